use crate::models::UserId;
use crate::storage::{ClientStorage, StorageArea, LEGACY_TOKEN_KEYS, TOKEN_KEY};
use crate::utils::{decode_jwt_claims, now_unix, TokenClaims};

/// Read/write access to the bearer token across both storage areas.
///
/// Lookups prefer the durable store and fall back to the tab-scoped one.
/// Read failures are logged and treated as "no token" so that a broken store
/// fails closed.
#[derive(Clone)]
pub struct TokenStore {
    storage: ClientStorage,
}

impl TokenStore {
    pub fn new(storage: ClientStorage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &ClientStorage {
        &self.storage
    }

    pub fn token(&self) -> Option<String> {
        [StorageArea::Durable, StorageArea::Session]
            .into_iter()
            .find_map(|area| match self.storage.area(area).get(TOKEN_KEY) {
                Ok(Some(token)) if !token.trim().is_empty() => Some(token),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(?area, error = %e, "Failed to read token from storage");
                    None
                }
            })
    }

    pub fn has_token(&self) -> bool {
        self.token().is_some()
    }

    /// Claims of the stored token, without any signature check.
    pub fn claims(&self) -> Option<TokenClaims> {
        self.token().and_then(|token| decode_jwt_claims(&token))
    }

    pub fn get_user_id_from_token(&self) -> Option<UserId> {
        self.user_id_at(now_unix())
    }

    /// User id claim of the stored token, if it has not expired by `now`.
    pub fn user_id_at(&self, now: i64) -> Option<UserId> {
        let claims = self.claims()?;
        if claims.is_expired(now) {
            tracing::debug!(exp = ?claims.exp, now, "Stored token has expired");
            return None;
        }
        claims.user_id()
    }

    /// Store `token` in `area` and drop any copy held in the other area.
    pub fn store_token(&self, token: &str, area: StorageArea) -> Result<(), anyhow::Error> {
        let other = match area {
            StorageArea::Durable => StorageArea::Session,
            StorageArea::Session => StorageArea::Durable,
        };
        self.storage.area(area).set(TOKEN_KEY, token)?;
        self.storage.area(other).remove(TOKEN_KEY)?;
        Ok(())
    }

    /// Remove the token and every legacy alias from both areas.
    pub fn clear_tokens(&self) -> Result<(), anyhow::Error> {
        self.storage.remove_everywhere(TOKEN_KEY)?;
        for key in LEGACY_TOKEN_KEYS {
            self.storage.remove_everywhere(key)?;
        }
        Ok(())
    }
}
