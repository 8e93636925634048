use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;

use crate::models::{deserialize_optional_id, UserId};

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TokenClaims {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id_usuario: Option<UserId>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: Option<UserId>,
    #[serde(default, rename = "userId", deserialize_with = "deserialize_optional_id")]
    pub user_id: Option<UserId>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub sub: Option<UserId>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id_rol: Option<i64>,
    #[serde(default)]
    pub correo: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub iat: Option<i64>,
}

impl TokenClaims {
    /// The user id claim, preferring the backend's own `id_usuario`.
    pub fn user_id(&self) -> Option<UserId> {
        self.id_usuario.or(self.id).or(self.user_id).or(self.sub)
    }

    /// True when the token carries an expiry that is at or before `now` (unix seconds).
    pub fn is_expired(&self, now: i64) -> bool {
        self.exp.is_some_and(|exp| exp <= now)
    }
}

/// Decode JWT claims without validation
///
/// The dashboard only needs the user id to know which profile to load; the
/// backend re-validates the token on every request, so nothing here may be
/// used as proof of authentication.
///
/// Returns `None` for anything that is not a three-segment token with a
/// base64url JSON payload.
pub fn decode_jwt_claims(token: &str) -> Option<TokenClaims> {
    let parts: Vec<&str> = token.trim().split('.').collect();

    if parts.len() != 3 {
        tracing::debug!(segments = parts.len(), "Invalid JWT format");
        return None;
    }

    // Decode the payload (second part), tolerating padded encoders
    let payload = match general_purpose::URL_SAFE_NO_PAD.decode(parts[1].trim_end_matches('=')) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::debug!(error = %e, "Failed to decode JWT payload");
            return None;
        }
    };

    match serde_json::from_slice::<TokenClaims>(&payload) {
        Ok(claims) => Some(claims),
        Err(e) => {
            tracing::debug!(error = %e, "Failed to parse JWT claims");
            None
        }
    }
}

#[cfg(test)]
pub(crate) fn encode_test_token(payload: &serde_json::Value) -> String {
    let header = general_purpose::URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{}.{}.signature", header, body)
}
