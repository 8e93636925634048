//! Session state machine.
//!
//! `Uninitialized -> Checking -> { Authenticated | Anonymous }`. An
//! authenticated session goes back to anonymous on logout or when the backend
//! rejects its token, and refreshes itself through `load_user_data` and
//! `update_user_data`.
//!
//! Every profile load captures a generation number. `logout`, session clears
//! and newer loads bump it, and a response whose generation is stale is
//! dropped without touching state or storage.
//!
//! Storage writes that belong to a state change run while the state lock is
//! held. The lock order is always state, then store.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};

use crate::error::SessionError;
use crate::models::{CachedProfile, ProfilePatch, UserId, UserProfile};
use crate::services::profile_api::ProfileApi;
use crate::services::token_store::TokenStore;
use crate::storage::{ClientStorage, StorageArea, USER_DATA_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Uninitialized,
    Checking,
    Authenticated,
    Anonymous,
}

#[derive(Debug)]
struct SessionState {
    user_profile: Option<UserProfile>,
    loading: bool,
    error: Option<String>,
    initialized: bool,
    phase: SessionPhase,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user_profile: None,
            loading: false,
            error: None,
            initialized: false,
            phase: SessionPhase::Uninitialized,
        }
    }
}

/// Serialisable view of the session handed to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub user_data: Option<UserProfile>,
    pub user_id: Option<UserId>,
    /// Header label and avatar initials for the signed-in user.
    pub display_name: Option<String>,
    pub initials: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
    pub initialized: bool,
    pub is_authenticated: bool,
    pub phase: SessionPhase,
}

pub struct SessionContext {
    profiles: Arc<dyn ProfileApi>,
    tokens: TokenStore,
    state: Mutex<SessionState>,
    generation: AtomicU64,
}

impl SessionContext {
    pub fn new(storage: ClientStorage, profiles: Arc<dyn ProfileApi>) -> Self {
        Self {
            profiles,
            tokens: TokenStore::new(storage),
            state: Mutex::new(SessionState::default()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // State is plain data; a panic elsewhere cannot leave it half-written
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolve the session from storage: no token or an unusable token clears
    /// everything, otherwise the profile is loaded. Always ends initialized.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> SessionSnapshot {
        self.lock().phase = SessionPhase::Checking;

        if !self.tokens.has_token() {
            debug!("No token found, starting anonymous session");
            self.clear_session(None);
        } else if let Some(user_id) = self.tokens.get_user_id_from_token() {
            if let Err(e) = self.load_user_data(Some(user_id)).await {
                debug!(user_id, error = %e, "Initial profile load did not complete");
            }
        } else {
            warn!(error = %SessionError::MalformedToken, "Stored token is unusable, clearing session");
            self.clear_session(None);
        }

        {
            let mut state = self.lock();
            state.initialized = true;
            state.loading = false;
            if state.phase == SessionPhase::Checking {
                state.phase = if state.user_profile.is_some() {
                    SessionPhase::Authenticated
                } else {
                    SessionPhase::Anonymous
                };
            }
        }

        self.snapshot()
    }

    /// Run [`Self::initialize`] only if this session has not resolved yet.
    pub async fn ensure_initialized(&self) -> SessionSnapshot {
        if self.initialized() {
            return self.snapshot();
        }
        self.initialize().await
    }

    /// Fetch the profile for `user_id` and make it the session's profile.
    ///
    /// Failures are recorded in `error`. An authentication failure also logs
    /// the session out; any other failure leaves the current profile alone.
    #[instrument(skip(self))]
    pub async fn load_user_data(
        &self,
        user_id: Option<UserId>,
    ) -> Result<UserProfile, SessionError> {
        let Some(user_id) = user_id else {
            let err = SessionError::MissingUserId;
            self.lock().error = Some(err.to_string());
            return Err(err);
        };

        let Some(token) = self.tokens.token() else {
            warn!(user_id, "Profile load requested without a token");
            let err = SessionError::MissingToken;
            self.clear_session(Some(err.to_string()));
            return Err(err);
        };

        let generation = {
            let mut state = self.lock();
            state.loading = true;
            state.error = None;
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        let result = self.profiles.fetch_profile(user_id, &token).await;

        let mut state = self.lock();
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(user_id, "Discarding stale profile response");
            return Err(SessionError::Superseded);
        }

        match result {
            Ok(profile) => {
                let profile = profile.normalized();
                state.user_profile = Some(profile.clone());
                state.loading = false;
                state.phase = SessionPhase::Authenticated;
                self.write_cache(&profile);
                drop(state);

                info!(user_id = profile.id_usuario, "User profile loaded");
                Ok(profile)
            }
            Err(e) if e.is_auth_related() => {
                drop(state);
                warn!(user_id, error = %e, "Backend rejected the session token, logging out");
                self.logout();
                self.lock().error = Some(e.to_string());
                Err(e)
            }
            Err(e) => {
                warn!(user_id, error = %e, "Failed to load user profile");
                state.loading = false;
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Shallow-merge `patch` into the current profile.
    ///
    /// Returns `None` without touching state or storage when there is no
    /// profile.
    pub fn update_user_data(&self, patch: ProfilePatch) -> Option<UserProfile> {
        let mut state = self.lock();
        let profile = state.user_profile.as_mut()?;
        patch.apply_to(profile);
        let updated = profile.clone();

        if self.tokens.has_token() {
            self.write_cache(&updated);
        }
        drop(state);

        debug!(user_id = updated.id_usuario, "User profile updated");
        Some(updated)
    }

    /// Store `token` (when given) in the durable store, then load the profile.
    pub async fn login(
        &self,
        user_id: UserId,
        token: Option<String>,
    ) -> Result<UserProfile, SessionError> {
        self.login_in(user_id, token, StorageArea::Durable).await
    }

    /// Like [`Self::login`], choosing which store keeps the token.
    #[instrument(skip(self, token))]
    pub async fn login_in(
        &self,
        user_id: UserId,
        token: Option<String>,
        area: StorageArea,
    ) -> Result<UserProfile, SessionError> {
        if let Some(token) = token {
            if let Err(e) = self.tokens.store_token(&token, area) {
                warn!(user_id, error = %e, "Failed to store token");
                let err = SessionError::Storage(e);
                self.lock().error = Some(err.to_string());
                return Err(err);
            }
        }
        self.load_user_data(Some(user_id)).await
    }

    /// Drop the profile and every token and cache key from both stores.
    pub fn logout(&self) {
        {
            let mut state = self.lock();
            self.generation.fetch_add(1, Ordering::SeqCst);
            state.user_profile = None;
            state.error = None;
            state.loading = false;
            state.initialized = false;
            state.phase = SessionPhase::Anonymous;
            self.clear_storage();
        }
        info!("Session logged out");
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.has_token() && self.lock().user_profile.is_some()
    }

    /// The profile's id, falling back to the token's claim before the profile loads.
    pub fn get_user_id(&self) -> Option<UserId> {
        let from_profile = self.lock().user_profile.as_ref().map(|p| p.id_usuario);
        from_profile.or_else(|| self.tokens.get_user_id_from_token())
    }

    pub fn token(&self) -> Option<String> {
        self.tokens.token()
    }

    pub fn user_data(&self) -> Option<UserProfile> {
        self.lock().user_profile.clone()
    }

    pub fn loading(&self) -> bool {
        self.lock().loading
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn initialized(&self) -> bool {
        self.lock().initialized
    }

    /// The `userData` projection currently in durable storage.
    pub fn cached_profile(&self) -> Option<CachedProfile> {
        let raw = self
            .tokens
            .storage()
            .durable()
            .get(USER_DATA_KEY)
            .ok()
            .flatten()?;
        serde_json::from_str(&raw)
            .inspect_err(|e| debug!(error = %e, "Ignoring unreadable cached profile"))
            .ok()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let has_token = self.tokens.has_token();
        let token_user_id = self.tokens.get_user_id_from_token();
        let state = self.lock();

        let is_authenticated = has_token && state.user_profile.is_some();
        let phase = match state.phase {
            SessionPhase::Authenticated if !is_authenticated => SessionPhase::Anonymous,
            phase => phase,
        };

        SessionSnapshot {
            user_data: state.user_profile.clone(),
            user_id: state
                .user_profile
                .as_ref()
                .map(|p| p.id_usuario)
                .or(token_user_id),
            display_name: state.user_profile.as_ref().map(UserProfile::display_name),
            initials: state.user_profile.as_ref().map(UserProfile::initials),
            loading: state.loading,
            error: state.error.clone(),
            initialized: state.initialized,
            is_authenticated,
            phase,
        }
    }

    /// Reset to anonymous without touching `initialized`.
    fn clear_session(&self, error: Option<String>) {
        {
            let mut state = self.lock();
            self.generation.fetch_add(1, Ordering::SeqCst);
            state.user_profile = None;
            state.loading = false;
            state.error = error;
            state.phase = SessionPhase::Anonymous;
            self.clear_storage();
        }
    }

    /// Callers hold the state lock.
    fn clear_storage(&self) {
        if let Err(e) = self.tokens.clear_tokens() {
            warn!(error = %e, "Failed to clear tokens from storage");
        }
        if let Err(e) = self.tokens.storage().remove_everywhere(USER_DATA_KEY) {
            warn!(error = %e, "Failed to clear cached profile from storage");
        }
    }

    /// Callers hold the state lock.
    fn write_cache(&self, profile: &UserProfile) {
        let cached = profile.projection();
        let result = serde_json::to_string(&cached)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.tokens.storage().durable().set(USER_DATA_KEY, &json));

        if let Err(e) = result {
            warn!(user_id = profile.id_usuario, error = %e, "Failed to cache user profile");
        }
    }
}
