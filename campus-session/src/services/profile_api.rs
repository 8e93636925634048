use async_trait::async_trait;

use crate::error::SessionError;
use crate::models::{UserId, UserProfile};

/// Source of full user profiles, authorised by the session's bearer token.
#[async_trait]
pub trait ProfileApi: Send + Sync {
    async fn fetch_profile(&self, user_id: UserId, token: &str) -> Result<UserProfile, SessionError>;
}
