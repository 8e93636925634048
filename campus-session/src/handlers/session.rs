use axum::{extract::State, Json};
use serde::Deserialize;
use service_core::error::AppError;

use crate::models::{ProfilePatch, UserId};
use crate::session::SessionSnapshot;
use crate::storage::StorageArea;
use crate::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub user_id: UserId,
    #[serde(default)]
    pub token: Option<String>,
    /// Keep the token across restarts (durable store) or only for this run.
    #[serde(default = "default_remember")]
    pub remember: bool,
}

fn default_remember() -> bool {
    true
}

pub async fn get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session.snapshot())
}

pub async fn init_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session.initialize().await)
}

pub async fn login_handler(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let area = if payload.remember {
        StorageArea::Durable
    } else {
        StorageArea::Session
    };

    state
        .session
        .login_in(payload.user_id, payload.token, area)
        .await?;

    tracing::info!(user_id = payload.user_id, "User logged in successfully");
    Ok(Json(state.session.snapshot()))
}

pub async fn logout_handler(State(state): State<AppState>) -> Json<SessionSnapshot> {
    state.session.logout();
    state.resources.clear();
    Json(state.session.snapshot())
}

pub async fn refresh_handler(
    State(state): State<AppState>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let user_id = state.session.get_user_id();
    state.session.load_user_data(user_id).await?;
    Ok(Json(state.session.snapshot()))
}

pub async fn update_profile_handler(
    State(state): State<AppState>,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<SessionSnapshot>, AppError> {
    if patch.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Profile update has no fields"
        )));
    }

    state
        .session
        .update_user_data(patch)
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("No active session")))?;

    Ok(Json(state.session.snapshot()))
}
