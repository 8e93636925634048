use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use service_core::error::AppError;

use crate::models::{ListState, UserResource};
use crate::AppState;

pub async fn list_user_resource(
    State(state): State<AppState>,
    Path(resource): Path<String>,
) -> Result<Json<ListState<Value>>, AppError> {
    let resource = UserResource::from_segment(&resource)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Unknown resource '{}'", resource)))?;

    let list = state
        .resources
        .refresh(&state.session, resource)
        .await?;

    Ok(Json(list))
}
