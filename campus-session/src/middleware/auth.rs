use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use service_core::error::AppError;

use crate::AppState;

/// Reject requests unless the session holds a token and a loaded profile.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.session.is_authenticated() {
        return AppError::Unauthorized(anyhow::anyhow!("Session is not authenticated"))
            .into_response();
    }

    next.run(request).await
}
