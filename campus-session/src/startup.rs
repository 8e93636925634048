use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::middleware::tracing::request_id_middleware;
use service_core::observability::REQUEST_ID_HEADER;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    app::health_check,
    resources::list_user_resource,
    session::{
        get_session, init_session, login_handler, logout_handler, refresh_handler,
        update_profile_handler,
    },
};
use crate::middleware::auth::auth_middleware;
use crate::AppState;

pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    let protected = Router::new()
        .route("/me/:resource", get(list_user_resource))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| {
            origin
                .parse::<HeaderValue>()
                .inspect_err(|e| tracing::error!("Invalid CORS origin '{}': {}", origin, e))
                .ok()
        })
        .collect();

    Router::new()
        .route("/health", get(health_check))
        .route("/session", get(get_session))
        .route("/session/init", post(init_session))
        .route("/session/login", post(login_handler))
        .route("/session/logout", post(logout_handler))
        .route("/session/refresh", post(refresh_handler))
        .route(
            "/session/profile",
            axum::routing::patch(update_profile_handler),
        )
        .merge(protected)
        .with_state(state)
        // Add tracing layer
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
}
