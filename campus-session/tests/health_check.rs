mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use campus_session::services::{ApiClient, UserResourceFeed};
use campus_session::session::SessionContext;
use campus_session::startup::build_router;
use campus_session::storage::ClientStorage;
use campus_session::AppState;
use common::{ana, ana_json, token_for, MockProfileApi, TestApp};
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn health_check_works() {
    let api = Arc::new(
        ApiClient::new(campus_session::config::ProfileApiSettings {
            url: "http://localhost:3000".to_string(),
            timeout_secs: 1,
        })
        .unwrap(),
    );
    let session = Arc::new(SessionContext::new(
        ClientStorage::in_memory(),
        Arc::new(MockProfileApi::new().with_profile(ana())),
    ));
    let app = build_router(
        AppState::new(session, Arc::new(UserResourceFeed::new(api))),
        &["http://localhost:5173".to_string()],
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

// =============================================================================
// Session endpoints
// =============================================================================

#[tokio::test]
async fn anonymous_session_after_init() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let body: Value = client
        .post(app.url("/session/init"))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse response");

    assert_eq!(body["is_authenticated"], false);
    assert_eq!(body["initialized"], true);
    assert_eq!(body["phase"], "anonymous");
    assert!(body["user_data"].is_null());
}

#[tokio::test]
async fn login_then_logout() {
    let app = TestApp::spawn().await;
    let client = Client::new();
    let token = token_for(json!({ "id_usuario": 42 }));

    Mock::given(method("GET"))
        .and(path("/api/usuarios/42"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(ana_json()))
        .mount(&app.backend)
        .await;

    let response = client
        .post(app.url("/session/login"))
        .json(&json!({ "user_id": 42, "token": token }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["is_authenticated"], true);
    assert_eq!(body["user_id"], 42);
    assert_eq!(body["user_data"]["nombres_usuario"], "Ana");
    assert_eq!(body["display_name"], "Ana Ruiz");
    assert_eq!(body["initials"], "AR");
    assert_eq!(app.storage.durable().get("token").unwrap(), Some(token));

    let body: Value = client
        .post(app.url("/session/logout"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["is_authenticated"], false);
    assert_eq!(body["initialized"], false);
    assert!(body["display_name"].is_null());
    common::assert_storage_cleared(&app.storage);
}

#[tokio::test]
async fn login_with_rejected_token_is_unauthorized() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    Mock::given(method("GET"))
        .and(path("/api/usuarios/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": true,
            "mensaje": "Token de autenticación inválido"
        })))
        .mount(&app.backend)
        .await;

    let response = client
        .post(app.url("/session/login"))
        .json(&json!({ "user_id": 42, "token": token_for(json!({ "id_usuario": 42 })) }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
    assert!(!app.session.is_authenticated());
    assert_eq!(
        app.session.error().as_deref(),
        Some("Token de autenticación inválido")
    );
}

#[tokio::test]
async fn profile_patch_requires_a_session() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .patch(app.url("/session/profile"))
        .json(&json!({ "correo": "new@x.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);

    let response = client
        .patch(app.url("/session/profile"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn profile_patch_updates_session() {
    let app = TestApp::spawn().await;
    let client = Client::new();
    Mock::given(method("GET"))
        .and(path("/api/usuarios/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ana_json()))
        .mount(&app.backend)
        .await;
    app.session
        .login(42, Some(token_for(json!({ "id_usuario": 42 }))))
        .await
        .unwrap();

    let body: Value = client
        .patch(app.url("/session/profile"))
        .json(&json!({ "correo": "new@x.com" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["user_data"]["correo"], "new@x.com");
    assert_eq!(app.session.cached_profile().unwrap().correo, "new@x.com");
}

#[tokio::test]
async fn refresh_without_session_is_unauthorized() {
    let app = TestApp::spawn().await;

    let response = Client::new()
        .post(app.url("/session/refresh"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
}

// =============================================================================
// User resources
// =============================================================================

#[tokio::test]
async fn resources_require_authentication() {
    let app = TestApp::spawn().await;

    let response = Client::new()
        .get(app.url("/me/notificaciones"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn resources_list_for_signed_in_user() {
    let app = TestApp::spawn().await;
    let client = Client::new();
    Mock::given(method("GET"))
        .and(path("/api/usuarios/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ana_json()))
        .mount(&app.backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/favoritos/usuario/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id_recurso": 3 }])))
        .mount(&app.backend)
        .await;
    app.session
        .login(42, Some(token_for(json!({ "id_usuario": 42 }))))
        .await
        .unwrap();

    let body: Value = client
        .get(app.url("/me/favoritos"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["items"][0]["id_recurso"], 3);
    assert_eq!(body["loading"], false);
    assert!(body["error"].is_null());

    let response = client.get(app.url("/me/carreras")).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}
