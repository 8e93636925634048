#![allow(dead_code)]

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use campus_session::config::ProfileApiSettings;
use campus_session::error::SessionError;
use campus_session::models::{UserId, UserProfile};
use campus_session::services::{ApiClient, ProfileApi, UserResourceFeed};
use campus_session::session::SessionContext;
use campus_session::startup::build_router;
use campus_session::storage::{ClientStorage, LEGACY_TOKEN_KEYS, TOKEN_KEY, USER_DATA_KEY};
use campus_session::AppState;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::MockServer;

/// Unsigned three-segment token carrying `payload` as its claims.
pub fn token_for(payload: Value) -> String {
    let header = general_purpose::URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{}.{}.signature", header, body)
}

pub fn ana_json() -> Value {
    json!({
        "id_usuario": 42,
        "nombres_usuario": "Ana",
        "apellidos_usuario": "Ruiz",
        "correo": "a@x.com",
        "id_rol": 2
    })
}

pub fn ana() -> UserProfile {
    serde_json::from_value(ana_json()).expect("valid profile fixture")
}

pub fn profile_with(id: i64, nombres: &str) -> UserProfile {
    let mut value = ana_json();
    value["id_usuario"] = json!(id);
    value["nombres_usuario"] = json!(nombres);
    serde_json::from_value(value).expect("valid profile fixture")
}

/// Every token alias and the cached profile are gone from both stores.
pub fn assert_storage_cleared(storage: &ClientStorage) {
    let keys = std::iter::once(TOKEN_KEY)
        .chain(LEGACY_TOKEN_KEYS.iter().copied())
        .chain(std::iter::once(USER_DATA_KEY));

    for key in keys {
        assert_eq!(storage.durable().get(key).unwrap(), None, "durable '{}'", key);
        assert_eq!(storage.session().get(key).unwrap(), None, "session '{}'", key);
    }
}

pub struct TestApp {
    pub address: String,
    pub backend: MockServer,
    pub storage: ClientStorage,
    pub session: Arc<SessionContext>,
}

impl TestApp {
    /// Serve the router on a random port, backed by a wiremock profile API.
    pub async fn spawn() -> Self {
        let backend = MockServer::start().await;
        let storage = ClientStorage::in_memory();

        let api = Arc::new(
            ApiClient::new(ProfileApiSettings {
                url: backend.uri(),
                timeout_secs: 5,
            })
            .expect("Failed to build API client"),
        );
        let session = Arc::new(SessionContext::new(storage.clone(), api.clone()));
        let resources = Arc::new(UserResourceFeed::new(api));
        let app = build_router(AppState::new(session.clone(), resources), &[]);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().expect("No local address").port();

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            address: format!("http://127.0.0.1:{}", port),
            backend,
            storage,
            session,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

#[derive(Clone)]
enum MockReply {
    Profile(UserProfile),
    Error(String),
    Rejected(String),
}

/// In-memory [`ProfileApi`] with scripted replies per user id.
#[derive(Default)]
pub struct MockProfileApi {
    replies: Mutex<HashMap<UserId, MockReply>>,
    delays: Mutex<HashMap<UserId, Duration>>,
    tokens_seen: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockProfileApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(self, profile: UserProfile) -> Self {
        self.set_reply(profile.id_usuario, MockReply::Profile(profile));
        self
    }

    /// Reply with a `{ error: true, mensaje }` style failure.
    pub fn with_error(self, user_id: UserId, message: &str) -> Self {
        self.set_reply(user_id, MockReply::Error(message.to_string()));
        self
    }

    /// Reply as if the backend answered 401.
    pub fn with_rejection(self, user_id: UserId, message: &str) -> Self {
        self.set_reply(user_id, MockReply::Rejected(message.to_string()));
        self
    }

    pub fn with_delay(self, user_id: UserId, delay: Duration) -> Self {
        if let Ok(mut delays) = self.delays.lock() {
            delays.insert(user_id, delay);
        }
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn tokens_seen(&self) -> Vec<String> {
        self.tokens_seen
            .lock()
            .map(|tokens| tokens.clone())
            .unwrap_or_default()
    }

    fn set_reply(&self, user_id: UserId, reply: MockReply) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.insert(user_id, reply);
        }
    }
}

#[async_trait]
impl ProfileApi for MockProfileApi {
    async fn fetch_profile(&self, user_id: UserId, token: &str) -> Result<UserProfile, SessionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut tokens) = self.tokens_seen.lock() {
            tokens.push(token.to_string());
        }

        let delay = self
            .delays
            .lock()
            .ok()
            .and_then(|delays| delays.get(&user_id).copied());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self
            .replies
            .lock()
            .map_err(|e| SessionError::fetch(format!("Mock profile mutex poisoned: {}", e)))?
            .get(&user_id)
            .cloned();

        match reply {
            Some(MockReply::Profile(profile)) => Ok(profile),
            Some(MockReply::Error(message)) => Err(SessionError::fetch(message)),
            Some(MockReply::Rejected(message)) => Err(SessionError::rejected(message)),
            None => Err(SessionError::fetch("Usuario no encontrado")),
        }
    }
}
