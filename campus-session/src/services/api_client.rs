use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use service_core::observability::TracedClientExt;

use crate::config::ProfileApiSettings;
use crate::error::SessionError;
use crate::models::{UserId, UserProfile, UserResource};
use crate::services::profile_api::ProfileApi;

/// HTTP client for the university backend REST API.
pub struct ApiClient {
    client: Client,
    settings: ProfileApiSettings,
}

impl ApiClient {
    pub fn new(settings: ProfileApiSettings) -> Result<Self, anyhow::Error> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self { client, settings })
    }

    pub fn base_url(&self) -> &str {
        self.settings.url.trim_end_matches('/')
    }

    /// Send a GET request with the bearer token and trace context propagation.
    ///
    /// Bodies shaped `{ "error": true, "mensaje": ... }` are failures whatever
    /// the HTTP status says.
    pub async fn get_with_auth(&self, path: &str, token: &str) -> Result<Value, SessionError> {
        let url = format!("{}{}", self.base_url(), path);

        let response = self
            .client
            .traced_get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(url = %url, error = %e, "Failed to send GET request");
                SessionError::fetch(format!("HTTP request failed: {}", e.without_url()))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!(url = %url, error = %e, "Failed to read response body");
            SessionError::fetch(format!("Failed to read response: {}", e.without_url()))
        })?;

        interpret_response(status, &body).inspect_err(|e| {
            tracing::warn!(url = %url, status = status.as_u16(), error = %e, "Backend request failed");
        })
    }

    /// List a user-scoped collection, accepting a bare array or a `data` envelope.
    pub async fn list_user_resource(
        &self,
        resource: UserResource,
        user_id: UserId,
        token: &str,
    ) -> Result<Vec<Value>, SessionError> {
        let body = self
            .get_with_auth(&resource.path_for(user_id), token)
            .await?;

        match body {
            Value::Array(items) => Ok(items),
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Array(items)) => Ok(items),
                Some(Value::Null) | None => Ok(Vec::new()),
                Some(_) => Err(SessionError::fetch("Unexpected list response shape")),
            },
            Value::Null => Ok(Vec::new()),
            _ => Err(SessionError::fetch("Unexpected list response shape")),
        }
    }
}

#[async_trait]
impl ProfileApi for ApiClient {
    async fn fetch_profile(&self, user_id: UserId, token: &str) -> Result<UserProfile, SessionError> {
        let body = self
            .get_with_auth(&format!("/api/usuarios/{}", user_id), token)
            .await?;

        // Some endpoints wrap the record in `data`
        let record = match body {
            Value::Object(mut map) if matches!(map.get("data"), Some(Value::Object(_))) => {
                map.remove("data").unwrap_or(Value::Null)
            }
            other => other,
        };

        serde_json::from_value::<UserProfile>(record).map_err(|e| {
            tracing::error!(user_id, error = %e, "Profile response has an unexpected shape");
            SessionError::fetch(format!("Invalid profile response: {}", e))
        })
    }
}

fn error_message(body: &Value) -> Option<String> {
    ["mensaje", "message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Classify a backend response into a JSON body or a [`SessionError`].
pub(crate) fn interpret_response(status: StatusCode, body: &str) -> Result<Value, SessionError> {
    let parsed: Option<Value> = if body.trim().is_empty() {
        Some(Value::Null)
    } else {
        serde_json::from_str(body).ok()
    };

    let rejected = status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN;

    let flagged = parsed
        .as_ref()
        .and_then(|v| v.get("error"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    if flagged || !status.is_success() {
        let message = parsed
            .as_ref()
            .and_then(error_message)
            .unwrap_or_else(|| {
                format!(
                    "Backend responded {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("")
                )
                .trim_end()
                .to_string()
            });

        return Err(if rejected {
            SessionError::rejected(message)
        } else {
            SessionError::fetch(message)
        });
    }

    parsed.ok_or_else(|| SessionError::fetch("Backend returned a non-JSON body"))
}
