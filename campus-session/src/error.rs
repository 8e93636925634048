use service_core::error::AppError;
use thiserror::Error;

/// Message fragments the backend uses when a token is missing, stale or rejected.
const AUTH_KEYWORDS: &[&str] = &[
    "token",
    "autenticación",
    "autenticacion",
    "authentication",
    "unauthorized",
    "no autorizado",
    "sesión",
    "session",
    "expirad",
    "expired",
    "jwt",
];

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No authentication token available")]
    MissingToken,

    #[error("Authentication token could not be decoded")]
    MalformedToken,

    #[error("No user id available for this session")]
    MissingUserId,

    #[error("{message}")]
    Fetch { message: String, auth_related: bool },

    #[error("Profile response was superseded by a newer session change")]
    Superseded,

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl SessionError {
    /// Build a fetch failure, classifying it from the backend message.
    pub fn fetch(message: impl Into<String>) -> Self {
        let message = message.into();
        let auth_related = message_is_auth_related(&message);
        SessionError::Fetch {
            message,
            auth_related,
        }
    }

    /// Build a fetch failure the backend rejected at the HTTP level (401/403).
    pub fn rejected(message: impl Into<String>) -> Self {
        SessionError::Fetch {
            message: message.into(),
            auth_related: true,
        }
    }

    /// Whether this failure means the session can no longer be trusted.
    pub fn is_auth_related(&self) -> bool {
        match self {
            SessionError::MissingToken | SessionError::MalformedToken => true,
            SessionError::Fetch { auth_related, .. } => *auth_related,
            _ => false,
        }
    }
}

pub fn message_is_auth_related(message: &str) -> bool {
    let lowered = message.to_lowercase();
    AUTH_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::MissingToken
            | SessionError::MalformedToken
            | SessionError::MissingUserId => AppError::Unauthorized(anyhow::anyhow!(err.to_string())),
            SessionError::Fetch {
                message,
                auth_related: true,
            } => AppError::Unauthorized(anyhow::anyhow!(message)),
            SessionError::Fetch { message, .. } => AppError::BadGateway(message),
            SessionError::Superseded => AppError::Conflict(anyhow::anyhow!(err.to_string())),
            SessionError::Storage(e) => AppError::InternalError(e),
        }
    }
}
