pub mod jwt;

pub use jwt::{decode_jwt_claims, TokenClaims};

/// Current wall-clock time as unix seconds.
pub fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}
