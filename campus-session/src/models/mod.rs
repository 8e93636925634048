pub mod profile;
pub mod resource;

pub use profile::{CachedProfile, ProfilePatch, UserProfile};
pub use resource::{ListState, UserResource};

use serde::{Deserialize, Deserializer};

/// Numeric identifier the backend uses for users, roles and careers.
pub type UserId = i64;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

/// Backends emit ids either as a number or as a numeric string.
pub(crate) fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawId>::deserialize(deserializer)? {
        Some(RawId::Number(id)) => Some(id),
        Some(RawId::Text(text)) => text.trim().parse().ok(),
        None => None,
    })
}

pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid id '{}'", text))),
    }
}
