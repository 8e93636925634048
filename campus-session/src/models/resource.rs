use serde::{Deserialize, Serialize};

use super::UserId;

/// User-scoped collections the dashboard lists for the signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserResource {
    Notificaciones,
    Pqrs,
    Favoritos,
}

impl UserResource {
    pub fn segment(&self) -> &'static str {
        match self {
            UserResource::Notificaciones => "notificaciones",
            UserResource::Pqrs => "pqrs",
            UserResource::Favoritos => "favoritos",
        }
    }

    /// Parse the path segment used by the dashboard routes.
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "notificaciones" | "notifications" => Some(UserResource::Notificaciones),
            "pqrs" => Some(UserResource::Pqrs),
            "favoritos" | "favorites" => Some(UserResource::Favoritos),
            _ => None,
        }
    }

    pub fn path_for(&self, user_id: UserId) -> String {
        format!("/api/{}/usuario/{}", self.segment(), user_id)
    }
}

/// Loading/error/items triple each list view keeps. The last fetch wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListState<T> {
    pub items: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

impl<T> ListState<T> {
    pub fn start(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn succeed(&mut self, items: Vec<T>) {
        self.items = items;
        self.loading = false;
        self.error = None;
    }

    /// Keep the previous items so the view does not flash empty on a failed refresh.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.error = Some(message.into());
    }
}
