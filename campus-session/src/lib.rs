pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod session;
pub mod startup;
pub mod storage;
pub mod utils;

use services::UserResourceFeed;
use session::SessionContext;
use std::sync::Arc;

/// Shared application state: the process-wide session and the lists hanging off it.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionContext>,
    pub resources: Arc<UserResourceFeed>,
}

impl AppState {
    pub fn new(session: Arc<SessionContext>, resources: Arc<UserResourceFeed>) -> Self {
        Self { session, resources }
    }
}
