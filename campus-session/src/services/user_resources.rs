use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::SessionError;
use crate::models::{ListState, UserResource};
use crate::services::api_client::ApiClient;
use crate::session::SessionContext;

/// Per-resource list state for the signed-in user's notifications, PQRS and favorites.
///
/// Each refresh reads the user id and token from the session at call time.
/// Overlapping refreshes of the same resource are not ordered: whichever
/// response lands last is what the list shows.
pub struct UserResourceFeed {
    api: Arc<ApiClient>,
    lists: Mutex<HashMap<UserResource, ListState<Value>>>,
}

impl UserResourceFeed {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            lists: Mutex::new(HashMap::new()),
        }
    }

    fn with_list<R>(&self, resource: UserResource, f: impl FnOnce(&mut ListState<Value>) -> R) -> R {
        let mut lists = self.lists.lock().unwrap_or_else(PoisonError::into_inner);
        f(lists.entry(resource).or_default())
    }

    pub fn current(&self, resource: UserResource) -> ListState<Value> {
        self.with_list(resource, |list| list.clone())
    }

    pub async fn refresh(
        &self,
        session: &SessionContext,
        resource: UserResource,
    ) -> Result<ListState<Value>, SessionError> {
        let user_id = session.get_user_id().ok_or(SessionError::MissingUserId)?;
        let token = session.token().ok_or(SessionError::MissingToken)?;

        self.with_list(resource, ListState::start);

        match self.api.list_user_resource(resource, user_id, &token).await {
            Ok(items) => {
                tracing::debug!(
                    resource = resource.segment(),
                    user_id,
                    count = items.len(),
                    "Fetched user resource list"
                );
                Ok(self.with_list(resource, |list| {
                    list.succeed(items);
                    list.clone()
                }))
            }
            Err(e) => {
                tracing::warn!(resource = resource.segment(), user_id, error = %e, "Failed to fetch user resource list");
                self.with_list(resource, |list| list.fail(e.to_string()));
                Err(e)
            }
        }
    }

    /// Forget every list, e.g. after the session logs out.
    pub fn clear(&self) {
        self.lists
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
