pub mod api_client;
pub mod profile_api;
pub mod token_store;
pub mod user_resources;

pub use api_client::ApiClient;
pub use profile_api::ProfileApi;
pub use token_store::TokenStore;
pub use user_resources::UserResourceFeed;
