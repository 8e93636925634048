use campus_session::config::get_configuration;
use campus_session::services::{ApiClient, UserResourceFeed};
use campus_session::session::SessionContext;
use campus_session::startup::build_router;
use campus_session::storage::{ClientStorage, FileStore, MemoryStore};
use campus_session::AppState;
use dotenvy::dotenv;
use service_core::observability::init_tracing;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "campus-session",
        &configuration.telemetry.log_level,
        configuration.telemetry.otlp_endpoint.as_deref(),
    );

    let durable = FileStore::open(&configuration.storage.durable_path).map_err(|e| {
        tracing::error!("Failed to open durable storage: {}", e);
        anyhow::anyhow!("Storage error: {}", e)
    })?;
    let storage = ClientStorage::new(Arc::new(durable), Arc::new(MemoryStore::new()));

    let api = Arc::new(ApiClient::new(configuration.profile_api.clone())?);
    let session = Arc::new(SessionContext::new(storage, api.clone()));

    let snapshot = session.initialize().await;
    info!(
        authenticated = snapshot.is_authenticated,
        user_id = ?snapshot.user_id,
        "Session initialized"
    );

    let resources = Arc::new(UserResourceFeed::new(api));
    let app = build_router(
        AppState::new(session, resources),
        &configuration.server.allowed_origins,
    );

    let address = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    info!("Starting campus-session on {}", address);
    axum::serve(listener, app).await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
