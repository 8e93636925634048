use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub server: ServerSettings,
    pub profile_api: ProfileApiSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Origins allowed to call the session endpoints from the browser.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ProfileApiSettings {
    /// Base URL of the university backend (e.g., http://localhost:3000).
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProfileApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Deserialize, Clone, Debug)]
pub struct StorageSettings {
    /// File backing the durable store (token and cached profile).
    #[serde(default = "default_durable_path")]
    pub durable_path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            durable_path: default_durable_path(),
        }
    }
}

fn default_durable_path() -> PathBuf {
    PathBuf::from("campus-session-storage.json")
}

#[derive(Deserialize, Clone, Debug)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP collector endpoint. Spans are only exported when this is set.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("Failed to read current dir: {}", e)))?;

    // Support running from the workspace root or from the crate directory
    let configuration_directory = if base_path.ends_with("campus-session") {
        base_path.join("config")
    } else {
        base_path.join("campus-session").join("config")
    };

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
