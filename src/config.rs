use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

/// Client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Base URL of the HTTP API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Base URL of the realtime endpoint, derived from the API base when unset
    pub realtime_url: Option<String>,

    /// Path of the realtime endpoint
    #[serde(default = "default_realtime_path")]
    pub realtime_path: String,

    /// Prefix of the per-document topics we subscribe to
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,

    /// Prefix of the destinations we send edits to
    #[serde(default = "default_app_prefix")]
    pub app_prefix: String,

    /// Quiet period before a local edit is broadcast
    #[serde(default = "default_edit_debounce_ms")]
    pub edit_debounce_ms: u64,

    /// How long a toast stays visible
    #[serde(default = "default_toast_ttl_ms")]
    pub toast_ttl_ms: u64,

    /// HTTP request timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Directory holding the local storage file
    pub storage_dir: Option<PathBuf>,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            // Fallback to .env file
            dotenvy::dotenv().ok();
        }

        // Load from environment variables using envy
        match envy::from_env::<Config>() {
            Ok(config) => {
                info!("Configuration loaded successfully");
                Ok(config)
            }
            Err(e) => {
                error!("Failed to load configuration: {}", e);
                Err(ConfigError::EnvError(e))
            }
        }
    }

    /// Full URL of an API path
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url.trim_end_matches('/'), path)
    }

    /// Realtime base URL, either configured or derived from the API base.
    pub fn realtime_base_url(&self) -> String {
        if let Some(url) = &self.realtime_url {
            return url.trim_end_matches('/').to_string();
        }
        let base = self.api_base_url.trim_end_matches('/');
        if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        }
    }

    /// Topic carrying JOIN/LEAVE/EDIT broadcasts for a document
    pub fn doc_topic(&self, doc_id: &str) -> String {
        format!("{}/doc/{}", self.topic_prefix, doc_id)
    }

    /// Destination our own JOIN/LEAVE/EDIT messages go to
    pub fn edit_destination(&self, doc_id: &str) -> String {
        format!("{}/edit/{}", self.app_prefix, doc_id)
    }

    pub fn edit_debounce(&self) -> Duration {
        Duration::from_millis(self.edit_debounce_ms)
    }

    pub fn toast_ttl(&self) -> Duration {
        Duration::from_millis(self.toast_ttl_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Location of the local storage file
    pub fn storage_path(&self) -> PathBuf {
        let dir = self.storage_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("collab-docs")
        });
        dir.join("storage.json")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            realtime_url: None,
            realtime_path: default_realtime_path(),
            topic_prefix: default_topic_prefix(),
            app_prefix: default_app_prefix(),
            edit_debounce_ms: default_edit_debounce_ms(),
            toast_ttl_ms: default_toast_ttl_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            storage_dir: None,
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvError(#[from] envy::Error),
}

// Default value functions
fn default_api_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_realtime_path() -> String {
    "/ws-docs".to_string()
}

fn default_topic_prefix() -> String {
    "/topic".to_string()
}

fn default_app_prefix() -> String {
    "/app".to_string()
}

fn default_edit_debounce_ms() -> u64 {
    500
}

fn default_toast_ttl_ms() -> u64 {
    2600
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}
