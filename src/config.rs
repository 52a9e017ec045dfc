use anyhow::Context;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

const CONFIG_PATH: &str = "config.toml";

/// Application configuration
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub reviews_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            reviews_path: PathBuf::from("data/reviews.csv"),
        }
    }
}

impl AppConfig {
    /// Read `config.toml` when present, falling back to defaults.
    ///
    /// The `PORT` environment variable overrides the configured port.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match std::fs::read_to_string(CONFIG_PATH) {
            Ok(contents) => {
                toml::from_str(&contents).context("Failed to parse config.toml")?
            }
            Err(_) => {
                info!("No config.toml found, using defaults");
                AppConfig::default()
            }
        };

        if let Ok(port) = std::env::var("PORT") {
            config.server.port = port.parse().context("Invalid PORT value")?;
        }

        Ok(config)
    }
}
