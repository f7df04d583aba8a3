//! Layered configuration manager.
//!
//! Sources, in order of precedence: `config/default.toml`, then
//! `config/{BHXH_ENV}.toml`, then environment variables prefixed with
//! `BHXH` (e.g. `BHXH_DATABASE_URL` overrides `database.url`).

use config::{Config, Environment, File, FileFormat};
use serde::de::DeserializeOwned;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::debug;

const ENV_VAR: &str = "BHXH_ENV";
const ENV_PREFIX: &str = "BHXH";
const DEFAULT_ENVIRONMENT: &str = "development";

/// Keys that must resolve before the server is allowed to start.
const REQUIRED_KEYS: &[&str] = &[
    "server.host",
    "server.port",
    "database.url",
    "logging.level",
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("khởi tạo cấu hình thất bại: {message}")]
    InitializationError { message: String },

    #[error("thiếu khóa cấu hình bắt buộc: {key}")]
    KeyNotFound { key: String },
}

/// A single configuration source.
pub enum ConfigSource {
    File { path: String, required: bool },
    Env { prefix: String, separator: String },
}

pub struct ConfigManager {
    config: Config,
    environment: String,
}

impl ConfigManager {
    /// Build the manager from the standard source stack for the current
    /// environment.
    pub fn new() -> Result<Self, ConfigError> {
        let environment =
            std::env::var(ENV_VAR).unwrap_or_else(|_| DEFAULT_ENVIRONMENT.to_string());

        let sources = vec![
            ConfigSource::File {
                path: "config/default.toml".to_string(),
                required: true,
            },
            ConfigSource::File {
                path: format!("config/{}.toml", environment),
                required: false,
            },
            ConfigSource::Env {
                prefix: ENV_PREFIX.to_string(),
                separator: "_".to_string(),
            },
        ];

        Self::with_sources(environment, sources)
    }

    pub fn with_sources(
        environment: String,
        sources: Vec<ConfigSource>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        for source in sources {
            match source {
                ConfigSource::File { path, required } => {
                    builder = builder
                        .add_source(File::new(&path, FileFormat::Toml).required(required));
                }
                ConfigSource::Env { prefix, separator } => {
                    builder = builder.add_source(
                        Environment::with_prefix(&prefix).separator(&separator),
                    );
                }
            }
        }

        let config = builder
            .build()
            .map_err(|e| ConfigError::InitializationError {
                message: e.to_string(),
            })?;

        debug!("Configuration loaded for environment '{}'", environment);

        Ok(Self {
            config,
            environment,
        })
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        self.config
            .get::<T>(key)
            .map_err(|_| ConfigError::KeyNotFound {
                key: key.to_string(),
            })
    }

    pub fn get_string(&self, key: &str) -> Result<String, ConfigError> {
        self.get::<String>(key)
    }

    /// Get a value, falling back to a default when the key is absent.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.config.get_string(key).is_ok() || self.config.get_table(key).is_ok()
    }

    /// Fail fast when a required key is missing.
    pub fn validate_required_config(&self) -> Result<(), ConfigError> {
        for key in REQUIRED_KEYS {
            if !self.exists(key) {
                return Err(ConfigError::KeyNotFound {
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }
}

// Global singleton, initialized on first access.
static GLOBAL_CONFIG: OnceLock<Arc<ConfigManager>> = OnceLock::new();

pub fn get_global_config_manager() -> Result<Arc<ConfigManager>, ConfigError> {
    if let Some(manager) = GLOBAL_CONFIG.get() {
        return Ok(manager.clone());
    }
    let manager = Arc::new(ConfigManager::new()?);
    let _ = GLOBAL_CONFIG.set(manager.clone());
    Ok(manager)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_source_overrides() {
        std::env::set_var("BHXH_SERVER_PORT", "4500");
        let manager = ConfigManager::with_sources(
            "test".to_string(),
            vec![ConfigSource::Env {
                prefix: ENV_PREFIX.to_string(),
                separator: "_".to_string(),
            }],
        )
        .unwrap();
        assert_eq!(manager.get_or("server.port", 0u16), 4500);
        std::env::remove_var("BHXH_SERVER_PORT");
    }

    #[test]
    fn test_missing_key_reports_key_name() {
        let manager = ConfigManager::with_sources("test".to_string(), vec![]).unwrap();
        let err = manager.get_string("database.url").unwrap_err();
        assert!(err.to_string().contains("database.url"));
    }
}
