// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::constants::ORIGIN_SECRET_HEADER;

pub mod server;
pub mod storage;

pub use server::ServerConfig;
pub use storage::{StorageBackend, StorageConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is referenced but not set")]
    MissingEnvVar(String),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub origin: OriginConfig,
    pub storage: StorageConfig,
}

fn default_secret_header() -> String {
    ORIGIN_SECRET_HEADER.to_string()
}

/// Shared-secret contract between the CDN and the origin
#[derive(Clone, Serialize, Deserialize)]
pub struct OriginConfig {
    pub secret: String,
    #[serde(default = "default_secret_header")]
    pub secret_header: String,
}

// Keep the secret out of debug logs
impl std::fmt::Debug for OriginConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OriginConfig")
            .field("secret", &"<redacted>")
            .field("secret_header", &self.secret_header)
            .finish()
    }
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, ConfigError> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            if std::env::var(var_name).is_err() {
                return Err(ConfigError::MissingEnvVar(var_name.to_string()));
            }
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        Ok(serde_yaml::from_str(&substituted)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be > 0".to_string()));
        }

        if self.origin.secret.is_empty() {
            return Err(ConfigError::Invalid(
                "origin.secret cannot be empty".to_string(),
            ));
        }

        if self.origin.secret_header.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "origin.secret_header cannot be empty".to_string(),
            ));
        }

        self.storage.validate().map_err(ConfigError::Invalid)
    }
}
