//! Server configuration types.
//!
//! Listen address, request timeout and log output. Default values are
//! sourced from `crate::constants`.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ADDRESS, DEFAULT_PORT, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::logging::LogFormat;

fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request timeout in seconds; 0 disables it
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            log_format: LogFormat::default(),
        }
    }
}

impl ServerConfig {
    /// `address:port` as passed to the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// `None` when the timeout is disabled
    pub fn request_timeout(&self) -> Option<std::time::Duration> {
        (self.request_timeout_secs > 0)
            .then(|| std::time::Duration::from_secs(self.request_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_deserialize_defaults() {
        let config: ServerConfig = serde_yaml::from_str("{}").unwrap();

        assert_eq!(config.address, DEFAULT_ADDRESS);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_server_config_custom_values() {
        let yaml = r#"
address: "127.0.0.1"
port: 9000
request_timeout_secs: 5
log_format: pretty
"#;
        let config: ServerConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(
            config.request_timeout(),
            Some(std::time::Duration::from_secs(5))
        );
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_zero_timeout_disables_it() {
        let config = ServerConfig {
            request_timeout_secs: 0,
            ..ServerConfig::default()
        };
        assert_eq!(config.request_timeout(), None);
    }
}
