//! Server configuration
//! Read from the environment (after `.env` has been loaded) with defaults for
//! local development.

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

pub const DEFAULT_MODULE_CONFIG_PATH: &str = "config/module.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid host address: {0}")]
    InvalidHost(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub module_config_path: PathBuf,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = match lookup("API_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| {
                ConfigError::InvalidConfig(format!("Invalid API_PORT: {} ({})", raw, e))
            })?,
            None => 3001,
        };

        let module_config_path = lookup("MODULE_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODULE_CONFIG_PATH));

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("pretty") | Some("text") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidConfig(format!(
                    "Unknown LOG_FORMAT: {}",
                    other
                )))
            }
        };

        Ok(Self {
            host,
            port,
            module_config_path,
            log_format,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.host.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn log_summary(&self) {
        info!(
            "Server configuration loaded: host={}, port={}, module_config={}",
            self.host,
            self.port,
            self.module_config_path.display()
        );
    }
}
