use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::relay::FramingLimits;

pub const DEFAULT_CONFIG_FILE: &str = "censorship-proxy.toml";
pub const MIN_CONTROL_BUFFER_SIZE: usize = 1024;
/// Lowest accepted header limit, enough for a request line and a handful of headers
pub const MIN_HEADER_BYTES: usize = 256;

/// Process settings. The runtime censorship config is not part of this; it
/// arrives through the control plane and lives in `ConfigStore`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub control: ControlConfig,
    pub relay: RelayConfig,
    pub logging: LoggingConfig,
}

/// Control-plane listener configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Bytes read from a control connection; longer documents are truncated
    pub buffer_size: usize,
}

/// Data-plane framing limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Maximum size of a request line plus headers
    pub max_header_bytes: usize,
    /// Maximum decoded body size
    pub max_body_bytes: usize,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Append log lines to this file instead of stderr
    pub file_path: Option<String>,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            buffer_size: MIN_CONTROL_BUFFER_SIZE,
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        let limits = FramingLimits::default();
        Self {
            max_header_bytes: limits.max_header_bytes,
            max_body_bytes: limits.max_body_bytes,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_path: None,
        }
    }
}

impl RelayConfig {
    pub fn limits(&self) -> FramingLimits {
        FramingLimits {
            max_header_bytes: self.max_header_bytes,
            max_body_bytes: self.max_body_bytes,
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    /// Environment variables take precedence over file values
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file()?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the TOML file named by CONFIG_FILE; a missing file means defaults
    pub fn load_from_file() -> Result<Self, ConfigError> {
        let config_path = env::var("CONFIG_FILE").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        if !Path::new(&config_path).exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ConfigError::FileNotFound(config_path.clone()))?;
        toml::from_str(&content).map_err(|e| ConfigError::Parsing(e.to_string()))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(size) = parse_env("CONTROL_BUFFER_SIZE")? {
            self.control.buffer_size = size;
        }
        if let Some(bytes) = parse_env("RELAY_MAX_HEADER_BYTES")? {
            self.relay.max_header_bytes = bytes;
        }
        if let Some(bytes) = parse_env("RELAY_MAX_BODY_BYTES")? {
            self.relay.max_body_bytes = bytes;
        }

        if let Ok(level) = env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(file_path) = env::var("LOG_FILE_PATH") {
            self.logging.file_path = Some(file_path);
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.control.buffer_size < MIN_CONTROL_BUFFER_SIZE {
            return Err(ConfigError::InvalidValue {
                key: "control.buffer_size".to_string(),
                value: self.control.buffer_size.to_string(),
            });
        }

        if self.relay.max_header_bytes < MIN_HEADER_BYTES {
            return Err(ConfigError::InvalidValue {
                key: "relay.max_header_bytes".to_string(),
                value: self.relay.max_header_bytes.to_string(),
            });
        }

        if self.relay.max_body_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "relay.max_body_bytes".to_string(),
                value: self.relay.max_body_bytes.to_string(),
            });
        }

        let valid_levels = ["off", "error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                value: self.logging.level.clone(),
            });
        }

        if let Some(path) = &self.logging.file_path {
            if path.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "logging.file_path".to_string(),
                    value: path.clone(),
                });
            }
        }

        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample_config() -> Result<String, ConfigError> {
        toml::to_string_pretty(&Self::default()).map_err(|e| ConfigError::Parsing(e.to_string()))
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}
