use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConfigError;

/// Runtime configuration pushed through the control plane
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CensorshipConfig {
    /// Upstream node as host:port
    pub target_address: String,
    /// Sender addresses whose transactions are dropped, stored as received
    pub censored_addresses: Vec<String>,
}

/// Wire shape of a control-plane document; every field may be absent
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigDocument {
    #[serde(default)]
    target_address: Option<String>,
    #[serde(default)]
    censored_addresses: Option<Vec<String>>,
}

impl CensorshipConfig {
    /// Config with the given target and an empty deny-list
    pub fn new(target_address: impl Into<String>) -> Self {
        Self {
            target_address: target_address.into(),
            censored_addresses: Vec::new(),
        }
    }

    pub fn with_censored_addresses(mut self, addresses: Vec<String>) -> Self {
        self.censored_addresses = addresses;
        self
    }

    /// Parse a control document, filling a missing or empty target from `fallback_target`
    pub fn from_document(raw: &[u8], fallback_target: &str) -> Result<Self, ConfigError> {
        let document: ConfigDocument = serde_json::from_slice(raw)
            .map_err(|e| ConfigError::MalformedInput(e.to_string()))?;

        let target_address = match document.target_address {
            Some(target) if !target.trim().is_empty() => target,
            _ => fallback_target.to_string(),
        };

        let censored_addresses = document.censored_addresses.ok_or_else(|| {
            ConfigError::InvalidConfig("censoredAddresses must be present".to_string())
        })?;

        let config = Self {
            target_address,
            censored_addresses,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the config invariant
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_address.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "targetAddress must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether requests need inspection at all
    pub fn is_censoring(&self) -> bool {
        !self.censored_addresses.is_empty()
    }
}

impl fmt::Display for CensorshipConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Config:")?;
        writeln!(f, "\tTarget Address: {}", self.target_address)?;
        writeln!(f, "\tCensored Addresses:")?;
        for address in &self.censored_addresses {
            writeln!(f, "\t\t{}", address)?;
        }
        Ok(())
    }
}
