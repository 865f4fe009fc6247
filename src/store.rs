use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::ConfigError;
use crate::models::CensorshipConfig;

/// Holds the live censorship configuration shared by every session and the
/// control listener.
///
/// Writes replace the whole value in a single assignment, so readers always
/// see either the previous or the next config. A poisoned lock therefore still
/// guards a complete value and is recovered instead of propagated.
#[derive(Debug)]
pub struct ConfigStore {
    config: RwLock<CensorshipConfig>,
}

impl ConfigStore {
    /// Store with the given target and an empty deny-list
    pub fn new(target_address: impl Into<String>) -> Self {
        Self::with_config(CensorshipConfig::new(target_address))
    }

    pub fn with_config(config: CensorshipConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }

    /// Snapshot of the current config
    pub fn get(&self) -> CensorshipConfig {
        self.read().clone()
    }

    /// Current upstream target
    pub fn target_address(&self) -> String {
        self.read().target_address.clone()
    }

    pub fn is_censoring(&self) -> bool {
        self.read().is_censoring()
    }

    /// Replace the config; invalid candidates leave the stored value untouched
    pub fn set(&self, candidate: CensorshipConfig) -> Result<(), ConfigError> {
        candidate.validate()?;
        *self.write() = candidate;
        Ok(())
    }

    /// Parse a control document, defaulting the target to the current one
    pub fn parse(&self, raw: &[u8]) -> Result<CensorshipConfig, ConfigError> {
        let fallback_target = self.target_address();
        CensorshipConfig::from_document(raw, &fallback_target)
    }

    /// Parse and install a control document, returning what was installed
    pub fn apply(&self, raw: &[u8]) -> Result<CensorshipConfig, ConfigError> {
        let config = self.parse(raw)?;
        self.set(config.clone())?;
        Ok(config)
    }

    fn read(&self) -> RwLockReadGuard<'_, CensorshipConfig> {
        self.config.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CensorshipConfig> {
        self.config.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_initial_config() {
        let store = ConfigStore::new("127.0.0.1:8545");
        let config = store.get();

        assert_eq!(config.target_address, "127.0.0.1:8545");
        assert!(config.censored_addresses.is_empty());
        assert!(!store.is_censoring());
    }

    #[test]
    fn test_set_then_get() {
        let store = ConfigStore::new("127.0.0.1:8545");
        let candidate = CensorshipConfig::new("10.0.0.2:8545")
            .with_censored_addresses(vec!["0xAbC".to_string()]);

        store.set(candidate.clone()).expect("valid config should be accepted");

        assert_eq!(store.get(), candidate);
        assert!(store.is_censoring());
    }

    #[test]
    fn test_invalid_set_leaves_previous_value() {
        let store = ConfigStore::new("127.0.0.1:8545");
        let before = store.get();

        let result = store.set(CensorshipConfig::new(""));

        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
        assert_eq!(store.get(), before);
    }

    #[test]
    fn test_parse_fills_current_target() {
        let store = ConfigStore::new("node-a:8545");
        store
            .set(CensorshipConfig::new("node-b:8545"))
            .expect("valid config should be accepted");

        let parsed = store.parse(br#"{"censoredAddresses":["0x01"]}"#).expect("Failed to parse");

        assert_eq!(parsed.target_address, "node-b:8545");
        // parse alone does not install anything
        assert!(!store.is_censoring());
    }

    #[test]
    fn test_apply_installs_document() {
        let store = ConfigStore::new("node-a:8545");

        let installed = store
            .apply(br#"{"targetAddress":"node-c:8545","censoredAddresses":["0x01","0x02"]}"#)
            .expect("Failed to apply");

        assert_eq!(store.get(), installed);
        assert_eq!(store.target_address(), "node-c:8545");
    }

    #[test]
    fn test_apply_rejects_malformed_document() {
        let store = ConfigStore::new("node-a:8545");
        store
            .apply(br#"{"censoredAddresses":["0x01"]}"#)
            .expect("Failed to apply");
        let before = store.get();

        assert!(matches!(store.apply(b"{not json"), Err(ConfigError::MalformedInput(_))));
        assert!(matches!(
            store.apply(br#"{"targetAddress":"x:1"}"#),
            Err(ConfigError::InvalidConfig(_))
        ));
        assert_eq!(store.get(), before);
    }

    #[test]
    fn test_concurrent_readers_see_whole_values() {
        let store = Arc::new(ConfigStore::new("node:0"));
        let mut handles = Vec::new();

        for writer in 0..4 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                for i in 0..200 {
                    let n = writer * 1000 + i;
                    let config = CensorshipConfig::new(format!("node:{}", n))
                        .with_censored_addresses(vec![format!("0x{:x}", n); 3]);
                    store.set(config).unwrap();
                }
            }));
        }

        for _ in 0..4 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                for _ in 0..500 {
                    let config = store.get();
                    let port = config.target_address.trim_start_matches("node:");
                    let n: u64 = port.parse().unwrap();
                    if n != 0 {
                        // Every address was written together with this target
                        let expected = format!("0x{:x}", n);
                        assert!(config.censored_addresses.iter().all(|a| *a == expected));
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
