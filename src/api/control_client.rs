use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::error::RelayError;

/// Document sent over the control plane.
/// A missing target keeps the proxy's current one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_address: Option<String>,
    pub censored_addresses: Vec<String>,
}

impl ControlUpdate {
    pub fn censor(addresses: Vec<String>) -> Self {
        Self {
            target_address: None,
            censored_addresses: addresses,
        }
    }

    /// Empty deny-list
    pub fn clear() -> Self {
        Self::default()
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_address = Some(target.into());
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        // Serializing a struct of strings cannot fail
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Send the update in a single write and close the connection
    pub async fn send(&self, control_addr: &str) -> Result<(), RelayError> {
        let mut stream = TcpStream::connect(control_addr)
            .await
            .map_err(|source| RelayError::Connect {
                addr: control_addr.to_string(),
                source,
            })?;

        stream.write_all(&self.to_bytes()).await?;
        stream.shutdown().await?;
        Ok(())
    }
}
