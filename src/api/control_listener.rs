use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpListener;

use crate::error::{ProxyError, RelayError};
use crate::logging::{ErrorLogger, LogContext, RelayMetrics, CONFIG_COMPONENT};
use crate::models::CensorshipConfig;
use crate::store::ConfigStore;

/// Accepts control connections and installs the document each one carries.
///
/// One connection carries one document, read with a single bounded read.
/// Nothing is written back; the outcome only shows up in the logs.
pub struct ControlListener {
    listener: TcpListener,
    store: Arc<ConfigStore>,
    buffer_size: usize,
}

impl ControlListener {
    pub async fn bind(addr: &str, store: Arc<ConfigStore>, buffer_size: usize) -> Result<Self, ProxyError> {
        let listener = TcpListener::bind(addr).await.map_err(|source| ProxyError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        Ok(Self::from_listener(listener, store, buffer_size))
    }

    pub fn from_listener(listener: TcpListener, store: Arc<ConfigStore>, buffer_size: usize) -> Self {
        Self {
            listener,
            store,
            buffer_size,
        }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept loop; accept errors are logged and do not stop the listener
    pub async fn run(self) {
        if let Ok(addr) = self.local_addr() {
            RelayMetrics::log_listener_started(CONFIG_COMPONENT, &addr.to_string());
        }

        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("Error accepting control connection: {}", e);
                    continue;
                }
            };

            let store = Arc::clone(&self.store);
            let buffer_size = self.buffer_size;

            tokio::spawn(async move {
                if let Err(e) = Self::handle_connection(stream, &store, buffer_size).await {
                    let context = LogContext::new(CONFIG_COMPONENT, "update").with_peer(&peer.to_string());
                    ErrorLogger::log_error(&e, Some(context));
                }
            });
        }
    }

    /// Read one document from `stream` and install it.
    ///
    /// Returns the installed config, or `None` when the peer sent nothing.
    pub async fn handle_connection<S>(
        mut stream: S,
        store: &ConfigStore,
        buffer_size: usize,
    ) -> Result<Option<CensorshipConfig>, ProxyError>
    where
        S: AsyncRead + Unpin,
    {
        let mut buffer = vec![0u8; buffer_size];
        let read = stream.read(&mut buffer).await.map_err(RelayError::from)?;

        if read == 0 {
            debug!("Control connection closed without data");
            return Ok(None);
        }

        let config = store.apply(&buffer[..read])?;
        RelayMetrics::log_config_updated(&config);
        Ok(Some(config))
    }
}
