use std::net::SocketAddr;
use std::sync::Arc;

use log::warn;
use tokio::net::{TcpListener, TcpStream};

use crate::error::ProxyError;
use crate::logging::{ErrorLogger, LogContext, RelayMetrics, CLIENT_COMPONENT};
use crate::relay::{ConnectionSession, RelayEngine, SessionSummary};

/// Accepts client connections and relays each one to the current target
pub struct ClientListener {
    listener: TcpListener,
    engine: Arc<RelayEngine>,
}

impl ClientListener {
    pub async fn bind(addr: &str, engine: Arc<RelayEngine>) -> Result<Self, ProxyError> {
        let listener = TcpListener::bind(addr).await.map_err(|source| ProxyError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        Ok(Self::from_listener(listener, engine))
    }

    pub fn from_listener(listener: TcpListener, engine: Arc<RelayEngine>) -> Self {
        Self { listener, engine }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept loop, one task per client
    pub async fn run(self) {
        if let Ok(addr) = self.local_addr() {
            RelayMetrics::log_listener_started(CLIENT_COMPONENT, &addr.to_string());
        }

        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("Error accepting client connection: {}", e);
                    continue;
                }
            };

            let engine = Arc::clone(&self.engine);
            tokio::spawn(async move {
                Self::serve(&engine, stream, peer).await;
            });
        }
    }

    /// Dial the target configured right now and relay until either side closes.
    /// Returns `None` when the target could not be reached.
    pub async fn serve(engine: &RelayEngine, stream: TcpStream, peer: SocketAddr) -> Option<SessionSummary> {
        let target_addr = engine.policy().store().target_address();

        match ConnectionSession::connect(stream, peer.to_string(), &target_addr).await {
            Ok(session) => Some(engine.run(session).await),
            Err(e) => {
                let context = LogContext::new(CLIENT_COMPONENT, "connect")
                    .with_peer(&peer.to_string())
                    .with_address(&target_addr);
                ErrorLogger::log_relay_error(&e, Some(context));
                None
            }
        }
    }
}
