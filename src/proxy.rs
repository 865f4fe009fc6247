use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use log::{error, info};

use crate::api::{ClientListener, ControlListener};
use crate::blockchain::TransactionInspector;
use crate::config::AppConfig;
use crate::error::ProxyError;
use crate::models::CensorshipConfig;
use crate::relay::{CensorshipPolicy, RelayEngine};
use crate::store::ConfigStore;

/// Addresses the proxy is started with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySettings {
    pub control_addr: String,
    pub listen_addr: String,
    pub target_addr: String,
    /// Deny-list in effect before the first control update
    pub initial_censored: Vec<String>,
}

/// Both planes bound and sharing one config store
pub struct Proxy {
    control: ControlListener,
    client: ClientListener,
    store: Arc<ConfigStore>,
}

impl Proxy {
    /// Build the shared state and bind both listeners. Bind failures are fatal.
    pub async fn bind(settings: &ProxySettings, app: &AppConfig) -> Result<Self, ProxyError> {
        let initial = CensorshipConfig::new(settings.target_addr.clone())
            .with_censored_addresses(settings.initial_censored.clone());
        initial.validate()?;
        let store = Arc::new(ConfigStore::with_config(initial));

        let policy = CensorshipPolicy::new(Arc::clone(&store), Arc::new(TransactionInspector::new()));
        let engine = Arc::new(RelayEngine::new(policy, app.relay.limits()));

        let control =
            ControlListener::bind(&settings.control_addr, Arc::clone(&store), app.control.buffer_size).await?;
        let client = ClientListener::bind(&settings.listen_addr, engine).await?;

        Ok(Self {
            control,
            client,
            store,
        })
    }

    pub fn store(&self) -> Arc<ConfigStore> {
        Arc::clone(&self.store)
    }

    pub fn control_addr(&self) -> std::io::Result<SocketAddr> {
        self.control.local_addr()
    }

    pub fn client_addr(&self) -> std::io::Result<SocketAddr> {
        self.client.local_addr()
    }

    /// Serve until Ctrl-C
    pub async fn run(self) {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Unable to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Serve until `shutdown` completes. Open sessions are not waited for.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!("Censorship proxy running\n{}", self.store.get());

        tokio::select! {
            _ = self.control.run() => {}
            _ = self.client.run() => {}
            _ = shutdown => {
                info!("Shutdown signal received, stopping listeners");
            }
        }
    }
}
