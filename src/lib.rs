pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod error_tests;
pub mod logging;
pub mod models;
pub mod proxy;
pub mod relay;
pub mod store;

pub use api::{ClientListener, ControlListener};
pub use blockchain::{InspectTransaction, TransactionInspector};
pub use config::{AppConfig, ControlConfig, LoggingConfig, RelayConfig};
pub use error::{ConfigError, DecodeError, ErrorSeverity, ProxyError, RelayError, Result};
pub use logging::{init_logging, ErrorLogger, LogContext, RelayMetrics};
pub use models::{AddressMatcher, CensorshipConfig, DecodedTransaction, RpcMethod, RpcRequest};
pub use proxy::{Proxy, ProxySettings};
pub use relay::{CensorshipPolicy, ConnectionSession, Direction, FramingLimits, RelayEngine, SessionSummary, Verdict};
pub use store::ConfigStore;
