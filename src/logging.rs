use log::{debug, error, info, warn, LevelFilter};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::env;
use std::fs::OpenOptions;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::LoggingConfig;
use crate::error::{ErrorSeverity, ProxyError, RelayError};
use crate::models::CensorshipConfig;
use crate::relay::SessionSummary;

/// Component name for the data plane
pub const CLIENT_COMPONENT: &str = "client";
/// Component name for the control plane
pub const CONFIG_COMPONENT: &str = "config";

/// Structured logging context for the proxy
pub struct LogContext {
    pub component: String,
    pub operation: String,
    pub metadata: HashMap<String, Value>,
}

impl LogContext {
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            component: component.to_string(),
            operation: operation.to_string(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn with_session(self, session_id: u64) -> Self {
        self.with_metadata("session", json!(session_id))
    }

    pub fn with_peer(self, peer: &str) -> Self {
        self.with_metadata("peer", json!(peer))
    }

    pub fn with_address(self, address: &str) -> Self {
        self.with_metadata("address", json!(address))
    }

    pub fn with_method(self, method: &str) -> Self {
        self.with_metadata("method", json!(method))
    }

    pub fn with_transaction_hash(self, tx_hash: &str) -> Self {
        self.with_metadata("transaction_hash", json!(tx_hash))
    }

    pub fn with_duration_ms(self, duration_ms: u64) -> Self {
        self.with_metadata("duration_ms", json!(duration_ms))
    }

    fn format_message(&self, level: &str, message: &str) -> String {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let mut log_entry = json!({
            "timestamp": timestamp,
            "level": level,
            "component": self.component,
            "operation": self.operation,
            "message": message,
        });

        for (key, value) in &self.metadata {
            log_entry[key] = value.clone();
        }

        log_entry.to_string()
    }

    pub fn info(&self, message: &str) {
        info!("{}", self.format_message("INFO", message));
    }

    pub fn warn(&self, message: &str) {
        warn!("{}", self.format_message("WARN", message));
    }

    pub fn error(&self, message: &str) {
        error!("{}", self.format_message("ERROR", message));
    }

    pub fn debug(&self, message: &str) {
        debug!("{}", self.format_message("DEBUG", message));
    }

    fn at_severity(&self, severity: ErrorSeverity, message: &str) {
        match severity {
            ErrorSeverity::Critical | ErrorSeverity::High => self.error(message),
            ErrorSeverity::Medium => self.warn(message),
            ErrorSeverity::Low => self.info(message),
        }
    }
}

/// Error logging utilities
pub struct ErrorLogger;

impl ErrorLogger {
    pub fn log_error(error: &ProxyError, context: Option<LogContext>) {
        let severity = error.severity();

        let log_context = context
            .unwrap_or_else(|| LogContext::new("error", "unknown"))
            .with_metadata("error_type", json!(format!("{:?}", error)))
            .with_metadata("severity", json!(format!("{:?}", severity)))
            .with_metadata("session_fatal", json!(error.is_session_fatal()));

        log_context.at_severity(severity, &format!("Error occurred: {}", error));
    }

    /// Log the error that ended a session; peer hang-ups only reach debug
    pub fn log_relay_error(error: &RelayError, context: Option<LogContext>) {
        let severity = error.severity();

        let log_context = context
            .unwrap_or_else(|| LogContext::new(CLIENT_COMPONENT, "relay"))
            .with_metadata("error_type", json!(format!("{:?}", error)))
            .with_metadata("severity", json!(format!("{:?}", severity)));

        if error.is_disconnect() {
            log_context.debug(&format!("Peer disconnected: {}", error));
        } else {
            log_context.at_severity(severity, &format!("Session terminated: {}", error));
        }
    }
}

/// Relay and control-plane events
pub struct RelayMetrics;

impl RelayMetrics {
    pub fn log_listener_started(component: &str, addr: &str) {
        let context = LogContext::new(component, "listen").with_address(addr);
        context.info(&format!("Listening on {}", addr));
    }

    pub fn log_session_opened(session_id: u64, peer: &str) {
        let context = LogContext::new(CLIENT_COMPONENT, "session_opened")
            .with_session(session_id)
            .with_peer(peer);

        context.info(&format!("Session {} opened for client {}", session_id, peer));
    }

    pub fn log_session_closed(summary: &SessionSummary) {
        let context = LogContext::new(CLIENT_COMPONENT, "session_closed")
            .with_session(summary.id)
            .with_peer(&summary.peer)
            .with_duration_ms(summary.duration_ms)
            .with_metadata("forwarded", json!(summary.forwarded))
            .with_metadata("censored", json!(summary.censored))
            .with_metadata("ended_by", json!(summary.ended_by.to_string()))
            .with_metadata("clean", json!(summary.error.is_none()));

        context.info(&format!(
            "Connection of client {} closed ({} closed first, {} forwarded, {} censored)",
            summary.peer, summary.ended_by, summary.forwarded, summary.censored
        ));
    }

    pub fn log_request_forwarded(session_id: u64, method: &str, path: &str, bytes: usize) {
        let context = LogContext::new(CLIENT_COMPONENT, "request_forwarded")
            .with_session(session_id)
            .with_method(method)
            .with_metadata("path", json!(path))
            .with_metadata("bytes", json!(bytes));

        context.debug(&format!("Forwarded {} {} ({} bytes)", method, path, bytes));
    }

    pub fn log_request_censored(session_id: u64, sender: &str, matched: &str, tx_hash: &str) {
        let context = LogContext::new(CLIENT_COMPONENT, "request_censored")
            .with_session(session_id)
            .with_address(sender)
            .with_transaction_hash(tx_hash)
            .with_metadata("matched", json!(matched));

        context.warn(&format!("Censored transaction from {}", sender));
    }

    pub fn log_config_updated(config: &CensorshipConfig) {
        let context = LogContext::new(CONFIG_COMPONENT, "update")
            .with_address(&config.target_address)
            .with_metadata("censored_count", json!(config.censored_addresses.len()));

        context.info(&format!("Configuration successfully updated\n{}", config));
    }
}

/// Initialize structured logging for the application.
///
/// `LOGS=no` discards everything; otherwise `RUST_LOG` refines the configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = env_logger::Builder::new();

    if logs_disabled() {
        builder.filter_level(LevelFilter::Off);
    } else {
        builder.parse_filters(&config.level);
        if let Ok(filters) = env::var("RUST_LOG") {
            builder.parse_filters(&filters);
        }
    }

    builder.format(|buf, record| {
        use std::io::Write;

        let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let message = record.args().to_string();

        // Structured logs are already JSON; keep them on one line
        if serde_json::from_str::<Value>(&message).is_ok() {
            writeln!(buf, "{} {}", timestamp, message)
        } else {
            writeln!(buf, "{} [{}] {}: {}", timestamp, record.level(), record.target(), message)
        }
    });

    if let Some(path) = &config.file_path {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.try_init()?;

    info!("Structured logging initialized");
    Ok(())
}

/// Whether the LOGS environment variable switches logging off
pub fn logs_disabled() -> bool {
    env::var("LOGS")
        .map(|value| value.trim().eq_ignore_ascii_case("no"))
        .unwrap_or(false)
}
