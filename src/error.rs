use thiserror::Error;

/// Main error type for the censorship proxy
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration errors, both for runtime censorship documents and process settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Malformed config document: {0}")]
    MalformedInput(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parsing failed: {0}")]
    Parsing(String),
}

/// Errors raised while turning a raw transaction payload into a sender address
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Bad hex in signed transaction: {0}")]
    BadHex(String),

    #[error("Bad transaction encoding: {0}")]
    BadEncoding(String),

    #[error("Unable to recover sender: {0}")]
    UnrecoverableSender(String),
}

/// Errors that end a relay session
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Error connecting to target {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Request exceeds {limit} bytes")]
    RequestTooLarge { limit: usize },

    #[error("Signed transaction rejected: {0}")]
    Decode(#[from] DecodeError),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ProxyError>;

/// Error severity levels for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The process cannot keep running
    Critical,
    /// A session or update was lost
    High,
    /// Expected failure on untrusted input
    Medium,
    /// Routine peer behaviour
    Low,
}

impl ProxyError {
    /// Get the severity level of an error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ProxyError::Bind { .. } => ErrorSeverity::Critical,
            ProxyError::Config(e) => e.severity(),
            ProxyError::Decode(_) => ErrorSeverity::Medium,
            ProxyError::Relay(e) => e.severity(),
        }
    }

    /// Whether the error tears down the session it happened in
    pub fn is_session_fatal(&self) -> bool {
        match self {
            ProxyError::Relay(_) => true,
            ProxyError::Decode(_) => true,

            // Config documents are rejected without touching any session
            ProxyError::Config(_) => false,
            ProxyError::Bind { .. } => false,
        }
    }
}

impl ConfigError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // Process settings are read once at startup
            ConfigError::FileNotFound(_) | ConfigError::Parsing(_) | ConfigError::InvalidValue { .. } => {
                ErrorSeverity::High
            }
            ConfigError::InvalidConfig(_) | ConfigError::MalformedInput(_) => ErrorSeverity::Medium,
        }
    }
}

impl RelayError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RelayError::Connect { .. } => ErrorSeverity::High,
            RelayError::Decode(_) | RelayError::MalformedRequest(_) | RelayError::RequestTooLarge { .. } => {
                ErrorSeverity::Medium
            }
            RelayError::Io(_) => ErrorSeverity::Low,
        }
    }

    /// Peer hang-ups that are not worth more than a debug line
    pub fn is_disconnect(&self) -> bool {
        match self {
            RelayError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}
