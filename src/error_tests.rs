#[cfg(test)]
mod tests {
    use crate::blockchain::{InspectTransaction, TransactionInspector};
    use crate::error::{ConfigError, DecodeError, ErrorSeverity, ProxyError, RelayError};
    use crate::logging::{ErrorLogger, LogContext};
    use crate::relay::{FramingLimits, RequestReader};
    use crate::store::ConfigStore;

    #[test]
    fn test_store_errors_are_recoverable() {
        let store = ConfigStore::new("node:8545");

        let error: ProxyError = store.apply(b"not json").unwrap_err().into();

        assert!(matches!(error, ProxyError::Config(ConfigError::MalformedInput(_))));
        assert_eq!(error.severity(), ErrorSeverity::Medium);
        assert!(!error.is_session_fatal());
    }

    #[test]
    fn test_inspection_errors_end_the_session() {
        let decode = TransactionInspector::new().inspect("0x1").unwrap_err();
        assert!(matches!(decode, DecodeError::BadHex(_)));

        let relay: RelayError = decode.clone().into();
        let error = ProxyError::from(relay);

        assert!(error.is_session_fatal());
        assert_eq!(error.severity(), ErrorSeverity::Medium);
        assert_eq!(ProxyError::from(decode).severity(), ErrorSeverity::Medium);
    }

    #[tokio::test]
    async fn test_framing_errors_map_to_relay_errors() {
        let limits = FramingLimits {
            max_header_bytes: 256,
            max_body_bytes: 4,
        };
        let input: &[u8] = b"POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";

        let error = RequestReader::new(input, limits).next_request().await.unwrap_err();
        assert!(matches!(error, RelayError::RequestTooLarge { limit: 4 }));
        assert!(!error.is_disconnect());

        let error = ProxyError::from(error);
        assert!(error.is_session_fatal());
        assert_eq!(format!("{}", error), "Relay error: Request exceeds 4 bytes");
    }

    #[test]
    fn test_config_error_types() {
        let invalid = ConfigError::InvalidConfig("targetAddress must not be empty".to_string());
        assert_eq!(format!("{}", invalid), "Invalid config: targetAddress must not be empty");

        let value = ConfigError::InvalidValue {
            key: "control.buffer_size".to_string(),
            value: "12".to_string(),
        };
        assert_eq!(format!("{}", value), "Invalid configuration value for control.buffer_size: 12");
        assert_eq!(value.severity(), ErrorSeverity::High);

        let missing = ConfigError::FileNotFound("/etc/proxy.toml".to_string());
        assert_eq!(format!("{}", missing), "Configuration file not found: /etc/proxy.toml");
    }

    #[test]
    fn test_connect_error_display_keeps_source() {
        let error = RelayError::Connect {
            addr: "127.0.0.1:1".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
        };

        assert_eq!(
            format!("{}", error),
            "Error connecting to target 127.0.0.1:1: connection refused"
        );
        assert!(std::error::Error::source(&error).is_some());
        assert_eq!(error.severity(), ErrorSeverity::High);
    }

    #[test]
    fn test_error_logging_for_every_severity() {
        let errors = vec![
            ProxyError::Bind {
                addr: "127.0.0.1:80".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            },
            ProxyError::Config(ConfigError::Parsing("expected `]`".to_string())),
            ProxyError::Decode(DecodeError::UnrecoverableSender("invalid signature".to_string())),
            ProxyError::Relay(RelayError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "broken pipe",
            ))),
        ];

        for error in &errors {
            let context = LogContext::new("test", "error_test");
            ErrorLogger::log_error(error, Some(context));
        }
    }
}
