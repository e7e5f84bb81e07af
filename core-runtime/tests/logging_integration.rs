//! Integration tests for logging system

use async_trait::async_trait;
use bridge_traits::error::Result as SinkResult;
use bridge_traits::log::{LogEntry, LogLevel, LoggerSink};
use core_runtime::logging::{init_logging, redact_if_sensitive, LogFormat, LoggingConfig};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct CollectingSink {
    entries: Mutex<Vec<LogEntry>>,
}

#[async_trait]
impl LoggerSink for CollectingSink {
    async fn log(&self, entry: LogEntry) -> SinkResult<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Debug
    }
}

// Global subscriber can only be installed once per process, so everything that
// depends on it lives in this single test.
#[test]
fn test_global_logging_forwards_to_sink_once() {
    let sink = Arc::new(CollectingSink::default());
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_logger_sink(sink.clone());

    init_logging(config.clone()).unwrap();

    tracing::info!(target: "core_auth::store", auth_token = "secret-value", "token stored");
    tracing::debug!(target: "sqlx::query", "filtered out");

    {
        let entries = sink.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "token stored");
        assert_eq!(
            entries[0].fields.get("auth_token"),
            Some(&"[REDACTED]".to_string())
        );
    }

    // A second initialisation is rejected
    assert!(init_logging(config).is_err());
}

#[test]
fn test_pii_redaction_credentials() {
    assert_eq!(redact_if_sensitive("token", "abc"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("current_password", "old"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("new_password", "new"), "[REDACTED]");
}

#[test]
fn test_pii_redaction_emails() {
    let redacted = redact_if_sensitive("email", "admin@example.com");

    assert!(redacted.starts_with('a'));
    assert!(redacted.contains("[REDACTED]"));
    assert!(!redacted.contains("example.com"));
}

#[test]
fn test_pii_redaction_normal_values() {
    assert_eq!(redact_if_sensitive("user_id", "42"), "42");
    assert_eq!(redact_if_sensitive("role", "admin"), "admin");
    assert_eq!(redact_if_sensitive("path", "/admin/bookings"), "/admin/bookings");
}

#[test]
fn test_format_selection() {
    #[cfg(debug_assertions)]
    assert_eq!(LoggingConfig::default().format, LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(LoggingConfig::default().format, LogFormat::Json);
}

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn)
        .with_pii_redaction(false)
        .with_spans(false)
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level, LogLevel::Warn);
    assert!(!config.redact_pii);
    assert!(!config.enable_spans);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
}
