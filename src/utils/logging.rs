//! Logging initialization for warden.
//!
//! Supports two formats:
//! - `pretty`: compact human-readable text (default)
//! - `json`: structured JSON lines for log aggregators (e.g. Loki, CloudWatch)
//!
//! Bootstrap failures (provisioning, composition) are surfaced through these
//! logs plus a non-zero exit — there is no running service to report health
//! at that point.

use crate::config::{LogFormat, LoggingConfig};

/// Initialize the global tracing subscriber from config.
///
/// Call this once at startup before any tracing events are emitted.
/// Falls back to `RUST_LOG` env var; if unset, uses `cfg.level`.
pub fn init_logging(cfg: &LoggingConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level));

    match cfg.format {
        LogFormat::Json => {
            if let Some(path) = &cfg.file {
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .expect("failed to open log file");
                tracing_subscriber::fmt()
                    .json()
                    .with_env_filter(filter)
                    .with_writer(move || file.try_clone().expect("file writer"))
                    .init();
            } else {
                tracing_subscriber::fmt()
                    .json()
                    .with_env_filter(filter)
                    .init();
            }
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .compact()
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{LogFormat, LoggingConfig};

    #[test]
    fn test_default_logging_config() {
        let cfg = LoggingConfig::default();
        assert_eq!(cfg.format, LogFormat::Pretty);
        assert_eq!(cfg.level, "info");
        assert!(cfg.file.is_none());
    }

    #[test]
    fn test_log_format_deserialize_json() {
        let cfg: LoggingConfig =
            serde_json::from_str(r#"{"format":"json","level":"debug"}"#).unwrap();
        assert_eq!(cfg.format, LogFormat::Json);
        assert_eq!(cfg.level, "debug");
    }

    #[test]
    fn test_logging_config_roundtrip() {
        let cfg = LoggingConfig {
            format: LogFormat::Json,
            file: Some("/var/log/warden.log".to_string()),
            level: "debug".to_string(),
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let restored: LoggingConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.format, LogFormat::Json);
        assert_eq!(restored.file.as_deref(), Some("/var/log/warden.log"));
        assert_eq!(restored.level, "debug");
    }

    #[test]
    fn test_log_format_partial_config_uses_defaults() {
        let cfg: LoggingConfig = serde_json::from_str(r#"{"level":"trace"}"#).unwrap();
        assert_eq!(cfg.format, LogFormat::Pretty);
        assert!(cfg.file.is_none());
        assert_eq!(cfg.level, "trace");
    }
}
