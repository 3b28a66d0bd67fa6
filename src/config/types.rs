//! Configuration type definitions for warden
//!
//! All types implement serde traits for JSON serialization and have sensible
//! defaults. The defaults describe the deployment warden grew out of: a
//! Streamlit web app on port 8501 with its liveness endpoint at
//! `/_stcore/health`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::compose::EnvValue;
use crate::installer::PackageSpec;

/// Main configuration struct for warden
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// The supervised service: how to launch it and where it listens.
    pub service: ServiceConfig,
    /// Declared dependency set installed at bootstrap.
    pub packages: Vec<PackageSpec>,
    /// Restart behavior on service exit.
    pub restart: RestartConfig,
    /// Liveness probing.
    pub probe: ProbeConfig,
    /// Orchestrator-facing status endpoint.
    pub status: StatusConfig,
    /// Logging output configuration.
    pub logging: LoggingConfig,
}

// ============================================================================
// Service Configuration
// ============================================================================

/// How to launch the supervised service and where it listens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Executable to launch.
    pub command: String,
    /// Argument list.
    pub args: Vec<String>,
    /// Working directory (supports `~/` prefix).
    pub workdir: String,
    /// Environment mapping; values are literals or `{"from_env": "VAR"}` placeholders.
    pub env: BTreeMap<String, EnvValue>,
    /// Address the service listens on (probe target).
    pub host: String,
    /// Port the service listens on.
    pub port: u16,
    /// Well-known liveness path the service must serve.
    pub liveness_path: String,
    /// Seconds to wait after SIGTERM before force-killing on stop.
    pub stop_grace_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            command: "streamlit".to_string(),
            args: vec![
                "run".to_string(),
                "app.py".to_string(),
                "--server.address".to_string(),
                "0.0.0.0".to_string(),
                "--server.port".to_string(),
                "8501".to_string(),
                "--server.headless".to_string(),
                "true".to_string(),
            ],
            workdir: ".".to_string(),
            env: BTreeMap::new(),
            host: "127.0.0.1".to_string(),
            port: 8501,
            liveness_path: "/_stcore/health".to_string(),
            stop_grace_secs: 10,
        }
    }
}

// ============================================================================
// Restart Configuration
// ============================================================================

/// Restart behavior on service exit.
///
/// The default is the always-restart, fixed-short-delay policy: every exit,
/// clean or crashed, is retried after `delay_secs`, with no retry cap.
/// `backoff` optionally grows the delay on repeated failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RestartConfig {
    /// Whether exits are retried at all.
    pub enabled: bool,
    /// Fixed delay before relaunching, in seconds.
    pub delay_secs: u64,
    /// Optional capped exponential back-off on consecutive failures.
    pub backoff: Option<BackoffConfig>,
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_secs: 3,
            backoff: None,
        }
    }
}

/// Capped exponential back-off.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Multiplier applied per consecutive failed attempt.
    pub factor: f64,
    /// Upper bound on the delay, in seconds.
    pub max_delay_secs: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            factor: 2.0,
            max_delay_secs: 60,
        }
    }
}

// ============================================================================
// Probe Configuration
// ============================================================================

/// Liveness probing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Seconds between probes. Probes are serial — a new probe starts only
    /// after the previous completed or timed out.
    pub interval_secs: u64,
    /// Per-probe timeout in seconds.
    pub timeout_secs: u64,
    /// Consecutive failures before the status flips to unhealthy.
    pub failure_threshold: u32,
    /// Seconds without a successful probe before the status reads unknown.
    pub staleness_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            timeout_secs: 5,
            failure_threshold: 3,
            staleness_secs: 60,
        }
    }
}

// ============================================================================
// Status Endpoint Configuration
// ============================================================================

/// Where the orchestrator-facing status endpoint listens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    pub host: String,
    pub port: u16,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9606,
        }
    }
}

// ============================================================================
// Logging Configuration
// ============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Output format: "pretty" or "json".
    pub format: LogFormat,
    /// Default log level filter (overridden by RUST_LOG).
    pub level: String,
    /// Optional log file path (stderr/stdout if unset).
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            level: "info".to_string(),
            file: None,
        }
    }
}
