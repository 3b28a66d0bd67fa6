//! Error types for warden
//!
//! This module defines all error types used throughout warden.
//! Uses `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.
//!
//! Propagation policy: `Install` and `Config` are fatal at bootstrap and abort
//! before any launch. `Launch` is recoverable — the supervisor swallows it into
//! the restart loop. `Probe` is informational and only degrades reported health.

use thiserror::Error;

/// The primary error type for warden operations.
#[derive(Error, Debug)]
pub enum WardenError {
    /// Provisioning failures (package cannot be resolved, fetched or installed).
    /// Fatal at bootstrap — the supervisor must not start on a half-provisioned host.
    #[error("Install error: {0}")]
    Install(String),

    /// Configuration errors (unresolved placeholder, invalid config file, etc.)
    /// Fatal before first launch — a service never runs with an incomplete environment.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Process launch failures (missing executable, spawn failure, etc.)
    /// Treated identically to a runtime crash by the restart loop.
    #[error("Launch error: {0}")]
    Launch(String),

    /// Liveness probe failures (timeout, refused connection, non-success status).
    /// Never fatal — only affects the reported health status.
    #[error("Probe error: {0}")]
    Probe(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// A specialized `Result` type for warden operations.
pub type Result<T> = std::result::Result<T, WardenError>;
