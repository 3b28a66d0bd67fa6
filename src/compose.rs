//! Environment composition — assemble the frozen launch environment.
//!
//! The composer turns the configured environment mapping (literal values and
//! placeholders resolved from the process environment / `.env` secret source)
//! into an immutable [`EnvSnapshot`]. Composition has no side effects; the
//! snapshot is handed to the supervisor and never mutated for the lifetime of
//! a process generation.
//!
//! Every placeholder must resolve to a non-empty value, otherwise composition
//! fails with a configuration error naming the unresolved key — the service
//! must never launch with an incomplete environment.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ServiceConfig;
use crate::error::{Result, WardenError};
use crate::utils::expand_tilde;

/// A configured environment value: either a literal string or a placeholder
/// resolved from the surrounding environment at compose time.
///
/// In JSON, a plain string is a literal; an object selects the source:
///
/// ```json
/// {
///   "STREAMLIT_SERVER_PORT": "8501",
///   "APP_PASSWORD": { "from_env": "APP_PASSWORD" }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum EnvValue {
    /// Placeholder resolved from the named environment variable.
    FromEnv { from_env: String },
    /// Explicit value used as-is.
    Literal(String),
}

/// Frozen key→value environment mapping plus working directory.
///
/// `BTreeMap` keeps iteration deterministic, so two compositions of the same
/// inputs hand the OS an identical environment.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvSnapshot {
    pub vars: BTreeMap<String, String>,
    pub workdir: PathBuf,
}

/// Compose the frozen environment snapshot for a service.
///
/// Fails with [`WardenError::Config`] naming the first unresolved key.
pub fn compose(service: &ServiceConfig) -> Result<EnvSnapshot> {
    let mut vars = BTreeMap::new();

    for (key, value) in &service.env {
        let resolved = match value {
            EnvValue::Literal(v) => v.clone(),
            EnvValue::FromEnv { from_env } => match std::env::var(from_env) {
                Ok(v) if !v.is_empty() => v,
                _ => {
                    return Err(WardenError::Config(format!(
                        "unresolved environment placeholder '{}' (from ${})",
                        key, from_env
                    )))
                }
            },
        };
        vars.insert(key.clone(), resolved);
    }

    let workdir = expand_tilde(&service.workdir);
    debug!(keys = vars.len(), workdir = %workdir.display(), "environment composed");

    Ok(EnvSnapshot { vars, workdir })
}
