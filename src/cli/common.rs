//! Shared CLI helpers used across multiple command handlers.

use std::path::{Path, PathBuf};

use warden::config::Config;
use warden::error::Result;

/// Load config from an explicit path or the default location.
pub(crate) fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => Config::load_from_path(p),
        None => Config::load(),
    }
}

/// The effective config file path for display and raw-JSON reads.
pub(crate) fn config_path(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf).unwrap_or_else(Config::path)
}

/// Read the raw config JSON for unknown-field validation.
///
/// Returns `None` when the file is missing; invalid JSON surfaces as an
/// error so callers can report it.
pub(crate) fn read_raw(path: &Path) -> Result<Option<serde_json::Value>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}
