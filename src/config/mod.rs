//! Configuration management for warden
//!
//! Configuration is loaded from `~/.warden/config.json` (or an explicit
//! `--config` path) with environment variable overrides following the pattern
//! `WARDEN_SECTION_KEY`.

mod types;
pub mod validate;

pub use types::*;

use std::path::{Path, PathBuf};

use crate::error::Result;

impl Config {
    /// Returns the warden configuration directory path (~/.warden)
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".warden")
    }

    /// Returns the path to the config file (~/.warden/config.json)
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load configuration from the default path with environment overrides.
    ///
    /// If the config file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::path())
    }

    /// Load configuration from a specific path with environment overrides.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Save configuration to a specific path, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables follow the pattern: WARDEN_SECTION_KEY
    fn apply_env_overrides(&mut self) {
        // Service
        if let Ok(val) = std::env::var("WARDEN_SERVICE_COMMAND") {
            self.service.command = val;
        }
        if let Ok(val) = std::env::var("WARDEN_SERVICE_WORKDIR") {
            self.service.workdir = val;
        }
        if let Ok(val) = std::env::var("WARDEN_SERVICE_HOST") {
            self.service.host = val;
        }
        if let Ok(val) = std::env::var("WARDEN_SERVICE_PORT") {
            if let Ok(v) = val.parse() {
                self.service.port = v;
            }
        }
        if let Ok(val) = std::env::var("WARDEN_SERVICE_LIVENESS_PATH") {
            self.service.liveness_path = val;
        }

        // Restart policy
        if let Ok(val) = std::env::var("WARDEN_RESTART_ENABLED") {
            if let Ok(v) = val.parse() {
                self.restart.enabled = v;
            }
        }
        if let Ok(val) = std::env::var("WARDEN_RESTART_DELAY_SECS") {
            if let Ok(v) = val.parse() {
                self.restart.delay_secs = v;
            }
        }

        // Probing
        if let Ok(val) = std::env::var("WARDEN_PROBE_INTERVAL_SECS") {
            if let Ok(v) = val.parse() {
                self.probe.interval_secs = v;
            }
        }
        if let Ok(val) = std::env::var("WARDEN_PROBE_FAILURE_THRESHOLD") {
            if let Ok(v) = val.parse() {
                self.probe.failure_threshold = v;
            }
        }

        // Status endpoint
        if let Ok(val) = std::env::var("WARDEN_STATUS_HOST") {
            self.status.host = val;
        }
        if let Ok(val) = std::env::var("WARDEN_STATUS_PORT") {
            if let Ok(v) = val.parse() {
                self.status.port = v;
            }
        }

        // Logging
        if let Ok(val) = std::env::var("WARDEN_LOGGING_LEVEL") {
            self.logging.level = val;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let cfg = Config::load_from_path(Path::new("/tmp/nonexistent_warden_config.json")).unwrap();
        // Fields no other test overrides via env, to stay parallel-safe.
        assert_eq!(cfg.service.command, "streamlit");
        assert_eq!(cfg.service.liveness_path, "/_stcore/health");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut cfg = Config::default();
        cfg.service.command = "/usr/local/bin/app".to_string();
        cfg.status.port = 9900;
        cfg.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.service.command, "/usr/local/bin/app");
        assert_eq!(loaded.status.port, 9900);
    }

    #[test]
    fn test_env_override_service_port() {
        std::env::set_var("WARDEN_SERVICE_PORT", "9000");
        let cfg = Config::load_from_path(Path::new("/tmp/nonexistent_warden_config.json")).unwrap();
        assert_eq!(cfg.service.port, 9000);
        std::env::remove_var("WARDEN_SERVICE_PORT");
    }

    #[test]
    fn test_env_override_restart_enabled() {
        std::env::set_var("WARDEN_RESTART_ENABLED", "false");
        let cfg = Config::load_from_path(Path::new("/tmp/nonexistent_warden_config.json")).unwrap();
        assert!(!cfg.restart.enabled);
        std::env::remove_var("WARDEN_RESTART_ENABLED");
    }

    #[test]
    fn test_env_override_ignores_unparseable() {
        std::env::set_var("WARDEN_PROBE_INTERVAL_SECS", "not-a-number");
        let cfg = Config::load_from_path(Path::new("/tmp/nonexistent_warden_config.json")).unwrap();
        assert_eq!(cfg.probe.interval_secs, 10);
        std::env::remove_var("WARDEN_PROBE_INTERVAL_SECS");
    }

    #[test]
    fn test_config_dir_under_home() {
        assert!(Config::path().to_string_lossy().contains(".warden"));
    }
}
