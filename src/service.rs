//! The immutable service descriptor — the exact launch contract.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::compose::EnvSnapshot;
use crate::config::ServiceConfig;

/// Immutable description of how to launch the supervised process.
///
/// Built once at bootstrap from static configuration plus the composed
/// environment snapshot. The supervisor owns it for the lifetime of the
/// host/container; nothing mutates it after the supervisor starts.
#[derive(Debug, Clone)]
pub struct ServiceSpec {
    pub command: String,
    pub args: Vec<String>,
    pub workdir: PathBuf,
    pub env: BTreeMap<String, String>,
    pub host: String,
    pub port: u16,
    pub liveness_path: String,
    pub stop_grace: Duration,
}

impl ServiceSpec {
    /// Build the spec from config plus a frozen environment snapshot.
    pub fn from_config(cfg: &ServiceConfig, snapshot: EnvSnapshot) -> Self {
        Self {
            command: cfg.command.clone(),
            args: cfg.args.clone(),
            workdir: snapshot.workdir,
            env: snapshot.vars,
            host: cfg.host.clone(),
            port: cfg.port,
            liveness_path: cfg.liveness_path.clone(),
            stop_grace: Duration::from_secs(cfg.stop_grace_secs),
        }
    }

    /// The URL the health reporter probes.
    pub fn liveness_url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.liveness_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::compose;

    #[test]
    fn test_from_config_carries_snapshot() {
        let cfg = ServiceConfig::default();
        let snapshot = compose(&cfg).unwrap();
        let spec = ServiceSpec::from_config(&cfg, snapshot);
        assert_eq!(spec.command, "streamlit");
        assert_eq!(spec.port, 8501);
        assert_eq!(spec.stop_grace, Duration::from_secs(10));
    }

    #[test]
    fn test_liveness_url() {
        let cfg = ServiceConfig::default();
        let snapshot = compose(&cfg).unwrap();
        let spec = ServiceSpec::from_config(&cfg, snapshot);
        assert_eq!(spec.liveness_url(), "http://127.0.0.1:8501/_stcore/health");
    }
}
