//! The `check` command: one-shot health check with a 0/1 exit code.
//!
//! The default target is the running warden instance's `/healthz`, which
//! folds in debounce and staleness — this is what a container HEALTHCHECK
//! or a systemd watchdog script should call. `--direct` bypasses warden and
//! probes the service liveness endpoint itself.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use super::common;

pub(crate) async fn cmd_check(config_path: Option<&Path>, direct: bool) -> Result<()> {
    let config = common::load_config(config_path).context("Failed to load configuration")?;

    let url = if direct {
        format!(
            "http://{}:{}{}",
            config.service.host, config.service.port, config.service.liveness_path
        )
    } else {
        format!("http://{}:{}/healthz", config.status.host, config.status.port)
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.probe.timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    match client.get(&url).send().await {
        Ok(resp) if resp.status().is_success() => {
            println!("[OK] {} -> {}", url, resp.status());
            Ok(())
        }
        Ok(resp) => {
            println!("[ERROR] {} -> {}", url, resp.status());
            std::process::exit(1);
        }
        Err(e) => {
            println!("[ERROR] {} -> {}", url, e);
            std::process::exit(1);
        }
    }
}
