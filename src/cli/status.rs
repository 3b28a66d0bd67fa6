//! The `status` command: query a running instance's status endpoint.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use super::common;

pub(crate) async fn cmd_status(config_path: Option<&Path>) -> Result<()> {
    let config = common::load_config(config_path).context("Failed to load configuration")?;
    let url = format!("http://{}:{}/status", config.status.host, config.status.port);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.probe.timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    let resp = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("No warden instance answering at {}", url))?;

    let body = resp.text().await.context("Failed to read status response")?;
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(_) => println!("{}", body),
    }
    Ok(())
}
