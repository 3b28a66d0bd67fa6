//! The `provision` command: install the declared package set and exit.
//!
//! Useful as a separate image build step or for pre-warming a host before
//! the first `warden run`.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use warden::installer::{Installer, Manifest, SystemFetcher};

use super::common;

pub(crate) async fn cmd_provision(config_path: Option<&Path>) -> Result<()> {
    let config = common::load_config(config_path).context("Failed to load configuration")?;

    if config.packages.is_empty() {
        println!("[OK] No packages declared, nothing to provision");
        return Ok(());
    }

    let mut installer = Installer::new(Manifest::default_path(), Arc::new(SystemFetcher));
    installer
        .provision(&config.packages)
        .await
        .context("Provisioning failed")?;

    println!(
        "[OK] {} package(s) provisioned (manifest: {})",
        config.packages.len(),
        Manifest::default_path().display()
    );
    Ok(())
}
