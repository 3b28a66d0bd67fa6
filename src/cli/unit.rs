//! The `install-unit` command: write the systemd unit.

use std::path::Path;

use anyhow::{Context, Result};

pub(crate) fn cmd_install_unit(config_path: Option<&Path>, unit_path: &Path) -> Result<()> {
    let binary = std::env::current_exe().context("Failed to resolve warden binary path")?;

    warden::unit::install_unit(unit_path, &binary, config_path)
        .with_context(|| format!("Failed to write unit to {}", unit_path.display()))?;

    println!("[OK] Unit written to {}", unit_path.display());
    println!();
    println!("Enable with:");
    println!("  systemctl daemon-reload");
    println!("  systemctl enable --now warden.service");
    Ok(())
}
