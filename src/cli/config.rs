//! Config inspection command handlers.

use std::path::Path;

use anyhow::{Context, Result};

use warden::config::validate::{validate, DiagnosticLevel};
use warden::config::Config;

use super::{common, ConfigAction};

pub(crate) fn cmd_config(config_path: Option<&Path>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Validate => cmd_validate(config_path),
        ConfigAction::Show => cmd_show(config_path),
    }
}

fn cmd_validate(config_path: Option<&Path>) -> Result<()> {
    let path = common::config_path(config_path);
    println!("Config file: {}", path.display());

    if !path.exists() {
        println!("[OK] No config file found (using defaults)");
        return Ok(());
    }

    let content = std::fs::read_to_string(&path).context("Failed to read config file")?;

    let raw: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            println!("[ERROR] Invalid JSON: {}", e);
            std::process::exit(1);
        }
    };
    let config: Config = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            println!("[ERROR] Invalid config: {}", e);
            std::process::exit(1);
        }
    };

    let diagnostics = validate(&config, Some(&raw));
    for diag in &diagnostics {
        println!("{}", diag);
    }

    let errors = diagnostics
        .iter()
        .filter(|d| d.level == DiagnosticLevel::Error)
        .count();
    if errors > 0 {
        println!("{} error(s) found", errors);
        std::process::exit(1);
    }
    println!("[OK] Configuration is valid");
    Ok(())
}

fn cmd_show(config_path: Option<&Path>) -> Result<()> {
    let config = common::load_config(config_path).context("Failed to load configuration")?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
