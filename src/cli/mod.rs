//! CLI module — command parsing and dispatch
//!
//! All CLI logic lives here. `main.rs` calls `cli::run()`.

pub mod check;
pub mod common;
pub mod config;
pub mod provision;
pub mod run;
pub mod status;
pub mod unit;

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "warden")]
#[command(version)]
#[command(about = "Supervised process lifecycle manager", long_about = None)]
struct Cli {
    /// Path to the config file (defaults to ~/.warden/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision dependencies, then launch and supervise the service
    Run,
    /// Install the declared package set without starting the service
    Provision,
    /// One-shot health check, exit 0/1 (container HEALTHCHECK target)
    Check {
        /// Probe the service liveness endpoint directly instead of asking
        /// the running warden instance
        #[arg(long)]
        direct: bool,
    },
    /// Query a running instance's status endpoint
    Status,
    /// Inspect or validate configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Write a systemd unit that runs `warden run` at boot
    InstallUnit {
        /// Unit file destination
        #[arg(long, default_value = warden::unit::DEFAULT_UNIT_PATH)]
        path: PathBuf,
    },
    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the config file and print diagnostics
    Validate,
    /// Print the effective configuration (file + env overrides) as JSON
    Show,
}

/// Entry point for the CLI — called from main().
pub async fn run() -> Result<()> {
    // Load .env before anything reads process environment: placeholder
    // resolution and env overrides both depend on it.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging from config (format, level, optional file output);
    // fall back to defaults if the config file is missing or unreadable.
    let logging_cfg = common::load_config(cli.config.as_deref())
        .map(|c| c.logging)
        .unwrap_or_default();
    warden::utils::logging::init_logging(&logging_cfg);

    match cli.command {
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            println!();
        }
        Some(Commands::Version) => {
            cmd_version();
        }
        Some(Commands::Run) => {
            run::cmd_run(cli.config.as_deref()).await?;
        }
        Some(Commands::Provision) => {
            provision::cmd_provision(cli.config.as_deref()).await?;
        }
        Some(Commands::Check { direct }) => {
            check::cmd_check(cli.config.as_deref(), direct).await?;
        }
        Some(Commands::Status) => {
            status::cmd_status(cli.config.as_deref()).await?;
        }
        Some(Commands::Config { action }) => {
            config::cmd_config(cli.config.as_deref(), action)?;
        }
        Some(Commands::InstallUnit { path }) => {
            unit::cmd_install_unit(cli.config.as_deref(), &path)?;
        }
    }

    Ok(())
}

/// Display version information
fn cmd_version() {
    println!("warden {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Supervised process lifecycle manager");
}
