//! The `run` command: the full lifecycle.
//!
//! Bootstrap order is strict: validate config → provision dependencies →
//! compose the environment → start the supervisor, health reporter and
//! status server → wait for a shutdown signal → graceful stop. Any failure
//! before the supervisor starts is fatal; nothing launches on a
//! half-provisioned host or with an incomplete environment.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{info, warn};

use warden::compose::compose;
use warden::config::validate::{has_errors, validate, DiagnosticLevel};
use warden::health::{start_status_server, HealthReporter};
use warden::installer::{Installer, Manifest, SystemFetcher};
use warden::service::ServiceSpec;
use warden::supervisor::{RestartPolicy, Supervisor};

use super::common;

pub(crate) async fn cmd_run(config_path: Option<&Path>) -> Result<()> {
    let config = common::load_config(config_path).context("Failed to load configuration")?;

    // Validation errors are fatal before any side effect.
    let raw = common::read_raw(&common::config_path(config_path))
        .context("Failed to read config file")?;
    let diagnostics = validate(&config, raw.as_ref());
    for diag in &diagnostics {
        match diag.level {
            DiagnosticLevel::Warn => warn!("{}", diag),
            DiagnosticLevel::Error => tracing::error!("{}", diag),
        }
    }
    if has_errors(&diagnostics) {
        anyhow::bail!("configuration has errors, refusing to start");
    }

    // Provision the declared dependency set. Fatal on first failure.
    let mut installer = Installer::new(Manifest::default_path(), Arc::new(SystemFetcher));
    installer
        .provision(&config.packages)
        .await
        .context("Provisioning failed")?;

    // Compose the environment. An unresolved placeholder aborts here,
    // before any launch attempt.
    let snapshot = compose(&config.service).context("Environment composition failed")?;
    let spec = ServiceSpec::from_config(&config.service, snapshot);
    let liveness_url = spec.liveness_url();

    let policy = RestartPolicy::from_config(&config.restart);
    let (supervisor, status_rx, stop) = Supervisor::new(spec, policy);
    supervisor.start().await.context("Supervisor failed to start")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (reporter, report_rx) = HealthReporter::new(
        liveness_url,
        &config.probe,
        status_rx.clone(),
        shutdown_rx,
    )
    .context("Failed to build health reporter")?;
    reporter.start().await.context("Health reporter failed to start")?;

    let server = start_status_server(
        &config.status.host,
        config.status.port,
        Duration::from_secs(config.probe.staleness_secs),
        report_rx,
        status_rx,
    )
    .await
    .context("Status server failed to start")?;

    wait_for_shutdown().await;
    info!("shutdown signal received, stopping service");

    stop.stop();
    let _ = shutdown_tx.send(true);

    // Give the supervisor its grace period plus slack to wind down.
    let deadline = config.service.stop_grace_secs + 5;
    let mut waited = 0u64;
    while supervisor.is_running().await && waited < deadline * 10 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        waited += 1;
    }
    server.abort();

    info!("warden stopped");
    Ok(())
}

/// Wait for Ctrl-C or SIGTERM.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to register SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
