//! The probe loop: periodically checks the service liveness endpoint and
//! publishes [`HealthReport`] snapshots.
//!
//! Probes are serial. The loop awaits each probe (bounded by the client
//! timeout) before the interval timer can fire again, so a slow endpoint
//! delays the next probe rather than stacking concurrent ones.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::ProbeConfig;
use crate::error::{Result, WardenError};
use crate::supervisor::SupervisorStatus;
use crate::utils::unix_now;

use super::report::{HealthReport, Verdict};

/// Periodically probes the service and publishes health reports.
pub struct HealthReporter {
    url: String,
    interval: Duration,
    threshold: u32,
    client: reqwest::Client,
    report_tx: watch::Sender<HealthReport>,
    status_rx: watch::Receiver<SupervisorStatus>,
    shutdown_rx: watch::Receiver<bool>,
    running: Arc<RwLock<bool>>,
}

impl HealthReporter {
    /// Build a reporter probing `url` per the probe config.
    ///
    /// `status_rx` feeds supervisor generations (probe history resets on
    /// relaunch); `shutdown_rx` stops the loop.
    pub fn new(
        url: String,
        cfg: &ProbeConfig,
        status_rx: watch::Receiver<SupervisorStatus>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Result<(Self, watch::Receiver<HealthReport>)> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        let (report_tx, report_rx) = watch::channel(HealthReport::initial());

        let reporter = Self {
            url,
            interval: Duration::from_secs(cfg.interval_secs),
            threshold: cfg.failure_threshold,
            client,
            report_tx,
            status_rx,
            shutdown_rx,
            running: Arc::new(RwLock::new(false)),
        };
        Ok((reporter, report_rx))
    }

    /// Start the probe loop in the background. Duplicate starts are no-ops.
    pub async fn start(&self) -> Result<()> {
        {
            let mut running = self.running.write().await;
            if *running {
                warn!("health reporter already running, ignoring duplicate start");
                return Ok(());
            }
            *running = true;
        }

        info!(
            url = %self.url,
            interval_secs = self.interval.as_secs(),
            threshold = self.threshold,
            "health reporter starting"
        );

        let client = self.client.clone();
        let url = self.url.clone();
        let interval = self.interval;
        let threshold = self.threshold;
        let report_tx = self.report_tx.clone();
        let status_rx = self.status_rx.clone();
        let shutdown_rx = self.shutdown_rx.clone();
        let running = Arc::clone(&self.running);

        tokio::spawn(async move {
            probe_loop(
                client, url, interval, threshold, report_tx, status_rx, shutdown_rx,
            )
            .await;
            let mut r = running.write().await;
            *r = false;
        });

        Ok(())
    }
}

async fn probe_loop(
    client: reqwest::Client,
    url: String,
    interval: Duration,
    threshold: u32,
    report_tx: watch::Sender<HealthReport>,
    status_rx: watch::Receiver<SupervisorStatus>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut report = HealthReport::initial();
    report.generation = status_rx.borrow().generation;

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let generation = status_rx.borrow().generation;
                if generation != report.generation {
                    debug!(generation, "service relaunched, resetting probe history");
                    reset_for_generation(&mut report, generation);
                }

                let outcome = probe_once(&client, &url).await;
                apply_outcome(&mut report, outcome, threshold, unix_now());
                report_tx.send_replace(report.clone());
            }
            _ = shutdown_requested(&mut shutdown_rx) => break,
        }
    }

    info!("health reporter stopped");
}

/// One probe: GET the liveness endpoint, any 2xx is success.
async fn probe_once(client: &reqwest::Client, url: &str) -> Result<()> {
    match client.get(url).send().await {
        Ok(resp) if resp.status().is_success() => {
            debug!(url = %url, status = resp.status().as_u16(), "probe succeeded");
            Ok(())
        }
        Ok(resp) => Err(WardenError::Probe(format!(
            "unexpected status {}",
            resp.status()
        ))),
        Err(e) => Err(WardenError::Probe(e.to_string())),
    }
}

/// Fold one probe outcome into the report, with threshold debounce.
///
/// A failure below the threshold leaves the verdict untouched; the flip to
/// Unhealthy happens exactly on the Nth consecutive failure.
fn apply_outcome(report: &mut HealthReport, outcome: Result<()>, threshold: u32, now: u64) {
    report.probes_total += 1;
    report.last_probe_at = Some(now);

    match outcome {
        Ok(()) => {
            if report.verdict != Verdict::Healthy {
                info!("probe succeeded, service is healthy");
            }
            report.verdict = Verdict::Healthy;
            report.consecutive_failures = 0;
            report.last_success_at = Some(now);
            report.last_error = None;
        }
        Err(e) => {
            report.consecutive_failures += 1;
            report.last_error = Some(e.to_string());
            if report.consecutive_failures >= threshold {
                if report.verdict != Verdict::Unhealthy {
                    warn!(
                        failures = report.consecutive_failures,
                        "failure threshold reached, service is unhealthy"
                    );
                }
                report.verdict = Verdict::Unhealthy;
            } else {
                debug!(
                    failures = report.consecutive_failures,
                    threshold, "probe failed, below threshold"
                );
            }
        }
    }
}

/// A relaunched service starts over: verdict and failure count reset,
/// cumulative counters and timestamps survive.
fn reset_for_generation(report: &mut HealthReport, generation: u64) {
    report.verdict = Verdict::Unknown;
    report.consecutive_failures = 0;
    report.last_error = None;
    report.generation = generation;
}

async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}
