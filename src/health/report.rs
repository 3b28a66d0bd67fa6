//! The health report record and verdict semantics.

use std::time::Duration;

use serde::Serialize;

/// Probe verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Healthy,
    Unhealthy,
    Unknown,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Healthy => "healthy",
            Verdict::Unhealthy => "unhealthy",
            Verdict::Unknown => "unknown",
        }
    }
}

/// Snapshot of probe history published by the health reporter.
///
/// The reporter is the single writer; observers receive snapshots over a
/// `watch` channel. `verdict` is the recorded verdict — readers that care
/// about staleness must go through [`HealthReport::effective_verdict`].
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub verdict: Verdict,
    pub consecutive_failures: u32,
    pub probes_total: u64,
    /// Unix timestamp of the most recent probe, successful or not.
    pub last_probe_at: Option<u64>,
    /// Unix timestamp of the most recent successful probe.
    pub last_success_at: Option<u64>,
    pub last_error: Option<String>,
    /// Supervisor generation the current probe history belongs to.
    pub generation: u64,
}

impl HealthReport {
    pub fn initial() -> Self {
        Self {
            verdict: Verdict::Unknown,
            consecutive_failures: 0,
            probes_total: 0,
            last_probe_at: None,
            last_success_at: None,
            last_error: None,
            generation: 0,
        }
    }

    /// The verdict a reader should act on, given the staleness window.
    ///
    /// A report whose last success is older than the window reads Unknown
    /// regardless of the recorded verdict. This also covers an impaired
    /// reporter: one that stopped publishing cannot refresh the timestamp,
    /// so its last snapshot decays to Unknown on its own.
    pub fn effective_verdict(&self, staleness: Duration, now: u64) -> Verdict {
        match self.last_success_at {
            Some(at) if now.saturating_sub(at) <= staleness.as_secs() => self.verdict,
            _ => Verdict::Unknown,
        }
    }
}
