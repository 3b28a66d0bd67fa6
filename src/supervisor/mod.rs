//! Process supervisor — launch, monitor and restart the service.
//!
//! State machine: `Stopped → Starting → Running → Exited → Starting → …`,
//! with `Stopped` reached only on an explicit stop request. Every exit —
//! crash, signal or clean exit — is treated identically: if the restart
//! policy is enabled and no stop was requested, the service is relaunched
//! after the policy delay, without any retry cap. Launch failures take the
//! same path as crashes.
//!
//! The supervisor is the single writer of [`SupervisorStatus`]; observers
//! (the health reporter, the status endpoint) receive it over a `watch`
//! channel rather than shared mutable state.

use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::{watch, RwLock};
use tracing::{debug, error, info, warn};

use crate::config::RestartConfig;
use crate::error::{Result, WardenError};
use crate::service::ServiceSpec;
use crate::utils::unix_now;

/// A run that lasted at least this long resets the back-off attempt counter.
const STABLE_UPTIME: Duration = Duration::from_secs(60);

/// Supervisor lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    Stopped,
    Starting,
    Running,
    Exited,
}

/// One running instance of the service.
///
/// Exactly one live handle exists per service at any time; it is created on
/// launch and invalidated when the process exits.
pub struct ProcessHandle {
    pub pid: u32,
    pub started_at: u64,
    child: tokio::process::Child,
}

/// Restart behavior applied on every exit.
#[derive(Debug, Clone)]
pub struct RestartPolicy {
    pub enabled: bool,
    pub delay: Duration,
    pub backoff: Option<Backoff>,
}

/// Capped exponential back-off on consecutive failed attempts.
#[derive(Debug, Clone)]
pub struct Backoff {
    pub factor: f64,
    pub max_delay: Duration,
}

impl RestartPolicy {
    pub fn from_config(cfg: &RestartConfig) -> Self {
        Self {
            enabled: cfg.enabled,
            delay: Duration::from_secs(cfg.delay_secs),
            backoff: cfg.backoff.as_ref().map(|b| Backoff {
                factor: b.factor,
                max_delay: Duration::from_secs(b.max_delay_secs),
            }),
        }
    }

    /// Delay before the given relaunch attempt (1-based).
    ///
    /// Without back-off this is the fixed delay regardless of attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match &self.backoff {
            None => self.delay,
            Some(b) => {
                let exp = attempt.saturating_sub(1).min(16);
                let scaled = self.delay.as_secs_f64() * b.factor.powi(exp as i32);
                Duration::from_secs_f64(scaled.min(b.max_delay.as_secs_f64()))
            }
        }
    }
}

/// Snapshot of supervisor state published to observers.
#[derive(Debug, Clone, Serialize)]
pub struct SupervisorStatus {
    pub state: ServiceState,
    /// Incremented on every successful launch; observers reset health
    /// tracking when it changes.
    pub generation: u64,
    pub pid: Option<u32>,
    pub started_at: Option<u64>,
    pub last_exit_code: Option<i32>,
    pub restarts: u64,
}

impl SupervisorStatus {
    pub fn initial() -> Self {
        Self {
            state: ServiceState::Stopped,
            generation: 0,
            pid: None,
            started_at: None,
            last_exit_code: None,
            restarts: 0,
        }
    }
}

/// Handle for issuing the explicit stop request.
///
/// Dropping every handle also counts as a stop request — the supervisor
/// cannot outlive its owner.
#[derive(Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    /// Request a stop: terminate the service and cease restart attempts.
    pub fn stop(&self) {
        let _ = self.tx.send(true);
    }
}

/// Supervises a single service according to its spec and restart policy.
pub struct Supervisor {
    spec: ServiceSpec,
    policy: RestartPolicy,
    status_tx: watch::Sender<SupervisorStatus>,
    stop_rx: watch::Receiver<bool>,
    running: Arc<RwLock<bool>>,
}

impl Supervisor {
    /// Create a supervisor plus its status receiver and stop handle.
    pub fn new(
        spec: ServiceSpec,
        policy: RestartPolicy,
    ) -> (Self, watch::Receiver<SupervisorStatus>, StopHandle) {
        let (status_tx, status_rx) = watch::channel(SupervisorStatus::initial());
        let (stop_tx, stop_rx) = watch::channel(false);
        let supervisor = Self {
            spec,
            policy,
            status_tx,
            stop_rx,
            running: Arc::new(RwLock::new(false)),
        };
        let stop = StopHandle {
            tx: Arc::new(stop_tx),
        };
        (supervisor, status_rx, stop)
    }

    /// Start the supervision loop in the background.
    ///
    /// A second call while the loop is live is a no-op — at most one run
    /// loop (and therefore one live process) exists per service.
    pub async fn start(&self) -> Result<()> {
        {
            let mut running = self.running.write().await;
            if *running {
                warn!("supervisor already running, ignoring duplicate start");
                return Ok(());
            }
            *running = true;
        }

        let spec = self.spec.clone();
        let policy = self.policy.clone();
        let status_tx = self.status_tx.clone();
        let stop_rx = self.stop_rx.clone();
        let running = Arc::clone(&self.running);

        info!(
            command = %spec.command,
            restart_enabled = policy.enabled,
            delay_secs = policy.delay.as_secs(),
            "supervisor starting"
        );

        tokio::spawn(async move {
            run_loop(spec, policy, status_tx, stop_rx).await;
            let mut r = running.write().await;
            *r = false;
        });

        Ok(())
    }

    /// Whether the supervision loop is live.
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }
}

/// The launch/monitor loop. Owns the process handle for its whole lifetime.
async fn run_loop(
    spec: ServiceSpec,
    policy: RestartPolicy,
    status_tx: watch::Sender<SupervisorStatus>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut generation: u64 = 0;
    let mut attempt: u32 = 0;
    let mut last_exit_code: Option<i32> = None;

    loop {
        if *stop_rx.borrow() {
            break;
        }

        publish(
            &status_tx,
            ServiceState::Starting,
            generation,
            None,
            None,
            last_exit_code,
        );

        match launch(&spec) {
            Err(e) => {
                // Recoverable by policy: treated like a crash, retried below.
                error!(error = %e, "launch failed");
                attempt += 1;
                publish(
                    &status_tx,
                    ServiceState::Exited,
                    generation,
                    None,
                    None,
                    last_exit_code,
                );
            }
            Ok(mut handle) => {
                generation += 1;
                info!(pid = handle.pid, generation, "service launched");
                publish(
                    &status_tx,
                    ServiceState::Running,
                    generation,
                    Some(handle.pid),
                    Some(handle.started_at),
                    last_exit_code,
                );

                let launched = Instant::now();
                tokio::select! {
                    status = handle.child.wait() => {
                        match status {
                            Ok(st) => {
                                last_exit_code = st.code();
                                warn!(exit_code = ?st.code(), pid = handle.pid, "service exited");
                            }
                            Err(e) => {
                                last_exit_code = None;
                                warn!(error = %e, "failed to await service exit");
                            }
                        }
                        if launched.elapsed() >= STABLE_UPTIME {
                            attempt = 0;
                        }
                        attempt += 1;
                        publish(
                            &status_tx,
                            ServiceState::Exited,
                            generation,
                            None,
                            None,
                            last_exit_code,
                        );
                    }
                    _ = stop_requested(&mut stop_rx) => {
                        info!(pid = handle.pid, "stop requested, terminating service");
                        graceful_stop(handle, spec.stop_grace).await;
                        break;
                    }
                }
            }
        }

        if !policy.enabled {
            info!("restart policy disabled, supervision ends");
            break;
        }

        let delay = policy.delay_for(attempt);
        debug!(delay_ms = delay.as_millis() as u64, attempt, "waiting before relaunch");
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = stop_requested(&mut stop_rx) => break,
        }
    }

    info!("supervisor stopped");
    publish(
        &status_tx,
        ServiceState::Stopped,
        generation,
        None,
        None,
        last_exit_code,
    );
}

/// Launch the service process per the spec's launch contract.
fn launch(spec: &ServiceSpec) -> Result<ProcessHandle> {
    let mut cmd = tokio::process::Command::new(&spec.command);
    cmd.args(&spec.args)
        .current_dir(&spec.workdir)
        .envs(&spec.env)
        .stdin(Stdio::null())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|e| {
        WardenError::Launch(format!("failed to spawn '{}': {}", spec.command, e))
    })?;
    let pid = child.id().unwrap_or(0);

    Ok(ProcessHandle {
        pid,
        started_at: unix_now(),
        child,
    })
}

/// Request graceful termination, wait the grace period, then force-kill.
async fn graceful_stop(mut handle: ProcessHandle, grace: Duration) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let _ = kill(Pid::from_raw(handle.pid as i32), Signal::SIGTERM);
        match tokio::time::timeout(grace, handle.child.wait()).await {
            Ok(_) => {
                info!("service exited within grace period");
                return;
            }
            Err(_) => warn!(
                grace_secs = grace.as_secs(),
                "grace period expired, force-killing"
            ),
        }
    }

    let _ = handle.child.kill().await;
}

/// Resolves once a stop has been requested (or every stop handle dropped).
async fn stop_requested(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}

fn publish(
    tx: &watch::Sender<SupervisorStatus>,
    state: ServiceState,
    generation: u64,
    pid: Option<u32>,
    started_at: Option<u64>,
    last_exit_code: Option<i32>,
) {
    tx.send_replace(SupervisorStatus {
        state,
        generation,
        pid,
        started_at,
        last_exit_code,
        restarts: generation.saturating_sub(1),
    });
}
