//! Orchestrator-facing HTTP status endpoint.
//!
//! Serves the supervisor state and the latest health report on demand, so a
//! container HEALTHCHECK, a systemd watchdog script or an operator can query
//! liveness without touching the supervised service directly.
//!
//! Uses raw TCP + manual HTTP to avoid adding a web framework dependency.

use std::time::Duration;

use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::Result;
use crate::supervisor::SupervisorStatus;
use crate::utils::unix_now;

use super::report::{HealthReport, Verdict};

/// JSON body of `GET /status`.
#[derive(Serialize)]
struct StatusBody {
    verdict: Verdict,
    supervisor: SupervisorStatus,
    report: HealthReport,
}

/// Start the status server.
///
/// Serves:
/// - `GET /status`  → 200 with the effective verdict, supervisor state and
///   full health report as JSON
/// - `GET /healthz` → 200 if the effective verdict is Healthy, 503 otherwise
/// - Anything else  → 404
///
/// The effective verdict is recomputed per request from the latest report
/// and the staleness window, so a silent reporter decays to Unknown here
/// without any writer involvement.
///
/// Returns a `JoinHandle` so callers can abort on shutdown.
pub async fn start_status_server(
    host: &str,
    port: u16,
    staleness: Duration,
    report_rx: watch::Receiver<HealthReport>,
    status_rx: watch::Receiver<SupervisorStatus>,
) -> Result<tokio::task::JoinHandle<()>> {
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "status server listening on http://{}", addr);

    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut stream, _addr)) => {
                    let report_rx = report_rx.clone();
                    let status_rx = status_rx.clone();
                    tokio::spawn(async move {
                        let mut buf = [0u8; 512];
                        let n = match tokio::time::timeout(
                            Duration::from_secs(5),
                            tokio::io::AsyncReadExt::read(&mut stream, &mut buf),
                        )
                        .await
                        {
                            Ok(Ok(n)) => n,
                            _ => return,
                        };

                        let request = String::from_utf8_lossy(&buf[..n]);
                        let request_line = request.lines().next().unwrap_or_default();
                        let mut parts = request_line.split_whitespace();
                        let method = parts.next().unwrap_or_default();
                        let raw_path = parts.next().unwrap_or_default();
                        let path = raw_path.split('?').next().unwrap_or(raw_path);

                        let report = report_rx.borrow().clone();
                        let supervisor = status_rx.borrow().clone();
                        let verdict = report.effective_verdict(staleness, unix_now());

                        let (status_line, body) = match (method, path) {
                            ("GET", "/status") => {
                                let body = StatusBody {
                                    verdict,
                                    supervisor,
                                    report,
                                };
                                let json = serde_json::to_string(&body)
                                    .unwrap_or_else(|_| "{}".to_string());
                                ("200 OK", json)
                            }
                            ("GET", "/healthz") => {
                                let body =
                                    format!("{{\"status\":\"{}\"}}", verdict.as_str());
                                if verdict == Verdict::Healthy {
                                    ("200 OK", body)
                                } else {
                                    ("503 Service Unavailable", body)
                                }
                            }
                            _ => ("404 Not Found", "{\"error\":\"not_found\"}".to_string()),
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_line,
                            body.len(),
                            body
                        );

                        let _ = stream.write_all(response.as_bytes()).await;
                        let _ = stream.shutdown().await;
                    });
                }
                Err(e) => {
                    warn!(error = %e, "status server accept error");
                }
            }
        }
    });

    Ok(handle)
}
