//! Integration tests for warden
//!
//! These exercise the supervisor, health reporter and status server wired
//! together the way `warden run` wires them, using short-lived `/bin/sh`
//! children as the supervised service and a local TCP responder standing in
//! for the service's liveness endpoint. No package managers or real
//! Streamlit processes are involved.

#![cfg(unix)]

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use warden::config::ProbeConfig;
use warden::health::{start_status_server, HealthReporter, Verdict};
use warden::supervisor::{RestartPolicy, ServiceState, Supervisor};
use warden::ServiceSpec;

fn shell_spec(script: &str, stop_grace: Duration) -> ServiceSpec {
    ServiceSpec {
        command: "/bin/sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        workdir: PathBuf::from("."),
        env: BTreeMap::new(),
        host: "127.0.0.1".to_string(),
        port: 8501,
        liveness_path: "/_stcore/health".to_string(),
        stop_grace,
    }
}

fn fast_policy() -> RestartPolicy {
    RestartPolicy {
        enabled: true,
        delay: Duration::from_millis(50),
        backoff: None,
    }
}

fn fast_probe() -> ProbeConfig {
    ProbeConfig {
        interval_secs: 1,
        timeout_secs: 1,
        failure_threshold: 3,
        staleness_secs: 60,
    }
}

/// Minimal HTTP responder standing in for the service liveness endpoint.
async fn spawn_ok_endpoint() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 512];
                let _ = stream.read(&mut buf).await;
                let _ = stream
                    .write_all(
                        b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok",
                    )
                    .await;
                let _ = stream.shutdown().await;
            });
        }
    });
    port
}

async fn http_get(port: u16, path: &str) -> String {
    let mut stream = TcpStream::connect(format!("127.0.0.1:{}", port))
        .await
        .unwrap();
    let request = format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", path);
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut buf = vec![0u8; 8192];
    let n = stream.read(&mut buf).await.unwrap();
    String::from_utf8_lossy(&buf[..n]).to_string()
}

async fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

#[tokio::test]
async fn crash_relaunch_generations_reach_reporter() {
    // The service keeps crashing; every relaunch bumps the supervisor
    // generation, and the reporter's published reports track it.
    let (supervisor, status_rx, stop) =
        Supervisor::new(shell_spec("exit 1", Duration::from_secs(1)), fast_policy());
    supervisor.start().await.unwrap();

    let port = spawn_ok_endpoint().await;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (reporter, mut report_rx) = HealthReporter::new(
        format!("http://127.0.0.1:{}/_stcore/health", port),
        &fast_probe(),
        status_rx.clone(),
        shutdown_rx,
    )
    .unwrap();
    reporter.start().await.unwrap();

    let report = tokio::time::timeout(
        Duration::from_secs(15),
        report_rx.wait_for(|r| r.generation >= 2),
    )
    .await
    .expect("reporter never observed a relaunch")
    .unwrap()
    .clone();
    assert!(report.generation >= 2);

    stop.stop();
    let _ = shutdown_tx.send(true);
    let mut status_rx = status_rx;
    tokio::time::timeout(
        Duration::from_secs(5),
        status_rx.wait_for(|s| s.state == ServiceState::Stopped),
    )
    .await
    .unwrap()
    .unwrap();
}

#[tokio::test]
async fn explicit_stop_terminates_and_ceases_relaunches() {
    let (supervisor, mut status_rx, stop) = Supervisor::new(
        shell_spec("sleep 30", Duration::from_secs(2)),
        fast_policy(),
    );
    supervisor.start().await.unwrap();

    tokio::time::timeout(
        Duration::from_secs(5),
        status_rx.wait_for(|s| s.state == ServiceState::Running),
    )
    .await
    .unwrap()
    .unwrap();

    stop.stop();
    let status = tokio::time::timeout(
        Duration::from_secs(5),
        status_rx.wait_for(|s| s.state == ServiceState::Stopped),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();

    // Exactly one launch, no relaunch after the stop.
    assert_eq!(status.generation, 1);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(status_rx.borrow().generation, 1);
    assert_eq!(status_rx.borrow().state, ServiceState::Stopped);
}

#[tokio::test]
async fn stop_force_kills_after_grace_period() {
    // The child ignores SIGTERM; the stop path must fall through to a kill
    // after the (short) grace period instead of hanging.
    let (supervisor, mut status_rx, stop) = Supervisor::new(
        shell_spec("trap '' TERM; sleep 30", Duration::from_secs(1)),
        fast_policy(),
    );
    supervisor.start().await.unwrap();

    tokio::time::timeout(
        Duration::from_secs(5),
        status_rx.wait_for(|s| s.state == ServiceState::Running),
    )
    .await
    .unwrap()
    .unwrap();

    stop.stop();
    tokio::time::timeout(
        Duration::from_secs(10),
        status_rx.wait_for(|s| s.state == ServiceState::Stopped),
    )
    .await
    .expect("force-kill path did not complete")
    .unwrap();
}

#[tokio::test]
async fn status_server_end_to_end_reports_healthy() {
    let (_supervisor, status_rx, _stop) = Supervisor::new(
        shell_spec("sleep 30", Duration::from_secs(1)),
        fast_policy(),
    );

    let service_port = spawn_ok_endpoint().await;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (reporter, mut report_rx) = HealthReporter::new(
        format!("http://127.0.0.1:{}/_stcore/health", service_port),
        &fast_probe(),
        status_rx.clone(),
        shutdown_rx,
    )
    .unwrap();
    reporter.start().await.unwrap();

    tokio::time::timeout(
        Duration::from_secs(10),
        report_rx.wait_for(|r| r.verdict == Verdict::Healthy),
    )
    .await
    .expect("reporter never reached healthy")
    .unwrap();

    let status_port = free_port().await;
    let server = start_status_server(
        "127.0.0.1",
        status_port,
        Duration::from_secs(60),
        report_rx.clone(),
        status_rx,
    )
    .await
    .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let response = http_get(status_port, "/healthz").await;
    assert!(response.contains("200 OK"), "response: {}", response);
    assert!(response.contains("\"status\":\"healthy\""));

    let response = http_get(status_port, "/status").await;
    assert!(response.contains("\"verdict\":\"healthy\""));
    assert!(response.contains("\"supervisor\""));

    server.abort();
    let _ = shutdown_tx.send(true);
}

#[tokio::test]
async fn dead_endpoint_flips_unhealthy_then_healthz_503() {
    let dead_port = free_port().await;
    let (_status_tx, status_rx) = watch::channel(warden::SupervisorStatus::initial());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (reporter, mut report_rx) = HealthReporter::new(
        format!("http://127.0.0.1:{}/_stcore/health", dead_port),
        &fast_probe(),
        status_rx.clone(),
        shutdown_rx,
    )
    .unwrap();
    reporter.start().await.unwrap();

    tokio::time::timeout(
        Duration::from_secs(15),
        report_rx.wait_for(|r| r.verdict == Verdict::Unhealthy),
    )
    .await
    .expect("reporter never flipped unhealthy")
    .unwrap();

    let status_port = free_port().await;
    let server = start_status_server(
        "127.0.0.1",
        status_port,
        Duration::from_secs(60),
        report_rx,
        status_rx,
    )
    .await
    .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let response = http_get(status_port, "/healthz").await;
    assert!(response.contains("503"), "response: {}", response);

    server.abort();
    let _ = shutdown_tx.send(true);
}
