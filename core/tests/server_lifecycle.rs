// Copyright (c) 2026 webdavd contributors
// SPDX-License-Identifier: MIT
//! Serving process over real sockets: readiness, request logging and
//! graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use webdavd_core::application::readiness::wait_for_health;
use webdavd_core::infrastructure::webdav::{AccessLog, RequestLogger, ServerError, WebDavServer};
use webdavd_core::ServeConfig;

struct Running {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<Result<(), ServerError>>,
}

async fn serve(server: WebDavServer) -> Running {
    let mut server = server;
    let addr = server.bind().await.unwrap();
    let (shutdown, rx) = oneshot::channel::<()>();
    let task = tokio::spawn(server.serve_until(async move {
        let _ = rx.await;
    }));
    Running {
        addr,
        shutdown,
        task,
    }
}

fn ephemeral(root: &std::path::Path) -> ServeConfig {
    ServeConfig::new(root).with_port(0)
}

#[tokio::test]
async fn test_health_and_file_serving() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("hello.txt"), "hello").unwrap();

    let running = serve(WebDavServer::new(&ephemeral(tmp.path()), None)).await;
    let base = format!("http://{}", running.addr);

    wait_for_health(&base, Duration::from_secs(5)).await.unwrap();

    let health: serde_json::Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "healthy");
    assert!(health["uptime_seconds"].is_u64());

    let body = reqwest::get(format!("{}/hello.txt", base))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "hello");

    running.shutdown.send(()).unwrap();
    running.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_request_log_written() {
    let tmp = tempfile::tempdir().unwrap();
    let logs = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("hello.txt"), "hello").unwrap();

    let log = AccessLog::open(Some(logs.path())).unwrap();
    let log_file = log.file_path().unwrap().to_path_buf();
    let logger: Arc<dyn RequestLogger> = Arc::new(log);

    let running = serve(WebDavServer::new(&ephemeral(tmp.path()), Some(logger))).await;
    let base = format!("http://{}", running.addr);

    let status = reqwest::get(format!("{}/hello.txt", base))
        .await
        .unwrap()
        .status();
    assert_eq!(status, reqwest::StatusCode::OK);
    let status = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .status();
    assert_eq!(status, reqwest::StatusCode::OK);

    running.shutdown.send(()).unwrap();
    running.task.await.unwrap().unwrap();

    let logged = std::fs::read_to_string(log_file).unwrap();
    assert!(logged.contains("GET /hello.txt 200"), "log was {:?}", logged);
    assert!(logged.contains("127.0.0.1:"));
    // health checks bypass request logging
    assert!(!logged.contains("/health"));
}

#[tokio::test]
async fn test_traversal_rejected_over_the_wire() {
    let tmp = tempfile::tempdir().unwrap();
    let running = serve(WebDavServer::new(&ephemeral(tmp.path()), None)).await;

    // reqwest normalizes dot segments, so speak HTTP directly
    let mut stream = TcpStream::connect(running.addr).await.unwrap();
    stream
        .write_all(b"GET /../secret.txt HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let response = String::from_utf8_lossy(&response);
    assert!(response.starts_with("HTTP/1.1 403"), "got {:?}", response);

    running.shutdown.send(()).unwrap();
    running.task.await.unwrap().unwrap();
}

/// Sends headers and the first half of a PUT body, leaving the request in
/// flight until the rest is written.
async fn begin_upload(addr: SocketAddr) -> TcpStream {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(
            b"PUT /upload.txt HTTP/1.1\r\nHost: localhost\r\nContent-Length: 11\r\n\r\nhello",
        )
        .await
        .unwrap();
    stream.flush().await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    stream
}

#[tokio::test]
async fn test_shutdown_lets_in_flight_request_complete() {
    let tmp = tempfile::tempdir().unwrap();
    let running = serve(WebDavServer::new(&ephemeral(tmp.path()), None)).await;

    let mut stream = begin_upload(running.addr).await;
    running.shutdown.send(()).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!running.task.is_finished());

    stream.write_all(b" world").await.unwrap();
    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .unwrap()
        .unwrap();
    let response = String::from_utf8_lossy(&response);
    assert!(response.starts_with("HTTP/1.1 2"), "got {:?}", response);

    running.task.await.unwrap().unwrap();
    assert_eq!(
        std::fs::read_to_string(tmp.path().join("upload.txt")).unwrap(),
        "hello world"
    );
}

#[tokio::test]
async fn test_shutdown_timeout_reported() {
    let tmp = tempfile::tempdir().unwrap();
    let server = WebDavServer::new(&ephemeral(tmp.path()), None)
        .with_shutdown_timeout(Duration::from_millis(300));
    let running = serve(server).await;

    let _stalled = begin_upload(running.addr).await;
    running.shutdown.send(()).unwrap();

    let result = running.task.await.unwrap();
    assert!(matches!(result, Err(ServerError::ShutdownTimeout(_))));
}

#[tokio::test]
async fn test_new_connections_refused_after_shutdown() {
    let tmp = tempfile::tempdir().unwrap();
    let running = serve(WebDavServer::new(&ephemeral(tmp.path()), None)).await;
    let addr = running.addr;

    running.shutdown.send(()).unwrap();
    running.task.await.unwrap().unwrap();

    assert!(TcpStream::connect(addr).await.is_err());
}
