//! Shared utilities for gateway integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use account_gateway::config::{BackendConfig, GatewayConfig};
use account_gateway::domain::AccountType;
use account_gateway::observability::metrics;
use account_gateway::simulator::{self, MockBackend};
use account_gateway::{GatewayServer, Shutdown};
use gateway_sdk::GatewayClient;

/// A running gateway in front of the six simulated backends.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub client: GatewayClient,
    pub backends: Vec<MockBackend>,
    shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Fast resilience settings so failure paths finish quickly.
pub fn fast_backend(kind: AccountType, base_url: String) -> BackendConfig {
    let mut backend = BackendConfig::new(kind.as_str(), kind, base_url);
    backend.timeout_ms = 200;
    backend.retry.max_retries = 1;
    backend.retry.base_delay_ms = 5;
    backend.retry.max_delay_ms = 20;
    backend.circuit_breaker.failure_threshold = 3;
    backend.circuit_breaker.reset_timeout_ms = 60_000;
    backend
}

/// Boot mock backends and the gateway on ephemeral ports.
pub async fn start_gateway(tweak: impl FnOnce(&mut GatewayConfig)) -> TestGateway {
    let shutdown = Shutdown::new();
    let any_port: SocketAddr = "127.0.0.1:0".parse().unwrap();

    let mut backends = Vec::new();
    for kind in AccountType::ALL {
        backends.push(simulator::spawn(kind, any_port, shutdown.subscribe()).await.unwrap());
    }

    let mut config = GatewayConfig::default();
    config.backends = backends
        .iter()
        .map(|b| fast_backend(b.kind, b.base_url()))
        .collect();
    tweak(&mut config);

    start_with_config(config, shutdown, backends).await
}

pub async fn start_with_config(
    config: GatewayConfig,
    shutdown: Shutdown,
    backends: Vec<MockBackend>,
) -> TestGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = GatewayServer::new(config, metrics::init_metrics()).unwrap();
    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestGateway {
        addr,
        client: GatewayClient::new(&format!("http://{addr}")),
        backends,
        shutdown,
    }
}

/// Start a programmable raw HTTP backend on an ephemeral port.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let head = String::from_utf8_lossy(&buf[..n]).to_string();
                let path = head
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or("/")
                    .to_string();

                let (status, body) = f(path).await;
                let status_text = match status {
                    200 => "200 OK",
                    404 => "404 Not Found",
                    500 => "500 Internal Server Error",
                    502 => "502 Bad Gateway",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
                tokio::time::sleep(Duration::from_millis(10)).await;
            });
        }
    });

    addr
}
