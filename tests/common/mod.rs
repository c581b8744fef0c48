//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use balancing_proxy::config::{BalancerConfig, Strategy};
use balancing_proxy::{Balancer, Shutdown};

/// Knobs shared between a mock backend's accept loop and the test.
struct Behavior {
    name: String,
    status: AtomicU16,
    delay_ms: AtomicU64,
    hits: AtomicUsize,
    probes: AtomicUsize,
    targets: Mutex<Vec<String>>,
}

/// A raw-TCP HTTP/1.1 backend bound on an ephemeral port.
///
/// Answers every request with the configured status after the configured
/// delay. The body is the backend's name. `/health` requests are counted
/// separately from proxied traffic.
pub struct MockBackend {
    pub addr: SocketAddr,
    behavior: Arc<Behavior>,
    task: JoinHandle<()>,
}

impl MockBackend {
    pub async fn start(name: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let behavior = Arc::new(Behavior {
            name: name.to_string(),
            status: AtomicU16::new(200),
            delay_ms: AtomicU64::new(0),
            hits: AtomicUsize::new(0),
            probes: AtomicUsize::new(0),
            targets: Mutex::new(Vec::new()),
        });

        let shared = behavior.clone();
        let task = tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(serve_one(socket, shared.clone()));
            }
        });

        Self {
            addr,
            behavior,
            task,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn set_status(&self, status: u16) {
        self.behavior.status.store(status, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.behavior
            .delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Proxied requests received (health probes excluded).
    pub fn hits(&self) -> usize {
        self.behavior.hits.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> usize {
        self.behavior.probes.load(Ordering::SeqCst)
    }

    /// Request targets (path and query) of proxied requests, in arrival order.
    pub fn targets(&self) -> Vec<String> {
        self.behavior.targets.lock().unwrap().clone()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve_one(mut socket: TcpStream, behavior: Arc<Behavior>) {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }

    let head = String::from_utf8_lossy(&head);
    let target = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    if target == "/health" {
        behavior.probes.fetch_add(1, Ordering::SeqCst);
    } else {
        behavior.hits.fetch_add(1, Ordering::SeqCst);
        behavior.targets.lock().unwrap().push(target);
    }

    let delay = behavior.delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    let status = behavior.status.load(Ordering::SeqCst);
    let reason = match status {
        200 => "OK",
        204 => "No Content",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    };
    let body = &behavior.name;
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// `n` distinct addresses nothing listens on.
pub async fn closed_port_urls(n: usize) -> Vec<String> {
    let mut listeners = Vec::new();
    for _ in 0..n {
        listeners.push(TcpListener::bind("127.0.0.1:0").await.unwrap());
    }
    listeners
        .iter()
        .map(|l| format!("http://{}", l.local_addr().unwrap()))
        .collect()
}

/// A running load balancer bound on an ephemeral port.
pub struct TestBalancer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub task: JoinHandle<std::io::Result<()>>,
}

impl TestBalancer {
    pub async fn start(strategy: Strategy, backends: Vec<String>, interval_secs: u64) -> Self {
        let mut config = BalancerConfig::default();
        config.balancer.strategy = strategy;
        config.balancer.backends = backends;
        config.health_check.interval_secs = interval_secs;
        config.health_check.timeout_secs = 1;
        config.upstream.timeout_secs = 5;

        let balancer = Balancer::from_config(&config).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let signal: broadcast::Receiver<()> = shutdown.subscribe();
        let task = tokio::spawn(balancer.serve(listener, signal));

        Self {
            addr,
            shutdown,
            task,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server to drain.
    pub async fn stop(self) -> std::io::Result<()> {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked")
    }
}

/// GET `url`, returning status and body text.
pub async fn get(client: &reqwest::Client, url: &str) -> (u16, String) {
    let response = client.get(url).send().await.unwrap();
    let status = response.status().as_u16();
    let body = response.text().await.unwrap();
    (status, body)
}

/// Wait long enough for the prober's immediate first cycle to land.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(400)).await;
}
