//! Demo backend for exercising the load balancer locally.
//!
//! `GET /health` always answers an empty 200. Every other path sleeps for
//! `--delay-ms`, then answers with the server's name.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, routing::get, Router};
use clap::Parser;
use tokio::net::TcpListener;

use balancing_proxy::lifecycle::signals::shutdown_signal;

#[derive(Parser)]
#[command(name = "demo-backend")]
#[command(about = "Minimal backend server for local load balancing demos", long_about = None)]
struct Cli {
    /// Port to listen on.
    #[arg(short, long, default_value_t = 8081)]
    port: u16,

    /// Name echoed in every response.
    #[arg(short, long, default_value = "backend")]
    name: String,

    /// Artificial delay before answering, in milliseconds.
    #[arg(short, long, default_value_t = 0)]
    delay_ms: u64,
}

struct DemoState {
    name: String,
    delay: Duration,
    served: AtomicU64,
}

async fn health() {}

async fn hello(State(state): State<Arc<DemoState>>) -> String {
    tokio::time::sleep(state.delay).await;
    let served = state.served.fetch_add(1, Ordering::Relaxed) + 1;
    tracing::info!(name = %state.name, served, "Request served");
    format!("Hello from backend server: {}", state.name)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "demo_backend=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let state = Arc::new(DemoState {
        name: cli.name,
        delay: Duration::from_millis(cli.delay_ms),
        served: AtomicU64::new(0),
    });

    let app = Router::new()
        .route("/health", get(health))
        .fallback(hello)
        .with_state(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, name = %state.name, "Demo backend listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(
        served = state.served.load(Ordering::Relaxed),
        "Demo backend stopped"
    );
    Ok(())
}
