//! HTTP Load Balancer
//!
//! A reverse-proxying load balancer built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request           ┌──────────────────────────────────────────────┐
//!     ─────────────────────────┼─▶ http server ──▶ dispatcher ──▶ selector    │
//!                              │                       │          (rr / lrt)  │
//!                              │                       ▼                      │
//!     Client Response          │                 upstream client ◀────────────┼──── Backend
//!     ◀────────────────────────┼──────────────────────┘                       │     Servers
//!                              │                                              │
//!                              │  health prober ──▶ GET /health every N secs  │
//!                              └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use tokio::net::TcpListener;

use balancing_proxy::config::{self, Args};
use balancing_proxy::lifecycle::signals::shutdown_signal;
use balancing_proxy::lifecycle::{Balancer, Shutdown};
use balancing_proxy::observability::init_logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = config::resolve(&args)?;

    init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "balancing-proxy starting"
    );
    tracing::info!(
        bind_address = %config.listener.bind_address,
        strategy = ?config.balancer.strategy,
        backends = config.balancer.backends.len(),
        health_interval_secs = config.health_check.interval_secs,
        "Configuration loaded"
    );

    let balancer = Balancer::from_config(&config)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    balancer.serve(listener, signal).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
