//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every backend, independent of request traffic
//! - Update backend health (and least-response membership) from the results
//!
//! # States
//! ```text
//! Stopped → Running → Stopped
//! ```
//! Stopping is non-preemptive: an in-flight cycle finishes, no new one starts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time;

use crate::http::client::UpstreamClient;
use crate::load_balancer::Selector;

/// Background health prober.
#[derive(Debug)]
pub struct HealthProber {
    selector: Arc<Selector>,
    client: UpstreamClient,
    path: String,
    interval: Duration,
    running: AtomicBool,
    wake: Notify,
}

impl HealthProber {
    pub fn new(
        selector: Arc<Selector>,
        client: UpstreamClient,
        path: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            selector,
            client,
            path: path.into(),
            interval,
            running: AtomicBool::new(false),
            wake: Notify::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Transition to Running and spawn the probe loop.
    ///
    /// Returns `None` if the prober is already running.
    pub fn start(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self.running.swap(true, Ordering::AcqRel) {
            return None;
        }

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            path = %self.path,
            "Health prober starting"
        );

        let prober = Arc::clone(self);
        Some(tokio::spawn(async move { prober.run().await }))
    }

    /// Transition to Stopped. The current cycle, if any, is allowed to finish.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            tracing::info!("Stopping health prober");
            self.wake.notify_one();
        }
    }

    async fn run(&self) {
        while self.is_running() {
            self.check_once().await;

            tokio::select! {
                _ = time::sleep(self.interval) => {}
                _ = self.wake.notified() => {}
            }
        }
        tracing::info!("Health prober stopped");
    }

    /// Run a single probe cycle over the whole pool.
    pub async fn check_once(&self) -> (usize, usize) {
        let start = Instant::now();
        let (healthy, unhealthy) = self
            .selector
            .check_backend_healths(&self.client, &self.path)
            .await;

        tracing::info!(
            healthy,
            unhealthy,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Health check complete"
        );
        (healthy, unhealthy)
    }
}
