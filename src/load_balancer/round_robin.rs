//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::future::join_all;

use crate::health::state::Health;
use crate::http::client::UpstreamClient;
use crate::load_balancer::{backend::Backend, LbError};

/// Round-robin selector over a fixed backend sequence.
///
/// The cursor points at the next position to try. Unhealthy backends are
/// skipped without consuming a turn.
#[derive(Debug)]
pub struct RoundRobin {
    backends: Vec<Arc<Backend>>,
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new(backends: Vec<Arc<Backend>>) -> Self {
        Self {
            backends,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    /// Scan forward from the cursor (at most one full lap) for a healthy
    /// backend and move the cursor just past it.
    pub fn next_available_backend(&self) -> Result<Arc<Backend>, LbError> {
        let len = self.backends.len();
        if len == 0 {
            return Err(LbError::NoHealthyBackends);
        }

        let mut current = self.cursor.load(Ordering::Acquire);
        loop {
            let index = (0..len)
                .map(|i| (current + i) % len)
                .find(|&i| self.backends[i].is_healthy())
                .ok_or(LbError::NoHealthyBackends)?;

            // Scan and advance are published together; a racing caller
            // rescans from the cursor it lost to.
            match self.cursor.compare_exchange_weak(
                current,
                (index + 1) % len,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(self.backends[index].clone()),
                Err(actual) => current = actual,
            }
        }
    }

    /// Probe every backend unconditionally.
    pub async fn check_backend_healths(&self, client: &UpstreamClient, path: &str) -> (usize, usize) {
        let results = join_all(
            self.backends
                .iter()
                .map(|backend| backend.check_health(client, path)),
        )
        .await;

        let healthy = results.iter().filter(|h| **h == Health::Healthy).count();
        (healthy, results.len() - healthy)
    }
}
