//! Least-response-time load balancing strategy.
//!
//! Healthy backends live in a min-heap keyed by their last observed
//! latency; unhealthy backends live in a plain list. Every backend is in
//! exactly one of the two, except while it is checked out for a request.
//!
//! # Data Flow
//! ```text
//! dispatch:  lock → pop fastest → unlock → forward → lock → re-file → unlock
//! sweep:     lock → snapshot → unlock → probe healthy, then unhealthy
//!            → lock → re-file everything present → unlock
//! ```
//!
//! The lock is never held across I/O. A checked-out backend is invisible to
//! both selection and the sweep, so concurrent requests spread over
//! different backends instead of piling onto the fastest one.

use std::collections::BinaryHeap;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use futures_util::future::join_all;
use url::Url;

use crate::http::client::UpstreamClient;
use crate::load_balancer::{backend::Backend, heap::MinHeapItem, LbError};

#[derive(Debug, Default)]
struct Partition {
    healthy: BinaryHeap<MinHeapItem<Arc<Backend>>>,
    unhealthy: Vec<Arc<Backend>>,
}

impl Partition {
    /// File a backend according to its current health and latency.
    fn file(&mut self, backend: Arc<Backend>) {
        if backend.is_healthy() {
            self.healthy
                .push(MinHeapItem::new(backend.last_response_latency(), backend));
        } else {
            self.unhealthy.push(backend);
        }
    }

    /// Re-file every backend currently present.
    fn reclassify(&mut self) {
        let present: Vec<Arc<Backend>> = self
            .healthy
            .drain()
            .map(|item| item.element)
            .chain(self.unhealthy.drain(..))
            .collect();

        for backend in present {
            self.file(backend);
        }
    }
}

/// Least-response selector.
#[derive(Debug)]
pub struct LeastResponse {
    pool: Mutex<Partition>,
    size: usize,
}

impl LeastResponse {
    pub fn new(backends: Vec<Arc<Backend>>) -> Self {
        let size = backends.len();
        let mut partition = Partition::default();
        for backend in backends {
            partition.file(backend);
        }

        Self {
            pool: Mutex::new(partition),
            size,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Partition> {
        self.pool.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pop the fastest healthy backend. It stays out of the pool until the
    /// returned [`Checkout`] is dropped.
    ///
    /// With the heap empty, backends missing from the unhealthy list are
    /// checked out, so the pool is busy rather than down.
    pub fn checkout(&self) -> Result<Checkout<'_>, LbError> {
        let mut partition = self.lock();
        match partition.healthy.pop() {
            Some(item) => Ok(Checkout {
                backend: item.element,
                home: self,
            }),
            None if partition.unhealthy.len() < self.size => Err(LbError::AllBackendsBusy),
            None => Err(LbError::NoHealthyBackends),
        }
    }

    /// Probe healthy backends, then unhealthy ones, then re-file all of them.
    pub async fn check_backend_healths(&self, client: &UpstreamClient, path: &str) -> (usize, usize) {
        let (healthy, unhealthy): (Vec<Arc<Backend>>, Vec<Arc<Backend>>) = {
            let partition = self.lock();
            (
                partition.healthy.iter().map(|i| i.element.clone()).collect(),
                partition.unhealthy.clone(),
            )
        };

        tracing::debug!(count = healthy.len(), "Checking healthy backends");
        join_all(healthy.iter().map(|b| b.check_health(client, path))).await;

        tracing::debug!(count = unhealthy.len(), "Checking unhealthy backends");
        let recovered = join_all(unhealthy.iter().map(|b| b.check_health(client, path)))
            .await
            .into_iter()
            .filter(|h| h.is_healthy())
            .count();
        if recovered > 0 {
            tracing::info!(recovered, "Unhealthy backends recovered");
        }

        let mut partition = self.lock();
        partition.reclassify();
        (partition.healthy.len(), partition.unhealthy.len())
    }

    /// Re-file every backend currently in the pool by its recorded state.
    pub(crate) fn reclassify(&self) {
        self.lock().reclassify();
    }

    fn refile(&self, backend: Arc<Backend>) {
        let start = Instant::now();
        self.lock().file(backend);
        tracing::trace!(waited_us = start.elapsed().as_micros() as u64, "Backend re-filed");
    }

    /// Addresses currently filed as (healthy, unhealthy). Checked-out
    /// backends appear in neither.
    pub fn members(&self) -> (Vec<Url>, Vec<Url>) {
        let partition = self.lock();
        (
            partition.healthy.iter().map(|i| i.element.url.clone()).collect(),
            partition.unhealthy.iter().map(|b| b.url.clone()).collect(),
        )
    }
}

/// A backend removed from the least-response pool for one request.
///
/// Dropping the checkout files the backend back by the health and latency
/// it holds at that moment, including when the request future is cancelled.
#[derive(Debug)]
pub struct Checkout<'a> {
    backend: Arc<Backend>,
    home: &'a LeastResponse,
}

impl Deref for Checkout<'_> {
    type Target = Backend;
    fn deref(&self) -> &Self::Target {
        &self.backend
    }
}

impl Drop for Checkout<'_> {
    fn drop(&mut self) {
        self.home.refile(self.backend.clone());
    }
}
