//! Strategy selection.

use std::ops::Deref;
use std::sync::Arc;

use crate::config::Strategy;
use crate::http::client::UpstreamClient;
use crate::load_balancer::{
    backend::Backend,
    least_response::{Checkout, LeastResponse},
    round_robin::RoundRobin,
    LbError,
};

/// The active selection strategy, chosen once at startup.
#[derive(Debug)]
pub enum Selector {
    RoundRobin(RoundRobin),
    LeastResponse(LeastResponse),
}

impl Selector {
    pub fn new(strategy: Strategy, backends: Vec<Arc<Backend>>) -> Self {
        match strategy {
            Strategy::RoundRobin => Selector::RoundRobin(RoundRobin::new(backends)),
            Strategy::LeastResponse => Selector::LeastResponse(LeastResponse::new(backends)),
        }
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            Selector::RoundRobin(_) => Strategy::RoundRobin,
            Selector::LeastResponse(_) => Strategy::LeastResponse,
        }
    }

    /// Pick the backend for the next request.
    pub fn next_available_backend(&self) -> Result<Lease<'_>, LbError> {
        match self {
            Selector::RoundRobin(rr) => rr.next_available_backend().map(Lease::Shared),
            Selector::LeastResponse(lr) => lr.checkout().map(Lease::CheckedOut),
        }
    }

    /// Run one probe cycle. Returns (healthy, unhealthy) counts.
    pub async fn check_backend_healths(&self, client: &UpstreamClient, path: &str) -> (usize, usize) {
        match self {
            Selector::RoundRobin(rr) => rr.check_backend_healths(client, path).await,
            Selector::LeastResponse(lr) => lr.check_backend_healths(client, path).await,
        }
    }
}

/// A selected backend.
///
/// Round-robin backends stay in rotation and their health flag is read on
/// the next scan. Least-response backends are re-filed when the lease drops.
#[derive(Debug)]
pub enum Lease<'a> {
    Shared(Arc<Backend>),
    CheckedOut(Checkout<'a>),
}

impl Deref for Lease<'_> {
    type Target = Backend;
    fn deref(&self) -> &Self::Target {
        match self {
            Lease::Shared(backend) => backend,
            Lease::CheckedOut(checkout) => checkout,
        }
    }
}
