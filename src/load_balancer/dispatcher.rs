//! Request dispatch.
//!
//! One selection, one forward, one response: the dispatcher never retries
//! a request against a second backend.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};

use crate::http::client::UpstreamClient;
use crate::load_balancer::{selector::Selector, LbError};

/// Couples backend selection, forwarding and health feedback.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    selector: Arc<Selector>,
    client: UpstreamClient,
}

impl Dispatcher {
    pub fn new(selector: Arc<Selector>, client: UpstreamClient) -> Self {
        Self { selector, client }
    }

    /// Forward `request` to the next available backend.
    ///
    /// Backend failures are absorbed into the backend's health and surface
    /// as a synthesized 503 response; only a failed selection is an error.
    pub async fn send_request(&self, request: Request<Body>) -> Result<Response<Body>, LbError> {
        let lease = self.selector.next_available_backend()?;

        tracing::debug!(
            backend = %lease.url,
            strategy = ?self.selector.strategy(),
            "Selected backend"
        );

        let (response, health) = lease.send_request(&self.client, request).await;

        // Least-response leases re-file here by the outcome just recorded.
        drop(lease);

        tracing::debug!(status = %response.status(), health = %health, "Dispatch complete");
        Ok(response)
    }
}
