//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single upstream server by its immutable base URL
//! - Track health state (Healthy/Unhealthy) as a single atomic scalar
//! - Track the latency of the last probe or forwarded request
//! - Probe the health path and forward client requests, folding the
//!   outcome back into its own state

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use url::Url;

use crate::health::state::{is_success, Health};
use crate::http::client::UpstreamClient;

/// A single backend server.
#[derive(Debug)]
pub struct Backend {
    /// Base URL (scheme, host and port). Fixed for the lifetime of the process.
    pub url: Url,
    /// Current health (see [`Health`]).
    health: AtomicU8,
    /// Round-trip time of the last probe or forwarded request, in microseconds.
    latency_us: AtomicU64,
}

impl Backend {
    /// Create a new backend. Backends start healthy with zero latency so that
    /// traffic flows before the first probe cycle completes.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            health: AtomicU8::new(Health::Healthy as u8),
            latency_us: AtomicU64::new(0),
        }
    }

    pub fn health(&self) -> Health {
        Health::from(self.health.load(Ordering::Acquire))
    }

    pub fn is_healthy(&self) -> bool {
        self.health().is_healthy()
    }

    /// Latency observed by the most recent probe or forwarded request.
    pub fn last_response_latency(&self) -> Duration {
        Duration::from_micros(self.latency_us.load(Ordering::Acquire))
    }

    /// Probe `<url><path>` and update health and latency in place.
    ///
    /// Failures are data: a timeout or transport error yields
    /// [`Health::Unhealthy`], never an error.
    pub async fn check_health(&self, client: &UpstreamClient, path: &str) -> Health {
        let start = Instant::now();
        let result = client.probe(&self.url, path).await;
        let latency = start.elapsed();

        let health = match result {
            Ok(status) => {
                if !is_success(status) {
                    tracing::warn!(backend = %self.url, status = %status, "Health check failed: non-success status");
                }
                Health::from_status(status)
            }
            Err(e) => {
                tracing::warn!(backend = %self.url, error = %e, "Health check failed");
                Health::Unhealthy
            }
        };

        tracing::debug!(
            backend = %self.url,
            latency_ms = latency.as_millis() as u64,
            health = %health,
            "Health check complete"
        );

        self.record(health, latency);
        health
    }

    /// Forward `request` to this backend.
    ///
    /// Returns the backend's response when its status is within 200..=206,
    /// otherwise a synthesized `503 Service Unavailable`. The returned
    /// [`Health`] is the classification just recorded on this backend.
    pub async fn send_request(
        &self,
        client: &UpstreamClient,
        request: Request<Body>,
    ) -> (Response<Body>, Health) {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let start = Instant::now();
        let result = client.forward(&self.url, request).await;
        let latency = start.elapsed();

        let (response, health) = match result {
            Ok(response) if is_success(response.status()) => {
                let (parts, body) = response.into_parts();
                (Response::from_parts(parts, Body::new(body)), Health::Healthy)
            }
            Ok(response) => {
                tracing::warn!(
                    backend = %self.url,
                    status = %response.status(),
                    "Backend returned non-success status"
                );
                (unavailable(), Health::Unhealthy)
            }
            Err(e) => {
                tracing::error!(backend = %self.url, error = %e, "Upstream error");
                (unavailable(), Health::Unhealthy)
            }
        };

        tracing::debug!(
            backend = %self.url,
            method = %method,
            path = %path,
            latency_ms = latency.as_millis() as u64,
            "Forwarded request"
        );

        self.record(health, latency);
        (response, health)
    }

    /// The single mutation path for health and latency.
    pub(crate) fn record(&self, health: Health, latency: Duration) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.latency_us.store(micros, Ordering::Release);

        let previous = Health::from(self.health.swap(health as u8, Ordering::AcqRel));
        if previous != health {
            match health {
                Health::Healthy => tracing::info!(backend = %self.url, "Backend is now healthy"),
                Health::Unhealthy => tracing::warn!(backend = %self.url, "Backend is now unhealthy"),
            }
        }
    }
}

/// Synthesized response for a failed forward.
fn unavailable() -> Response<Body> {
    let mut response = Response::new(Body::from("Backend unavailable"));
    *response.status_mut() = StatusCode::SERVICE_UNAVAILABLE;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
