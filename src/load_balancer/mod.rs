//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → dispatcher.rs (one selection, one forward)
//!     → selector.rs (strategy chosen at startup):
//!         - round_robin.rs (rotate through healthy backends)
//!         - least_response.rs (pop the fastest healthy backend)
//!     → backend.rs (forward, record latency and health)
//!     → Response, synthesized 503, NoHealthyBackends or AllBackendsBusy
//! ```
//!
//! # Design Decisions
//! - The pool is fixed at startup; only health, latency and collection
//!   membership change
//! - Health is a single atomic scalar per backend
//! - Least-response state sits behind one mutex that is never held across I/O

pub mod backend;
pub mod dispatcher;
pub mod heap;
pub mod least_response;
pub mod round_robin;
pub mod selector;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

pub use backend::Backend;
pub use dispatcher::Dispatcher;
pub use selector::{Lease, Selector};

/// Error surfaced by selection.
#[derive(Debug, thiserror::Error)]
pub enum LbError {
    #[error("No healthy backends available")]
    NoHealthyBackends,

    /// Least-response only: healthy backends exist but all are serving a request.
    #[error("All healthy backends are busy")]
    AllBackendsBusy,
}

impl IntoResponse for LbError {
    fn into_response(self) -> Response {
        let status = match self {
            LbError::NoHealthyBackends | LbError::AllBackendsBusy => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        };
        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}
