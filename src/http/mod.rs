//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all route)
//!     → request.rs (request ID)
//!     → load balancer dispatcher
//!     → client.rs (forward to backend with timeout)
//!     → Send to client
//! ```

pub mod client;
pub mod request;
pub mod server;

pub use client::{ClientError, UpstreamClient};
pub use request::X_REQUEST_ID;
pub use server::HttpServer;
