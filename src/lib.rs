//! HTTP load balancer library.
//!
//! Reverse-proxies every incoming request to one backend chosen by a
//! pluggable strategy (round-robin or least-response-time), while a
//! background prober keeps each backend's health current.

// Core subsystems
pub mod config;
pub mod http;

// Traffic management
pub mod health;
pub mod load_balancer;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::schema::BalancerConfig;
pub use http::HttpServer;
pub use lifecycle::{Balancer, Shutdown};
