//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file (loader.rs)
//!     → command-line flags (cli.rs)
//!     → validation.rs (semantic checks)
//!     → BalancerConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the backend pool is fixed at startup
//! - All fields have defaults to allow minimal configs
//! - Any validation error is fatal before the prober or listener start

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::Args;
pub use loader::{resolve, ConfigError};
pub use schema::{
    BalancerConfig, HealthCheckConfig, ListenerConfig, ObservabilityConfig, PoolConfig, Strategy,
    UpstreamConfig,
};
