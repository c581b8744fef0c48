//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (prober.rs):
//!     Periodic loop
//!     → Selector sweep (per strategy)
//!     → Backend probe → state.rs rule
//!
//! Passive health checks:
//!     Forwarded request outcome
//!     → same state.rs rule, applied by the backend itself
//! ```

pub mod prober;
pub mod state;

pub use prober::HealthProber;
pub use state::Health;
