//! Backend health state.
//!
//! # States
//! - Healthy: backend receives traffic
//! - Unhealthy: backend excluded from selection
//!
//! # State Transitions
//! ```text
//! Healthy → Unhealthy: probe or forwarded request outside 200..=206, or transport error
//! Unhealthy → Healthy: probe or forwarded request inside 200..=206
//! ```
//!
//! The same rule is applied to probes and to forwarded requests, so a
//! repeated outcome never changes the state twice.

use axum::http::StatusCode;

/// Health of a single backend.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Healthy = 1,
    Unhealthy = 2,
}

impl Health {
    /// Map an upstream status code to a health classification.
    pub fn from_status(status: StatusCode) -> Self {
        if is_success(status) {
            Health::Healthy
        } else {
            Health::Unhealthy
        }
    }

    pub fn is_healthy(self) -> bool {
        self == Health::Healthy
    }
}

impl From<u8> for Health {
    fn from(val: u8) -> Self {
        match val {
            1 => Health::Healthy,
            _ => Health::Unhealthy,
        }
    }
}

impl std::fmt::Display for Health {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Health::Healthy => write!(f, "healthy"),
            Health::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Success window shared by probes and forwarded requests: 200 OK through
/// 206 Partial Content, inclusive.
pub fn is_success(status: StatusCode) -> bool {
    (200..=206).contains(&status.as_u16())
}
