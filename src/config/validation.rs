//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (interval and timeouts > 0)
//! - Parse backend URLs and the bind address
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BalancerConfig → Result<(), Vec<ValidationError>>
//! - Runs before the prober or listener start

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::BalancerConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("no backends configured")]
    NoBackends,

    #[error("backend {url:?} is not a valid URL: {reason}")]
    MalformedBackend { url: String, reason: String },

    #[error("backend {0:?} must use http")]
    UnsupportedScheme(String),

    #[error("duplicate backend {0:?}")]
    DuplicateBackend(String),

    #[error("health_check.interval_secs must be positive")]
    ZeroInterval,

    #[error("{0} must be positive")]
    ZeroTimeout(&'static str),

    #[error("health_check.path must start with '/'")]
    InvalidProbePath,

    #[error("listener.bind_address {0:?} is not a socket address")]
    InvalidBindAddress(String),
}

/// Validate a fully merged configuration.
pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.balancer.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }

    let mut seen: Vec<Url> = Vec::new();
    for raw in &config.balancer.backends {
        match parse_backend_url(raw) {
            Ok(url) if seen.contains(&url) => {
                errors.push(ValidationError::DuplicateBackend(raw.clone()));
            }
            Ok(url) => seen.push(url),
            Err(e) => errors.push(e),
        }
    }

    if config.health_check.interval_secs == 0 {
        errors.push(ValidationError::ZeroInterval);
    }
    if config.health_check.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("health_check.timeout_secs"));
    }
    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("upstream.timeout_secs"));
    }
    if !config.health_check.path.starts_with('/') {
        errors.push(ValidationError::InvalidProbePath);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Parse a backend base URL. Only scheme, host and port are significant.
pub fn parse_backend_url(raw: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(raw).map_err(|e| ValidationError::MalformedBackend {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if url.scheme() != "http" {
        return Err(ValidationError::UnsupportedScheme(raw.to_string()));
    }
    if url.host_str().is_none() {
        return Err(ValidationError::MalformedBackend {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(url)
}
