//! Upstream HTTP client.
//!
//! # Responsibilities
//! - Probe a backend's health path with a GET
//! - Forward a client request to a backend, preserving method, path,
//!   query, headers and body
//! - Bound every call with a timeout so a stalled backend cannot stall
//!   the caller

use std::str::FromStr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{
    header,
    uri::{Authority, PathAndQuery, Scheme},
    HeaderMap, HeaderName, Request, Response, StatusCode, Uri, Version,
};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::time;
use url::Url;

/// Headers that only apply to a single connection and are never forwarded.
const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Error type for upstream calls.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    #[error("invalid upstream uri: {0}")]
    InvalidUri(String),
}

/// Shared HTTP client used for both probes and forwarded requests.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    inner: Client<HttpConnector, Body>,
    probe_timeout: Duration,
    forward_timeout: Duration,
}

impl UpstreamClient {
    pub fn new(probe_timeout: Duration, forward_timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(probe_timeout.min(forward_timeout)));

        let inner = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            inner,
            probe_timeout,
            forward_timeout,
        }
    }

    /// Issue `GET <base><path>` and return the status code.
    pub async fn probe(&self, base: &Url, path: &str) -> Result<StatusCode, ClientError> {
        let uri = join_uri(base, path)?;
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .header(header::USER_AGENT, "balancing-proxy-health-check")
            .body(Body::empty())
            .map_err(|e| ClientError::InvalidUri(e.to_string()))?;

        let response = time::timeout(self.probe_timeout, self.inner.request(request))
            .await
            .map_err(|_| ClientError::Timeout(self.probe_timeout))??;

        Ok(response.status())
    }

    /// Forward `request` to `base`, keeping its path and query.
    pub async fn forward(
        &self,
        base: &Url,
        request: Request<Body>,
    ) -> Result<Response<Incoming>, ClientError> {
        let (mut parts, body) = request.into_parts();

        let path = parts
            .uri
            .path_and_query()
            .map(PathAndQuery::as_str)
            .unwrap_or("/");
        parts.uri = join_uri(base, path)?;
        // Upstream connections are HTTP/1.1 whatever protocol the client used.
        parts.version = Version::HTTP_11;

        parts.headers.remove(header::HOST);
        strip_hop_by_hop(&mut parts.headers);

        let request = Request::from_parts(parts, body);

        let response = time::timeout(self.forward_timeout, self.inner.request(request))
            .await
            .map_err(|_| ClientError::Timeout(self.forward_timeout))??;

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, body))
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
}

/// Build an absolute URI from a backend base URL and a path-and-query.
///
/// Any path on the base URL is ignored: backends are addressed by
/// scheme, host and port only.
fn join_uri(base: &Url, path_and_query: &str) -> Result<Uri, ClientError> {
    let host = base
        .host_str()
        .ok_or_else(|| ClientError::InvalidUri(format!("{} has no host", base)))?;
    let authority = match base.port_or_known_default() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    let scheme = Scheme::from_str(base.scheme()).map_err(|e| ClientError::InvalidUri(e.to_string()))?;
    let authority =
        Authority::from_str(&authority).map_err(|e| ClientError::InvalidUri(e.to_string()))?;
    let path_and_query = if path_and_query.starts_with('/') {
        PathAndQuery::from_str(path_and_query)
    } else {
        PathAndQuery::from_str(&format!("/{}", path_and_query))
    }
    .map_err(|e| ClientError::InvalidUri(e.to_string()))?;

    Uri::builder()
        .scheme(scheme)
        .authority(authority)
        .path_and_query(path_and_query)
        .build()
        .map_err(|e| ClientError::InvalidUri(e.to_string()))
}
