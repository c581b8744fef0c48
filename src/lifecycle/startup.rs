//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the backend pool and selector from validated configuration
//! - Start the health prober
//! - Serve HTTP until shutdown, stopping the prober before draining
//!
//! # Design Decisions
//! - Fail fast: any configuration error is fatal before anything starts
//! - The prober's first cycle runs immediately, then every interval

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::validation::{parse_backend_url, validate_config};
use crate::config::{BalancerConfig, ConfigError};
use crate::health::HealthProber;
use crate::http::{HttpServer, UpstreamClient};
use crate::load_balancer::{Backend, Dispatcher, Selector};

/// The assembled load balancer: dispatch path plus health prober, sharing
/// one selector.
pub struct Balancer {
    dispatcher: Dispatcher,
    prober: Arc<HealthProber>,
}

impl Balancer {
    /// Build every subsystem from configuration.
    pub fn from_config(config: &BalancerConfig) -> Result<Self, ConfigError> {
        validate_config(config).map_err(ConfigError::Validation)?;

        let backends = config
            .balancer
            .backends
            .iter()
            .map(|raw| parse_backend_url(raw).map(|url| Arc::new(Backend::new(url))))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ConfigError::Validation(vec![e]))?;

        tracing::info!(
            backends = backends.len(),
            strategy = ?config.balancer.strategy,
            "Backend pool created"
        );
        for backend in &backends {
            tracing::info!(backend = %backend.url, "Backend registered");
        }

        let selector = Arc::new(Selector::new(config.balancer.strategy, backends));
        let client = UpstreamClient::new(
            Duration::from_secs(config.health_check.timeout_secs),
            Duration::from_secs(config.upstream.timeout_secs),
        );

        let prober = Arc::new(HealthProber::new(
            selector.clone(),
            client.clone(),
            config.health_check.path.clone(),
            Duration::from_secs(config.health_check.interval_secs),
        ));

        Ok(Self {
            dispatcher: Dispatcher::new(selector, client),
            prober,
        })
    }

    /// Start probing and serve on `listener` until `shutdown` fires.
    ///
    /// On shutdown the prober is stopped first (its current cycle may
    /// finish), then the server drains in-flight requests.
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let probe_task = self.prober.start();

        let prober = self.prober.clone();
        let signal = async move {
            let _ = shutdown.recv().await;
            prober.stop();
        };

        let result = HttpServer::new(self.dispatcher).run(listener, signal).await;

        self.prober.stop();
        if let Some(task) = probe_task {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Health prober task failed");
            }
        }

        result
    }
}
