//! Command-line flags.

use std::path::PathBuf;

use clap::Parser;

use crate::config::schema::{BalancerConfig, Strategy};

/// Load balancer forwarding HTTP requests to a pool of backend servers
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Backend base URLs, e.g. http://127.0.0.1:8081
    pub backends: Vec<String>,

    /// TOML configuration file; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Time interval in seconds between health checks
    #[arg(short, long)]
    pub interval_health_check: Option<u64>,

    /// Use the least-response strategy (shorthand for --strategy least-response)
    #[arg(short, long, conflicts_with = "strategy")]
    pub dynamic: bool,

    /// Backend selection strategy
    #[arg(long, value_enum)]
    pub strategy: Option<Strategy>,

    /// Address to listen on
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Args {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, config: &mut BalancerConfig) {
        if !self.backends.is_empty() {
            config.balancer.backends = self.backends.clone();
        }
        if let Some(secs) = self.interval_health_check {
            config.health_check.interval_secs = secs;
        }
        if self.dynamic {
            config.balancer.strategy = Strategy::LeastResponse;
        } else if let Some(strategy) = self.strategy {
            config.balancer.strategy = strategy;
        }
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
    }
}
