//! Console logging for rallyctl
//!
//! Usage:
//!   rallyctl --debug ...                       # debug logging
//!   RUST_LOG=rallyctl_server=debug rallyctl    # fine-grained control
//!
//! Logs go to stderr so command output on stdout stays clean.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Tracing configuration options
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Use the debug level unless RUST_LOG is set
    pub debug: bool,
}

pub fn init_tracing(config: &TracingConfig) -> Result<()> {
    let default_level = if config.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.debug)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}
