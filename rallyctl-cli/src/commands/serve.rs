//! Web UI server command

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use rallyctl_core::RallyConfig;
use rallyctl_server::run_server;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default: config file, then 127.0.0.1:8501)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,
}

/// Run the web UI until Ctrl+C or SIGTERM
pub async fn run_serve(args: ServeArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = RallyConfig::load(config_path).context("Failed to load configuration")?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    let session = super::connect().await?;
    tracing::info!(bind = %config.server.bind, database = session.database(), "starting rally dashboard");

    run_server(session, config).await.context("Server error")?;
    Ok(())
}
