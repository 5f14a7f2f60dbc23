//! Subcommand implementations

pub mod check;
pub mod race;
pub mod schema;
pub mod serve;

pub use check::run_check;
pub use race::{run_race, RaceArgs};
pub use schema::{run_schema, SchemaCommands};
pub use serve::{run_serve, ServeArgs};

use anyhow::{Context, Result};
use rallyctl_core::SnowflakeConfig;
use rallyctl_server::Session;

/// Read credentials from the environment and log in.
pub(crate) async fn connect() -> Result<Session> {
    let config = SnowflakeConfig::from_env().context("Snowflake credentials are incomplete")?;
    tracing::debug!(?config, "connecting to warehouse");
    Session::connect(&config)
        .await
        .with_context(|| format!("Failed to connect to Snowflake account '{}'", config.account))
}
