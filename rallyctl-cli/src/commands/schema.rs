//! Schema management

use anyhow::{Context, Result};
use clap::Subcommand;
use rallyctl_server::db::migrations;

#[derive(Subcommand, Debug)]
pub enum SchemaCommands {
    /// Create the database, schemas and tables if they do not exist
    Init,
}

pub async fn run_schema(command: SchemaCommands) -> Result<()> {
    match command {
        SchemaCommands::Init => {
            let session = super::connect().await?;
            let database = session.database().to_owned();
            let applied = migrations::run(&session).await;
            session.close().await.context("Failed to close Snowflake session")?;
            let applied = applied.context("Schema setup failed")?;
            println!("Schema ready in {database} ({applied} statements applied).");
        }
    }
    Ok(())
}
