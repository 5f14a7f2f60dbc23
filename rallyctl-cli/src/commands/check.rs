//! Connection test: log in, report what the session sees, log out

use anyhow::{Context, Result};
use rallyctl_server::db::Value;
use rallyctl_server::Session;

pub async fn run_check() -> Result<()> {
    let session = super::connect().await?;

    // Report first, then always log out
    let report = report(&session).await;
    let closed = session.close().await.context("Failed to close Snowflake session");
    report?;
    closed?;

    println!("Connection closed.");
    Ok(())
}

async fn report(session: &Session) -> Result<()> {
    println!(
        "Connected to Snowflake (version {})",
        session.server_version().unwrap_or("unknown")
    );

    let row = session
        .fetch_one(
            "SELECT CURRENT_DATABASE() AS DB, CURRENT_WAREHOUSE() AS WH, CURRENT_ROLE() AS ROLE",
            &[],
        )
        .await
        .context("Failed to read session context")?;
    if let Some(row) = row {
        let field = |name: &str| -> Result<String> {
            Ok(row.get::<Option<String>>(name)?.unwrap_or_else(|| "-".into()))
        };
        println!("Database:  {}", field("DB")?);
        println!("Warehouse: {}", field("WH")?);
        println!("Role:      {}", field("ROLE")?);
    }

    for (label, table) in [("Teams", "TEAMS.TEAMS"), ("Cars", "CARS.CARS")] {
        let count = session
            .fetch_one_value(&format!("SELECT COUNT(*) FROM {table}"), &[])
            .await
            .with_context(|| format!("Failed to count {table}"))?;
        println!("{label}: {}", count.unwrap_or(Value::Integer(0)));
    }
    Ok(())
}
