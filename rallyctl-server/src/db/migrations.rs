//! Schema bootstrap for the rally tables
//!
//! Idempotent: every statement uses `IF NOT EXISTS`, so running it against an
//! existing database changes nothing.

use super::{DbError, Session};

/// Schemas holding the rally tables
pub const SCHEMAS: [&str; 3] = ["TEAMS", "CARS", "RACES"];

const TABLES: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS TEAMS.TEAMS (
        TEAM_ID NUMBER AUTOINCREMENT START 1 INCREMENT 1 PRIMARY KEY,
        TEAM_NAME VARCHAR(128) NOT NULL,
        MEMBERS VARCHAR,
        BUDGET NUMBER(12, 2) DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS CARS.CARS (
        CAR_ID NUMBER AUTOINCREMENT START 1 INCREMENT 1 PRIMARY KEY,
        CAR_NAME VARCHAR(128) NOT NULL,
        TEAM_ID NUMBER,
        SPEED FLOAT,
        DURABILITY FLOAT,
        ACCELERATION FLOAT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS RACES.RACES (
        RACE_ID NUMBER AUTOINCREMENT START 1 INCREMENT 1 PRIMARY KEY,
        TRACK_NAME VARCHAR NOT NULL,
        WINNER_TEAM_ID NUMBER,
        CREATED_AT TIMESTAMP_NTZ DEFAULT CURRENT_TIMESTAMP()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS RACES.RACE_RESULTS (
        RESULT_ID NUMBER AUTOINCREMENT START 1 INCREMENT 1 PRIMARY KEY,
        RACE_ID NUMBER NOT NULL,
        CAR_ID NUMBER NOT NULL,
        TIME_TAKEN FLOAT,
        POSITION NUMBER
    )
    "#,
];

/// Create the database, schemas and tables if missing.
///
/// Returns the number of statements executed.
pub async fn run(session: &Session) -> Result<usize, DbError> {
    let database = session.database();
    tracing::info!(%database, "creating rally schema");

    let mut statements = vec![
        format!("CREATE DATABASE IF NOT EXISTS {database}"),
        format!("USE DATABASE {database}"),
    ];
    statements.extend(
        SCHEMAS
            .iter()
            .map(|schema| format!("CREATE SCHEMA IF NOT EXISTS {database}.{schema}")),
    );
    statements.extend(TABLES.iter().map(|sql| sql.to_string()));

    // One statement per request; multi-statement text is rejected by default
    for sql in &statements {
        session.execute(sql, &[]).await?;
    }

    tracing::info!(statements = statements.len(), "rally schema ready");
    Ok(statements.len())
}
