//! rallyctl-server: warehouse session, rally data access and web UI
//!
//! - `db`: Snowflake session client, transactions and repositories
//! - `race`: simulate a race and book its results and budgets
//! - `http`: axum pages and JSON API

pub mod db;
pub mod http;
pub mod race;

pub use db::{DbError, Session, Transaction};
pub use http::{build_router, run_server, AppState, ServerError, WarehouseInfo};
pub use race::{run_race, BudgetChange, RaceError, RaceOutcome};
