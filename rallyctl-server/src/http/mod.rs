//! HTTP layer
//!
//! Axum server with:
//! - Server-rendered pages for teams, cars and races
//! - A small JSON API under `/api`
//! - Request tracing
//! - Graceful shutdown

pub mod error;
pub mod routes;
pub mod server;
pub mod views;

pub use error::{ApiError, PageError};
pub use server::{build_router, run_server, AppState, ServerError, WarehouseInfo};
