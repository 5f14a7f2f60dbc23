//! Health check endpoint

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::http::server::{AppState, WarehouseInfo};

#[derive(Debug, Serialize, PartialEq)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: String,
    /// Snowflake version reported at login
    pub server_version: Option<String>,
    /// A request currently holds the warehouse session
    pub busy: bool,
}

impl HealthResponse {
    fn new(warehouse: &WarehouseInfo, busy: bool) -> Self {
        Self {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            database: warehouse.database.clone(),
            server_version: warehouse.server_version.clone(),
            busy,
        }
    }
}

/// GET /health
///
/// Never waits for the session and sends no statement.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let busy = state.session.try_lock().is_err();
    Json(HealthResponse::new(&state.warehouse, busy))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_login_details() {
        let info = WarehouseInfo {
            database: "BOOTCAMP_RALLY".into(),
            server_version: Some("8.40.1".into()),
        };
        let body = HealthResponse::new(&info, false);
        assert_eq!(body.status, "ok");
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(body.database, "BOOTCAMP_RALLY");
        assert_eq!(body.server_version.as_deref(), Some("8.40.1"));
        assert!(!body.busy);
    }
}
