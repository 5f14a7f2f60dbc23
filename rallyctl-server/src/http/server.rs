//! Axum server setup
//!
//! Server skeleton with:
//! - Tracing middleware
//! - Graceful shutdown on SIGTERM/Ctrl+C, then warehouse logout

use std::net::SocketAddr;
use std::sync::Arc;

use axum::response::Redirect;
use axum::routing::get;
use axum::Router;
use rallyctl_core::RallyConfig;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use super::routes;
use crate::db::Session;

/// Shared application state
///
/// The single warehouse session is locked for the whole of each request, so
/// requests run one at a time and a transaction is never shared.
pub struct AppState {
    pub session: Mutex<Session>,
    pub config: RallyConfig,
    /// Captured at startup so it can be read without taking the session lock
    pub warehouse: WarehouseInfo,
}

/// What the session reported at login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseInfo {
    pub database: String,
    pub server_version: Option<String>,
}

impl AppState {
    pub fn new(session: Session, config: RallyConfig) -> Self {
        let warehouse = WarehouseInfo {
            database: session.database().to_owned(),
            server_version: session.server_version().map(str::to_owned),
        };
        Self {
            session: Mutex::new(session),
            config,
            warehouse,
        }
    }
}

/// Build the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/teams") }))
        .merge(routes::health::router())
        .merge(routes::teams::router())
        .merge(routes::cars::router())
        .merge(routes::race::router())
        .merge(routes::races::router())
        .nest("/api", routes::api::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server until a shutdown signal, then close the session.
pub async fn run_server(session: Session, config: RallyConfig) -> Result<(), ServerError> {
    let bind_addr: SocketAddr = config.server.bind;
    let state = Arc::new(AppState::new(session, config));
    let app = build_router(Arc::clone(&state));

    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    match Arc::try_unwrap(state) {
        Ok(state) => {
            if let Err(err) = state.session.into_inner().close().await {
                tracing::warn!(error = %err, "warehouse logout failed");
            }
        }
        Err(_) => tracing::warn!("session still in use at shutdown, skipping logout"),
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
