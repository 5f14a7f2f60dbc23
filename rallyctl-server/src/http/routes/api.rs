//! Read-only JSON API for scripting
//!
//! Mounted under `/api`. Errors use the `{error, message}` body.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::db::{Car, CarRepo, Race, RaceRepo, RaceResult, Team, TeamRepo};
use crate::http::error::ApiError;
use crate::http::server::AppState;

/// GET /api/teams
async fn teams(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Team>>, ApiError> {
    let session = state.session.lock().await;
    Ok(Json(TeamRepo::new(&session).list().await?))
}

/// GET /api/cars
async fn cars(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Car>>, ApiError> {
    let session = state.session.lock().await;
    Ok(Json(CarRepo::new(&session).list().await?))
}

/// GET /api/races
async fn races(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Race>>, ApiError> {
    let session = state.session.lock().await;
    Ok(Json(RaceRepo::new(&session).list().await?))
}

/// GET /api/races/{id}/results
async fn race_results(
    State(state): State<Arc<AppState>>,
    Path(race_id): Path<i64>,
) -> Result<Json<Vec<RaceResult>>, ApiError> {
    let session = state.session.lock().await;
    let results = RaceRepo::new(&session).results(race_id).await?;
    // Every stored race has at least one result
    if results.is_empty() {
        return Err(ApiError::NotFound {
            resource: "race",
            id: race_id.to_string(),
        });
    }
    Ok(Json(results))
}

/// API routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/teams", get(teams))
        .route("/cars", get(cars))
        .route("/races", get(races))
        .route("/races/{id}/results", get(race_results))
}
