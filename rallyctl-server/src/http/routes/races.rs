//! Race history pages

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};

use super::NoticeQuery;
use crate::db::RaceRepo;
use crate::http::error::PageError;
use crate::http::server::AppState;
use crate::http::views;

const TITLE: &str = "Race history";
const PATH: &str = "/races";

/// GET /races
async fn list_races(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NoticeQuery>,
) -> Result<Html<String>, PageError> {
    let session = state.session.lock().await;
    let races = RaceRepo::new(&session)
        .list()
        .await
        .map_err(PageError::db(TITLE, PATH))?;
    Ok(Html(views::races_page(&races, query.banner().as_ref())))
}

/// GET /races/{id}
async fn race_results(
    State(state): State<Arc<AppState>>,
    Path(race_id): Path<i64>,
) -> Result<Html<String>, PageError> {
    let session = state.session.lock().await;
    let results = RaceRepo::new(&session)
        .results(race_id)
        .await
        .map_err(PageError::db(TITLE, PATH))?;
    if results.is_empty() {
        return Err(PageError::new(
            StatusCode::NOT_FOUND,
            TITLE,
            PATH,
            format!("Race {race_id} not found."),
        ));
    }
    Ok(Html(views::race_detail_page(race_id, &results)))
}

/// Race history routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/races", get(list_races))
        .route("/races/{id}", get(race_results))
}
