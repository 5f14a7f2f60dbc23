//! Team pages

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use rallyctl_core::models::team::DEFAULT_TEAM_BUDGET;
use rallyctl_core::{parse_number, NewTeam, ValidationError};
use serde::Deserialize;

use super::{with_notice, with_warning, NoticeQuery};
use crate::db::TeamRepo;
use crate::http::error::PageError;
use crate::http::server::AppState;
use crate::http::views::{self, Banner};

const TITLE: &str = "Teams";
const PATH: &str = "/teams";

/// Raw "Add new team" form; kept as text so it can be re-rendered as typed.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamForm {
    #[serde(default)]
    pub team_name: String,
    #[serde(default)]
    pub members: String,
    #[serde(default)]
    pub budget: String,
}

impl Default for TeamForm {
    fn default() -> Self {
        Self {
            team_name: String::new(),
            members: String::new(),
            budget: DEFAULT_TEAM_BUDGET.to_string(),
        }
    }
}

impl TeamForm {
    pub fn validate(&self) -> Result<NewTeam, ValidationError> {
        let budget = parse_number("Initial budget", &self.budget)?;
        NewTeam::new(&self.team_name, &self.members, budget)
    }
}

/// GET /teams
async fn list_teams(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NoticeQuery>,
) -> Result<Html<String>, PageError> {
    let session = state.session.lock().await;
    let teams = TeamRepo::new(&session)
        .list()
        .await
        .map_err(PageError::db(TITLE, PATH))?;

    Ok(Html(views::teams_page(
        &teams,
        &TeamForm::default(),
        query.banner().as_ref(),
    )))
}

/// POST /teams
async fn create_team(
    State(state): State<Arc<AppState>>,
    Form(form): Form<TeamForm>,
) -> Result<Response, PageError> {
    let session = state.session.lock().await;
    let repo = TeamRepo::new(&session);

    let team = match form.validate() {
        Ok(team) => team,
        Err(err) => {
            let teams = repo.list().await.map_err(PageError::db(TITLE, PATH))?;
            let html = views::teams_page(&teams, &form, Some(&Banner::error(err.to_string())));
            return Ok((StatusCode::BAD_REQUEST, Html(html)).into_response());
        }
    };

    repo.add(&team).await.map_err(PageError::db(TITLE, PATH))?;
    tracing::info!(team = %team.name(), "team added");

    let notice = format!("Team '{}' added.", team.name());
    Ok(Redirect::to(&with_notice(PATH, &notice)).into_response())
}

/// POST /teams/{id}/delete
async fn delete_team(
    State(state): State<Arc<AppState>>,
    Path(team_id): Path<i64>,
) -> Result<Redirect, PageError> {
    let session = state.session.lock().await;
    let deleted = TeamRepo::new(&session)
        .delete(team_id)
        .await
        .map_err(PageError::db(TITLE, PATH))?;

    let target = if deleted == 0 {
        with_warning(PATH, &format!("Team {team_id} not found."))
    } else {
        tracing::info!(team_id, "team deleted");
        with_notice(PATH, &format!("Team {team_id} deleted."))
    };
    Ok(Redirect::to(&target))
}

/// Team routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/teams", get(list_teams).post(create_team))
        .route("/teams/{id}/delete", post(delete_team))
}
