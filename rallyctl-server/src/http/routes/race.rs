//! Race page: settings form, eligible cars and the outcome of a run

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Form, Router,
};
use rallyctl_core::{parse_number, RaceDefaults, RaceSettings, TrackCatalog, ValidationError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

use crate::db::{Car, CarRepo, DbError, Session, TeamRepo};
use crate::http::error::PageError;
use crate::http::server::AppState;
use crate::http::views::{self, Banner};
use crate::race::{run_race, RaceError, RaceOutcome};

const TITLE: &str = "Rally Race";
const PATH: &str = "/race";

/// Raw race settings form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RaceForm {
    #[serde(default)]
    pub track: String,
    #[serde(default)]
    pub fee: String,
    #[serde(default)]
    pub prize: String,
}

impl RaceForm {
    /// Form prefilled from configured defaults, first track selected.
    pub fn with_defaults(defaults: &RaceDefaults, catalog: &TrackCatalog) -> Self {
        Self {
            track: catalog.iter().next().map(|t| t.name.clone()).unwrap_or_default(),
            fee: defaults.fee.to_string(),
            prize: defaults.prize.to_string(),
        }
    }

    pub fn validate(&self, catalog: &TrackCatalog) -> Result<RaceSettings, ValidationError> {
        RaceSettings::new(
            &self.track,
            parse_number("Participation fee", &self.fee)?,
            parse_number("Winner prize", &self.prize)?,
            catalog,
        )
    }
}

/// Cars whose team exists; only these start.
fn eligible(cars: Vec<Car>, team_ids: &HashSet<i64>) -> Vec<Car> {
    cars.into_iter()
        .filter(|c| c.team_id.is_some_and(|id| team_ids.contains(&id)))
        .collect()
}

async fn render(
    session: &Session,
    state: &AppState,
    form: &RaceForm,
    outcome: Option<&RaceOutcome>,
    banner: Option<&Banner>,
) -> Result<String, DbError> {
    let teams = TeamRepo::new(session).list().await?;
    let team_ids: HashSet<i64> = teams.iter().map(|t| t.team_id).collect();
    let cars = eligible(CarRepo::new(session).list().await?, &team_ids);

    // No banner of our own when a run already produced one
    let no_cars = (banner.is_none() && cars.is_empty())
        .then(|| Banner::warning("No cars available. Add cars first."));

    Ok(views::race_page(
        &state.config.tracks,
        form,
        &cars,
        &teams,
        outcome,
        banner.or(no_cars.as_ref()),
    ))
}

/// GET /race
async fn race_form(State(state): State<Arc<AppState>>) -> Result<Html<String>, PageError> {
    let form = RaceForm::with_defaults(&state.config.race, &state.config.tracks);
    let session = state.session.lock().await;
    let html = render(&session, &state, &form, None, None)
        .await
        .map_err(PageError::db(TITLE, PATH))?;
    Ok(Html(html))
}

/// POST /race - run a race and show its results
async fn start_race(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RaceForm>,
) -> Result<Response, PageError> {
    let mut session = state.session.lock().await;

    let settings = match form.validate(&state.config.tracks) {
        Ok(settings) => settings,
        Err(err) => {
            let banner = Banner::error(err.to_string());
            let html = render(&session, &state, &form, None, Some(&banner))
                .await
                .map_err(PageError::db(TITLE, PATH))?;
            return Ok((StatusCode::BAD_REQUEST, Html(html)).into_response());
        }
    };

    let mut rng = StdRng::from_entropy();
    let (outcome, banner) =
        match run_race(&mut session, &settings, &state.config.race, &mut rng).await {
            Ok(outcome) => {
                let banner = Banner::success(outcome.summary());
                (Some(outcome), banner)
            }
            Err(RaceError::NoEligibleCars) => (
                None,
                Banner::warning(RaceError::NoEligibleCars.to_string()),
            ),
            Err(RaceError::Db(e)) => return Err(PageError::db(TITLE, PATH)(e)),
            Err(e @ RaceError::MissingRaceId) => {
                return Err(PageError::new(
                    StatusCode::BAD_GATEWAY,
                    TITLE,
                    PATH,
                    e.to_string(),
                ))
            }
        };

    let html = render(&session, &state, &form, outcome.as_ref(), Some(&banner))
        .await
        .map_err(PageError::db(TITLE, PATH))?;
    Ok(Html(html).into_response())
}

/// Race routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/race", get(race_form).post(start_race))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_prefill_the_form() {
        let form = RaceForm::with_defaults(&RaceDefaults::default(), &TrackCatalog::default());
        assert_eq!(form.track, "Asphalt Sprint");
        assert_eq!(form.fee, "1000");
        assert_eq!(form.prize, "5000");
        assert!(form.validate(&TrackCatalog::default()).is_ok());
    }

    #[test]
    fn unknown_track_is_rejected() {
        let form = RaceForm {
            track: "Moon Base".into(),
            fee: "1".into(),
            prize: "1".into(),
        };
        assert_eq!(
            form.validate(&TrackCatalog::default()).unwrap_err().to_string(),
            "unknown track: 'Moon Base'"
        );
    }
}
