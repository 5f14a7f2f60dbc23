//! Car pages

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use rallyctl_core::models::car::{DEFAULT_ACCELERATION, DEFAULT_BASE_SPEED_KMH, DEFAULT_DURABILITY};
use rallyctl_core::{parse_id, parse_number, NewCar, ValidationError};
use serde::Deserialize;

use super::{with_notice, with_warning, NoticeQuery};
use crate::db::{CarRepo, DbError, Session, TeamRepo};
use crate::http::error::PageError;
use crate::http::server::AppState;
use crate::http::views::{self, Banner};

const TITLE: &str = "Cars";
const PATH: &str = "/cars";

/// Raw "Add new car" form
#[derive(Debug, Clone, Deserialize)]
pub struct CarForm {
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub car_name: String,
    #[serde(default)]
    pub speed: String,
    #[serde(default)]
    pub durability: String,
    #[serde(default)]
    pub acceleration: String,
}

impl Default for CarForm {
    fn default() -> Self {
        Self {
            team_id: String::new(),
            car_name: String::new(),
            speed: DEFAULT_BASE_SPEED_KMH.to_string(),
            durability: format!("{DEFAULT_DURABILITY:.2}"),
            acceleration: format!("{DEFAULT_ACCELERATION:.2}"),
        }
    }
}

impl CarForm {
    pub fn validate(&self) -> Result<NewCar, ValidationError> {
        NewCar::new(
            &self.car_name,
            parse_id("Team", &self.team_id)?,
            parse_number("Base speed", &self.speed)?,
            parse_number("Durability", &self.durability)?,
            parse_number("Acceleration", &self.acceleration)?,
        )
    }
}

async fn render(
    session: &Session,
    form: &CarForm,
    banner: Option<&Banner>,
) -> Result<String, DbError> {
    let teams = TeamRepo::new(session).list().await?;
    let cars = CarRepo::new(session).list().await?;
    Ok(views::cars_page(&cars, &teams, form, banner))
}

/// GET /cars
async fn list_cars(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NoticeQuery>,
) -> Result<Html<String>, PageError> {
    let session = state.session.lock().await;
    let html = render(&session, &CarForm::default(), query.banner().as_ref())
        .await
        .map_err(PageError::db(TITLE, PATH))?;
    Ok(Html(html))
}

/// POST /cars
async fn create_car(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CarForm>,
) -> Result<Response, PageError> {
    let session = state.session.lock().await;

    let team_ids = TeamRepo::new(&session)
        .list()
        .await
        .map_err(PageError::db(TITLE, PATH))?
        .into_iter()
        .map(|t| t.team_id)
        .collect::<Vec<_>>();

    // The select box can be stale: the team may have been deleted since
    let validated = form.validate().and_then(|car| {
        if team_ids.contains(&car.team_id()) {
            Ok(car)
        } else {
            Err(ValidationError::UnknownChoice {
                field: "team",
                value: car.team_id().to_string(),
            })
        }
    });

    let car = match validated {
        Ok(car) => car,
        Err(err) => {
            let html = render(&session, &form, Some(&Banner::error(err.to_string())))
                .await
                .map_err(PageError::db(TITLE, PATH))?;
            return Ok((StatusCode::BAD_REQUEST, Html(html)).into_response());
        }
    };

    CarRepo::new(&session)
        .add(&car)
        .await
        .map_err(PageError::db(TITLE, PATH))?;
    tracing::info!(car = %car.name(), team_id = car.team_id(), "car added");

    let notice = format!("Car '{}' added.", car.name());
    Ok(Redirect::to(&with_notice(PATH, &notice)).into_response())
}

/// POST /cars/{id}/delete
async fn delete_car(
    State(state): State<Arc<AppState>>,
    Path(car_id): Path<i64>,
) -> Result<Redirect, PageError> {
    let session = state.session.lock().await;
    let deleted = CarRepo::new(&session)
        .delete(car_id)
        .await
        .map_err(PageError::db(TITLE, PATH))?;

    let target = if deleted == 0 {
        with_warning(PATH, &format!("Car {car_id} not found."))
    } else {
        tracing::info!(car_id, "car deleted");
        with_notice(PATH, &format!("Car {car_id} deleted."))
    };
    Ok(Redirect::to(&target))
}

/// Car routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/cars", get(list_cars).post(create_car))
        .route("/cars/{id}/delete", post(delete_car))
}
