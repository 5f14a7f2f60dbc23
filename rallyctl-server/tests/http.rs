//! Router tests through `tower::ServiceExt::oneshot`

mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::{dml, error_reply, MockWarehouse};
use rallyctl_core::RallyConfig;
use rallyctl_server::{build_router, AppState};
use tower::ServiceExt;

async fn app(mock: &MockWarehouse) -> Router {
    let session = mock.connect().await;
    build_router(Arc::new(AppState::new(session, RallyConfig::default())))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Option<String>, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, location, String::from_utf8(body.to_vec()).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(uri: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_owned()))
        .unwrap()
}

#[tokio::test]
async fn root_redirects_to_teams() {
    let mock = MockWarehouse::start().await;
    let (status, location, _) = send(app(&mock).await, get("/")).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/teams"));
}

#[tokio::test]
async fn health_reports_session_without_querying() {
    let mock = MockWarehouse::start().await;
    let (status, _, body) = send(app(&mock).await, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"], "BOOTCAMP_RALLY");
    assert_eq!(json["server_version"], "8.40.1");
    assert_eq!(json["busy"], false);
    assert!(mock.statements().is_empty());
}

#[tokio::test]
async fn teams_page_lists_teams_and_notice() {
    let mock = MockWarehouse::start().await;
    common::teams(&mock, &[&[Some("1"), Some("Red Devils"), Some("Alice,Bob"), Some("10000.00")]]);

    let (status, _, body) = send(
        app(&mock).await,
        get("/teams?notice=Team%20%27Red%20Devils%27%20added."),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Add new team"));
    assert!(body.contains("<td>Red Devils</td>"));
    assert!(body.contains("Team &#x27;Red Devils&#x27; added."));
    assert!(body.contains(r#"name="budget" type="number" min="0" step="1000" value="10000""#));
}

#[tokio::test]
async fn adding_a_team_redirects_with_notice() {
    let mock = MockWarehouse::start().await;
    mock.respond("INSERT INTO TEAMS.TEAMS", dml(1));

    let (status, location, _) = send(
        app(&mock).await,
        post_form("/teams", "team_name=Red+Devils&members=Alice%2CBob&budget=10000"),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(
        location.as_deref(),
        Some("/teams?notice=Team%20%27Red%20Devils%27%20added.")
    );

    let stmt = mock.statement("INSERT INTO TEAMS.TEAMS");
    assert_eq!(stmt.bindings["1"]["value"], "Red Devils");
    assert_eq!(stmt.bindings["2"]["value"], "Alice,Bob");
}

#[tokio::test]
async fn invalid_team_is_rejected_with_message() {
    let mock = MockWarehouse::start().await;
    common::teams(&mock, &[]);

    let (status, _, body) = send(
        app(&mock).await,
        post_form("/teams", "team_name=+++&members=&budget=10000"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Team name is required."));
    assert!(!mock.sql_log().iter().any(|s| s.starts_with("INSERT")));
}

#[tokio::test]
async fn warehouse_error_becomes_banner() {
    let mock = MockWarehouse::start().await;
    mock.respond(
        "FROM TEAMS.TEAMS",
        error_reply(
            "002003",
            "42S02",
            "SQL compilation error: Object 'TEAMS.TEAMS' does not exist or not authorized.",
        ),
    );

    let (status, _, body) = send(app(&mock).await, get("/teams")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains(r#"class="banner error""#));
    assert!(body.contains("does not exist or not authorized."));
}

#[tokio::test]
async fn cars_page_needs_a_team() {
    let mock = MockWarehouse::start().await;
    common::teams(&mock, &[]);
    common::cars(&mock, &[]);

    let (status, _, body) = send(app(&mock).await, get("/cars")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Create a team first."));
}

#[tokio::test]
async fn adding_a_car_binds_selected_team() {
    let mock = MockWarehouse::start().await;
    common::teams(&mock, &[&[Some("3"), Some("Red"), None, Some("10000")]]);
    mock.respond("INSERT INTO CARS.CARS", dml(1));

    let (status, location, _) = send(
        app(&mock).await,
        post_form(
            "/cars",
            "team_id=3&car_name=Bolt&speed=220&durability=0.85&acceleration=0.90",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert!(location.unwrap().starts_with("/cars?notice="));
    assert_eq!(mock.statement("INSERT INTO CARS.CARS").bindings["2"]["value"], "3");
}

#[tokio::test]
async fn car_for_a_deleted_team_is_rejected() {
    let mock = MockWarehouse::start().await;
    common::teams(&mock, &[&[Some("1"), Some("Red"), None, Some("10000")]]);
    common::cars(&mock, &[]);

    let (status, _, body) = send(
        app(&mock).await,
        post_form(
            "/cars",
            "team_id=3&car_name=Bolt&speed=220&durability=0.85&acceleration=0.90",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains(r#"class="banner error""#));
    assert!(body.contains("unknown team: &#x27;3&#x27;"));
    assert!(!mock.sql_log().iter().any(|s| s.starts_with("INSERT")));
}

#[tokio::test]
async fn deleting_a_missing_car_warns() {
    let mock = MockWarehouse::start().await;
    mock.respond("DELETE FROM CARS.CARS", dml(0));

    let (status, location, _) = send(app(&mock).await, post_form("/cars/42/delete", "")).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/cars?warning=Car%2042%20not%20found."));
}

#[tokio::test]
async fn race_without_cars_warns() {
    let mock = MockWarehouse::start().await;
    common::teams(&mock, &[&[Some("1"), Some("Red"), None, Some("10000")]]);
    common::cars(&mock, &[]);

    let (status, _, body) = send(
        app(&mock).await,
        post_form("/race", "track=Forest+Run&fee=1000&prize=5000"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No cars available. Add cars first."));
    assert!(!mock.sql_log().iter().any(|s| s == "BEGIN"));
}

#[tokio::test]
async fn race_page_shows_settings() {
    let mock = MockWarehouse::start().await;
    common::teams(&mock, &[]);
    common::cars(&mock, &[]);

    let (status, _, body) = send(app(&mock).await, get("/race")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Mountain Pass"));
    assert!(body.contains("Steep climbs, tricky"));
    assert!(body.contains(r#"name="fee" type="number" min="0" step="100" value="1000""#));
}

#[tokio::test]
async fn api_lists_teams_as_json() {
    let mock = MockWarehouse::start().await;
    common::teams(&mock, &[&[Some("1"), Some("Red"), None, Some("10000.00")]]);

    let (status, _, body) = send(app(&mock).await, get("/api/teams")).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            {"team_id": 1, "team_name": "Red", "members": null, "budget": 10000.0}
        ])
    );
}

#[tokio::test]
async fn api_errors_are_json() {
    let mock = MockWarehouse::start().await;
    mock.respond("FROM CARS.CARS", error_reply("002003", "42S02", "no such table"));

    let (status, _, body) = send(app(&mock).await, get("/api/cars")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"], "database_error");
    assert_eq!(json["message"], "002003 (42S02): no such table");
}

#[tokio::test]
async fn unknown_race_is_not_found() {
    let mock = MockWarehouse::start().await;
    mock.respond("FROM RACES.RACE_RESULTS rr", common::rows(&common::RESULT_COLUMNS, &[]));

    let (status, _, body) = send(app(&mock).await, get("/api/races/99/results")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"], "not_found");

    let (status, _, body) = send(app(&mock).await, get("/races/99")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Race 99 not found."));
}

#[tokio::test]
async fn race_run_renders_results_and_budgets() {
    let mock = MockWarehouse::start().await;
    common::seed_race(&mock);

    let (status, _, body) = send(
        app(&mock).await,
        post_form("/race", "track=Asphalt+Sprint&fee=1000&prize=5000"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"class="banner success""#));
    assert!(body.contains("Race 5 finished! Winner: Red"));

    assert!(body.contains("Race results (minutes, lower is better)"));
    assert!(body.contains(
        r#"<tr><td class="num">1</td><td>Rocket</td><td>Red</td><td class="num">15.000</td></tr>"#
    ));
    assert!(body.contains(
        r#"<tr><td class="num">2</td><td>Snail</td><td>Blue</td><td class="num">125.000</td></tr>"#
    ));

    assert!(body.contains("Budgets (before/after race)"));
    assert!(body.contains(
        r#"<tr><td>Blue</td><td class="num">8000.00</td><td class="num">7000.00</td><td class="num">-1000.00</td></tr>"#
    ));
    assert!(body.contains(
        r#"<tr><td>Red</td><td class="num">10000.00</td><td class="num">14000.00</td><td class="num">+4000.00</td></tr>"#
    ));
    assert!(mock.sql_log().iter().any(|s| s == "COMMIT"));
}
