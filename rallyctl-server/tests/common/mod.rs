//! In-process stand-in for the Snowflake session API.
//!
//! Records every statement with its bindings and answers from canned replies
//! matched by SQL fragment (latest registration wins; unmatched statements get
//! an empty DML success).

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use rallyctl_core::SnowflakeConfig;
use rallyctl_server::Session;
use serde_json::{json, Value};

pub const PASSWORD: &str = "s3cret";

/// One statement as received by the mock
#[derive(Debug, Clone)]
pub struct Statement {
    /// Whitespace-collapsed SQL text
    pub sql: String,
    pub bindings: Value,
}

#[derive(Default)]
struct Inner {
    logins: Vec<HashMap<String, String>>,
    logouts: usize,
    token: String,
    expire_next: bool,
    statements: Vec<Statement>,
    responders: Vec<(String, VecDeque<Reply>)>,
    pending: HashMap<String, Value>,
}

#[derive(Clone)]
enum Reply {
    Now(Value),
    /// Answer "still running" first, then serve the body from the result URL
    Later(Value),
}

#[derive(Clone)]
pub struct MockWarehouse {
    inner: Arc<Mutex<Inner>>,
    base_url: String,
}

impl MockWarehouse {
    pub async fn start() -> Self {
        let inner = Arc::new(Mutex::new(Inner::default()));
        let app = Router::new()
            .route("/session/v1/login-request", post(login))
            .route("/queries/v1/query-request", post(query))
            .route("/queries/{id}/result", get(result))
            .route("/session", post(logout))
            .with_state(Arc::clone(&inner));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            inner,
            base_url: format!("http://{addr}"),
        }
    }

    pub fn config(&self) -> SnowflakeConfig {
        SnowflakeConfig {
            user: "rally".into(),
            password: PASSWORD.into(),
            account: "xy12345.eu-west-1".into(),
            warehouse: "COMPUTE_WH".into(),
            role: "SYSADMIN".into(),
            database: "BOOTCAMP_RALLY".into(),
            base_url: Some(self.base_url.clone()),
        }
    }

    pub async fn connect(&self) -> Session {
        Session::connect(&self.config()).await.unwrap()
    }

    /// Answer statements containing `fragment` with `body`.
    pub fn respond(&self, fragment: &str, body: Value) {
        self.respond_seq(fragment, vec![body]);
    }

    /// Answer with each body in turn; the last one repeats.
    pub fn respond_seq(&self, fragment: &str, bodies: Vec<Value>) {
        let replies = bodies.into_iter().map(Reply::Now).collect();
        self.lock().responders.push((compact(fragment), replies));
    }

    /// Answer "query in progress" and serve `body` from the result URL.
    pub fn respond_later(&self, fragment: &str, body: Value) {
        let replies = VecDeque::from([Reply::Later(body)]);
        self.lock().responders.push((compact(fragment), replies));
    }

    /// The next statement fails with "session token expired".
    pub fn expire_token(&self) {
        self.lock().expire_next = true;
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.lock().statements.clone()
    }

    pub fn sql_log(&self) -> Vec<String> {
        self.statements().into_iter().map(|s| s.sql).collect()
    }

    /// The statement containing `fragment`; panics if there is none.
    pub fn statement(&self, fragment: &str) -> Statement {
        let fragment = compact(fragment);
        self.statements()
            .into_iter()
            .find(|s| s.sql.contains(&fragment))
            .unwrap_or_else(|| panic!("no statement containing {fragment:?}"))
    }

    pub fn logins(&self) -> Vec<HashMap<String, String>> {
        self.lock().logins.clone()
    }

    pub fn logouts(&self) -> usize {
        self.lock().logouts
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }
}

type Shared = Arc<Mutex<Inner>>;

async fn login(
    State(inner): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let mut inner = inner.lock().unwrap();
    inner.logins.push(params);

    if body["data"]["PASSWORD"] != PASSWORD {
        return Json(json!({
            "data": null,
            "code": "390100",
            "message": "Incorrect username or password was specified.",
            "success": false
        }));
    }

    inner.token = format!("token-{}", inner.logins.len());
    Json(json!({
        "data": {
            "token": inner.token,
            "masterToken": "master",
            "serverVersion": "8.40.1"
        },
        "code": null,
        "message": null,
        "success": true
    }))
}

async fn query(
    State(inner): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let mut inner = inner.lock().unwrap();

    let expected = format!("Snowflake Token=\"{}\"", inner.token);
    let presented = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if presented != expected {
        return Json(error_reply("390104", "08001", "Authentication token is invalid."));
    }
    if std::mem::take(&mut inner.expire_next) {
        return Json(error_reply(
            "390112",
            "08001",
            "Your session has expired. Please login again.",
        ));
    }

    let sql = compact(body["sqlText"].as_str().unwrap_or_default());
    inner.statements.push(Statement {
        sql: sql.clone(),
        bindings: body.get("bindings").cloned().unwrap_or(Value::Null),
    });

    let reply = inner
        .responders
        .iter_mut()
        .rev()
        .find(|(fragment, _)| sql.contains(fragment.as_str()))
        .map(|(_, replies)| {
            if replies.len() > 1 {
                replies.pop_front().unwrap()
            } else {
                replies[0].clone()
            }
        });

    match reply {
        Some(Reply::Now(body)) => Json(body),
        Some(Reply::Later(body)) => {
            let id = format!("q{}", inner.statements.len());
            inner.pending.insert(id.clone(), body);
            Json(json!({
                "data": {"getResultUrl": format!("/queries/{id}/result")},
                "code": "333333",
                "message": "Query execution in progress",
                "success": true
            }))
        }
        None => Json(dml(0)),
    }
}

async fn result(State(inner): State<Shared>, Path(id): Path<String>) -> Json<Value> {
    let body = inner.lock().unwrap().pending.remove(&id);
    Json(body.unwrap_or_else(|| error_reply("000605", "", "unknown query")))
}

async fn logout(State(inner): State<Shared>, Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    if params.get("delete").map(String::as_str) == Some("true") {
        inner.lock().unwrap().logouts += 1;
    }
    Json(json!({"data": null, "code": null, "message": null, "success": true}))
}

fn compact(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Result set; columns are `(name, type, scale)`.
pub fn rows(columns: &[(&str, &str, i64)], rows: &[&[Option<&str>]]) -> Value {
    let rowtype: Vec<Value> = columns
        .iter()
        .map(|(name, kind, scale)| json!({"name": name, "type": kind, "scale": scale, "nullable": true}))
        .collect();
    json!({
        "data": {
            "rowtype": rowtype,
            "rowset": rows,
            "total": rows.len(),
            "queryResultFormat": "json"
        },
        "code": null,
        "message": null,
        "success": true
    })
}

/// DML success affecting `n` rows
pub fn dml(n: u64) -> Value {
    json!({
        "data": {
            "rowtype": [{"name": "number of rows inserted", "type": "fixed", "scale": 0}],
            "rowset": [[n.to_string()]],
            "stats": {"numRowsInserted": n},
            "queryResultFormat": "json"
        },
        "code": null,
        "message": null,
        "success": true
    })
}

pub fn error_reply(code: &str, sql_state: &str, message: &str) -> Value {
    json!({
        "data": {"sqlState": sql_state},
        "code": code,
        "message": message,
        "success": false
    })
}

pub const TEAM_COLUMNS: [(&str, &str, i64); 4] = [
    ("TEAM_ID", "fixed", 0),
    ("TEAM_NAME", "text", 0),
    ("MEMBERS", "text", 0),
    ("BUDGET", "fixed", 2),
];

pub const CAR_COLUMNS: [(&str, &str, i64); 7] = [
    ("CAR_ID", "fixed", 0),
    ("CAR_NAME", "text", 0),
    ("TEAM_ID", "fixed", 0),
    ("TEAM_NAME", "text", 0),
    ("SPEED", "real", 0),
    ("DURABILITY", "real", 0),
    ("ACCELERATION", "real", 0),
];

pub const RESULT_COLUMNS: [(&str, &str, i64); 8] = [
    ("RESULT_ID", "fixed", 0),
    ("RACE_ID", "fixed", 0),
    ("CAR_ID", "fixed", 0),
    ("CAR_NAME", "text", 0),
    ("TEAM_ID", "fixed", 0),
    ("TEAM_NAME", "text", 0),
    ("TIME_TAKEN", "real", 0),
    ("POSITION", "fixed", 0),
];

/// Register the team list query.
pub fn teams(mock: &MockWarehouse, fixture: &[&[Option<&str>]]) {
    mock.respond("FROM TEAMS.TEAMS ORDER BY TEAM_ID", rows(&TEAM_COLUMNS, fixture));
}

/// Register the car list query.
pub fn cars(mock: &MockWarehouse, fixture: &[&[Option<&str>]]) {
    mock.respond("FROM CARS.CARS c LEFT JOIN", rows(&CAR_COLUMNS, fixture));
}

/// Two teams, one car each, plus a car whose team was deleted.
pub fn seed_race(mock: &MockWarehouse) {
    mock.respond_seq(
        "FROM TEAMS.TEAMS ORDER BY TEAM_ID",
        vec![
            rows(
                &TEAM_COLUMNS,
                &[
                    &[Some("1"), Some("Red"), None, Some("10000.00")],
                    &[Some("2"), Some("Blue"), None, Some("8000.00")],
                ],
            ),
            rows(
                &TEAM_COLUMNS,
                &[
                    &[Some("1"), Some("Red"), None, Some("14000.00")],
                    &[Some("2"), Some("Blue"), None, Some("7000.00")],
                ],
            ),
        ],
    );
    cars(
        mock,
        &[
            // fast car for team 1
            &[Some("10"), Some("Rocket"), Some("1"), Some("Red"), Some("400"), Some("1"), Some("1")],
            // slow car for team 2
            &[Some("11"), Some("Snail"), Some("2"), Some("Blue"), Some("120"), Some("0"), Some("0")],
            &[Some("12"), Some("Orphan"), Some("9"), None, Some("300"), Some("1"), Some("1")],
        ],
    );
    mock.respond("INSERT INTO RACES.RACES", dml(1));
    mock.respond(
        "SELECT MAX(RACE_ID)",
        rows(&[("MAX(RACE_ID)", "fixed", 0)], &[&[Some("5")]]),
    );
    mock.respond("INSERT INTO RACES.RACE_RESULTS", dml(2));
    mock.respond(
        "FROM RACES.RACE_RESULTS rr",
        rows(
            &RESULT_COLUMNS,
            &[
                &[Some("1"), Some("5"), Some("10"), Some("Rocket"), Some("1"), Some("Red"), Some("15.0"), Some("1")],
                &[Some("2"), Some("5"), Some("11"), Some("Snail"), Some("2"), Some("Blue"), Some("125.0"), Some("2")],
            ],
        ),
    );
}
