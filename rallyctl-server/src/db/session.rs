//! Warehouse session management
//!
//! One `Session` is one authenticated Snowflake session. Statements are sent
//! with `?` placeholders and server-side bindings, never string interpolation.
//!
//! Outside a transaction every statement autocommits. `Session::begin` borrows
//! the session mutably and hands out a `Transaction` guard; all data access
//! functions work through the guard via `Deref<Target = Session>`.

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use rallyctl_core::SnowflakeConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde_json::json;
use uuid::Uuid;

use super::error::DbError;
use super::protocol::{
    Binding, BindingValue, Bindings, LoginRequest, LoginRequestData, LoginResponse, QueryData,
    QueryRequest, QueryResponse, QUERY_IN_PROGRESS, QUERY_IN_PROGRESS_ASYNC, SESSION_EXPIRED,
};
use super::value::{decode_rows, Row, Value};

const CLIENT_APP_ID: &str = "rallyctl";

/// Per-request HTTP timeout; long queries are polled instead
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Upper bound on the poll interval for long-running queries
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// An authenticated warehouse session
pub struct Session {
    http: reqwest::Client,
    config: SnowflakeConfig,
    base_url: String,
    token: RwLock<String>,
    server_version: Option<String>,
    sequence: AtomicU64,
    /// Set when a `Transaction` was dropped without commit/rollback
    needs_rollback: AtomicBool,
    /// Set while a `Transaction` guard is alive
    in_transaction: AtomicBool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url)
            .field("user", &self.config.user)
            .field("database", &self.config.database)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Open a session with user/password authentication.
    ///
    /// # Errors
    ///
    /// `DbError::Auth` when the warehouse rejects the credentials,
    /// `DbError::Http` when it cannot be reached.
    pub async fn connect(config: &SnowflakeConfig) -> Result<Self, DbError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base_url = config.base_url();

        let (token, server_version) = login(&http, &base_url, config).await?;
        tracing::info!(
            account = %config.account,
            user = %config.user,
            database = %config.database,
            warehouse = %config.warehouse,
            "warehouse session opened"
        );

        Ok(Self {
            http,
            config: config.clone(),
            base_url,
            token: RwLock::new(token),
            server_version,
            sequence: AtomicU64::new(0),
            needs_rollback: AtomicBool::new(false),
            in_transaction: AtomicBool::new(false),
        })
    }

    /// Server version reported at login, if any
    pub fn server_version(&self) -> Option<&str> {
        self.server_version.as_deref()
    }

    /// Database the session was opened against
    pub fn database(&self) -> &str {
        &self.config.database
    }

    /// Log out and release the server-side session.
    pub async fn close(self) -> Result<(), DbError> {
        self.flush_pending_rollback().await;

        let request_id = Uuid::new_v4().to_string();
        let response = self
            .http
            .post(format!("{}/session", self.base_url))
            .query(&[("delete", "true"), ("request_id", request_id.as_str())])
            .headers(self.auth_headers()?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DbError::Status {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        tracing::info!("warehouse session closed");
        Ok(())
    }

    /// Run a query and return all rows.
    pub async fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DbError> {
        let data = self.run(sql, scalar_bindings(params)).await?;
        decode_rows(&data.rowtype, data.rowset)
    }

    /// Run a query and return the first row, if any.
    pub async fn fetch_one(&self, sql: &str, params: &[Value]) -> Result<Option<Row>, DbError> {
        Ok(self.fetch_all(sql, params).await?.into_iter().next())
    }

    /// First column of the first row. `None` for no rows or SQL NULL.
    pub async fn fetch_one_value(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<Option<Value>, DbError> {
        let first = self
            .fetch_one(sql, params)
            .await?
            .and_then(|row| row.values().first().cloned());
        Ok(first.filter(|v| !v.is_null()))
    }

    /// Run a DML statement and return the affected row count.
    pub async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, DbError> {
        let data = self.run(sql, scalar_bindings(params)).await?;
        Ok(data.affected_rows())
    }

    /// Run the same statement for every parameter row using array binding.
    ///
    /// Returns the total affected row count. An empty batch is a no-op.
    pub async fn execute_many(&self, sql: &str, batch: &[Vec<Value>]) -> Result<u64, DbError> {
        if batch.is_empty() {
            return Ok(0);
        }
        let bindings = array_bindings(batch)?;
        let data = self.run(sql, Some(bindings)).await?;
        Ok(data.affected_rows())
    }

    /// Start a transaction. Statements autocommit again once it ends.
    pub async fn begin(&mut self) -> Result<Transaction<'_>, DbError> {
        self.execute("BEGIN", &[]).await?;
        self.in_transaction.store(true, Ordering::SeqCst);
        tracing::debug!("transaction started");
        Ok(Transaction {
            session: self,
            finished: false,
        })
    }

    /// Submit a statement, re-authenticating once if the token expired.
    ///
    /// Inside a transaction the expiry is returned as is: a fresh session
    /// would run the statement outside the open transaction.
    async fn run(&self, sql: &str, bindings: Option<Bindings>) -> Result<QueryData, DbError> {
        self.flush_pending_rollback().await;

        match self.submit(sql, bindings.as_ref()).await {
            Err(err)
                if err.code() == Some(SESSION_EXPIRED)
                    && !self.in_transaction.load(Ordering::SeqCst) =>
            {
                tracing::warn!("session token expired, logging in again");
                self.relogin().await?;
                self.submit(sql, bindings.as_ref()).await
            }
            other => other,
        }
    }

    async fn submit(&self, sql: &str, bindings: Option<&Bindings>) -> Result<QueryData, DbError> {
        let sequence_id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let request = QueryRequest {
            sql_text: sql,
            async_exec: false,
            sequence_id,
            is_internal: false,
            bindings,
        };
        tracing::debug!(sequence_id, sql = %compact_sql(sql), "submitting statement");

        let response = self
            .http
            .post(format!("{}/queries/v1/query-request", self.base_url))
            .query(&[("requestId", Uuid::new_v4().to_string())])
            .headers(self.auth_headers()?)
            .json(&request)
            .send()
            .await?;

        let mut body = read_query_response(response).await?;
        let mut delay = Duration::from_millis(250);

        while matches!(
            body.code.as_deref(),
            Some(QUERY_IN_PROGRESS) | Some(QUERY_IN_PROGRESS_ASYNC)
        ) {
            let url = body
                .data
                .as_ref()
                .and_then(|d| d.get_result_url.clone())
                .ok_or_else(|| DbError::Unsupported("query in progress without result URL".into()))?;
            tracing::debug!(%url, ?delay, "query still running, polling");
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(MAX_POLL_INTERVAL);

            let response = self
                .http
                .get(format!("{}{}", self.base_url, url))
                .headers(self.auth_headers()?)
                .send()
                .await?;
            body = read_query_response(response).await?;
        }

        into_data(body)
    }

    async fn relogin(&self) -> Result<(), DbError> {
        let (token, _) = login(&self.http, &self.base_url, &self.config).await?;
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = token;
        Ok(())
    }

    /// Roll back a transaction abandoned by a dropped guard before running anything else.
    async fn flush_pending_rollback(&self) {
        if self.needs_rollback.swap(false, Ordering::SeqCst) {
            tracing::warn!("rolling back abandoned transaction");
            if let Err(err) = self.submit("ROLLBACK", None).await {
                tracing::error!(error = %err, "rollback of abandoned transaction failed");
            }
        }
    }

    fn auth_headers(&self) -> Result<HeaderMap, DbError> {
        let token = self.token.read().unwrap_or_else(|e| e.into_inner()).clone();
        let mut headers = HeaderMap::with_capacity(3);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth = HeaderValue::from_str(&format!("Snowflake Token=\"{token}\""))
            .map_err(|_| DbError::Unsupported("session token is not a valid header value".into()))?;
        headers.insert(AUTHORIZATION, auth);
        Ok(headers)
    }
}

/// A transaction on a borrowed session.
///
/// Dropping the guard without `commit` or `rollback` schedules a rollback that
/// runs before the session's next statement.
pub struct Transaction<'a> {
    session: &'a mut Session,
    finished: bool,
}

impl Transaction<'_> {
    pub async fn commit(mut self) -> Result<(), DbError> {
        self.session.execute("COMMIT", &[]).await?;
        self.finish();
        tracing::debug!("transaction committed");
        Ok(())
    }

    pub async fn rollback(mut self) -> Result<(), DbError> {
        self.session.execute("ROLLBACK", &[]).await?;
        self.finish();
        tracing::debug!("transaction rolled back");
        Ok(())
    }

    fn finish(&mut self) {
        self.finished = true;
        self.session.in_transaction.store(false, Ordering::SeqCst);
    }
}

impl Deref for Transaction<'_> {
    type Target = Session;

    fn deref(&self) -> &Session {
        self.session
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("transaction dropped without commit or rollback");
            self.session.in_transaction.store(false, Ordering::SeqCst);
            self.session.needs_rollback.store(true, Ordering::SeqCst);
        }
    }
}

async fn login(
    http: &reqwest::Client,
    base_url: &str,
    config: &SnowflakeConfig,
) -> Result<(String, Option<String>), DbError> {
    // Login takes the bare account locator, without region/cloud suffix
    let account_name = config.account.split('.').next().unwrap_or(&config.account);

    let session_parameters = HashMap::from([
        ("AUTOCOMMIT", json!(true)),
        ("CLIENT_SESSION_KEEP_ALIVE", json!(true)),
    ]);
    let request = LoginRequest {
        data: LoginRequestData {
            client_app_id: CLIENT_APP_ID,
            client_app_version: env!("CARGO_PKG_VERSION"),
            account_name,
            login_name: &config.user,
            password: &config.password,
            session_parameters,
        },
    };

    let response = http
        .post(format!("{base_url}/session/v1/login-request"))
        .query(&[
            ("request_id", Uuid::new_v4().to_string()),
            ("databaseName", config.database.clone()),
            ("warehouse", config.warehouse.clone()),
            ("roleName", config.role.clone()),
        ])
        .header(ACCEPT, "application/json")
        .header(USER_AGENT, concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(DbError::Status {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        });
    }

    let body: LoginResponse = response.json().await?;
    let token = body
        .data
        .as_ref()
        .and_then(|d| d.token.clone())
        .filter(|_| body.success);

    match token {
        Some(token) => Ok((token, body.data.and_then(|d| d.server_version))),
        None => Err(DbError::Auth {
            code: body.code.unwrap_or_else(|| "unknown".into()),
            message: body.message.unwrap_or_else(|| "login rejected".into()),
        }),
    }
}

async fn read_query_response(response: reqwest::Response) -> Result<QueryResponse, DbError> {
    let status = response.status();
    if !status.is_success() {
        return Err(DbError::Status {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        });
    }
    Ok(response.json().await?)
}

fn into_data(body: QueryResponse) -> Result<QueryData, DbError> {
    if !body.success {
        let data = body.data.unwrap_or_default();
        return Err(DbError::Snowflake {
            code: body.code.unwrap_or_else(|| "unknown".into()),
            sql_state: data.sql_state.unwrap_or_default(),
            message: body.message.unwrap_or_else(|| "statement failed".into()),
        });
    }

    let data = body.data.unwrap_or_default();
    if let Some(format) = &data.query_result_format {
        if !format.eq_ignore_ascii_case("json") {
            return Err(DbError::Unsupported(format!("result format '{format}'")));
        }
    }
    if !data.chunks.is_empty() {
        return Err(DbError::Unsupported(format!(
            "result set split into {} remote chunks",
            data.chunks.len()
        )));
    }
    Ok(data)
}

fn scalar_bindings(params: &[Value]) -> Option<Bindings> {
    if params.is_empty() {
        return None;
    }
    let bindings = params
        .iter()
        .enumerate()
        .map(|(idx, value)| {
            let binding = Binding {
                kind: value.binding_type(),
                value: BindingValue::Single(value.to_wire()),
            };
            ((idx + 1).to_string(), binding)
        })
        .collect();
    Some(bindings)
}

/// Column-major bindings for a batch; each column's type comes from its first non-null value.
fn array_bindings(batch: &[Vec<Value>]) -> Result<Bindings, DbError> {
    let width = batch[0].len();
    if let Some(bad) = batch.iter().position(|row| row.len() != width) {
        return Err(DbError::Unsupported(format!(
            "batch row {bad} has a different parameter count than row 0"
        )));
    }

    let bindings = (0..width)
        .map(|col| {
            let kind = batch
                .iter()
                .map(|row| &row[col])
                .find(|v| !v.is_null())
                .map_or("TEXT", Value::binding_type);
            let values = batch.iter().map(|row| row[col].to_wire()).collect();
            let binding = Binding {
                kind,
                value: BindingValue::Many(values),
            };
            ((col + 1).to_string(), binding)
        })
        .collect();
    Ok(bindings)
}

/// Collapse whitespace for single-line log output.
fn compact_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}
