//! Snowflake session API wire types
//!
//! Covers the three endpoints a password-authenticated client needs:
//! - `POST /session/v1/login-request`
//! - `POST /queries/v1/query-request`
//! - `POST /session?delete=true` (logout, empty body)

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Session token has expired; log in again and retry
pub const SESSION_EXPIRED: &str = "390112";

/// Query still running after the server-side wait; poll the result URL
pub const QUERY_IN_PROGRESS: &str = "333333";

/// Same as [`QUERY_IN_PROGRESS`], returned for async submissions
pub const QUERY_IN_PROGRESS_ASYNC: &str = "333334";

/// Login request envelope
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub data: LoginRequestData<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct LoginRequestData<'a> {
    pub client_app_id: &'a str,
    pub client_app_version: &'a str,
    pub account_name: &'a str,
    pub login_name: &'a str,
    pub password: &'a str,
    pub session_parameters: HashMap<&'static str, serde_json::Value>,
}

/// Login response
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub data: Option<LoginResponseData>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub success: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponseData {
    pub token: Option<String>,
    #[serde(default)]
    pub master_token: Option<String>,
    #[serde(default)]
    pub server_version: Option<String>,
}

/// A positional parameter binding (`"1"`, `"2"`, ... keys)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Binding {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: BindingValue,
}

/// Scalar binding, or one value per row for array (batch) binding
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BindingValue {
    Single(Option<String>),
    Many(Vec<Option<String>>),
}

pub type Bindings = BTreeMap<String, Binding>;

/// Statement submission
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest<'a> {
    pub sql_text: &'a str,
    pub async_exec: bool,
    pub sequence_id: u64,
    pub is_internal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bindings: Option<&'a Bindings>,
}

/// Statement (or result poll) response
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub data: Option<QueryData>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub success: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryData {
    #[serde(default)]
    pub rowtype: Vec<ColumnType>,
    #[serde(default)]
    pub rowset: Vec<Vec<Option<String>>>,
    #[serde(default)]
    pub total: Option<i64>,
    #[serde(default)]
    pub query_id: Option<String>,
    #[serde(default)]
    pub sql_state: Option<String>,
    #[serde(default)]
    pub stats: Option<DmlStats>,
    #[serde(default)]
    pub query_result_format: Option<String>,
    #[serde(default)]
    pub chunks: Vec<serde_json::Value>,
    #[serde(default)]
    pub get_result_url: Option<String>,
}

/// Column metadata from `rowtype`
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnType {
    pub name: String,
    /// Lowercase logical type: fixed, real, text, boolean, date, ...
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub scale: Option<i64>,
    #[serde(default)]
    pub nullable: Option<bool>,
}

/// Row counts reported for DML statements
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DmlStats {
    #[serde(default)]
    pub num_rows_inserted: u64,
    #[serde(default)]
    pub num_rows_updated: u64,
    #[serde(default)]
    pub num_rows_deleted: u64,
}

impl DmlStats {
    pub fn total(&self) -> u64 {
        self.num_rows_inserted + self.num_rows_updated + self.num_rows_deleted
    }
}

impl QueryData {
    /// Affected row count for DML.
    ///
    /// Prefers `stats`; otherwise sums the `number of rows ...` columns of the
    /// first result row, which is how DML results are returned as a rowset.
    pub fn affected_rows(&self) -> u64 {
        if let Some(stats) = &self.stats {
            return stats.total();
        }

        let Some(first) = self.rowset.first() else {
            return 0;
        };
        self.rowtype
            .iter()
            .zip(first)
            .filter(|(col, _)| col.name.to_ascii_lowercase().starts_with("number of rows"))
            .filter_map(|(_, cell)| cell.as_deref()?.parse::<u64>().ok())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bindings_serialize_as_snowflake_expects() {
        let mut bindings = Bindings::new();
        bindings.insert(
            "1".into(),
            Binding {
                kind: "TEXT",
                value: BindingValue::Single(Some("Red".into())),
            },
        );
        bindings.insert(
            "2".into(),
            Binding {
                kind: "FIXED",
                value: BindingValue::Many(vec![Some("1".into()), None]),
            },
        );

        let request = QueryRequest {
            sql_text: "SELECT ?",
            async_exec: false,
            sequence_id: 3,
            is_internal: false,
            bindings: Some(&bindings),
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "sqlText": "SELECT ?",
                "asyncExec": false,
                "sequenceId": 3,
                "isInternal": false,
                "bindings": {
                    "1": {"type": "TEXT", "value": "Red"},
                    "2": {"type": "FIXED", "value": ["1", null]}
                }
            })
        );
    }

    #[test]
    fn affected_rows_from_stats() {
        let data: QueryData = serde_json::from_value(json!({
            "rowtype": [{"name": "number of rows updated", "type": "fixed", "scale": 0}],
            "rowset": [["2"]],
            "stats": {"numRowsUpdated": 2}
        }))
        .unwrap();
        assert_eq!(data.affected_rows(), 2);
    }

    #[test]
    fn affected_rows_from_rowset() {
        let data: QueryData = serde_json::from_value(json!({
            "rowtype": [
                {"name": "number of rows inserted", "type": "fixed", "scale": 0},
                {"name": "number of multi-joined rows updated", "type": "fixed", "scale": 0}
            ],
            "rowset": [["3", "0"]]
        }))
        .unwrap();
        assert_eq!(data.affected_rows(), 3);
    }

    #[test]
    fn login_failure_parses() {
        let resp: LoginResponse = serde_json::from_value(json!({
            "data": null,
            "code": "390100",
            "message": "Incorrect username or password was specified.",
            "success": false
        }))
        .unwrap();
        assert!(!resp.success);
        assert_eq!(resp.code.as_deref(), Some("390100"));
    }
}
