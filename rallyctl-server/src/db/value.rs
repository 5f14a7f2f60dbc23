//! Typed values and rows
//!
//! The JSON result format delivers every cell as a string (or null); cells are
//! decoded once per column type so repositories read typed values by name.

use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::error::DbError;
use super::protocol::ColumnType;

/// A single SQL value, used both for parameters and decoded cells
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
}

impl Value {
    /// Snowflake binding type name
    pub fn binding_type(&self) -> &'static str {
        match self {
            Self::Null => "ANY",
            Self::Integer(_) => "FIXED",
            Self::Float(_) => "REAL",
            Self::Text(_) => "TEXT",
            Self::Boolean(_) => "BOOLEAN",
        }
    }

    /// String form sent on the wire; `None` for NULL
    pub fn to_wire(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Integer(n) => Some(n.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Text(s) => Some(s.clone()),
            Self::Boolean(b) => Some(b.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Convert to a Rust type; `column` names the source in error messages.
    pub fn extract<T: FromValue>(&self, column: &str) -> Result<T, DbError> {
        T::from_value(self).map_err(|reason| DbError::decode(column, reason))
    }

    /// Decode one result cell according to its column type.
    pub fn decode(cell: Option<&str>, column: &ColumnType) -> Result<Self, DbError> {
        let Some(raw) = cell else {
            return Ok(Self::Null);
        };

        match column.kind.to_ascii_lowercase().as_str() {
            "fixed" if column.scale.unwrap_or(0) == 0 => match raw.parse::<i64>() {
                Ok(n) => Ok(Self::Integer(n)),
                // NUMBER(38,0) can exceed i64; keep the digits rather than fail
                Err(_) => Ok(Self::Text(raw.to_owned())),
            },
            "fixed" | "real" => raw
                .parse::<f64>()
                .map(Self::Float)
                .map_err(|e| DbError::decode(&column.name, e.to_string())),
            "boolean" => match raw {
                "1" | "true" | "TRUE" => Ok(Self::Boolean(true)),
                "0" | "false" | "FALSE" => Ok(Self::Boolean(false)),
                other => Err(DbError::decode(
                    &column.name,
                    format!("invalid boolean '{other}'"),
                )),
            },
            _ => Ok(Self::Text(raw.to_owned())),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Integer(n) => serializer.serialize_i64(*n),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Boolean(b) => serializer.serialize_bool(*b),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Conversion from a decoded cell into a Rust type
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, String>;
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Integer(n) => Ok(*n),
            Value::Float(f) if f.fract() == 0.0 => Ok(*f as i64),
            other => Err(format!("expected integer, got {other:?}")),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Float(f) => Ok(*f),
            Value::Integer(n) => Ok(*n as f64),
            other => Err(format!("expected number, got {other:?}")),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            other => Err(format!("expected text, got {other:?}")),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Boolean(b) => Ok(*b),
            other => Err(format!("expected boolean, got {other:?}")),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// One result row with column names shared across the result set
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Raw value by column name (ASCII case-insensitive)
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .map(|idx| &self.values[idx])
    }

    /// Typed value by column name.
    pub fn get<T: FromValue>(&self, column: &str) -> Result<T, DbError> {
        let value = self
            .value(column)
            .ok_or_else(|| DbError::MissingColumn(column.to_owned()))?;
        value.extract(column)
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.columns.iter().zip(&self.values) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Decode a whole rowset against its column metadata.
pub fn decode_rows(
    rowtype: &[ColumnType],
    rowset: Vec<Vec<Option<String>>>,
) -> Result<Vec<Row>, DbError> {
    let columns: Arc<[String]> = rowtype.iter().map(|c| c.name.clone()).collect();

    rowset
        .into_iter()
        .map(|cells| {
            if cells.len() != rowtype.len() {
                return Err(DbError::Unsupported(format!(
                    "row has {} cells but {} columns were described",
                    cells.len(),
                    rowtype.len()
                )));
            }
            let values = cells
                .iter()
                .zip(rowtype)
                .map(|(cell, col)| Value::decode(cell.as_deref(), col))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Row::new(Arc::clone(&columns), values))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str, kind: &str, scale: i64) -> ColumnType {
        ColumnType {
            name: name.into(),
            kind: kind.into(),
            scale: Some(scale),
            nullable: Some(true),
        }
    }

    #[test]
    fn decodes_by_column_type() {
        let rowtype = vec![
            col("TEAM_ID", "fixed", 0),
            col("TEAM_NAME", "text", 0),
            col("BUDGET", "fixed", 2),
            col("SPEED", "real", 0),
            col("ACTIVE", "boolean", 0),
            col("MEMBERS", "text", 0),
        ];
        let rows = decode_rows(
            &rowtype,
            vec![vec![
                Some("7".into()),
                Some("Red".into()),
                Some("9000.50".into()),
                Some("220".into()),
                Some("1".into()),
                None,
            ]],
        )
        .unwrap();

        let row = &rows[0];
        assert_eq!(row.get::<i64>("TEAM_ID").unwrap(), 7);
        assert_eq!(row.get::<String>("team_name").unwrap(), "Red");
        assert_eq!(row.get::<f64>("BUDGET").unwrap(), 9000.5);
        assert_eq!(row.get::<f64>("SPEED").unwrap(), 220.0);
        assert!(row.get::<bool>("ACTIVE").unwrap());
        assert_eq!(row.get::<Option<String>>("MEMBERS").unwrap(), None);
    }

    #[test]
    fn missing_column_and_type_mismatch() {
        let rows = decode_rows(&[col("X", "text", 0)], vec![vec![Some("a".into())]]).unwrap();
        assert!(matches!(
            rows[0].get::<i64>("Y"),
            Err(DbError::MissingColumn(_))
        ));
        assert!(matches!(rows[0].get::<i64>("X"), Err(DbError::Decode { .. })));
    }

    #[test]
    fn huge_integers_stay_text() {
        let v = Value::decode(Some("99999999999999999999999"), &col("N", "fixed", 0)).unwrap();
        assert_eq!(v, Value::Text("99999999999999999999999".into()));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = decode_rows(&[col("A", "text", 0)], vec![vec![None, None]]).unwrap_err();
        assert!(matches!(err, DbError::Unsupported(_)));
    }

    #[test]
    fn row_serializes_as_object() {
        let rows = decode_rows(
            &[col("CAR_ID", "fixed", 0), col("TEAM_NAME", "text", 0)],
            vec![vec![Some("1".into()), None]],
        )
        .unwrap();
        let json = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(json, serde_json::json!({"CAR_ID": 1, "TEAM_NAME": null}));
    }

    #[test]
    fn wire_form_of_parameters() {
        assert_eq!(Value::from(10000.0).to_wire().as_deref(), Some("10000"));
        assert_eq!(Value::from(0.85).to_wire().as_deref(), Some("0.85"));
        assert_eq!(Value::from(None::<i64>).to_wire(), None);
        assert_eq!(Value::from("x").binding_type(), "TEXT");
    }
}
