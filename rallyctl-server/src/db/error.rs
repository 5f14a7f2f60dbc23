//! Database error type

/// Errors from the warehouse session and row decoding.
///
/// Warehouse-side failures keep the server's code, SQL state and message so
/// they can be shown to the user unchanged.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("authentication failed ({code}): {message}")]
    Auth { code: String, message: String },

    #[error("{code} ({sql_state}): {message}")]
    Snowflake {
        code: String,
        sql_state: String,
        message: String,
    },

    #[error("column not found: {0}")]
    MissingColumn(String),

    #[error("cannot decode column {column}: {reason}")]
    Decode { column: String, reason: String },

    #[error("unsupported result: {0}")]
    Unsupported(String),
}

impl DbError {
    pub(crate) fn decode(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Warehouse error code, if this error came from the warehouse
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Snowflake { code, .. } | Self::Auth { code, .. } => Some(code),
            _ => None,
        }
    }
}
