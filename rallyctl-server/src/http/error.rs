//! API and page error types with IntoResponse
//!
//! JSON endpoints answer `{error, message}`; HTML pages answer an error
//! banner. Warehouse messages are passed through so the user sees why a
//! statement failed.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use rallyctl_core::ValidationError;
use serde_json::json;

use super::views::{self, Banner};
use crate::db::DbError;
use crate::race::RaceError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Nothing to race with (409)
    Conflict { message: String },

    /// Warehouse error (502, message surfaced)
    Database(DbError),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            Self::Validation(e) => (StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
            Self::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("{resource} '{id}' not found"),
            ),
            Self::Conflict { message } => (StatusCode::CONFLICT, "conflict", message.clone()),
            Self::Database(e) => (StatusCode::BAD_GATEWAY, "database_error", e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(%message, "warehouse request failed");
        }
        (status, Json(json!({ "error": error, "message": message }))).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        Self::Database(e)
    }
}

impl From<RaceError> for ApiError {
    fn from(e: RaceError) -> Self {
        match e {
            RaceError::Db(e) => e.into(),
            RaceError::NoEligibleCars => Self::Conflict {
                message: e.to_string(),
            },
            RaceError::MissingRaceId => Self::Database(DbError::Unsupported(e.to_string())),
        }
    }
}

/// Error for HTML handlers: the page is rendered with an error banner.
#[derive(Debug)]
pub struct PageError {
    status: StatusCode,
    title: &'static str,
    active: &'static str,
    message: String,
}

impl PageError {
    pub fn new(status: StatusCode, title: &'static str, active: &'static str, message: String) -> Self {
        Self {
            status,
            title,
            active,
            message,
        }
    }

    /// Attach page identity to a warehouse error.
    pub fn db(title: &'static str, active: &'static str) -> impl FnOnce(DbError) -> Self {
        move |e| {
            tracing::error!(error = %e, page = active, "page query failed");
            Self::new(StatusCode::BAD_GATEWAY, title, active, format!("Database error: {e}"))
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let html = views::error_page(self.title, self.active, &Banner::error(self.message));
        (self.status, Html(html)).into_response()
    }
}
