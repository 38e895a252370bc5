//! Error responses.
//!
//! | Variant        | Status | Body                                |
//! |----------------|--------|-------------------------------------|
//! | `BadRequest`   | 400    | `{"error": message}`                |
//! | `MalformedQuery` | 400  | `{"error": message}`                |
//! | `MalformedBody`| 400    | `{"detail": message}`               |
//! | `Fields`       | 400    | `{field: [message, ...], ...}`      |
//! | `NotFound`     | 404    | `{"detail": "Not found."}`          |
//! | `NoCounty`     | 404    | `{"error": "No county found"}`      |
//! | `Store`/`Task` | 500    | `{"detail": "Internal server error."}` |

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use finder_core::{FieldErrors, StoreError};
use serde_json::json;
use thiserror::Error;
use tokio::task::JoinError;

/// Errors returned by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required query or body parameter was missing or unparseable.
    #[error("bad request: {0}")]
    BadRequest(&'static str),
    /// The query string could not be decoded.
    #[error("malformed query: {0}")]
    MalformedQuery(String),
    /// The request body was not valid JSON for the endpoint.
    #[error("malformed body: {0}")]
    MalformedBody(String),
    /// One or more fields failed validation.
    #[error("invalid fields: {0}")]
    Fields(FieldErrors),
    #[error("not found")]
    NotFound,
    #[error("no county found")]
    NoCounty,
    #[error("store failure")]
    Store(#[source] StoreError),
    #[error("blocking task failed")]
    Task(#[from] JoinError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Invalid(fields) => Self::Fields(fields),
            StoreError::UnknownVenue { id } => {
                let mut fields = FieldErrors::default();
                fields.push(
                    "venue_id",
                    format!("Invalid pk \"{id}\" - object does not exist."),
                );
                Self::Fields(fields)
            }
            other => Self::Store(other),
        }
    }
}

impl From<FieldErrors> for ApiError {
    fn from(fields: FieldErrors) -> Self {
        Self::Fields(fields)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::MalformedBody(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::MalformedQuery(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            Self::MalformedQuery(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            Self::MalformedBody(message) => {
                (StatusCode::BAD_REQUEST, json!({ "detail": message }))
            }
            Self::Fields(fields) => (StatusCode::BAD_REQUEST, json!(fields)),
            Self::NotFound => (StatusCode::NOT_FOUND, json!({ "detail": "Not found." })),
            Self::NoCounty => (StatusCode::NOT_FOUND, json!({ "error": "No county found" })),
            Self::Store(err) => {
                tracing::error!(error = %err, "store operation failed");
                internal_error()
            }
            Self::Task(err) => {
                tracing::error!(error = %err, "blocking store task failed");
                internal_error()
            }
        };
        (status, Json(body)).into_response()
    }
}

fn internal_error() -> (StatusCode, serde_json::Value) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "detail": "Internal server error." }),
    )
}
