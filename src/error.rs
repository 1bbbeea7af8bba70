//! Application error type shared by every handler and middleware.
//!
//! Handlers return [`AppError`]; its `IntoResponse` impl produces a minimal
//! JSON body and attaches the error to the response extensions. The
//! centralized error handler (`http::middleware::error_handler`) picks it up
//! there and renders the final payload for the current environment.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// An error carried to the client.
///
/// `operational` errors are expected failures (bad input, missing
/// documents) whose message is safe to show in production.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub operational: bool,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            operational: true,
        }
    }

    /// A programming or unknown error; its details are hidden in production.
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            operational: false,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// `fail` for client errors, `error` otherwise.
    pub fn status_text(&self) -> &'static str {
        if self.status.is_client_error() {
            "fail"
        } else {
            "error"
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = json!({
            "status": self.status_text(),
            "message": self.message,
        });
        let mut response = (self.status, Json(body)).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// Failures raised by the document store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("No {0} found with that ID")]
    NotFound(&'static str),

    #[error("Invalid {path}: {value}.")]
    InvalidId { path: &'static str, value: String },

    #[error("Duplicate field value: {value}. Please use another value!")]
    Duplicate { field: &'static str, value: String },

    #[error("Invalid input data. {}", .0.join(". "))]
    Validation(Vec<String>),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let status = match err {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::InvalidId { .. }
            | StoreError::Duplicate { .. }
            | StoreError::Validation(_) => StatusCode::BAD_REQUEST,
        };
        AppError::new(status, err.to_string())
    }
}

impl From<validator::ValidationErrors> for StoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("Invalid value for {}", field),
                })
            })
            .collect();
        messages.sort();
        StoreError::Validation(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text() {
        assert_eq!(AppError::not_found("x").status_text(), "fail");
        assert_eq!(AppError::internal("x").status_text(), "error");
    }

    #[test]
    fn test_store_error_mapping() {
        let err: AppError = StoreError::InvalidId {
            path: "id",
            value: "abc".into(),
        }
        .into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Invalid id: abc.");
        assert!(err.operational);

        let err: AppError = StoreError::Duplicate {
            field: "name",
            value: "\"The Forest Hiker\"".into(),
        }
        .into();
        assert_eq!(
            err.message,
            "Duplicate field value: \"The Forest Hiker\". Please use another value!"
        );

        let err: AppError = StoreError::Validation(vec![
            "A tour must have a price".into(),
            "A tour must have a summary".into(),
        ])
        .into();
        assert_eq!(
            err.message,
            "Invalid input data. A tour must have a price. A tour must have a summary"
        );

        let err: AppError = StoreError::NotFound("tour").into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "No tour found with that ID");
    }

    #[test]
    fn test_into_response_attaches_error() {
        let response = AppError::not_found("gone").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let attached = response.extensions().get::<AppError>().unwrap();
        assert_eq!(attached.message, "gone");
    }
}
