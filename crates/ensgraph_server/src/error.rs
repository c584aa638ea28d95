//! Error types and the single translation from failures to HTTP responses.

use crate::response::ErrorEnvelope;
use crate::validation::FieldIssue;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ensgraph_core::db::DbError;
use ensgraph_core::FriendServiceError;
use log::error;
use serde_json::{json, Value};
use thiserror::Error;

/// Startup and wiring failures of the server process.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Store could not be opened or migrated.
    #[error("database error: {0}")]
    Db(#[from] DbError),

    /// Socket bind or serve failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// `CORS_ORIGIN` is not a valid header value.
    #[error("invalid CORS origin `{0}`")]
    InvalidCorsOrigin(String),
}

/// Closed set of failure categories exposed over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Storage,
    Unexpected,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Conflict => StatusCode::CONFLICT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Storage | Self::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::Conflict => "CONFLICT",
            Self::NotFound => "NOT_FOUND",
            Self::Storage => "DATABASE_ERROR",
            Self::Unexpected => "INTERNAL_ERROR",
        }
    }
}

/// Error returned by handlers; rendered as the `{success: false, ...}` envelope.
#[derive(Debug)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn validation(issues: Vec<FieldIssue>) -> Self {
        Self::new(ErrorKind::Validation, "Invalid request data").with_details(json!(issues))
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(ErrorKind::NotFound, format!("{resource} not found"))
    }

    /// Generic 500 for failures outside the service layer.
    ///
    /// `cause` is always logged; it is attached to the response only when
    /// `expose_details` is set.
    pub fn unexpected(cause: impl Into<String>, expose_details: bool) -> Self {
        let cause = cause.into();
        error!("event=http_error module=server status=error kind=unexpected error={cause}");
        let err = Self::new(ErrorKind::Unexpected, "Internal server error");
        if expose_details {
            err.with_details(json!({ "message": cause }))
        } else {
            err
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let envelope = ErrorEnvelope {
            success: false,
            error: self.message,
            code: Some(self.kind.code()),
            details: self.details,
        };
        (self.kind.status(), Json(envelope)).into_response()
    }
}

/// Maps a service failure onto its HTTP category.
///
/// Storage and consistency failures are logged with full detail here and
/// reach the client as a generic message unless `expose_details` is set.
pub fn translate_service_error(err: &FriendServiceError, expose_details: bool) -> ApiError {
    match err {
        FriendServiceError::InvalidName(cause) => ApiError::validation(vec![FieldIssue::new(
            "ens_name",
            cause.to_string(),
        )]),
        FriendServiceError::SelfRelationship(_)
        | FriendServiceError::DuplicateRelationship { .. } => {
            ApiError::new(ErrorKind::Conflict, err.to_string())
        }
        FriendServiceError::Repo(cause) => {
            error!("event=http_error module=server status=error kind=storage error={cause}");
            let message = if cause.is_missing_table() {
                "Database schema not provisioned: missing table"
            } else {
                "Database operation failed"
            };
            let api_error = ApiError::new(ErrorKind::Storage, message);
            if expose_details {
                api_error.with_details(json!({ "message": cause.to_string() }))
            } else {
                api_error
            }
        }
        FriendServiceError::InconsistentState(_) => {
            ApiError::unexpected(err.to_string(), expose_details)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{translate_service_error, ErrorKind};
    use axum::http::StatusCode;
    use ensgraph_core::db::DbError;
    use ensgraph_core::{FriendServiceError, NameValidationError, RepoError};

    #[test]
    fn kinds_map_to_status_codes() {
        assert_eq!(ErrorKind::Validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::Conflict.status(), StatusCode::CONFLICT);
        assert_eq!(ErrorKind::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorKind::Storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ErrorKind::Unexpected.code(), "INTERNAL_ERROR");
    }

    #[test]
    fn conflicts_keep_their_message() {
        let err = FriendServiceError::SelfRelationship("a.eth".to_string());
        let api_error = translate_service_error(&err, false);
        assert_eq!(api_error.kind, ErrorKind::Conflict);
        assert!(api_error.message.contains("a.eth"));
    }

    #[test]
    fn invalid_names_are_validation_errors() {
        let err = FriendServiceError::InvalidName(NameValidationError::Empty);
        assert_eq!(translate_service_error(&err, false).kind, ErrorKind::Validation);
    }

    #[test]
    fn storage_detail_is_suppressed_outside_development() {
        let err = FriendServiceError::Repo(RepoError::Db(DbError::InvalidUrl("x".to_string())));

        let hidden = translate_service_error(&err, false);
        assert_eq!(hidden.kind, ErrorKind::Storage);
        assert_eq!(hidden.message, "Database operation failed");
        assert!(hidden.details.is_none());

        let shown = translate_service_error(&err, true);
        assert!(shown.details.is_some());
    }
}
