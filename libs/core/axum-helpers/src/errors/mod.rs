pub mod codes;
pub mod handlers;
pub mod responses;

pub use codes::ErrorCode;

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Body of every error response.
///
/// ```json
/// {
///   "code": 1013,
///   "error": "MINIMUM_RECORD_REQUIRED",
///   "message": "Cannot delete the last root category of channel 'webstore'"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Integer code for logging and monitoring
    pub code: i32,
    /// Machine-readable identifier, see [`ErrorCode::as_str`]
    pub error: String,
    pub message: String,
    /// Structured details such as per-field validation failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            error: code.as_str().to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Query string error: {0}")]
    QueryRejection(#[from] QueryRejection),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Invalid hashed id: {0}")]
    InvalidHashedId(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unprocessable Entity: {0}")]
    UnprocessableEntity(String),

    #[error("Unsupported language(s): {}", .0.join(", "))]
    InvalidLanguage(Vec<String>),

    #[error("Minimum record required: {0}")]
    MinimumRecordRequired(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Search Unavailable: {0}")]
    SearchUnavailable(String),
}

impl AppError {
    /// Status, code, client message and details for this error
    pub fn parts(&self) -> (StatusCode, ErrorCode, String, Option<Value>) {
        match self {
            AppError::SerdeJson(_) => internal(ErrorCode::SerdeJsonError),
            AppError::Database(e) => map_db_error(e),
            AppError::Io(_) => internal(ErrorCode::IoError),
            AppError::JsonExtractorRejection(e) => {
                (e.status(), ErrorCode::JsonExtraction, e.body_text(), None)
            }
            AppError::QueryRejection(e) => {
                (StatusCode::BAD_REQUEST, ErrorCode::InvalidQuery, e.body_text(), None)
            }
            AppError::ValidationError(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::ValidationError,
                ErrorCode::ValidationError.default_message().to_string(),
                Some(validation_details(e)),
            ),
            AppError::InvalidHeader(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::InvalidHeader, msg.clone(), None)
            }
            AppError::InvalidHashedId(_) => (
                StatusCode::NOT_FOUND,
                ErrorCode::InvalidHashedId,
                ErrorCode::InvalidHashedId.default_message().to_string(),
                None,
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::ValidationError, msg.clone(), None)
            }
            AppError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::ValidationError,
                msg.clone(),
                None,
            ),
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, msg.clone(), None)
            }
            AppError::Forbidden(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::Forbidden, msg.clone(), None)
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorCode::NotFound, msg.clone(), None)
            }
            AppError::Conflict(msg) => {
                (StatusCode::CONFLICT, ErrorCode::Conflict, msg.clone(), None)
            }
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::UnprocessableEntity,
                msg.clone(),
                None,
            ),
            AppError::InvalidLanguage(locales) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::InvalidLanguage,
                self.to_string(),
                Some(serde_json::json!({ "locales": locales })),
            ),
            AppError::MinimumRecordRequired(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::MinimumRecordRequired,
                msg.clone(),
                None,
            ),
            AppError::InternalServerError(_) => internal(ErrorCode::InternalError),
            AppError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::ServiceUnavailable,
                msg.clone(),
                None,
            ),
            AppError::SearchUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::SearchUnavailable,
                ErrorCode::SearchUnavailable.default_message().to_string(),
                None,
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();

        if status.is_server_error() {
            tracing::error!(error_code = code.code(), status = %status, error = %self, "Request failed");
        } else if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            tracing::warn!(error_code = code.code(), status = %status, error = %self, "Request rejected");
        } else {
            tracing::info!(error_code = code.code(), status = %status, error = %self, "Request rejected");
        }

        let mut body = ErrorResponse::new(code, message);
        body.details = details;
        (status, Json(body)).into_response()
    }
}

/// 500 with the generic message; the cause only goes to the log
fn internal(code: ErrorCode) -> (StatusCode, ErrorCode, String, Option<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        code,
        code.default_message().to_string(),
        None,
    )
}

fn map_db_error(error: &DbErr) -> (StatusCode, ErrorCode, String, Option<Value>) {
    if let Some(SqlErr::UniqueConstraintViolation(_)) = error.sql_err() {
        return (
            StatusCode::CONFLICT,
            ErrorCode::Conflict,
            ErrorCode::Conflict.default_message().to_string(),
            None,
        );
    }

    match error {
        DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => (
            StatusCode::NOT_FOUND,
            ErrorCode::DatabaseNotFound,
            ErrorCode::DatabaseNotFound.default_message().to_string(),
            None,
        ),
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::DatabaseUnavailable,
            ErrorCode::DatabaseUnavailable.default_message().to_string(),
            None,
        ),
        DbErr::Migration(_) => internal(ErrorCode::MigrationError),
        DbErr::Exec(_) | DbErr::Query(_) => internal(ErrorCode::DatabaseError),
        _ => internal(ErrorCode::DatabaseUnhandled),
    }
}

/// `{ field: [{code, message, params}] }`
fn validation_details(errors: &ValidationErrors) -> Value {
    let fields = errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let entries: Vec<Value> = errors
                .iter()
                .map(|err| {
                    serde_json::json!({
                        "code": err.code,
                        "message": err.message,
                        "params": err.params,
                    })
                })
                .collect();
            (field.to_string(), Value::Array(entries))
        })
        .collect::<serde_json::Map<_, _>>();
    Value::Object(fields)
}

/// Build an error response without going through [`AppError`]
pub fn error_response(status: StatusCode, message: String, error_code: ErrorCode) -> Response {
    (status, Json(ErrorResponse::new(error_code, message))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn render(err: AppError) -> (StatusCode, ErrorResponse) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn not_found_renders_code_and_message() {
        let (status, body) = render(AppError::NotFound("Category not found".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.code, 1004);
        assert_eq!(body.error, "NOT_FOUND");
        assert_eq!(body.message, "Category not found");
        assert!(body.details.is_none());
    }

    #[tokio::test]
    async fn business_rule_violations_are_unprocessable() {
        let (status, body) =
            render(AppError::MinimumRecordRequired("last root".into())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.error, "MINIMUM_RECORD_REQUIRED");

        let (status, body) =
            render(AppError::InvalidLanguage(vec!["xx".into(), "yy".into()])).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.details.unwrap()["locales"][1], "yy");
    }

    #[tokio::test]
    async fn field_validation_failures_are_unprocessable() {
        let mut errors = ValidationErrors::new();
        errors.add("slug", validator::ValidationError::new("regex"));
        let (status, body) = render(AppError::ValidationError(errors)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.error, "VALIDATION_ERROR");
        assert_eq!(body.details.unwrap()["slug"][0]["code"], "regex");

        let (status, body) = render(AppError::Validation("template lacks {price}".into())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.error, "VALIDATION_ERROR");

        let (status, _) = render(AppError::BadRequest("bad path".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn internal_errors_hide_the_cause() {
        let (status, body) =
            render(AppError::InternalServerError("pool exploded at 10.0.0.3".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.message.contains("10.0.0.3"));
    }

    #[tokio::test]
    async fn record_not_found_maps_to_404() {
        let (status, body) =
            render(AppError::Database(DbErr::RecordNotFound("categories".into()))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "DATABASE_NOT_FOUND");
    }

    #[tokio::test]
    async fn undecodable_hashed_ids_look_like_missing_records() {
        let (status, body) = render(AppError::InvalidHashedId("!!".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "INVALID_HASHED_ID");
    }

    #[tokio::test]
    async fn search_outage_is_503() {
        let (status, _) = render(AppError::SearchUnavailable("connect refused".into())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
