//! Error codes carried in every error body.
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! let code = ErrorCode::MinimumRecordRequired;
//! assert_eq!(code.as_str(), "MINIMUM_RECORD_REQUIRED");
//! assert_eq!(code.code(), 1013);
//! ```

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors (1000-1099)
    ValidationError,
    /// Path id is not a hashed id this service could have issued
    InvalidHashedId,
    InvalidJson,
    NotFound,
    Unauthorized,
    Forbidden,
    Conflict,
    UnprocessableEntity,
    JsonExtraction,
    /// Malformed acting-user header (`x-user-id`, `x-timezone`)
    InvalidHeader,
    MethodNotAllowed,
    /// Localized payload uses a locale the store does not support
    InvalidLanguage,
    /// Operation would remove the last record of a required set
    MinimumRecordRequired,
    InvalidQuery,

    // Server errors (1100-1199)
    InternalError,
    ServiceUnavailable,
    SearchUnavailable,

    // Database errors (2000-2999)
    DatabaseError,
    DatabaseNotFound,
    DatabaseUnavailable,
    DatabaseUnhandled,

    // Migration errors (3000s)
    MigrationError,

    // I/O errors (4000s)
    IoError,

    // JSON serialization errors (5000s)
    SerdeJsonError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidHashedId => "INVALID_HASHED_ID",
            Self::InvalidJson => "INVALID_JSON",
            Self::NotFound => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::Conflict => "CONFLICT",
            Self::UnprocessableEntity => "UNPROCESSABLE_ENTITY",
            Self::JsonExtraction => "JSON_EXTRACTION",
            Self::InvalidHeader => "INVALID_HEADER",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::InvalidLanguage => "INVALID_LANGUAGE",
            Self::MinimumRecordRequired => "MINIMUM_RECORD_REQUIRED",
            Self::InvalidQuery => "INVALID_QUERY",
            Self::InternalError => "INTERNAL_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::SearchUnavailable => "SEARCH_UNAVAILABLE",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::DatabaseNotFound => "DATABASE_NOT_FOUND",
            Self::DatabaseUnavailable => "DATABASE_UNAVAILABLE",
            Self::DatabaseUnhandled => "DATABASE_UNHANDLED",
            Self::MigrationError => "MIGRATION_ERROR",
            Self::IoError => "IO_ERROR",
            Self::SerdeJsonError => "SERDE_JSON_ERROR",
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::ValidationError => 1001,
            Self::InvalidHashedId => 1002,
            Self::JsonExtraction => 1003,
            Self::NotFound => 1004,
            Self::Unauthorized => 1005,
            Self::Forbidden => 1006,
            Self::Conflict => 1007,
            Self::UnprocessableEntity => 1008,
            Self::InvalidJson => 1009,
            Self::InvalidHeader => 1010,
            Self::MethodNotAllowed => 1011,
            Self::InvalidLanguage => 1012,
            Self::MinimumRecordRequired => 1013,
            Self::InvalidQuery => 1014,

            Self::InternalError => 1100,
            Self::ServiceUnavailable => 1101,
            Self::SearchUnavailable => 1102,

            Self::DatabaseError => 2001,
            Self::DatabaseNotFound => 2002,
            Self::DatabaseUnavailable => 2003,
            Self::DatabaseUnhandled => 2099,

            Self::MigrationError => 3001,
            Self::IoError => 4001,
            Self::SerdeJsonError => 5001,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            Self::ValidationError => "Request validation failed",
            Self::InvalidHashedId => "Resource not found",
            Self::InvalidJson => "Invalid JSON format",
            Self::NotFound => "Resource not found",
            Self::Unauthorized => "Authentication required",
            Self::Forbidden => "Access forbidden",
            Self::Conflict => "Resource already exists",
            Self::UnprocessableEntity => "Request cannot be processed",
            Self::JsonExtraction => "Failed to parse request body",
            Self::InvalidHeader => "Invalid request header",
            Self::MethodNotAllowed => "The HTTP method is not allowed for this resource",
            Self::InvalidLanguage => "Unsupported language",
            Self::MinimumRecordRequired => "At least one record is required",
            Self::InvalidQuery => "Invalid query string",
            Self::InternalError => "An internal server error occurred",
            Self::ServiceUnavailable => "Service is temporarily unavailable",
            Self::SearchUnavailable => "Search is temporarily unavailable",
            Self::DatabaseError => "Database error occurred",
            Self::DatabaseNotFound => "Database record not found",
            Self::DatabaseUnavailable => "Database is temporarily unavailable",
            Self::DatabaseUnhandled => "Unhandled database error",
            Self::MigrationError => "Database migration failed",
            Self::IoError => "I/O error occurred",
            Self::SerdeJsonError => "Failed to process JSON data",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
