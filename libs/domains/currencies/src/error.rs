use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use core_model::LifecycleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CurrencyError {
    #[error("Currency not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Currency code '{0}' already exists")]
    DuplicateCode(String),

    #[error("The default currency {0} cannot be deleted")]
    DefaultLocked(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CurrencyResult<T> = Result<T, CurrencyError>;

impl From<LifecycleError> for CurrencyError {
    fn from(err: LifecycleError) -> Self {
        CurrencyError::Unprocessable(err.to_string())
    }
}

impl From<CurrencyError> for AppError {
    fn from(err: CurrencyError) -> Self {
        match err {
            CurrencyError::NotFound(_) => AppError::NotFound("Currency not found".to_string()),
            CurrencyError::Validation(msg) => AppError::Validation(msg),
            err @ CurrencyError::DuplicateCode(_) => AppError::Conflict(err.to_string()),
            err @ CurrencyError::DefaultLocked(_) => AppError::UnprocessableEntity(err.to_string()),
            CurrencyError::Unprocessable(msg) => AppError::UnprocessableEntity(msg),
            CurrencyError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for CurrencyError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
