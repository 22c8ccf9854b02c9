use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use core_model::LifecycleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BasketError {
    #[error("Basket not found: {0}")]
    NotFound(String),

    #[error("Saved basket not found: {0}")]
    SavedBasketNotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("An acting user is required")]
    Unauthenticated,

    #[error("Cannot merge a {guest} basket into a {target} basket")]
    CurrencyMismatch { target: String, guest: String },

    #[error("{0}")]
    Unprocessable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type BasketResult<T> = Result<T, BasketError>;

impl From<LifecycleError> for BasketError {
    fn from(err: LifecycleError) -> Self {
        BasketError::Unprocessable(err.to_string())
    }
}

impl From<BasketError> for AppError {
    fn from(err: BasketError) -> Self {
        match err {
            BasketError::NotFound(_) => AppError::NotFound("Basket not found".to_string()),
            BasketError::SavedBasketNotFound(_) => {
                AppError::NotFound("Saved basket not found".to_string())
            }
            BasketError::Validation(msg) => AppError::Validation(msg),
            err @ BasketError::Unauthenticated => AppError::Unauthorized(err.to_string()),
            err @ BasketError::CurrencyMismatch { .. } => {
                AppError::UnprocessableEntity(err.to_string())
            }
            BasketError::Unprocessable(msg) => AppError::UnprocessableEntity(msg),
            BasketError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for BasketError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
