use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use core_model::LifecycleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetSourceError {
    #[error("Asset source not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Asset source handle '{0}' already exists")]
    DuplicateHandle(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AssetSourceResult<T> = Result<T, AssetSourceError>;

impl From<LifecycleError> for AssetSourceError {
    fn from(err: LifecycleError) -> Self {
        AssetSourceError::Unprocessable(err.to_string())
    }
}

impl From<AssetSourceError> for AppError {
    fn from(err: AssetSourceError) -> Self {
        match err {
            AssetSourceError::NotFound(_) => {
                AppError::NotFound("Asset source not found".to_string())
            }
            AssetSourceError::Validation(msg) => AppError::Validation(msg),
            err @ AssetSourceError::DuplicateHandle(_) => AppError::Conflict(err.to_string()),
            AssetSourceError::Unprocessable(msg) => AppError::UnprocessableEntity(msg),
            AssetSourceError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for AssetSourceError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
