use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use core_model::LifecycleError;
use thiserror::Error;

use crate::tree::TreeError;

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("Category not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Unsupported language(s): {}", .0.join(", "))]
    InvalidLanguage(Vec<String>),

    #[error("{0}")]
    MinimumRecordRequired(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("A category cannot be moved under itself or one of its descendants")]
    Cycle,

    #[error("Category {0} still has children")]
    HasChildren(String),

    #[error("Slug '{0}' is already used in this channel")]
    DuplicateSlug(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CategoryResult<T> = Result<T, CategoryError>;

impl From<LifecycleError> for CategoryError {
    fn from(err: LifecycleError) -> Self {
        CategoryError::Unprocessable(err.to_string())
    }
}

impl From<TreeError> for CategoryError {
    fn from(err: TreeError) -> Self {
        match err {
            TreeError::EmptySiblings => {
                CategoryError::Unprocessable("siblings must list at least one category".to_string())
            }
            TreeError::DuplicateSibling => {
                CategoryError::Unprocessable("a category is listed more than once".to_string())
            }
            // internal keys never leave the service
            TreeError::Unknown(_) => CategoryError::NotFound("category".to_string()),
            TreeError::Cycle => CategoryError::Cycle,
            TreeError::HasChildren(_) => CategoryError::HasChildren("category".to_string()),
            TreeError::LastRoot => CategoryError::MinimumRecordRequired(
                "A channel must keep at least one root category".to_string(),
            ),
        }
    }
}

impl From<CategoryError> for AppError {
    fn from(err: CategoryError) -> Self {
        match err {
            CategoryError::NotFound(_) => AppError::NotFound("Category not found".to_string()),
            CategoryError::Validation(msg) => AppError::Validation(msg),
            CategoryError::InvalidLanguage(locales) => AppError::InvalidLanguage(locales),
            CategoryError::MinimumRecordRequired(msg) => AppError::MinimumRecordRequired(msg),
            CategoryError::Unprocessable(msg) => AppError::UnprocessableEntity(msg),
            err @ CategoryError::Cycle => AppError::UnprocessableEntity(err.to_string()),
            err @ CategoryError::HasChildren(_) => AppError::UnprocessableEntity(err.to_string()),
            err @ CategoryError::DuplicateSlug(_) => AppError::Conflict(err.to_string()),
            CategoryError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for CategoryError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
