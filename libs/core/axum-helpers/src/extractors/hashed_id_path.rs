use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
    response::{IntoResponse, Response},
};

/// Longest token accepted before decoding is attempted
const MAX_LEN: usize = 64;

/// Hashed id taken from the single path parameter.
///
/// Only the shape is checked here (base62, bounded length). Decoding is left
/// to the repository that owns the codec; tokens that fail either step are
/// answered with 404 so valid and invalid ids are indistinguishable.
///
/// ```ignore
/// async fn show(HashedIdPath(id): HashedIdPath) -> impl IntoResponse { ... }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedIdPath(pub String);

impl HashedIdPath {
    pub fn is_well_formed(token: &str) -> bool {
        !token.is_empty() && token.len() <= MAX_LEN && token.chars().all(|c| c.is_ascii_alphanumeric())
    }
}

impl<S> FromRequestParts<S> for HashedIdPath
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(token) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()).into_response())?;

        if Self::is_well_formed(&token) {
            Ok(HashedIdPath(token))
        } else {
            Err(AppError::InvalidHashedId(token).into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, http::StatusCode, routing::get};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new().route(
            "/things/{id}",
            get(|HashedIdPath(id): HashedIdPath| async move { id }),
        )
    }

    #[tokio::test]
    async fn accepts_base62_tokens() {
        let response = app()
            .oneshot(Request::builder().uri("/things/aZ09xQ").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_tokens_are_not_found() {
        let response = app()
            .oneshot(Request::builder().uri("/things/a-b_c").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn length_is_bounded() {
        assert!(HashedIdPath::is_well_formed("abc"));
        assert!(!HashedIdPath::is_well_formed(""));
        assert!(!HashedIdPath::is_well_formed(&"a".repeat(MAX_LEN + 1)));
    }
}
