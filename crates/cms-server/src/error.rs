//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cms_store::StoreError;
use serde_json::json;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ServerError {
    /// No active page has the given permalink.
    #[error("Page not found: {0}")]
    PageNotFound(String),

    /// Content store failure.
    #[error("Store error: {0}")]
    Store(StoreError),

    /// Response serialization failure.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::PageNotFound(permalink) => Self::PageNotFound(permalink),
            other => Self::Store(other),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::PageNotFound(permalink) => (
                StatusCode::NOT_FOUND,
                json!({"error": "Page not found", "path": permalink}),
            ),
            Self::Store(e) => {
                tracing::error!(error = %e, "Store error while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": "Internal server error"}),
                )
            }
            Self::Serialize(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": e.to_string()}),
            ),
        };

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_store_page_not_found_maps_to_404() {
        let err = ServerError::from(StoreError::PageNotFound("about".to_owned()));

        assert!(matches!(err, ServerError::PageNotFound(ref p) if p == "about"));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_other_store_errors_map_to_500() {
        let err = ServerError::from(StoreError::DuplicatePermalink("home".to_owned()));

        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
