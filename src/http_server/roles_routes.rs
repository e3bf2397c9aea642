//! Roles HTTP Routes
//!
//! `GET /roles` returns the committed document, `POST /roles` replaces it.
//! Handlers only translate between HTTP and the document store.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::document::{DocumentError, DocumentStore};

/// Response header carrying the committed document version
pub const VERSION_HEADER: &str = "x-document-version";

#[derive(Debug, Serialize, Deserialize)]
pub struct ReplaceResponse {
    pub message: String,
    pub version: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

type ErrorReply = (StatusCode, Json<ErrorResponse>);

/// Create roles routes
///
/// The document has no size cap of its own, so axum's default body limit is
/// lifted for these routes.
pub fn roles_routes(store: Arc<DocumentStore>) -> Router {
    Router::new()
        .route("/roles", get(get_roles_handler).post(replace_roles_handler))
        .layer(DefaultBodyLimit::disable())
        .with_state(store)
}

fn error_reply(status: StatusCode, error: String) -> ErrorReply {
    (
        status,
        Json(ErrorResponse {
            error,
            code: status.as_u16(),
        }),
    )
}

impl From<DocumentError> for ErrorReply {
    fn from(err: DocumentError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        error_reply(status, err.to_string())
    }
}

async fn get_roles_handler(State(store): State<Arc<DocumentStore>>) -> impl IntoResponse {
    let document = store.read();

    (
        StatusCode::OK,
        [(VERSION_HEADER, document.version().to_string())],
        Json(document.content().clone()),
    )
}

async fn replace_roles_handler(
    State(store): State<Arc<DocumentStore>>,
    body: Bytes,
) -> Result<Json<ReplaceResponse>, ErrorReply> {
    // fsync and rename block; keep them off the async workers
    let version = tokio::task::spawn_blocking(move || store.replace(&body))
        .await
        .map_err(|e| {
            error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Replace task failed: {}", e),
            )
        })??;

    Ok(Json(ReplaceResponse {
        message: "Roles saved".to_string(),
        version,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::LoadPolicy;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn app(dir: &TempDir) -> Router {
        let store =
            DocumentStore::open(dir.path().join("roles.json"), LoadPolicy::Forgiving).unwrap();
        roles_routes(Arc::new(store))
    }

    #[tokio::test]
    async fn test_get_sets_version_header() {
        let dir = TempDir::new().unwrap();

        let response = app(&dir)
            .oneshot(Request::builder().uri("/roles").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[VERSION_HEADER], "0");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({"roles": []}));
    }

    #[tokio::test]
    async fn test_post_empty_body_is_bad_request() {
        let dir = TempDir::new().unwrap();

        let response = app(&dir)
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/roles")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, 400);
    }

    #[test]
    fn test_document_error_maps_to_status() {
        let reply: ErrorReply = DocumentError::InvalidDocument("bad".to_string()).into();
        let (status, Json(body)) = reply;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.error.contains("bad"));
    }
}
