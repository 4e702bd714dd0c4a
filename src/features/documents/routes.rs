use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::documents::dtos::MAX_UPLOAD_SIZE;
use crate::features::documents::handlers::{
    delete_document, download_document, list_documents, upload_document,
};
use crate::features::documents::services::DocumentService;

/// Create routes for the documents feature
pub fn routes(service: Arc<DocumentService>) -> Router {
    Router::new()
        .route(
            "/documents/upload",
            // Allow body size up to MAX_UPLOAD_SIZE + buffer for multipart overhead
            post(upload_document).layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE + 1024 * 1024)),
        )
        .route("/documents", get(list_documents))
        .route(
            "/documents/{id}",
            get(download_document).delete(delete_document),
        )
        .with_state(service)
}
