use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::documents::handlers::{
    create_document, delete_document, get_document, list_documents,
};
use crate::features::documents::services::DocumentService;

/// Create routes for the documents feature
///
/// `GET /api/docs/{id}` also answers `HEAD` with the same headers.
pub fn routes(service: Arc<DocumentService>, max_upload_size: usize) -> Router {
    Router::new()
        .route(
            "/api/docs",
            post(create_document)
                .layer(DefaultBodyLimit::max(max_upload_size))
                .get(list_documents),
        )
        .route("/api/docs/{id}", get(get_document).delete(delete_document))
        .with_state(service)
}
