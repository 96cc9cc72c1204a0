use crate::features::auth::handlers;
use crate::features::auth::services::AuthService;
use axum::{
    routing::{delete, post},
    Router,
};
use std::sync::Arc;

/// Auth routes (no session required)
pub fn routes(service: Arc<AuthService>) -> Router {
    Router::new()
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/{token}", delete(handlers::logout))
        .with_state(service)
}
