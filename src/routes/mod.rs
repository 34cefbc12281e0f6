use axum::{Router, routing::get};

use crate::AppState;

pub mod api;

pub fn create_router<S: AppState>() -> Router<S> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api", api::create_api_router())
}

async fn root() -> &'static str {
    "newsdesk article service"
}

async fn health() -> &'static str {
    "OK"
}
