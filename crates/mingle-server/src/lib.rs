//! Mingle server library logic.
//!
//! Wires the stores and the projection core into an axum application. The
//! interesting decisions live in [`views`] (what a viewer may see) and in
//! `mingle-graph` (how that is decided); the handlers here are thin
//! load-then-assemble wrappers.

pub mod api_events;
pub mod api_messages;
pub mod api_tags;
pub mod api_users;
pub mod config;
pub mod middleware;
pub mod views;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use mingle_db::DbPool;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
}

/// Maximum request body size (2 MiB). Protects against OOM from oversized payloads.
const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/api/users/{userId}/follow",
            post(api_users::follow_user_handler).delete(api_users::unfollow_user_handler),
        )
        .route(
            "/api/events",
            get(api_events::list_events_handler).post(api_events::create_event_handler),
        )
        .route("/api/events/{eventId}", get(api_events::get_event_handler))
        .route(
            "/api/events/{eventId}/join",
            post(api_events::join_event_handler),
        )
        .route(
            "/api/events/{eventId}/messages",
            get(api_messages::list_messages_handler).post(api_messages::create_message_handler),
        )
        .route(
            "/api/tags",
            get(api_tags::list_tags_handler).post(api_tags::create_tag_handler),
        )
        .layer(axum::middleware::from_fn(middleware::auth_middleware));

    Router::new()
        .route("/health", get(health))
        .route("/api/users/init", post(api_users::init_user_handler))
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
