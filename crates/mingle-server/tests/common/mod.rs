//! Shared setup for the API integration tests.

use axum::{
    body::{to_bytes, Body},
    http::Request,
    response::Response,
    Router,
};
use mingle_db::{create_pool, run_migrations, DbPool, DbRuntimeSettings};
use mingle_server::{app, AppState};
use serde_json::Value;

/// Builds the application against a fresh shared-cache in-memory database.
///
/// The pool is returned alongside the router so tests can seed and inspect
/// rows through the store crates.
pub fn setup_app() -> (Router, DbPool) {
    let db_id = uuid::Uuid::new_v4();
    let db_path = format!("file:memdb{}?mode=memory&cache=shared", db_id);
    let pool = create_pool(&db_path, DbRuntimeSettings::default()).expect("pool creation failed");
    {
        let conn = pool.get().expect("failed to get connection");
        run_migrations(&conn).expect("migrations failed");
    }

    (app(AppState { pool: pool.clone() }), pool)
}

/// A request with no body, authenticated as `subject` when given.
pub fn request(method: &str, uri: &str, subject: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(subject) = subject {
        builder = builder.header("X-Mingle-User", subject);
    }
    builder.body(Body::empty()).expect("request build failed")
}

/// A JSON request, authenticated as `subject` when given.
pub fn json_request(
    method: &str,
    uri: &str,
    subject: Option<&str>,
    body: &Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(subject) = subject {
        builder = builder.header("X-Mingle-User", subject);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request build failed")
}

/// Reads a response body as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&bytes).expect("body is not valid json")
}
