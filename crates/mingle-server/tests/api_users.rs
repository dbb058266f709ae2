mod common;

use axum::http::StatusCode;
use common::{body_json, json_request, request, setup_app};
use mingle_graph::load_follow_sets;
use mingle_identity::create_user;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn health_check_returns_ok() {
    let (app, _pool) = setup_app();

    let response = app
        .oneshot(request("GET", "/health", None))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn init_creates_then_reports_existing() {
    let (app, _pool) = setup_app();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/users/init",
            Some("ext-alice"),
            &json!({"display_name": "Alice", "image_url": "https://img/alice.png"}),
        ))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["status"], "created");
    assert_eq!(body["user"]["display_name"], "Alice");
    assert_eq!(body["user"]["is_verified"], false);

    // A second init for the same subject is a no-op.
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/users/init",
            Some("ext-alice"),
            &json!({"display_name": "Alice Again"}),
        ))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "exists");
    // The original profile wins.
    assert_eq!(body["user"]["display_name"], "Alice");
}

#[tokio::test]
async fn init_requires_subject_and_name() {
    let (app, _pool) = setup_app();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/users/init",
            None,
            &json!({"display_name": "Nobody"}),
        ))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/users/init",
            Some("ext-blank"),
            &json!({"display_name": ""}),
        ))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn protected_routes_reject_unknown_subjects() {
    let (app, _pool) = setup_app();

    let response = app
        .clone()
        .oneshot(request("GET", "/api/events", None))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // A subject without an account is just as unauthenticated.
    let response = app
        .oneshot(request("GET", "/api/events", Some("ext-ghost")))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bearer_token_works_like_the_header() {
    let (app, pool) = setup_app();

    {
        let conn = pool.get().expect("failed to get connection");
        create_user(&conn, "ext-alice", "Alice", None).expect("seed failed");
    }

    let response = app
        .oneshot(
            axum::http::Request::builder()
                .method("GET")
                .uri("/api/events")
                .header("Authorization", "Bearer ext-alice")
                .body(axum::body::Body::empty())
                .expect("request build failed"),
        )
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn follow_and_unfollow_round_trip() {
    let (app, pool) = setup_app();

    let (alice, bob) = {
        let conn = pool.get().expect("failed to get connection");
        (
            create_user(&conn, "ext-alice", "Alice", None).expect("seed failed"),
            create_user(&conn, "ext-bob", "Bob", None).expect("seed failed"),
        )
    };

    let uri = format!("/api/users/{}/follow", bob.id);
    let response = app
        .clone()
        .oneshot(request("POST", &uri, Some("ext-alice")))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::OK);

    // Following twice stays a single edge.
    let response = app
        .clone()
        .oneshot(request("POST", &uri, Some("ext-alice")))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::OK);

    {
        let conn = pool.get().expect("failed to get connection");
        let sets = load_follow_sets(&conn, &alice.id).expect("load failed");
        assert!(sets.follows(&bob.id));
        assert_eq!(sets.following.len(), 1);
    }

    let response = app
        .clone()
        .oneshot(request("DELETE", &uri, Some("ext-alice")))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::OK);

    {
        let conn = pool.get().expect("failed to get connection");
        let sets = load_follow_sets(&conn, &alice.id).expect("load failed");
        assert!(!sets.follows(&bob.id));
    }
}

#[tokio::test]
async fn following_an_unknown_user_is_not_found() {
    let (app, pool) = setup_app();

    {
        let conn = pool.get().expect("failed to get connection");
        create_user(&conn, "ext-alice", "Alice", None).expect("seed failed");
    }

    let response = app
        .oneshot(request(
            "POST",
            "/api/users/no-such-user/follow",
            Some("ext-alice"),
        ))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
