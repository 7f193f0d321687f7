//! # Dispute Lifecycle — End-to-End Integration Tests
//!
//! Exercises the dispute lifecycle through the HTTP API over the
//! in-memory ledger: registration, challenge, acceptance, the voting
//! quadrants, claiming, and pagination.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use tribunal_api::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn test_app(state: AppState) -> axum::Router {
    tribunal_api::app(state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_post(uri: &str, actor: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-actor", actor)
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn json_patch(uri: &str, actor: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("PATCH")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-actor", actor)
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn json_get(uri: &str, actor: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-actor", actor)
        .body(Body::empty())
        .unwrap()
}

/// Register a user and mark them ready over HTTP.
async fn register(app: &axum::Router, username: &str) {
    let response = app
        .clone()
        .oneshot(json_post(
            "/v1/users",
            username,
            serde_json::json!({"username": username}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_patch(
            &format!("/v1/users/{username}"),
            username,
            serde_json::json!({"ready": true, "notifications_enabled": true}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

/// Create a dispute and return its id.
async fn challenge(app: &axum::Router, creator: &str, opponent: &str, amount: i64) -> String {
    let response = app
        .clone()
        .oneshot(json_post(
            "/v1/disputes",
            creator,
            serde_json::json!({
                "title": "Chess match",
                "description": "Best of three, loser pays",
                "opponent": opponent,
                "amount": amount
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_str().unwrap().to_string()
}

async fn dispute_view(app: &axum::Router, id: &str, actor: &str) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(json_get(&format!("/v1/disputes/{id}"), actor))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn challenge_accept_and_split_vote_settles_win_lose() {
    let app = test_app(AppState::in_memory());
    register(&app, "alice").await;
    register(&app, "bob").await;

    let id = challenge(&app, "alice", "bob", 100).await;

    // Bob sees the invitation.
    let view = dispute_view(&app, &id, "bob").await;
    assert_eq!(view["result"], "new");
    assert_eq!(view["opponent"], "alice");

    // Accept, then alice claims victory and bob concedes.
    let response = app
        .clone()
        .oneshot(json_post(
            &format!("/v1/disputes/{id}/accept"),
            "bob",
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    for (actor, win) in [("alice", true), ("bob", false)] {
        let response = app
            .clone()
            .oneshot(json_post(
                &format!("/v1/disputes/{id}/vote"),
                actor,
                serde_json::json!({"win": win}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    // Win and lose line up, never win/win.
    let alice_view = dispute_view(&app, &id, "alice").await;
    let bob_view = dispute_view(&app, &id, "bob").await;
    assert_eq!(alice_view["result"], "win");
    assert_eq!(alice_view["claim"], true);
    assert_eq!(bob_view["result"], "lose");
    assert_eq!(bob_view["claim"], false);

    // The winner collects exactly once.
    let response = app
        .clone()
        .oneshot(json_post(
            &format!("/v1/disputes/{id}/claim"),
            "alice",
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let view = dispute_view(&app, &id, "alice").await;
    assert_eq!(view["claim"], false);
}

#[tokio::test]
async fn rejection_gives_the_creator_an_immediate_claim() {
    let app = test_app(AppState::in_memory());
    register(&app, "alice").await;
    register(&app, "bob").await;

    let id = challenge(&app, "alice", "bob", 100).await;
    let response = app
        .clone()
        .oneshot(json_post(
            &format!("/v1/disputes/{id}/reject"),
            "bob",
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let alice_view = dispute_view(&app, &id, "alice").await;
    assert_eq!(alice_view["claim"], true);
    let bob_view = dispute_view(&app, &id, "bob").await;
    assert_eq!(bob_view["result"], "rejected");
    assert_eq!(bob_view["claim"], false);
}

#[tokio::test]
async fn minimum_stake_is_enforced_end_to_end() {
    let app = test_app(AppState::in_memory());
    register(&app, "alice").await;
    register(&app, "bob").await;

    let response = app
        .clone()
        .oneshot(json_patch(
            "/v1/users/bob",
            "bob",
            serde_json::json!({"min_stake": 1000}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(json_post(
            "/v1/disputes",
            "alice",
            serde_json::json!({
                "title": "Chess match",
                "description": "Best of three",
                "opponent": "bob",
                "amount": 999
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn pagination_walks_pages_without_overlap() {
    let app = test_app(AppState::in_memory());
    register(&app, "alice").await;
    register(&app, "bob").await;

    for _ in 0..13 {
        challenge(&app, "alice", "bob", 100).await;
    }

    let response = app
        .clone()
        .oneshot(json_get("/v1/disputes?limit=5", "alice"))
        .await
        .unwrap();
    let first = body_json(response).await;
    assert_eq!(first["data"].as_array().unwrap().len(), 5);
    let cursor = first["nextCursor"].as_str().unwrap().to_string();

    let mut seen: Vec<String> = first["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["id"].as_str().unwrap().to_string())
        .collect();

    // Walk the remaining pages.
    let mut cursor = Some(cursor);
    while let Some(current) = cursor.take() {
        let encoded = current.replace('+', "%2B").replace(':', "%3A");
        let response = app
            .clone()
            .oneshot(json_get(
                &format!("/v1/disputes?limit=5&cursor={encoded}"),
                "alice",
            ))
            .await
            .unwrap();
        let page = body_json(response).await;
        for row in page["data"].as_array().unwrap() {
            let id = row["id"].as_str().unwrap().to_string();
            assert!(!seen.contains(&id), "page overlap on {id}");
            seen.push(id);
        }
        cursor = page["nextCursor"].as_str().map(String::from);
    }
    assert_eq!(seen.len(), 13);
}
