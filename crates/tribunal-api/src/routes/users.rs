//! # User Routes
//!
//! Registration, profile lookup, self-service settings, and the jury
//! leaderboard.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use tribunal_core::User;
use tribunal_engine::SettingsUpdate;

use crate::error::AppError;
use crate::extractors::Actor;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Request to register a user.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
}

/// Request to change one's own settings. Absent fields stay unchanged.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SettingsRequest {
    pub notifications_enabled: Option<bool>,
    pub ready: Option<bool>,
    pub min_stake: Option<i64>,
    pub channel_id: Option<i64>,
}

/// A user profile.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub notifications_enabled: bool,
    pub ready: bool,
    pub min_stake: i64,
    pub rating: i64,
    pub created_at: DateTime<Utc>,
}

/// One leaderboard row.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardEntry {
    pub username: String,
    pub rating: i64,
}

/// Query parameters for the leaderboard.
#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<i64>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the user router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/users", post(register_user))
        .route("/v1/users/top", get(leaderboard))
        .route("/v1/users/:username", get(get_user).patch(update_settings))
}

fn user_to_response(user: User) -> UserResponse {
    UserResponse {
        id: user.id.to_string(),
        username: user.username,
        notifications_enabled: user.notifications_enabled,
        ready: user.ready,
        min_stake: user.min_stake,
        rating: user.rating,
        created_at: user.created_at,
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/users — Register a username. Idempotent.
#[utoipa::path(
    post,
    path = "/v1/users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered (or already present)"),
        (status = 422, description = "Validation error"),
    ),
    tag = "users"
)]
pub(crate) async fn register_user(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<StatusCode, AppError> {
    state.users.register_if_absent(&request.username).await?;
    Ok(StatusCode::CREATED)
}

/// GET /v1/users/:username — Profile lookup.
#[utoipa::path(
    get,
    path = "/v1/users/{username}",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 404, description = "Not found"),
    ),
    tag = "users"
)]
pub(crate) async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.users.by_username(&username).await?;
    Ok(Json(user_to_response(user)))
}

/// PATCH /v1/users/:username — Change one's own settings.
#[utoipa::path(
    patch,
    path = "/v1/users/{username}",
    params(("username" = String, Path, description = "Username")),
    request_body = SettingsRequest,
    responses(
        (status = 204, description = "Settings applied"),
        (status = 403, description = "Not the caller's own profile"),
        (status = 404, description = "Not found"),
    ),
    tag = "users"
)]
pub(crate) async fn update_settings(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(username): Path<String>,
    Json(request): Json<SettingsRequest>,
) -> Result<StatusCode, AppError> {
    if actor != username {
        return Err(AppError::Forbidden(
            "settings can only be changed by their owner".to_string(),
        ));
    }
    state
        .users
        .update_settings(
            &username,
            SettingsUpdate {
                notifications_enabled: request.notifications_enabled,
                ready: request.ready,
                min_stake: request.min_stake,
                channel_id: request.channel_id,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/users/top — The highest-rated jurors.
#[utoipa::path(
    get,
    path = "/v1/users/top",
    responses(
        (status = 200, description = "Leaderboard", body = [LeaderboardEntry]),
    ),
    tag = "users"
)]
pub(crate) async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    let users = state.users.leaderboard(query.limit.unwrap_or(10)).await?;
    Ok(Json(
        users
            .into_iter()
            .map(|user| LeaderboardEntry {
                username: user.username,
                rating: user.rating,
            })
            .collect(),
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_app(state: AppState) -> Router<()> {
        router().with_state(state)
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(
        method: &str,
        uri: &str,
        actor: Option<&str>,
        body: serde_json::Value,
    ) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(actor) = actor {
            builder = builder.header("x-actor", actor);
        }
        builder
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap()
    }

    #[tokio::test]
    async fn register_then_get_roundtrip() {
        let state = AppState::in_memory();

        let response = test_app(state.clone())
            .oneshot(json_request(
                "POST",
                "/v1/users",
                None,
                serde_json::json!({"username": "alice"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        // Registration is idempotent.
        let response = test_app(state.clone())
            .oneshot(json_request(
                "POST",
                "/v1/users",
                None,
                serde_json::json!({"username": "alice"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let request = Request::builder()
            .method("GET")
            .uri("/v1/users/alice")
            .body(Body::empty())
            .unwrap();
        let response = test_app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let user: UserResponse = body_json(response).await;
        assert_eq!(user.username, "alice");
        assert!(!user.ready);
        assert_eq!(user.rating, 0);
    }

    #[tokio::test]
    async fn unknown_user_is_404() {
        let state = AppState::in_memory();
        let request = Request::builder()
            .method("GET")
            .uri("/v1/users/ghost")
            .body(Body::empty())
            .unwrap();
        let response = test_app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn settings_require_matching_actor() {
        let state = AppState::in_memory();
        state.users.register_if_absent("alice").await.unwrap();

        let response = test_app(state.clone())
            .oneshot(json_request(
                "PATCH",
                "/v1/users/alice",
                Some("bob"),
                serde_json::json!({"ready": true}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = test_app(state.clone())
            .oneshot(json_request(
                "PATCH",
                "/v1/users/alice",
                Some("alice"),
                serde_json::json!({"ready": true, "min_stake": 250}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let user = state.users.by_username("alice").await.unwrap();
        assert!(user.ready);
        assert_eq!(user.min_stake, 250);
    }

    #[tokio::test]
    async fn leaderboard_returns_rows() {
        let state = AppState::in_memory();
        for name in ["alice", "bob"] {
            state.users.register_if_absent(name).await.unwrap();
        }

        let request = Request::builder()
            .method("GET")
            .uri("/v1/users/top?limit=1")
            .body(Body::empty())
            .unwrap();
        let response = test_app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let rows: Vec<LeaderboardEntry> = body_json(response).await;
        assert_eq!(rows.len(), 1);
    }
}
