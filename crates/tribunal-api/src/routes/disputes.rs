//! # Dispute Routes
//!
//! HTTP surface for the dispute lifecycle: creation, acceptance and
//! rejection, the two-party vote, reward claiming, and the list/detail
//! projections with cursor pagination.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use tribunal_core::{Attachment, DisputeId, Page};
use tribunal_engine::ledger::{DisputeFilter, DisputeView};
use tribunal_engine::NewDispute;

use crate::error::AppError;
use crate::extractors::Actor;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// An opaque attachment payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttachmentDto {
    /// Raw payload bytes.
    pub data: Vec<u8>,
    /// MIME type reported by the uploader.
    pub mime: String,
}

impl From<Attachment> for AttachmentDto {
    fn from(attachment: Attachment) -> Self {
        Self {
            data: attachment.data,
            mime: attachment.mime,
        }
    }
}

impl From<AttachmentDto> for Attachment {
    fn from(dto: AttachmentDto) -> Self {
        Self {
            data: dto.data,
            mime: dto.mime,
        }
    }
}

/// Request to create a dispute.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDisputeRequest {
    /// Short human-readable title.
    pub title: String,
    /// What the parties disagree about.
    pub description: String,
    /// Username of the challenged opponent.
    pub opponent: String,
    /// Wagered amount, strictly positive.
    pub amount: i64,
    /// Currency tag; defaults to "TON".
    pub currency: Option<String>,
    /// Optional illustration.
    pub image: Option<AttachmentDto>,
}

/// Identifier of a freshly created resource.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedResponse {
    pub id: String,
}

/// Self-reported vote request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VoteRequest {
    /// The claim "I won".
    pub win: bool,
}

/// A dispute as seen by the calling participant.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DisputeResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub amount: i64,
    pub currency: String,
    /// The caller's outcome state.
    pub result: String,
    /// Whether the caller holds an uncollected reward.
    pub claim: bool,
    /// The caller's self-reported claim.
    pub vote: bool,
    /// The other participant's username.
    pub opponent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One page of disputes.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DisputePage {
    pub data: Vec<DisputeResponse>,
    /// Cursor for the next page, absent on the last page.
    #[serde(rename = "nextCursor")]
    pub next_cursor: Option<String>,
}

/// Query parameters for the dispute list.
#[derive(Debug, Deserialize)]
pub struct ListDisputesQuery {
    pub status: Option<String>,
    pub result: Option<String>,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the dispute lifecycle router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/disputes", post(create_dispute).get(list_disputes))
        .route("/v1/disputes/:id", get(get_dispute))
        .route("/v1/disputes/:id/accept", post(accept_dispute))
        .route("/v1/disputes/:id/reject", post(reject_dispute))
        .route("/v1/disputes/:id/claim", post(claim_dispute))
        .route("/v1/disputes/:id/vote", post(vote_dispute))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn dispute_to_response(view: DisputeView) -> DisputeResponse {
    DisputeResponse {
        id: view.dispute.id.to_string(),
        title: view.dispute.title,
        description: view.dispute.description,
        amount: view.dispute.stake.amount,
        currency: view.dispute.stake.currency,
        result: view.result.as_str().to_string(),
        claim: view.claim,
        vote: view.vote,
        opponent: view.opponent,
        created_at: view.dispute.created_at,
        updated_at: view.dispute.updated_at,
    }
}

fn page_to_response(page: Page<DisputeView>) -> DisputePage {
    DisputePage {
        next_cursor: page.next_cursor.map(|cursor| cursor.to_string()),
        data: page.items.into_iter().map(dispute_to_response).collect(),
    }
}

fn parse_filter(query: ListDisputesQuery) -> Result<DisputeFilter, AppError> {
    Ok(DisputeFilter {
        status: query
            .status
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|err: tribunal_core::UnknownVariant| AppError::Validation(err.to_string()))?,
        result: query
            .result
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|err: tribunal_core::UnknownVariant| AppError::Validation(err.to_string()))?,
        cursor: query
            .cursor
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|err: tribunal_core::UnknownVariant| AppError::Validation(err.to_string()))?,
        limit: query.limit.unwrap_or(0),
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/disputes — Challenge an opponent.
#[utoipa::path(
    post,
    path = "/v1/disputes",
    request_body = CreateDisputeRequest,
    responses(
        (status = 201, description = "Dispute created", body = CreatedResponse),
        (status = 404, description = "Opponent not found"),
        (status = 422, description = "Validation error"),
    ),
    tag = "disputes"
)]
pub(crate) async fn create_dispute(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(request): Json<CreateDisputeRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let id = state
        .disputes
        .create(
            NewDispute {
                title: request.title,
                description: request.description,
                opponent: request.opponent,
                amount: request.amount,
                currency: request.currency,
                image: request.image.map(Into::into),
            },
            &actor,
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse { id: id.to_string() }),
    ))
}

/// GET /v1/disputes — List the caller's disputes, newest first.
#[utoipa::path(
    get,
    path = "/v1/disputes",
    responses(
        (status = 200, description = "One page of disputes", body = DisputePage),
        (status = 422, description = "Invalid filter or cursor"),
    ),
    tag = "disputes"
)]
pub(crate) async fn list_disputes(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Query(query): Query<ListDisputesQuery>,
) -> Result<Json<DisputePage>, AppError> {
    let filter = parse_filter(query)?;
    let page = state.disputes.list(&actor, filter).await?;
    Ok(Json(page_to_response(page)))
}

/// GET /v1/disputes/:id — The dispute as the caller sees it.
#[utoipa::path(
    get,
    path = "/v1/disputes/{id}",
    params(("id" = Uuid, Path, description = "Dispute id")),
    responses(
        (status = 200, description = "Dispute details", body = DisputeResponse),
        (status = 404, description = "Not found"),
    ),
    tag = "disputes"
)]
pub(crate) async fn get_dispute(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<DisputeResponse>, AppError> {
    let view = state.disputes.get(DisputeId::from_uuid(id), &actor).await?;
    Ok(Json(dispute_to_response(view)))
}

/// POST /v1/disputes/:id/accept — Accept an invitation.
#[utoipa::path(
    post,
    path = "/v1/disputes/{id}/accept",
    params(("id" = Uuid, Path, description = "Dispute id")),
    responses(
        (status = 204, description = "Accepted"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Not awaiting acceptance"),
    ),
    tag = "disputes"
)]
pub(crate) async fn accept_dispute(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .disputes
        .accept(DisputeId::from_uuid(id), &actor)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/disputes/:id/reject — Decline an invitation.
#[utoipa::path(
    post,
    path = "/v1/disputes/{id}/reject",
    params(("id" = Uuid, Path, description = "Dispute id")),
    responses(
        (status = 204, description = "Rejected"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Not awaiting acceptance"),
    ),
    tag = "disputes"
)]
pub(crate) async fn reject_dispute(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .disputes
        .reject(DisputeId::from_uuid(id), &actor)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/disputes/:id/claim — Collect a settled dispute's reward.
#[utoipa::path(
    post,
    path = "/v1/disputes/{id}/claim",
    params(("id" = Uuid, Path, description = "Dispute id")),
    responses(
        (status = 204, description = "Reward collected"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Not settled"),
    ),
    tag = "disputes"
)]
pub(crate) async fn claim_dispute(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .disputes
        .claim(DisputeId::from_uuid(id), &actor)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/disputes/:id/vote — Cast the self-reported vote.
#[utoipa::path(
    post,
    path = "/v1/disputes/{id}/vote",
    params(("id" = Uuid, Path, description = "Dispute id")),
    request_body = VoteRequest,
    responses(
        (status = 204, description = "Vote applied"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Not open for voting"),
    ),
    tag = "disputes"
)]
pub(crate) async fn vote_dispute(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(request): Json<VoteRequest>,
) -> Result<StatusCode, AppError> {
    state
        .disputes
        .vote(DisputeId::from_uuid(id), &actor, request.win)
        .await?;
    Ok(StatusCode::NO_CONTENT)
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

    use tribunal_engine::SettingsUpdate;

    fn test_app(state: AppState) -> Router<()> {
        router().with_state(state)
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
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

    fn get_as(uri: &str, actor: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .header("x-actor", actor)
            .body(Body::empty())
            .unwrap()
    }

    async fn seed_users(state: &AppState) {
        for name in ["alice", "bob"] {
            state.users.register_if_absent(name).await.unwrap();
            state
                .users
                .update_settings(
                    name,
                    SettingsUpdate {
                        ready: Some(true),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }
    }

    fn create_body() -> serde_json::Value {
        serde_json::json!({
            "title": "Chess match",
            "description": "Best of three, loser pays",
            "opponent": "bob",
            "amount": 100
        })
    }

    #[tokio::test]
    async fn create_returns_201_with_id() {
        let state = AppState::in_memory();
        seed_users(&state).await;

        let response = test_app(state)
            .oneshot(json_post("/v1/disputes", "alice", create_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created: CreatedResponse = body_json(response).await;
        assert!(Uuid::parse_str(&created.id).is_ok());
    }

    #[tokio::test]
    async fn create_without_actor_is_401() {
        let state = AppState::in_memory();
        seed_users(&state).await;

        let request = Request::builder()
            .method("POST")
            .uri("/v1/disputes")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&create_body()).unwrap()))
            .unwrap();
        let response = test_app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_for_unknown_opponent_is_404() {
        let state = AppState::in_memory();
        seed_users(&state).await;

        let mut body = create_body();
        body["opponent"] = serde_json::json!("nobody");
        let response = test_app(state)
            .oneshot(json_post("/v1/disputes", "alice", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_with_zero_amount_is_422() {
        let state = AppState::in_memory();
        seed_users(&state).await;

        let mut body = create_body();
        body["amount"] = serde_json::json!(0);
        let response = test_app(state)
            .oneshot(json_post("/v1/disputes", "alice", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn accept_then_double_accept_conflicts() {
        let state = AppState::in_memory();
        seed_users(&state).await;

        let response = test_app(state.clone())
            .oneshot(json_post("/v1/disputes", "alice", create_body()))
            .await
            .unwrap();
        let created: CreatedResponse = body_json(response).await;

        let uri = format!("/v1/disputes/{}/accept", created.id);
        let response = test_app(state.clone())
            .oneshot(json_post(&uri, "bob", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = test_app(state)
            .oneshot(json_post(&uri, "bob", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn vote_settles_and_shows_in_detail() {
        let state = AppState::in_memory();
        seed_users(&state).await;

        let response = test_app(state.clone())
            .oneshot(json_post("/v1/disputes", "alice", create_body()))
            .await
            .unwrap();
        let created: CreatedResponse = body_json(response).await;

        let accept = format!("/v1/disputes/{}/accept", created.id);
        test_app(state.clone())
            .oneshot(json_post(&accept, "bob", serde_json::json!({})))
            .await
            .unwrap();

        let vote = format!("/v1/disputes/{}/vote", created.id);
        test_app(state.clone())
            .oneshot(json_post(&vote, "alice", serde_json::json!({"win": true})))
            .await
            .unwrap();
        let response = test_app(state.clone())
            .oneshot(json_post(&vote, "bob", serde_json::json!({"win": false})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = test_app(state.clone())
            .oneshot(get_as(&format!("/v1/disputes/{}", created.id), "alice"))
            .await
            .unwrap();
        let detail: DisputeResponse = body_json(response).await;
        assert_eq!(detail.result, "win");
        assert!(detail.claim);
        assert_eq!(detail.opponent.as_deref(), Some("bob"));

        let response = test_app(state)
            .oneshot(get_as(&format!("/v1/disputes/{}", created.id), "bob"))
            .await
            .unwrap();
        let detail: DisputeResponse = body_json(response).await;
        assert_eq!(detail.result, "lose");
        assert!(!detail.claim);
    }

    #[tokio::test]
    async fn list_pages_with_next_cursor() {
        let state = AppState::in_memory();
        seed_users(&state).await;

        for _ in 0..12 {
            test_app(state.clone())
                .oneshot(json_post("/v1/disputes", "alice", create_body()))
                .await
                .unwrap();
        }

        let response = test_app(state.clone())
            .oneshot(get_as("/v1/disputes?limit=10", "alice"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let page: DisputePage = body_json(response).await;
        assert_eq!(page.data.len(), 10);
        let cursor = page.next_cursor.expect("expected a next page");

        let response = test_app(state)
            .oneshot(get_as(
                &format!("/v1/disputes?limit=10&cursor={}", urlencode(&cursor)),
                "alice",
            ))
            .await
            .unwrap();
        let page: DisputePage = body_json(response).await;
        assert_eq!(page.data.len(), 2);
        assert!(page.next_cursor.is_none());
    }

    #[tokio::test]
    async fn list_rejects_bad_filter() {
        let state = AppState::in_memory();
        seed_users(&state).await;

        let response = test_app(state)
            .oneshot(get_as("/v1/disputes?status=bogus", "alice"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn get_unknown_dispute_is_404() {
        let state = AppState::in_memory();
        seed_users(&state).await;

        let response = test_app(state)
            .oneshot(get_as(&format!("/v1/disputes/{}", Uuid::new_v4()), "alice"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    /// Percent-encode the characters a cursor can contain that are not
    /// URI-safe (`+` and `:`).
    fn urlencode(raw: &str) -> String {
        raw.replace('%', "%25")
            .replace('+', "%2B")
            .replace(':', "%3A")
    }
}
