//! # Investigation Routes
//!
//! The juror-facing surface: list and detail views that carry the caller's
//! own ballot (never the running tallies), and ballot voting.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use tribunal_core::{InvestigationId, Page};
use tribunal_engine::ledger::{InvestigationFilter, InvestigationView};

use crate::error::AppError;
use crate::extractors::Actor;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Juror ballot request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BallotRequest {
    /// `"p1"`, `"p2"`, or anything else for a draw.
    pub vote: String,
}

/// An investigation as seen by the calling juror.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InvestigationResponse {
    pub id: String,
    pub dispute_id: String,
    pub title: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// The caller's ballot state.
    pub ballot_result: String,
    /// The caller's choice, once cast.
    pub ballot_vote: Option<String>,
}

/// One page of investigations.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InvestigationPage {
    pub data: Vec<InvestigationResponse>,
    /// Cursor for the next page, absent on the last page.
    #[serde(rename = "nextCursor")]
    pub next_cursor: Option<String>,
}

/// Query parameters for the investigation list.
#[derive(Debug, Deserialize)]
pub struct ListInvestigationsQuery {
    pub status: Option<String>,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the investigation router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/investigations", get(list_investigations))
        .route("/v1/investigations/:id", get(get_investigation))
        .route("/v1/investigations/:id/vote", post(vote_investigation))
}

fn investigation_to_response(view: InvestigationView) -> InvestigationResponse {
    InvestigationResponse {
        id: view.id.to_string(),
        dispute_id: view.dispute_id.to_string(),
        title: view.title,
        status: view.status.as_str().to_string(),
        created_at: view.created_at,
        ends_at: view.ends_at,
        ballot_result: view.ballot_result.as_str().to_string(),
        ballot_vote: view.ballot_vote.map(|vote| vote.as_str().to_string()),
    }
}

fn page_to_response(page: Page<InvestigationView>) -> InvestigationPage {
    InvestigationPage {
        next_cursor: page.next_cursor.map(|cursor| cursor.to_string()),
        data: page
            .items
            .into_iter()
            .map(investigation_to_response)
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /v1/investigations — List the caller's investigations.
#[utoipa::path(
    get,
    path = "/v1/investigations",
    responses(
        (status = 200, description = "One page of investigations", body = InvestigationPage),
        (status = 422, description = "Invalid filter or cursor"),
    ),
    tag = "investigations"
)]
pub(crate) async fn list_investigations(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Query(query): Query<ListInvestigationsQuery>,
) -> Result<Json<InvestigationPage>, AppError> {
    let filter = InvestigationFilter {
        status: query
            .status
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
    };
    let page = state.investigations.list(&actor, filter).await?;
    Ok(Json(page_to_response(page)))
}

/// GET /v1/investigations/:id — The investigation as the caller sees it.
#[utoipa::path(
    get,
    path = "/v1/investigations/{id}",
    params(("id" = Uuid, Path, description = "Investigation id")),
    responses(
        (status = 200, description = "Investigation details", body = InvestigationResponse),
        (status = 404, description = "Not found"),
    ),
    tag = "investigations"
)]
pub(crate) async fn get_investigation(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<InvestigationResponse>, AppError> {
    let view = state
        .investigations
        .get(InvestigationId::from_uuid(id), &actor)
        .await?;
    Ok(Json(investigation_to_response(view)))
}

/// POST /v1/investigations/:id/vote — Cast the caller's ballot.
#[utoipa::path(
    post,
    path = "/v1/investigations/{id}/vote",
    params(("id" = Uuid, Path, description = "Investigation id")),
    request_body = BallotRequest,
    responses(
        (status = 204, description = "Ballot recorded"),
        (status = 404, description = "No ballot for this caller"),
        (status = 409, description = "Ballot already cast"),
    ),
    tag = "investigations"
)]
pub(crate) async fn vote_investigation(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(request): Json<BallotRequest>,
) -> Result<StatusCode, AppError> {
    state
        .investigations
        .vote(InvestigationId::from_uuid(id), &actor, &request.vote)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
