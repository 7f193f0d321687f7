//! # Evidence Routes
//!
//! Evidence submission for escalated disputes, the evidence listing, and
//! the minimal dispute projection shown on the evidence screen.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use tribunal_core::{DisputeId, Evidence};
use tribunal_engine::NewEvidence;

use crate::error::AppError;
use crate::extractors::Actor;
use crate::routes::disputes::AttachmentDto;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Request to submit evidence.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProvideEvidenceRequest {
    /// Free-text account of why this side won.
    pub description: String,
    /// Opaque image payload.
    pub image: AttachmentDto,
}

/// One evidence submission.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EvidenceResponse {
    pub id: String,
    pub dispute_id: String,
    pub user_id: String,
    pub description: String,
    pub image: AttachmentDto,
    pub submitted_at: DateTime<Utc>,
}

/// The minimal dispute projection for the evidence screen.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DisputeBriefResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image: Option<AttachmentDto>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the evidence router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/disputes/:id/evidence",
            post(provide_evidence).get(list_evidence),
        )
        .route("/v1/disputes/:id/brief", get(get_brief))
}

fn evidence_to_response(evidence: Evidence) -> EvidenceResponse {
    EvidenceResponse {
        id: evidence.id.to_string(),
        dispute_id: evidence.dispute_id.to_string(),
        user_id: evidence.user_id.to_string(),
        description: evidence.description,
        image: evidence.image.into(),
        submitted_at: evidence.submitted_at,
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/disputes/:id/evidence — Submit one side's evidence.
#[utoipa::path(
    post,
    path = "/v1/disputes/{id}/evidence",
    params(("id" = Uuid, Path, description = "Dispute id")),
    request_body = ProvideEvidenceRequest,
    responses(
        (status = 201, description = "Evidence recorded"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Not awaiting evidence"),
    ),
    tag = "evidence"
)]
pub(crate) async fn provide_evidence(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(request): Json<ProvideEvidenceRequest>,
) -> Result<StatusCode, AppError> {
    state
        .evidence
        .provide(NewEvidence {
            dispute_id: DisputeId::from_uuid(id),
            username: actor,
            description: request.description,
            image: request.image.into(),
        })
        .await?;
    Ok(StatusCode::CREATED)
}

/// GET /v1/disputes/:id/evidence — All evidence, in submission order.
#[utoipa::path(
    get,
    path = "/v1/disputes/{id}/evidence",
    params(("id" = Uuid, Path, description = "Dispute id")),
    responses(
        (status = 200, description = "Evidence rows", body = [EvidenceResponse]),
    ),
    tag = "evidence"
)]
pub(crate) async fn list_evidence(
    State(state): State<AppState>,
    Actor(_actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<EvidenceResponse>>, AppError> {
    let rows = state.evidence.list(DisputeId::from_uuid(id)).await?;
    Ok(Json(rows.into_iter().map(evidence_to_response).collect()))
}

/// GET /v1/disputes/:id/brief — The evidence-screen projection.
#[utoipa::path(
    get,
    path = "/v1/disputes/{id}/brief",
    params(("id" = Uuid, Path, description = "Dispute id")),
    responses(
        (status = 200, description = "Dispute brief", body = DisputeBriefResponse),
        (status = 404, description = "Not found"),
    ),
    tag = "evidence"
)]
pub(crate) async fn get_brief(
    State(state): State<AppState>,
    Actor(_actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<DisputeBriefResponse>, AppError> {
    let brief = state.disputes.brief(DisputeId::from_uuid(id)).await?;
    Ok(Json(DisputeBriefResponse {
        id: brief.id.to_string(),
        title: brief.title,
        description: brief.description,
        image: brief.image.map(Into::into),
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
