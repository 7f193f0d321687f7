//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use utoipa::OpenApi;

use crate::routes;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tribunal API",
        description = "Two-party monetary dispute arbitration with escalation to crowd-sourced jury investigation.\n\nProvides:\n- **Dispute lifecycle**: challenge, accept/reject, self-reported voting, reward claiming\n- **Evidence intake**: per-side submissions that escalate to a jury investigation\n- **Investigations**: juror ballots, plurality outcomes, rating rewards\n- **Users**: registration, settings, jury leaderboard\n\nThe acting user is taken from the `x-actor` header; authentication lives at the perimeter.",
        license(name = "MIT"),
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    paths(
        // ── Disputes ─────────────────────────────────────────────────
        routes::disputes::create_dispute,
        routes::disputes::list_disputes,
        routes::disputes::get_dispute,
        routes::disputes::accept_dispute,
        routes::disputes::reject_dispute,
        routes::disputes::claim_dispute,
        routes::disputes::vote_dispute,
        // ── Evidence ─────────────────────────────────────────────────
        routes::evidence::provide_evidence,
        routes::evidence::list_evidence,
        routes::evidence::get_brief,
        // ── Investigations ───────────────────────────────────────────
        routes::investigations::list_investigations,
        routes::investigations::get_investigation,
        routes::investigations::vote_investigation,
        // ── Users ────────────────────────────────────────────────────
        routes::users::register_user,
        routes::users::get_user,
        routes::users::update_settings,
        routes::users::leaderboard,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        routes::disputes::AttachmentDto,
        routes::disputes::CreateDisputeRequest,
        routes::disputes::CreatedResponse,
        routes::disputes::VoteRequest,
        routes::disputes::DisputeResponse,
        routes::disputes::DisputePage,
        routes::evidence::ProvideEvidenceRequest,
        routes::evidence::EvidenceResponse,
        routes::evidence::DisputeBriefResponse,
        routes::investigations::BallotRequest,
        routes::investigations::InvestigationResponse,
        routes::investigations::InvestigationPage,
        routes::users::RegisterRequest,
        routes::users::SettingsRequest,
        routes::users::UserResponse,
        routes::users::LeaderboardEntry,
    )),
    tags(
        (name = "disputes", description = "Dispute lifecycle"),
        (name = "evidence", description = "Evidence intake"),
        (name = "investigations", description = "Jury investigations"),
        (name = "users", description = "Users and leaderboard"),
    )
)]
pub struct ApiDoc;
