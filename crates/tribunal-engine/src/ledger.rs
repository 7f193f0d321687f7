//! # Ledger Store Contracts
//!
//! The data-access traits the engines consume, one per entity, unified by
//! the [`Ledger`] supertrait. Backends hold no business logic: they read
//! and write rows keyed by identifiers.
//!
//! Partial updates travel as patch structs whose `None` fields leave the
//! stored value untouched, so a single contract method covers every field
//! combination an engine writes.
//!
//! Read operations fail with [`StoreError::NotFound`] when no row matches;
//! everything else is an opaque [`StoreError::Backend`]. The helper
//! [`missing`] converts a lookup's `NotFound` into the context-appropriate
//! engine error at the call site.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use tribunal_core::{
    BallotId, BallotResult, Dispute, DisputeId, EngineError, Evidence, Investigation,
    InvestigationId, InvestigationStatus, JurorBallot, JurorChoice, PageCursor, Participation,
    ParticipationId, ParticipationResult, ParticipationStatus, StoreError, User, UserId,
};

// ── Patches ────────────────────────────────────────────────────────────

/// Partial update of a user row. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub notifications_enabled: Option<bool>,
    pub ready: Option<bool>,
    pub min_stake: Option<i64>,
    pub rating: Option<i64>,
    pub channel_id: Option<i64>,
}

/// Partial update of a participation row.
#[derive(Debug, Clone, Default)]
pub struct ParticipationPatch {
    pub status: Option<ParticipationStatus>,
    pub result: Option<ParticipationResult>,
    pub vote: Option<bool>,
    pub claim: Option<bool>,
}

/// Partial update of an investigation row.
#[derive(Debug, Clone, Default)]
pub struct InvestigationPatch {
    pub status: Option<InvestigationStatus>,
    pub p1: Option<i32>,
    pub p2: Option<i32>,
    pub draw: Option<i32>,
    pub total: Option<i32>,
}

/// Partial update of a juror ballot row.
#[derive(Debug, Clone, Default)]
pub struct BallotPatch {
    pub vote: Option<JurorChoice>,
    pub result: Option<BallotResult>,
}

// ── Filters ────────────────────────────────────────────────────────────

/// Filter for dispute list queries.
#[derive(Debug, Clone, Default)]
pub struct DisputeFilter {
    /// Restrict to participations in this status.
    pub status: Option<ParticipationStatus>,
    /// Restrict to participations with this result.
    pub result: Option<ParticipationResult>,
    /// Continue from a previous page.
    pub cursor: Option<PageCursor>,
    /// Page size; stores fetch `limit + 1` rows to detect a next page.
    pub limit: usize,
}

/// Filter for investigation list queries.
#[derive(Debug, Clone, Default)]
pub struct InvestigationFilter {
    /// Restrict to investigations in this status.
    pub status: Option<InvestigationStatus>,
    /// Continue from a previous page.
    pub cursor: Option<PageCursor>,
    /// Page size; stores fetch `limit + 1` rows to detect a next page.
    pub limit: usize,
}

// ── Read projections ───────────────────────────────────────────────────

/// A dispute joined with the viewing user's participation.
///
/// Stores return it with `opponent` unset; the engines resolve the
/// opponent's username before handing the view outward.
#[derive(Debug, Clone, Serialize)]
pub struct DisputeView {
    /// The dispute record.
    #[serde(flatten)]
    pub dispute: Dispute,
    /// The viewing user's outcome state.
    pub result: ParticipationResult,
    /// Whether the viewing user has an uncollected reward.
    pub claim: bool,
    /// The viewing user's self-reported claim.
    pub vote: bool,
    /// The other participant's username, resolved by the engine.
    pub opponent: Option<String>,
}

/// The minimal dispute projection shown on the evidence screen.
#[derive(Debug, Clone, Serialize)]
pub struct DisputeBrief {
    pub id: DisputeId,
    pub title: String,
    pub description: String,
    pub image: Option<tribunal_core::Attachment>,
}

/// An investigation joined with the viewing juror's own ballot.
///
/// Deliberately omits the running tallies so jurors cannot see how the
/// vote is leaning before they cast their own ballot.
#[derive(Debug, Clone, Serialize)]
pub struct InvestigationView {
    pub id: InvestigationId,
    pub dispute_id: DisputeId,
    pub title: String,
    pub status: InvestigationStatus,
    pub created_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// The viewing juror's ballot state.
    pub ballot_result: BallotResult,
    /// The viewing juror's choice, once cast.
    pub ballot_vote: Option<JurorChoice>,
}

// ── Contracts ──────────────────────────────────────────────────────────

/// User rows.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;
    async fn user_by_id(&self, id: UserId) -> Result<User, StoreError>;
    async fn user_by_username(&self, username: &str) -> Result<User, StoreError>;
    async fn username_exists(&self, username: &str) -> Result<bool, StoreError>;
    async fn count_users(&self) -> Result<i64, StoreError>;
    async fn users_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, StoreError>;
    async fn top_by_rating(&self, limit: i64) -> Result<Vec<User>, StoreError>;
    /// Add `delta` to the rating of every listed user.
    async fn add_rating(&self, ids: &[UserId], delta: i64) -> Result<(), StoreError>;
    async fn update_user(&self, username: &str, patch: UserPatch) -> Result<(), StoreError>;
}

/// Dispute rows and their joined projections.
#[async_trait]
pub trait DisputeStore: Send + Sync {
    async fn insert_dispute(&self, dispute: &Dispute) -> Result<(), StoreError>;
    /// The dispute as seen by one of its participants.
    async fn dispute_for(&self, dispute: DisputeId, user: UserId)
        -> Result<DisputeView, StoreError>;
    /// Up to `filter.limit + 1` joined rows for the user, newest first.
    async fn list_disputes(
        &self,
        user: UserId,
        filter: &DisputeFilter,
    ) -> Result<Vec<DisputeView>, StoreError>;
    /// Evidence-screen projection, no participant required.
    async fn dispute_brief(&self, dispute: DisputeId) -> Result<DisputeBrief, StoreError>;
}

/// Participation rows.
#[async_trait]
pub trait ParticipationStore: Send + Sync {
    async fn insert_participation(&self, row: &Participation) -> Result<(), StoreError>;
    async fn participation(
        &self,
        dispute: DisputeId,
        user: UserId,
    ) -> Result<Participation, StoreError>;
    async fn update_participation(
        &self,
        id: ParticipationId,
        patch: ParticipationPatch,
    ) -> Result<(), StoreError>;
    /// The other participant of a dispute.
    async fn opponent_id(&self, dispute: DisputeId, user: UserId) -> Result<UserId, StoreError>;
}

/// Evidence rows.
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    async fn insert_evidence(&self, evidence: &Evidence) -> Result<(), StoreError>;
    async fn evidence_count(&self, dispute: DisputeId) -> Result<i64, StoreError>;
    /// All evidence for a dispute, ordered by submission time.
    async fn evidence_for(&self, dispute: DisputeId) -> Result<Vec<Evidence>, StoreError>;
}

/// Investigation rows.
#[async_trait]
pub trait InvestigationStore: Send + Sync {
    async fn insert_investigation(&self, investigation: &Investigation)
        -> Result<(), StoreError>;
    /// The raw row, tallies included. Engine-side use only.
    async fn investigation(&self, id: InvestigationId) -> Result<Investigation, StoreError>;
    /// The investigation as seen by one juror.
    async fn investigation_for(
        &self,
        id: InvestigationId,
        user: UserId,
    ) -> Result<InvestigationView, StoreError>;
    /// Up to `filter.limit + 1` joined rows for the juror, newest first.
    async fn list_investigations(
        &self,
        user: UserId,
        filter: &InvestigationFilter,
    ) -> Result<Vec<InvestigationView>, StoreError>;
    async fn update_investigation(
        &self,
        id: InvestigationId,
        patch: InvestigationPatch,
    ) -> Result<(), StoreError>;
}

/// Juror ballot rows.
#[async_trait]
pub trait BallotStore: Send + Sync {
    /// Issue an unvoted ballot to every user except the two disputants.
    /// Returns the user ids that received one. The jury is frozen here:
    /// users registered after the broadcast never get a ballot.
    async fn broadcast_ballots(
        &self,
        investigation: InvestigationId,
        exclude: [UserId; 2],
    ) -> Result<Vec<UserId>, StoreError>;
    async fn ballot(
        &self,
        investigation: InvestigationId,
        user: UserId,
    ) -> Result<JurorBallot, StoreError>;
    async fn update_ballot(&self, id: BallotId, patch: BallotPatch) -> Result<(), StoreError>;
    /// Delete ballots never voted on. Returns how many were removed.
    async fn purge_unvoted(&self, investigation: InvestigationId) -> Result<u64, StoreError>;
    /// Users whose ballot recorded the given choice.
    async fn voters_by_choice(
        &self,
        investigation: InvestigationId,
        choice: JurorChoice,
    ) -> Result<Vec<UserId>, StoreError>;
    /// Mark the listed jurors' ballots `correct` and every other ballot of
    /// the investigation `incorrect`.
    async fn mark_ballots(
        &self,
        investigation: InvestigationId,
        correct: &[UserId],
    ) -> Result<(), StoreError>;
    /// The two original disputants, in evidence submission order: index 0
    /// is the first submitter ("p1"), index 1 the second ("p2").
    async fn disputants(&self, investigation: InvestigationId) -> Result<Vec<User>, StoreError>;
}

/// The full ledger contract consumed by the engines.
pub trait Ledger:
    UserStore + DisputeStore + ParticipationStore + EvidenceStore + InvestigationStore + BallotStore
{
}

impl<T> Ledger for T where
    T: UserStore
        + DisputeStore
        + ParticipationStore
        + EvidenceStore
        + InvestigationStore
        + BallotStore
{
}

// ── Error translation ──────────────────────────────────────────────────

/// Map a lookup's `NotFound` to a named engine error, everything else to
/// an opaque storage failure.
pub(crate) fn missing(entity: &'static str) -> impl FnOnce(StoreError) -> EngineError {
    move |err| match err {
        StoreError::NotFound => EngineError::NotFound(entity.to_string()),
        other => EngineError::Storage(other.to_string()),
    }
}

/// Map any store error to an opaque storage failure. For writes, where a
/// missing row is itself a backend inconsistency.
pub(crate) fn storage(err: StoreError) -> EngineError {
    EngineError::Storage(err.to_string())
}
