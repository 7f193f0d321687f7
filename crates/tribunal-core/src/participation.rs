//! # Participation State Machine
//!
//! One user's state within one dispute. Every dispute owns exactly two
//! participation rows that evolve in lock-step: the invited opponent starts
//! at `new`/`new`, the creator at `current`/`sent`.
//!
//! ## Design Choice: Validated Enum over Typestate
//!
//! Statuses and results are validated enums rather than typestate. The pair
//! of rows is mutated together by the engines, persisted between every
//! transition, and filtered on in list queries — the states must exist as
//! runtime values. Transition legality is still closed: the engines check
//! preconditions before writing, and [`ParticipationResult::valid_transitions`]
//! documents the full graph so the rules are testable as data.
//!
//! ## Result Transition Graph
//!
//! ```text
//! new ─▶ processed             (invitee accepts)
//! new ─▶ rejected              (invitee declines; terminal)
//! sent ─▶ processed            (creator's side, on accept or reject)
//! processed ─▶ answered        (voted first, waiting on opponent)
//! processed / answered ─▶ draw | win | lose   (quadrants resolve directly)
//! processed / answered ─▶ evidence            (both claim victory)
//! evidence ─▶ evidence_answered               (first evidence in)
//! evidence / evidence_answered ─▶ inspected   (second evidence in)
//! inspected ─▶ win | lose | draw              (investigation closes)
//! ```
//!
//! `rejected`, `win`, `lose`, and `draw` are terminal.

use serde::{Deserialize, Serialize};

use crate::error::UnknownVariant;
use crate::ids::{DisputeId, ParticipationId, UserId};

// ── Status ─────────────────────────────────────────────────────────────

/// Coarse lifecycle bucket for a participation row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationStatus {
    /// Invitation delivered, not yet accepted or rejected.
    New,
    /// Dispute is live for this user.
    Current,
    /// This user's side of the dispute is settled.
    Passed,
}

impl ParticipationStatus {
    /// The canonical string name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Current => "current",
            Self::Passed => "passed",
        }
    }
}

impl std::fmt::Display for ParticipationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ParticipationStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "current" => Ok(Self::Current),
            "passed" => Ok(Self::Passed),
            other => Err(UnknownVariant::new("participation status", other)),
        }
    }
}

// ── Result ─────────────────────────────────────────────────────────────

/// Fine-grained outcome state for a participation row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationResult {
    /// Invitation created, not yet acted on.
    New,
    /// Creator's side: challenge sent, awaiting the opponent.
    Sent,
    /// Dispute accepted; awaiting self-reported votes.
    Processed,
    /// This user voted first and is waiting on the opponent.
    Answered,
    /// Both parties claimed victory; evidence is now required.
    Evidence,
    /// This user submitted the first piece of evidence.
    EvidenceAnswered,
    /// Both pieces of evidence are in; a jury investigation is running.
    Inspected,
    /// Invitation declined. Terminal.
    Rejected,
    /// Won the dispute. Terminal.
    Win,
    /// Lost the dispute. Terminal.
    Lose,
    /// Dispute ended even. Terminal.
    Draw,
}

impl ParticipationResult {
    /// The canonical string name of this result.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Sent => "sent",
            Self::Processed => "processed",
            Self::Answered => "answered",
            Self::Evidence => "evidence",
            Self::EvidenceAnswered => "evidence_answered",
            Self::Inspected => "inspected",
            Self::Rejected => "rejected",
            Self::Win => "win",
            Self::Lose => "lose",
            Self::Draw => "draw",
        }
    }

    /// Whether this result is terminal (no further transitions allowed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Win | Self::Lose | Self::Draw)
    }

    /// Valid target results from this result.
    pub fn valid_transitions(&self) -> &'static [ParticipationResult] {
        match self {
            Self::New => &[Self::Processed, Self::Rejected],
            Self::Sent => &[Self::Processed],
            Self::Processed => &[
                Self::Answered,
                Self::Draw,
                Self::Win,
                Self::Lose,
                Self::Evidence,
            ],
            Self::Answered => &[Self::Draw, Self::Win, Self::Lose, Self::Evidence],
            Self::Evidence => &[Self::EvidenceAnswered, Self::Inspected],
            Self::EvidenceAnswered => &[Self::Inspected],
            Self::Inspected => &[Self::Win, Self::Lose, Self::Draw],
            Self::Rejected | Self::Win | Self::Lose | Self::Draw => &[],
        }
    }
}

impl std::fmt::Display for ParticipationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ParticipationResult {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "sent" => Ok(Self::Sent),
            "processed" => Ok(Self::Processed),
            "answered" => Ok(Self::Answered),
            "evidence" => Ok(Self::Evidence),
            "evidence_answered" => Ok(Self::EvidenceAnswered),
            "inspected" => Ok(Self::Inspected),
            "rejected" => Ok(Self::Rejected),
            "win" => Ok(Self::Win),
            "lose" => Ok(Self::Lose),
            "draw" => Ok(Self::Draw),
            other => Err(UnknownVariant::new("participation result", other)),
        }
    }
}

// ── The Participation ──────────────────────────────────────────────────

/// One user's state and outcome within one dispute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participation {
    /// Unique row identifier.
    pub id: ParticipationId,
    /// The dispute this row belongs to.
    pub dispute_id: DisputeId,
    /// The user this row belongs to.
    pub user_id: UserId,
    /// Coarse lifecycle bucket.
    pub status: ParticipationStatus,
    /// Fine-grained outcome state.
    pub result: ParticipationResult,
    /// Self-reported claim: true for "I won". Meaningful once `result`
    /// reaches `answered` or later.
    pub vote: bool,
    /// Whether an uncollected reward is available to this user.
    pub claim: bool,
}

impl Participation {
    /// Row for the invited opponent: `new`/`new`.
    pub fn invited(dispute_id: DisputeId, user_id: UserId) -> Self {
        Self::fresh(
            dispute_id,
            user_id,
            ParticipationStatus::New,
            ParticipationResult::New,
        )
    }

    /// Row for the dispute creator: `current`/`sent`.
    pub fn initiating(dispute_id: DisputeId, user_id: UserId) -> Self {
        Self::fresh(
            dispute_id,
            user_id,
            ParticipationStatus::Current,
            ParticipationResult::Sent,
        )
    }

    fn fresh(
        dispute_id: DisputeId,
        user_id: UserId,
        status: ParticipationStatus,
        result: ParticipationResult,
    ) -> Self {
        Self {
            id: ParticipationId::new(),
            dispute_id,
            user_id,
            status,
            result,
            vote: false,
            claim: false,
        }
    }
}
