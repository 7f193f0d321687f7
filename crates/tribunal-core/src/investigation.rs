//! # Investigations and Juror Ballots
//!
//! A jury investigation opens when both disputants claim victory and both
//! have submitted evidence. The eligible jury — every user except the two
//! disputants — is frozen at creation time as explicit ballot rows; users
//! who register later are not retroactively added.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::UnknownVariant;
use crate::ids::{BallotId, DisputeId, InvestigationId, UserId};

/// Advisory voting window length. `ends_at` is informational only; no
/// background sweep closes an investigation — only the final ballot does.
pub const JURY_WINDOW_HOURS: i64 = 24;

// ── Status ─────────────────────────────────────────────────────────────

/// Lifecycle state of an investigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestigationStatus {
    /// Open for juror ballots.
    Current,
    /// Every expected ballot is in and the outcome has been applied.
    /// Terminal; the flip from `current` happens exactly once.
    Passed,
}

impl InvestigationStatus {
    /// The canonical string name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Passed => "passed",
        }
    }
}

impl std::fmt::Display for InvestigationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for InvestigationStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "current" => Ok(Self::Current),
            "passed" => Ok(Self::Passed),
            other => Err(UnknownVariant::new("investigation status", other)),
        }
    }
}

// ── Juror choice ───────────────────────────────────────────────────────

/// What a juror voted for: the first disputant, the second, or a draw.
///
/// "First" and "second" follow evidence submission order — participant one
/// is whoever submitted evidence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JurorChoice {
    /// The first evidence submitter won.
    P1,
    /// The second evidence submitter won.
    P2,
    /// Neither side proved its claim.
    Draw,
}

impl JurorChoice {
    /// The canonical string name of this choice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P1 => "p1",
            Self::P2 => "p2",
            Self::Draw => "draw",
        }
    }

    /// Interpret raw ballot input. Anything other than `"p1"` or `"p2"`
    /// counts as a draw vote.
    pub fn from_ballot_input(s: &str) -> Self {
        match s {
            "p1" => Self::P1,
            "p2" => Self::P2,
            _ => Self::Draw,
        }
    }
}

impl std::fmt::Display for JurorChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for JurorChoice {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "p1" => Ok(Self::P1),
            "p2" => Ok(Self::P2),
            "draw" => Ok(Self::Draw),
            other => Err(UnknownVariant::new("juror choice", other)),
        }
    }
}

// ── The Investigation ──────────────────────────────────────────────────

/// A crowd-arbitration process for one dispute.
///
/// `total` is fixed at creation to the jury size at that moment; the
/// tallies `p1`/`p2`/`draw` climb toward it as ballots arrive. The
/// investigation closes on the ballot that makes the tallies sum to
/// `total`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Investigation {
    /// Unique investigation identifier.
    pub id: InvestigationId,
    /// The disputed dispute. Exactly one investigation exists per dispute.
    pub dispute_id: DisputeId,
    /// Mirrors the dispute's title for display.
    pub title: String,
    /// Number of ballots expected, frozen at creation.
    pub total: i32,
    /// Ballots for the first disputant.
    pub p1: i32,
    /// Ballots for the second disputant.
    pub p2: i32,
    /// Ballots for a draw.
    pub draw: i32,
    /// Lifecycle state.
    pub status: InvestigationStatus,
    /// When the investigation opened (UTC).
    pub created_at: DateTime<Utc>,
    /// Advisory voting deadline; not enforced.
    pub ends_at: DateTime<Utc>,
}

impl Investigation {
    /// Open a new investigation expecting `total` ballots.
    pub fn open(dispute_id: DisputeId, title: impl Into<String>, total: i32) -> Self {
        let now = Utc::now();
        Self {
            id: InvestigationId::new(),
            dispute_id,
            title: title.into(),
            total,
            p1: 0,
            p2: 0,
            draw: 0,
            status: InvestigationStatus::Current,
            created_at: now,
            ends_at: now + Duration::hours(JURY_WINDOW_HOURS),
        }
    }

    /// How many ballots have been cast so far.
    pub fn votes_cast(&self) -> i32 {
        self.p1 + self.p2 + self.draw
    }

    /// Whether every expected ballot is in.
    pub fn is_complete(&self) -> bool {
        self.votes_cast() == self.total
    }
}

// ── Juror ballots ──────────────────────────────────────────────────────

/// Tally state of a single juror's ballot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BallotResult {
    /// Issued at broadcast, not yet voted.
    New,
    /// Vote recorded, investigation still open.
    Sent,
    /// Vote matched the final outcome.
    Correct,
    /// Vote did not match the final outcome.
    Incorrect,
}

impl BallotResult {
    /// The canonical string name of this result.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Sent => "sent",
            Self::Correct => "correct",
            Self::Incorrect => "incorrect",
        }
    }
}

impl std::fmt::Display for BallotResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BallotResult {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "sent" => Ok(Self::Sent),
            "correct" => Ok(Self::Correct),
            "incorrect" => Ok(Self::Incorrect),
            other => Err(UnknownVariant::new("ballot result", other)),
        }
    }
}

/// One juror's vote record within one investigation.
///
/// A row is issued to every eligible juror at broadcast time and remains
/// even if the juror never votes — except that unvoted rows are purged
/// when the investigation closes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JurorBallot {
    /// Unique ballot identifier.
    pub id: BallotId,
    /// The investigation this ballot belongs to.
    pub investigation_id: InvestigationId,
    /// The juror it was issued to.
    pub user_id: UserId,
    /// The juror's choice, once cast.
    pub vote: Option<JurorChoice>,
    /// Tally state.
    pub result: BallotResult,
}

impl JurorBallot {
    /// Issue an unvoted ballot to a juror.
    pub fn issued(investigation_id: InvestigationId, user_id: UserId) -> Self {
        Self {
            id: BallotId::new(),
            investigation_id,
            user_id,
            vote: None,
            result: BallotResult::New,
        }
    }
}
