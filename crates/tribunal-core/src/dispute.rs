//! Dispute records and stake validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::ids::DisputeId;

/// Default currency tag applied when a dispute request omits one.
pub const DEFAULT_CURRENCY: &str = "TON";

/// A wagered monetary stake.
///
/// The amount is an integer in the currency's smallest unit; zero and
/// negative stakes are rejected at construction time, so a `Stake` held by
/// a [`Dispute`] is always positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stake {
    /// Wagered amount, strictly positive.
    pub amount: i64,
    /// Currency tag (e.g. "TON").
    pub currency: String,
}

impl Stake {
    /// Create a validated stake.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] if `amount` is not strictly
    /// positive.
    pub fn new(amount: i64, currency: impl Into<String>) -> Result<Self, EngineError> {
        if amount <= 0 {
            return Err(EngineError::InvalidInput(format!(
                "stake amount must be positive, got {amount}"
            )));
        }
        Ok(Self {
            amount,
            currency: currency.into(),
        })
    }
}

impl std::fmt::Display for Stake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

/// An opaque binary payload attached to a dispute or evidence submission.
///
/// The engine never interprets the bytes; it stores and returns them as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Raw payload bytes.
    pub data: Vec<u8>,
    /// MIME type reported by the uploader (e.g. "image/jpeg").
    pub mime: String,
}

/// A wagered disagreement between two users.
///
/// The dispute record itself is immutable after creation; every per-user
/// outcome lives in the two [`Participation`](crate::Participation) rows
/// that own it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispute {
    /// Unique dispute identifier.
    pub id: DisputeId,
    /// Short human-readable title.
    pub title: String,
    /// What the parties disagree about.
    pub description: String,
    /// The wagered stake.
    pub stake: Stake,
    /// Optional illustration supplied at creation time.
    pub image: Option<Attachment>,
    /// When the dispute was created (UTC).
    pub created_at: DateTime<Utc>,
    /// When the dispute record was last touched (UTC).
    pub updated_at: DateTime<Utc>,
}

impl Dispute {
    /// Open a new dispute record.
    pub fn open(
        title: impl Into<String>,
        description: impl Into<String>,
        stake: Stake,
        image: Option<Attachment>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: DisputeId::new(),
            title: title.into(),
            description: description.into(),
            stake,
            image,
            created_at: now,
            updated_at: now,
        }
    }
}
