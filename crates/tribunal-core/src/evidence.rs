//! Evidence submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dispute::Attachment;
use crate::ids::{DisputeId, EvidenceId, UserId};

/// One evidence submission for a dispute.
///
/// Evidence is append-only and ordered by submission time. A dispute holds
/// at most two rows — one per side — and the arrival of the second row is
/// what opens the jury investigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    /// Unique submission identifier.
    pub id: EvidenceId,
    /// The dispute the evidence belongs to.
    pub dispute_id: DisputeId,
    /// The submitting participant.
    pub user_id: UserId,
    /// Free-text account of why this side won.
    pub description: String,
    /// Opaque image payload; the engine never interprets it.
    pub image: Attachment,
    /// When the evidence was submitted (UTC).
    pub submitted_at: DateTime<Utc>,
}

impl Evidence {
    /// Record a new evidence submission.
    pub fn submit(
        dispute_id: DisputeId,
        user_id: UserId,
        description: impl Into<String>,
        image: Attachment,
    ) -> Self {
        Self {
            id: EvidenceId::new(),
            dispute_id,
            user_id,
            description: description.into(),
            image,
            submitted_at: Utc::now(),
        }
    }
}
