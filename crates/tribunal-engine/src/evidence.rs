//! # Evidence Intake
//!
//! Records evidence submissions for escalated disputes and opens the jury
//! investigation when the second submission lands.
//!
//! Whether a submission is "first" or "second" is decided by counting the
//! dispute's existing evidence rows under the dispute's aggregate lock, so
//! two concurrent submissions cannot both observe an empty set.

use std::sync::Arc;

use tribunal_core::{
    Attachment, DisputeId, EngineError, Evidence, Investigation, ParticipationResult,
};

use crate::ledger::{missing, storage, Ledger, ParticipationPatch};
use crate::locks::AggregateLocks;
use crate::notify::{messages, notify_user, Notifier};

/// Input for an evidence submission.
#[derive(Debug, Clone)]
pub struct NewEvidence {
    /// The escalated dispute.
    pub dispute_id: DisputeId,
    /// The submitting participant's username.
    pub username: String,
    /// Free-text account of why this side won.
    pub description: String,
    /// Opaque image payload.
    pub image: Attachment,
}

/// The evidence intake component.
pub struct EvidenceIntake {
    ledger: Arc<dyn Ledger>,
    notifier: Arc<dyn Notifier>,
    locks: Arc<AggregateLocks>,
}

impl EvidenceIntake {
    /// Assemble the intake over a ledger, a notifier, and a shared lock
    /// registry.
    pub fn new(
        ledger: Arc<dyn Ledger>,
        notifier: Arc<dyn Notifier>,
        locks: Arc<AggregateLocks>,
    ) -> Self {
        Self {
            ledger,
            notifier,
            locks,
        }
    }

    /// Record one side's evidence.
    ///
    /// Requires the submitter's participation to be in the
    /// `evidence` state — the dispute escalated and this side has not
    /// submitted yet. The first submission marks the submitter
    /// `evidence_answered` and stops. The second marks both sides
    /// `inspected`, opens the investigation with a jury of every other
    /// user, broadcasts one ballot each, and notifies the jurors.
    pub async fn provide(&self, input: NewEvidence) -> Result<(), EngineError> {
        if input.username.trim().is_empty() {
            return Err(EngineError::InvalidInput(
                "username must be provided".to_string(),
            ));
        }

        let user = self
            .ledger
            .user_by_username(&input.username)
            .await
            .map_err(missing("user"))?;

        let _guard = self.locks.acquire(*input.dispute_id.as_uuid()).await;

        let mine = self
            .ledger
            .participation(input.dispute_id, user.id)
            .await
            .map_err(missing("participation"))?;
        if mine.result != ParticipationResult::Evidence {
            return Err(EngineError::InvalidState(format!(
                "participation {} is not awaiting evidence",
                mine.id
            )));
        }

        let existing = self
            .ledger
            .evidence_count(input.dispute_id)
            .await
            .map_err(storage)?;

        let evidence = Evidence::submit(input.dispute_id, user.id, input.description, input.image);
        self.ledger
            .insert_evidence(&evidence)
            .await
            .map_err(storage)?;

        if existing == 0 {
            self.ledger
                .update_participation(
                    mine.id,
                    ParticipationPatch {
                        result: Some(ParticipationResult::EvidenceAnswered),
                        ..Default::default()
                    },
                )
                .await
                .map_err(storage)?;
            return Ok(());
        }

        // Second submission: both sides are now inspected and the jury
        // takes over.
        let inspected = ParticipationPatch {
            result: Some(ParticipationResult::Inspected),
            ..Default::default()
        };
        self.ledger
            .update_participation(mine.id, inspected.clone())
            .await
            .map_err(storage)?;

        let opponent_id = self
            .ledger
            .opponent_id(input.dispute_id, user.id)
            .await
            .map_err(missing("opponent"))?;
        let theirs = self
            .ledger
            .participation(input.dispute_id, opponent_id)
            .await
            .map_err(missing("participation"))?;
        self.ledger
            .update_participation(theirs.id, inspected)
            .await
            .map_err(storage)?;

        let total_users = self.ledger.count_users().await.map_err(storage)?;
        let brief = self
            .ledger
            .dispute_brief(input.dispute_id)
            .await
            .map_err(missing("dispute"))?;

        let investigation =
            Investigation::open(input.dispute_id, brief.title, (total_users - 2) as i32);
        self.ledger
            .insert_investigation(&investigation)
            .await
            .map_err(storage)?;

        let juror_ids = self
            .ledger
            .broadcast_ballots(investigation.id, [user.id, opponent_id])
            .await
            .map_err(storage)?;
        tracing::info!(
            investigation = %investigation.id,
            dispute = %input.dispute_id,
            jurors = juror_ids.len(),
            "investigation opened"
        );

        let jurors = self
            .ledger
            .users_by_ids(&juror_ids)
            .await
            .map_err(storage)?;
        for juror in &jurors {
            notify_user(
                self.notifier.as_ref(),
                juror,
                &messages::investigation_available(),
            )
            .await;
        }
        Ok(())
    }

    /// All evidence for a dispute, ordered by submission time.
    pub async fn list(&self, dispute: DisputeId) -> Result<Vec<Evidence>, EngineError> {
        self.ledger.evidence_for(dispute).await.map_err(storage)
    }
}
