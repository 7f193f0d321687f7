//! # Investigation Engine
//!
//! Tallies juror ballots and closes the investigation exactly once.
//!
//! The tally increment and the "all jurors voted" threshold check run under
//! the investigation's aggregate lock, so two concurrent final ballots
//! cannot both observe an incomplete tally or both attempt closure. The
//! ballot-state precondition (`result = new`) additionally makes a retried
//! vote fail instead of double-counting, and the `current → passed` status
//! flip guards closure itself.

use std::sync::Arc;

use tribunal_core::{
    clamp_limit, paginate, plurality, BallotResult, EngineError, Investigation, InvestigationId,
    InvestigationStatus, JurorChoice, Page, ParticipationResult, ParticipationStatus, User,
};

use crate::ledger::{
    missing, storage, BallotPatch, InvestigationFilter, InvestigationPatch, InvestigationView,
    Ledger, ParticipationPatch,
};
use crate::locks::AggregateLocks;
use crate::notify::{messages, notify_user, Notifier};

/// Rating awarded for casting a ballot, regardless of correctness.
const BALLOT_REWARD: i64 = 1;

/// Additional rating awarded when a ballot matches the outcome.
const CORRECT_BONUS: i64 = 3;

/// The jury arbitration engine.
pub struct InvestigationEngine {
    ledger: Arc<dyn Ledger>,
    notifier: Arc<dyn Notifier>,
    locks: Arc<AggregateLocks>,
}

impl InvestigationEngine {
    /// Assemble the engine over a ledger, a notifier, and a shared lock
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

    /// Cast a juror ballot. `vote` is `"p1"`, `"p2"`, or anything else for
    /// a draw.
    ///
    /// Records the ballot, rewards the juror with +1 rating, and bumps the
    /// matching tally. When the tallies reach the expected total the
    /// investigation closes: unvoted ballots are purged, the plurality
    /// outcome is computed, correct jurors gain +3 and their ballots are
    /// marked, the disputants' participations settle, and everyone
    /// involved is notified.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] if the caller holds no ballot for this
    /// investigation, [`EngineError::InvalidState`] if the ballot was
    /// already cast.
    pub async fn vote(
        &self,
        id: InvestigationId,
        username: &str,
        vote: &str,
    ) -> Result<(), EngineError> {
        let user = self
            .ledger
            .user_by_username(username)
            .await
            .map_err(missing("user"))?;
        let choice = JurorChoice::from_ballot_input(vote);

        let _guard = self.locks.acquire(*id.as_uuid()).await;

        let ballot = self
            .ledger
            .ballot(id, user.id)
            .await
            .map_err(missing("ballot"))?;
        if ballot.result != BallotResult::New {
            return Err(EngineError::InvalidState(format!(
                "ballot {} was already cast",
                ballot.id
            )));
        }

        self.ledger
            .update_ballot(
                ballot.id,
                BallotPatch {
                    vote: Some(choice),
                    result: Some(BallotResult::Sent),
                },
            )
            .await
            .map_err(storage)?;
        self.ledger
            .add_rating(&[user.id], BALLOT_REWARD)
            .await
            .map_err(storage)?;

        let mut investigation = self
            .ledger
            .investigation(id)
            .await
            .map_err(missing("investigation"))?;
        match choice {
            JurorChoice::P1 => investigation.p1 += 1,
            JurorChoice::P2 => investigation.p2 += 1,
            JurorChoice::Draw => investigation.draw += 1,
        }
        self.ledger
            .update_investigation(
                id,
                InvestigationPatch {
                    p1: Some(investigation.p1),
                    p2: Some(investigation.p2),
                    draw: Some(investigation.draw),
                    ..Default::default()
                },
            )
            .await
            .map_err(storage)?;
        tracing::info!(investigation = %id, juror = %user.username, %choice, "ballot recorded");

        if !investigation.is_complete() {
            return Ok(());
        }

        // The final ballot is in. The status flip below happens at most
        // once: the ballot precondition means no other call can reach this
        // point for the same investigation.
        if investigation.status != InvestigationStatus::Current {
            return Ok(());
        }
        self.close(investigation).await
    }

    /// Apply an investigation's outcome. Called with the final tallies,
    /// under the investigation's aggregate lock.
    async fn close(&self, investigation: Investigation) -> Result<(), EngineError> {
        let id = investigation.id;
        self.ledger
            .update_investigation(
                id,
                InvestigationPatch {
                    status: Some(InvestigationStatus::Passed),
                    ..Default::default()
                },
            )
            .await
            .map_err(storage)?;

        let purged = self.ledger.purge_unvoted(id).await.map_err(storage)?;
        let outcome = plurality(investigation.p1, investigation.p2, investigation.draw);
        tracing::info!(
            investigation = %id,
            %outcome,
            p1 = investigation.p1,
            p2 = investigation.p2,
            draw = investigation.draw,
            purged,
            "investigation closed"
        );

        let winner_ids = self
            .ledger
            .voters_by_choice(id, outcome)
            .await
            .map_err(storage)?;
        if !winner_ids.is_empty() {
            self.ledger
                .add_rating(&winner_ids, CORRECT_BONUS)
                .await
                .map_err(storage)?;
        }
        self.ledger
            .mark_ballots(id, &winner_ids)
            .await
            .map_err(storage)?;

        let disputants = self.ledger.disputants(id).await.map_err(storage)?;
        let [first, second] = disputants.as_slice() else {
            return Err(EngineError::Storage(format!(
                "investigation {id} has {} disputants on record, expected 2",
                disputants.len()
            )));
        };

        let first_row = self
            .ledger
            .participation(investigation.dispute_id, first.id)
            .await
            .map_err(missing("participation"))?;
        let second_row = self
            .ledger
            .participation(investigation.dispute_id, second.id)
            .await
            .map_err(missing("participation"))?;

        let settle = |result: ParticipationResult, claim: bool| ParticipationPatch {
            status: Some(ParticipationStatus::Passed),
            result: Some(result),
            claim: Some(claim),
            ..Default::default()
        };

        match outcome {
            JurorChoice::Draw => {
                self.ledger
                    .update_participation(first_row.id, settle(ParticipationResult::Draw, true))
                    .await
                    .map_err(storage)?;
                self.ledger
                    .update_participation(second_row.id, settle(ParticipationResult::Draw, true))
                    .await
                    .map_err(storage)?;
                self.notify_outcome(first, &investigation.title, messages::investigation_draw)
                    .await;
                self.notify_outcome(second, &investigation.title, messages::investigation_draw)
                    .await;
            }
            JurorChoice::P1 => {
                self.ledger
                    .update_participation(first_row.id, settle(ParticipationResult::Win, true))
                    .await
                    .map_err(storage)?;
                self.ledger
                    .update_participation(second_row.id, settle(ParticipationResult::Lose, false))
                    .await
                    .map_err(storage)?;
                self.notify_outcome(first, &investigation.title, messages::investigation_won)
                    .await;
                self.notify_outcome(second, &investigation.title, messages::investigation_lost)
                    .await;
            }
            JurorChoice::P2 => {
                self.ledger
                    .update_participation(second_row.id, settle(ParticipationResult::Win, true))
                    .await
                    .map_err(storage)?;
                self.ledger
                    .update_participation(first_row.id, settle(ParticipationResult::Lose, false))
                    .await
                    .map_err(storage)?;
                self.notify_outcome(second, &investigation.title, messages::investigation_won)
                    .await;
                self.notify_outcome(first, &investigation.title, messages::investigation_lost)
                    .await;
            }
        }

        let winners = self
            .ledger
            .users_by_ids(&winner_ids)
            .await
            .map_err(storage)?;
        for winner in &winners {
            notify_user(
                self.notifier.as_ref(),
                winner,
                &messages::juror_correct(&investigation.title),
            )
            .await;
        }
        Ok(())
    }

    async fn notify_outcome(&self, user: &User, title: &str, text: fn(&str) -> String) {
        notify_user(self.notifier.as_ref(), user, &text(title)).await;
    }

    /// The investigation as seen by the calling juror.
    pub async fn get(
        &self,
        id: InvestigationId,
        username: &str,
    ) -> Result<InvestigationView, EngineError> {
        let user = self
            .ledger
            .user_by_username(username)
            .await
            .map_err(missing("user"))?;
        self.ledger
            .investigation_for(id, user.id)
            .await
            .map_err(missing("investigation"))
    }

    /// One page of the juror's investigations, newest first.
    pub async fn list(
        &self,
        username: &str,
        mut filter: InvestigationFilter,
    ) -> Result<Page<InvestigationView>, EngineError> {
        let user = self
            .ledger
            .user_by_username(username)
            .await
            .map_err(missing("user"))?;

        filter.limit = clamp_limit(filter.limit);
        let limit = filter.limit;
        let rows = self
            .ledger
            .list_investigations(user.id, &filter)
            .await
            .map_err(storage)?;

        Ok(paginate(rows, limit, |row| row.created_at))
    }
}
