//! # Dispute Engine
//!
//! Owns the dispute lifecycle: creation, acceptance/rejection, the
//! two-party voting protocol, reward claiming, and the read projections.
//!
//! The voting protocol is a symmetric two-bit negotiation. The decision
//! itself lives in [`tribunal_core::verdict::resolve_claims`]; this engine
//! applies the decided quadrant as lock-step writes to the two
//! participation rows, serialized per dispute through [`AggregateLocks`].

use std::sync::Arc;

use tribunal_core::{
    clamp_limit, paginate, resolve_claims, Attachment, Dispute, DisputeId, EngineError, Page,
    Participation, ParticipationResult, ParticipationStatus, Stake, StoreError, VoteOutcome,
    DEFAULT_CURRENCY,
};

use crate::ledger::{
    missing, storage, DisputeBrief, DisputeFilter, DisputeView, Ledger, ParticipationPatch,
};
use crate::locks::AggregateLocks;
use crate::notify::{messages, notify_user, Notifier};

/// Input for creating a dispute.
#[derive(Debug, Clone)]
pub struct NewDispute {
    /// Short human-readable title.
    pub title: String,
    /// What the parties disagree about.
    pub description: String,
    /// Username of the challenged opponent.
    pub opponent: String,
    /// Wagered amount, strictly positive.
    pub amount: i64,
    /// Currency tag; defaults to [`DEFAULT_CURRENCY`] when absent.
    pub currency: Option<String>,
    /// Optional illustration.
    pub image: Option<Attachment>,
}

/// The dispute lifecycle engine.
pub struct DisputeEngine {
    ledger: Arc<dyn Ledger>,
    notifier: Arc<dyn Notifier>,
    locks: Arc<AggregateLocks>,
}

impl DisputeEngine {
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

    /// Create a dispute challenging `input.opponent`.
    ///
    /// Validates before any write: all fields present and the amount
    /// positive, the opponent registered, ready, and satisfied by the
    /// stake. On success the dispute and both participation rows are
    /// persisted and the opponent is notified.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidInput`], [`EngineError::OpponentNotFound`],
    /// [`EngineError::OpponentUnready`], [`EngineError::BelowMinimum`], or
    /// [`EngineError::Storage`].
    pub async fn create(
        &self,
        input: NewDispute,
        creator_username: &str,
    ) -> Result<DisputeId, EngineError> {
        if input.title.trim().is_empty()
            || input.description.trim().is_empty()
            || input.opponent.trim().is_empty()
        {
            return Err(EngineError::InvalidInput(
                "title, description and opponent must be provided".to_string(),
            ));
        }
        let currency = input
            .currency
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
        let stake = Stake::new(input.amount, currency)?;

        let opponent = self
            .ledger
            .user_by_username(&input.opponent)
            .await
            .map_err(|err| match err {
                StoreError::NotFound => EngineError::OpponentNotFound(input.opponent.clone()),
                other => storage(other),
            })?;

        if !opponent.ready {
            return Err(EngineError::OpponentUnready(opponent.username));
        }
        if stake.amount < opponent.min_stake {
            return Err(EngineError::BelowMinimum {
                amount: stake.amount,
                minimum: opponent.min_stake,
            });
        }

        let creator = self
            .ledger
            .user_by_username(creator_username)
            .await
            .map_err(missing("user"))?;

        let dispute = Dispute::open(input.title, input.description, stake, input.image);
        self.ledger
            .insert_dispute(&dispute)
            .await
            .map_err(storage)?;
        self.ledger
            .insert_participation(&Participation::invited(dispute.id, opponent.id))
            .await
            .map_err(storage)?;
        self.ledger
            .insert_participation(&Participation::initiating(dispute.id, creator.id))
            .await
            .map_err(storage)?;

        tracing::info!(dispute = %dispute.id, creator = %creator.username, opponent = %opponent.username, "dispute created");
        notify_user(
            self.notifier.as_ref(),
            &opponent,
            &messages::new_dispute(&creator.username),
        )
        .await;

        Ok(dispute.id)
    }

    /// Accept a dispute invitation.
    ///
    /// Requires the acceptor's participation to be `new`. Moves both
    /// participations to `current`/`processed` and notifies the creator.
    pub async fn accept(&self, dispute: DisputeId, acceptor: &str) -> Result<(), EngineError> {
        let user = self
            .ledger
            .user_by_username(acceptor)
            .await
            .map_err(missing("user"))?;

        let _guard = self.locks.acquire(*dispute.as_uuid()).await;

        let mine = self
            .ledger
            .participation(dispute, user.id)
            .await
            .map_err(missing("participation"))?;
        if mine.status != ParticipationStatus::New {
            return Err(EngineError::InvalidState(format!(
                "participation {} is not awaiting acceptance",
                mine.id
            )));
        }

        let accepted = ParticipationPatch {
            status: Some(ParticipationStatus::Current),
            result: Some(ParticipationResult::Processed),
            ..Default::default()
        };
        self.ledger
            .update_participation(mine.id, accepted.clone())
            .await
            .map_err(storage)?;

        let opponent_id = self
            .ledger
            .opponent_id(dispute, user.id)
            .await
            .map_err(missing("opponent"))?;
        let theirs = self
            .ledger
            .participation(dispute, opponent_id)
            .await
            .map_err(missing("participation"))?;
        self.ledger
            .update_participation(theirs.id, accepted)
            .await
            .map_err(storage)?;

        let opponent = self
            .ledger
            .user_by_id(opponent_id)
            .await
            .map_err(missing("user"))?;
        let view = self
            .ledger
            .dispute_for(dispute, user.id)
            .await
            .map_err(missing("dispute"))?;

        notify_user(
            self.notifier.as_ref(),
            &opponent,
            &messages::dispute_accepted(&view.dispute.title, &user.username),
        )
        .await;
        Ok(())
    }

    /// Decline a dispute invitation.
    ///
    /// Requires the rejector's participation to be `new`. The rejector
    /// settles as `passed`/`rejected`; the creator settles as
    /// `passed`/`processed` with the claim flag raised, since the stake
    /// returns to them immediately.
    pub async fn reject(&self, dispute: DisputeId, rejector: &str) -> Result<(), EngineError> {
        let user = self
            .ledger
            .user_by_username(rejector)
            .await
            .map_err(missing("user"))?;

        let _guard = self.locks.acquire(*dispute.as_uuid()).await;

        let mine = self
            .ledger
            .participation(dispute, user.id)
            .await
            .map_err(missing("participation"))?;
        if mine.status != ParticipationStatus::New {
            return Err(EngineError::InvalidState(format!(
                "participation {} is not awaiting acceptance",
                mine.id
            )));
        }

        self.ledger
            .update_participation(
                mine.id,
                ParticipationPatch {
                    status: Some(ParticipationStatus::Passed),
                    result: Some(ParticipationResult::Rejected),
                    ..Default::default()
                },
            )
            .await
            .map_err(storage)?;

        let opponent_id = self
            .ledger
            .opponent_id(dispute, user.id)
            .await
            .map_err(missing("opponent"))?;
        let theirs = self
            .ledger
            .participation(dispute, opponent_id)
            .await
            .map_err(missing("participation"))?;
        self.ledger
            .update_participation(
                theirs.id,
                ParticipationPatch {
                    status: Some(ParticipationStatus::Passed),
                    result: Some(ParticipationResult::Processed),
                    claim: Some(true),
                    ..Default::default()
                },
            )
            .await
            .map_err(storage)?;

        let opponent = self
            .ledger
            .user_by_id(opponent_id)
            .await
            .map_err(missing("user"))?;
        let view = self
            .ledger
            .dispute_for(dispute, user.id)
            .await
            .map_err(missing("dispute"))?;

        notify_user(
            self.notifier.as_ref(),
            &opponent,
            &messages::dispute_cancelled(&view.dispute.title, &user.username),
        )
        .await;
        Ok(())
    }

    /// Collect a settled dispute's reward: clears the claim flag.
    ///
    /// Requires the caller's participation to be `passed`.
    pub async fn claim(&self, dispute: DisputeId, claimer: &str) -> Result<(), EngineError> {
        let user = self
            .ledger
            .user_by_username(claimer)
            .await
            .map_err(missing("user"))?;

        let _guard = self.locks.acquire(*dispute.as_uuid()).await;

        let mine = self
            .ledger
            .participation(dispute, user.id)
            .await
            .map_err(missing("participation"))?;
        if mine.status != ParticipationStatus::Passed {
            return Err(EngineError::InvalidState(format!(
                "participation {} is not settled",
                mine.id
            )));
        }

        self.ledger
            .update_participation(
                mine.id,
                ParticipationPatch {
                    claim: Some(false),
                    ..Default::default()
                },
            )
            .await
            .map_err(storage)?;
        Ok(())
    }

    /// Cast a self-reported vote: `win` is the claim "I won".
    ///
    /// If the opponent has not voted yet the claim is recorded and the
    /// dispute stays open. Otherwise the four-quadrant rule settles the
    /// pair directly or escalates to evidence collection. The whole
    /// read-decide-write sequence runs under the dispute's aggregate lock.
    pub async fn vote(
        &self,
        dispute: DisputeId,
        voter: &str,
        win: bool,
    ) -> Result<(), EngineError> {
        let user = self
            .ledger
            .user_by_username(voter)
            .await
            .map_err(missing("user"))?;

        let _guard = self.locks.acquire(*dispute.as_uuid()).await;

        let mine = self
            .ledger
            .participation(dispute, user.id)
            .await
            .map_err(missing("participation"))?;
        // Voting is only open between acceptance and settlement. The
        // precondition also makes a retried settlement call fail here
        // instead of reapplying its writes.
        if mine.status != ParticipationStatus::Current
            || !matches!(
                mine.result,
                ParticipationResult::Processed | ParticipationResult::Answered
            )
        {
            return Err(EngineError::InvalidState(format!(
                "participation {} is not open for voting",
                mine.id
            )));
        }

        let opponent_id = self
            .ledger
            .opponent_id(dispute, user.id)
            .await
            .map_err(missing("opponent"))?;
        let theirs = self
            .ledger
            .participation(dispute, opponent_id)
            .await
            .map_err(missing("participation"))?;
        let opponent = self
            .ledger
            .user_by_id(opponent_id)
            .await
            .map_err(missing("user"))?;
        let view = self
            .ledger
            .dispute_for(dispute, user.id)
            .await
            .map_err(missing("dispute"))?;
        let title = view.dispute.title;

        let opponent_has_voted = theirs.result != ParticipationResult::Processed;
        let outcome = resolve_claims(opponent_has_voted, theirs.vote, win);

        match outcome {
            VoteOutcome::Recorded => {
                self.ledger
                    .update_participation(
                        mine.id,
                        ParticipationPatch {
                            vote: Some(win),
                            result: Some(ParticipationResult::Answered),
                            ..Default::default()
                        },
                    )
                    .await
                    .map_err(storage)?;
            }
            VoteOutcome::Draw => {
                let settled = ParticipationPatch {
                    status: Some(ParticipationStatus::Passed),
                    result: Some(ParticipationResult::Draw),
                    claim: Some(true),
                    ..Default::default()
                };
                self.ledger
                    .update_participation(theirs.id, settled.clone())
                    .await
                    .map_err(storage)?;
                self.ledger
                    .update_participation(mine.id, settled)
                    .await
                    .map_err(storage)?;
                notify_user(
                    self.notifier.as_ref(),
                    &opponent,
                    &messages::dispute_draw(&title, &user.username),
                )
                .await;
            }
            VoteOutcome::OpponentLoses => {
                self.ledger
                    .update_participation(
                        theirs.id,
                        ParticipationPatch {
                            status: Some(ParticipationStatus::Passed),
                            result: Some(ParticipationResult::Lose),
                            ..Default::default()
                        },
                    )
                    .await
                    .map_err(storage)?;
                self.ledger
                    .update_participation(
                        mine.id,
                        ParticipationPatch {
                            status: Some(ParticipationStatus::Passed),
                            result: Some(ParticipationResult::Win),
                            claim: Some(true),
                            vote: Some(win),
                            ..Default::default()
                        },
                    )
                    .await
                    .map_err(storage)?;
                notify_user(
                    self.notifier.as_ref(),
                    &opponent,
                    &messages::dispute_lost(&title, &user.username),
                )
                .await;
            }
            VoteOutcome::VoterLoses => {
                self.ledger
                    .update_participation(
                        mine.id,
                        ParticipationPatch {
                            status: Some(ParticipationStatus::Passed),
                            result: Some(ParticipationResult::Lose),
                            ..Default::default()
                        },
                    )
                    .await
                    .map_err(storage)?;
                self.ledger
                    .update_participation(
                        theirs.id,
                        ParticipationPatch {
                            status: Some(ParticipationStatus::Passed),
                            result: Some(ParticipationResult::Win),
                            claim: Some(true),
                            ..Default::default()
                        },
                    )
                    .await
                    .map_err(storage)?;
                notify_user(
                    self.notifier.as_ref(),
                    &opponent,
                    &messages::dispute_won(&title, &user.username),
                )
                .await;
            }
            VoteOutcome::Escalated => {
                self.ledger
                    .update_participation(
                        mine.id,
                        ParticipationPatch {
                            vote: Some(win),
                            result: Some(ParticipationResult::Evidence),
                            ..Default::default()
                        },
                    )
                    .await
                    .map_err(storage)?;
                self.ledger
                    .update_participation(
                        theirs.id,
                        ParticipationPatch {
                            result: Some(ParticipationResult::Evidence),
                            ..Default::default()
                        },
                    )
                    .await
                    .map_err(storage)?;
                tracing::info!(dispute = %dispute, "both parties claim victory, evidence required");
                notify_user(
                    self.notifier.as_ref(),
                    &opponent,
                    &messages::evidence_required(&title, &user.username),
                )
                .await;
            }
        }
        Ok(())
    }

    /// The dispute as seen by `username`, with the opponent resolved.
    pub async fn get(
        &self,
        dispute: DisputeId,
        username: &str,
    ) -> Result<DisputeView, EngineError> {
        let user = self
            .ledger
            .user_by_username(username)
            .await
            .map_err(missing("user"))?;
        let mut view = self
            .ledger
            .dispute_for(dispute, user.id)
            .await
            .map_err(missing("dispute"))?;

        let opponent_id = self
            .ledger
            .opponent_id(dispute, user.id)
            .await
            .map_err(missing("opponent"))?;
        let opponent = self
            .ledger
            .user_by_id(opponent_id)
            .await
            .map_err(missing("user"))?;
        view.opponent = Some(opponent.username);
        Ok(view)
    }

    /// One page of `username`'s disputes, newest first, with opponents
    /// resolved.
    pub async fn list(
        &self,
        username: &str,
        mut filter: DisputeFilter,
    ) -> Result<Page<DisputeView>, EngineError> {
        let user = self
            .ledger
            .user_by_username(username)
            .await
            .map_err(missing("user"))?;

        filter.limit = clamp_limit(filter.limit);
        let limit = filter.limit;
        let mut rows = self
            .ledger
            .list_disputes(user.id, &filter)
            .await
            .map_err(storage)?;

        for row in &mut rows {
            let opponent_id = self
                .ledger
                .opponent_id(row.dispute.id, user.id)
                .await
                .map_err(missing("opponent"))?;
            let opponent = self
                .ledger
                .user_by_id(opponent_id)
                .await
                .map_err(missing("user"))?;
            row.opponent = Some(opponent.username);
        }

        Ok(paginate(rows, limit, |row| row.dispute.created_at))
    }

    /// The minimal projection shown on the evidence screen.
    pub async fn brief(&self, dispute: DisputeId) -> Result<DisputeBrief, EngineError> {
        self.ledger
            .dispute_brief(dispute)
            .await
            .map_err(missing("dispute"))
    }
}
