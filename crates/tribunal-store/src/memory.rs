//! # In-Memory Ledger
//!
//! Thread-safe in-memory implementation of the ledger contracts. Backs the
//! test suites and API deployments without a configured database.
//!
//! All operations are synchronous under `parking_lot` locks; no guard is
//! ever held across an await point.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use tribunal_core::{
    BallotId, BallotResult, Dispute, DisputeId, Evidence, Investigation, InvestigationId,
    JurorBallot, JurorChoice, Participation, ParticipationId, StoreError, User, UserId,
};
use tribunal_engine::ledger::{
    BallotPatch, BallotStore, DisputeBrief, DisputeFilter, DisputeStore, DisputeView,
    EvidenceStore, InvestigationFilter, InvestigationPatch, InvestigationStore,
    InvestigationView, ParticipationPatch, ParticipationStore, UserPatch, UserStore,
};

/// In-memory ledger over per-entity hash maps.
#[derive(Default)]
pub struct MemoryLedger {
    users: RwLock<HashMap<Uuid, User>>,
    disputes: RwLock<HashMap<Uuid, Dispute>>,
    participations: RwLock<HashMap<Uuid, Participation>>,
    evidence: RwLock<Vec<Evidence>>,
    investigations: RwLock<HashMap<Uuid, Investigation>>,
    ballots: RwLock<HashMap<Uuid, JurorBallot>>,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    fn view_of(dispute: &Dispute, row: &Participation) -> DisputeView {
        DisputeView {
            dispute: dispute.clone(),
            result: row.result,
            claim: row.claim,
            vote: row.vote,
            opponent: None,
        }
    }
}

#[async_trait]
impl UserStore for MemoryLedger {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        self.users
            .write()
            .insert(*user.id.as_uuid(), user.clone());
        Ok(())
    }

    async fn user_by_id(&self, id: UserId) -> Result<User, StoreError> {
        self.users
            .read()
            .get(id.as_uuid())
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn user_by_username(&self, username: &str) -> Result<User, StoreError> {
        self.users
            .read()
            .values()
            .find(|user| user.username == username)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self
            .users
            .read()
            .values()
            .any(|user| user.username == username))
    }

    async fn count_users(&self) -> Result<i64, StoreError> {
        Ok(self.users.read().len() as i64)
    }

    async fn users_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, StoreError> {
        let users = self.users.read();
        Ok(ids
            .iter()
            .filter_map(|id| users.get(id.as_uuid()).cloned())
            .collect())
    }

    async fn top_by_rating(&self, limit: i64) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.users.read().values().cloned().collect();
        users.sort_by(|a, b| {
            b.rating
                .cmp(&a.rating)
                .then_with(|| a.username.cmp(&b.username))
        });
        users.truncate(limit.max(0) as usize);
        Ok(users)
    }

    async fn add_rating(&self, ids: &[UserId], delta: i64) -> Result<(), StoreError> {
        let mut users = self.users.write();
        for id in ids {
            if let Some(user) = users.get_mut(id.as_uuid()) {
                user.rating += delta;
            }
        }
        Ok(())
    }

    async fn update_user(&self, username: &str, patch: UserPatch) -> Result<(), StoreError> {
        let mut users = self.users.write();
        let user = users
            .values_mut()
            .find(|user| user.username == username)
            .ok_or(StoreError::NotFound)?;
        if let Some(enabled) = patch.notifications_enabled {
            user.notifications_enabled = enabled;
        }
        if let Some(ready) = patch.ready {
            user.ready = ready;
        }
        if let Some(min_stake) = patch.min_stake {
            user.min_stake = min_stake;
        }
        if let Some(rating) = patch.rating {
            user.rating = rating;
        }
        if let Some(channel_id) = patch.channel_id {
            user.channel_id = channel_id;
        }
        Ok(())
    }
}

#[async_trait]
impl DisputeStore for MemoryLedger {
    async fn insert_dispute(&self, dispute: &Dispute) -> Result<(), StoreError> {
        self.disputes
            .write()
            .insert(*dispute.id.as_uuid(), dispute.clone());
        Ok(())
    }

    async fn dispute_for(
        &self,
        dispute: DisputeId,
        user: UserId,
    ) -> Result<DisputeView, StoreError> {
        let disputes = self.disputes.read();
        let record = disputes.get(dispute.as_uuid()).ok_or(StoreError::NotFound)?;
        let participations = self.participations.read();
        let row = participations
            .values()
            .find(|row| row.dispute_id == dispute && row.user_id == user)
            .ok_or(StoreError::NotFound)?;
        Ok(Self::view_of(record, row))
    }

    async fn list_disputes(
        &self,
        user: UserId,
        filter: &DisputeFilter,
    ) -> Result<Vec<DisputeView>, StoreError> {
        let disputes = self.disputes.read();
        let participations = self.participations.read();

        let mut views: Vec<DisputeView> = participations
            .values()
            .filter(|row| row.user_id == user)
            .filter(|row| filter.status.map_or(true, |status| row.status == status))
            .filter(|row| filter.result.map_or(true, |result| row.result == result))
            .filter_map(|row| {
                disputes
                    .get(row.dispute_id.as_uuid())
                    .map(|record| Self::view_of(record, row))
            })
            .filter(|view| {
                filter
                    .cursor
                    .map_or(true, |cursor| view.dispute.created_at <= cursor.timestamp())
            })
            .collect();

        views.sort_by(|a, b| b.dispute.created_at.cmp(&a.dispute.created_at));
        views.truncate(filter.limit + 1);
        Ok(views)
    }

    async fn dispute_brief(&self, dispute: DisputeId) -> Result<DisputeBrief, StoreError> {
        let disputes = self.disputes.read();
        let record = disputes.get(dispute.as_uuid()).ok_or(StoreError::NotFound)?;
        Ok(DisputeBrief {
            id: record.id,
            title: record.title.clone(),
            description: record.description.clone(),
            image: record.image.clone(),
        })
    }
}

#[async_trait]
impl ParticipationStore for MemoryLedger {
    async fn insert_participation(&self, row: &Participation) -> Result<(), StoreError> {
        self.participations
            .write()
            .insert(*row.id.as_uuid(), row.clone());
        Ok(())
    }

    async fn participation(
        &self,
        dispute: DisputeId,
        user: UserId,
    ) -> Result<Participation, StoreError> {
        self.participations
            .read()
            .values()
            .find(|row| row.dispute_id == dispute && row.user_id == user)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update_participation(
        &self,
        id: ParticipationId,
        patch: ParticipationPatch,
    ) -> Result<(), StoreError> {
        let mut participations = self.participations.write();
        let row = participations
            .get_mut(id.as_uuid())
            .ok_or(StoreError::NotFound)?;
        if let Some(status) = patch.status {
            row.status = status;
        }
        if let Some(result) = patch.result {
            row.result = result;
        }
        if let Some(vote) = patch.vote {
            row.vote = vote;
        }
        if let Some(claim) = patch.claim {
            row.claim = claim;
        }
        Ok(())
    }

    async fn opponent_id(&self, dispute: DisputeId, user: UserId) -> Result<UserId, StoreError> {
        self.participations
            .read()
            .values()
            .find(|row| row.dispute_id == dispute && row.user_id != user)
            .map(|row| row.user_id)
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl EvidenceStore for MemoryLedger {
    async fn insert_evidence(&self, evidence: &Evidence) -> Result<(), StoreError> {
        self.evidence.write().push(evidence.clone());
        Ok(())
    }

    async fn evidence_count(&self, dispute: DisputeId) -> Result<i64, StoreError> {
        Ok(self
            .evidence
            .read()
            .iter()
            .filter(|row| row.dispute_id == dispute)
            .count() as i64)
    }

    async fn evidence_for(&self, dispute: DisputeId) -> Result<Vec<Evidence>, StoreError> {
        let mut rows: Vec<Evidence> = self
            .evidence
            .read()
            .iter()
            .filter(|row| row.dispute_id == dispute)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.submitted_at);
        Ok(rows)
    }
}

#[async_trait]
impl InvestigationStore for MemoryLedger {
    async fn insert_investigation(&self, investigation: &Investigation) -> Result<(), StoreError> {
        self.investigations
            .write()
            .insert(*investigation.id.as_uuid(), investigation.clone());
        Ok(())
    }

    async fn investigation(&self, id: InvestigationId) -> Result<Investigation, StoreError> {
        self.investigations
            .read()
            .get(id.as_uuid())
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn investigation_for(
        &self,
        id: InvestigationId,
        user: UserId,
    ) -> Result<InvestigationView, StoreError> {
        let investigations = self.investigations.read();
        let record = investigations.get(id.as_uuid()).ok_or(StoreError::NotFound)?;
        let ballots = self.ballots.read();
        let ballot = ballots
            .values()
            .find(|row| row.investigation_id == id && row.user_id == user)
            .ok_or(StoreError::NotFound)?;
        Ok(juror_view(record, ballot))
    }

    async fn list_investigations(
        &self,
        user: UserId,
        filter: &InvestigationFilter,
    ) -> Result<Vec<InvestigationView>, StoreError> {
        let investigations = self.investigations.read();
        let ballots = self.ballots.read();

        let mut views: Vec<InvestigationView> = ballots
            .values()
            .filter(|row| row.user_id == user)
            .filter_map(|row| {
                investigations
                    .get(row.investigation_id.as_uuid())
                    .map(|record| juror_view(record, row))
            })
            .filter(|view| filter.status.map_or(true, |status| view.status == status))
            .filter(|view| {
                filter
                    .cursor
                    .map_or(true, |cursor| view.created_at <= cursor.timestamp())
            })
            .collect();

        views.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        views.truncate(filter.limit + 1);
        Ok(views)
    }

    async fn update_investigation(
        &self,
        id: InvestigationId,
        patch: InvestigationPatch,
    ) -> Result<(), StoreError> {
        let mut investigations = self.investigations.write();
        let record = investigations
            .get_mut(id.as_uuid())
            .ok_or(StoreError::NotFound)?;
        if let Some(status) = patch.status {
            record.status = status;
        }
        if let Some(p1) = patch.p1 {
            record.p1 = p1;
        }
        if let Some(p2) = patch.p2 {
            record.p2 = p2;
        }
        if let Some(draw) = patch.draw {
            record.draw = draw;
        }
        if let Some(total) = patch.total {
            record.total = total;
        }
        Ok(())
    }
}

#[async_trait]
impl BallotStore for MemoryLedger {
    async fn broadcast_ballots(
        &self,
        investigation: InvestigationId,
        exclude: [UserId; 2],
    ) -> Result<Vec<UserId>, StoreError> {
        let juror_ids: Vec<UserId> = self
            .users
            .read()
            .values()
            .map(|user| user.id)
            .filter(|id| !exclude.contains(id))
            .collect();

        let mut ballots = self.ballots.write();
        for juror in &juror_ids {
            let ballot = JurorBallot::issued(investigation, *juror);
            ballots.insert(*ballot.id.as_uuid(), ballot);
        }
        Ok(juror_ids)
    }

    async fn ballot(
        &self,
        investigation: InvestigationId,
        user: UserId,
    ) -> Result<JurorBallot, StoreError> {
        self.ballots
            .read()
            .values()
            .find(|row| row.investigation_id == investigation && row.user_id == user)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update_ballot(&self, id: BallotId, patch: BallotPatch) -> Result<(), StoreError> {
        let mut ballots = self.ballots.write();
        let row = ballots.get_mut(id.as_uuid()).ok_or(StoreError::NotFound)?;
        if let Some(vote) = patch.vote {
            row.vote = Some(vote);
        }
        if let Some(result) = patch.result {
            row.result = result;
        }
        Ok(())
    }

    async fn purge_unvoted(&self, investigation: InvestigationId) -> Result<u64, StoreError> {
        let mut ballots = self.ballots.write();
        let before = ballots.len();
        ballots.retain(|_, row| !(row.investigation_id == investigation && row.vote.is_none()));
        Ok((before - ballots.len()) as u64)
    }

    async fn voters_by_choice(
        &self,
        investigation: InvestigationId,
        choice: JurorChoice,
    ) -> Result<Vec<UserId>, StoreError> {
        Ok(self
            .ballots
            .read()
            .values()
            .filter(|row| row.investigation_id == investigation && row.vote == Some(choice))
            .map(|row| row.user_id)
            .collect())
    }

    async fn mark_ballots(
        &self,
        investigation: InvestigationId,
        correct: &[UserId],
    ) -> Result<(), StoreError> {
        let mut ballots = self.ballots.write();
        for row in ballots.values_mut() {
            if row.investigation_id != investigation {
                continue;
            }
            row.result = if correct.contains(&row.user_id) {
                BallotResult::Correct
            } else {
                BallotResult::Incorrect
            };
        }
        Ok(())
    }

    async fn disputants(&self, investigation: InvestigationId) -> Result<Vec<User>, StoreError> {
        let dispute_id = self
            .investigations
            .read()
            .get(investigation.as_uuid())
            .map(|record| record.dispute_id)
            .ok_or(StoreError::NotFound)?;

        let mut rows: Vec<Evidence> = self
            .evidence
            .read()
            .iter()
            .filter(|row| row.dispute_id == dispute_id)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.submitted_at);

        let users = self.users.read();
        let mut seen = Vec::new();
        for row in rows {
            if seen.iter().any(|user: &User| user.id == row.user_id) {
                continue;
            }
            if let Some(user) = users.get(row.user_id.as_uuid()) {
                seen.push(user.clone());
            }
        }
        Ok(seen)
    }
}

fn juror_view(record: &Investigation, ballot: &JurorBallot) -> InvestigationView {
    InvestigationView {
        id: record.id,
        dispute_id: record.dispute_id,
        title: record.title.clone(),
        status: record.status,
        created_at: record.created_at,
        ends_at: record.ends_at,
        ballot_result: ballot.result,
        ballot_vote: ballot.vote,
    }
}
