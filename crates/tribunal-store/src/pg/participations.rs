//! Participation persistence operations.

use async_trait::async_trait;
use uuid::Uuid;

use tribunal_core::{DisputeId, Participation, ParticipationId, StoreError, UserId};
use tribunal_engine::ledger::{ParticipationPatch, ParticipationStore};

use super::{db_err, PgLedger};

#[derive(sqlx::FromRow)]
struct ParticipationRow {
    id: Uuid,
    dispute_id: Uuid,
    user_id: Uuid,
    status: String,
    result: String,
    vote: bool,
    claim: bool,
}

impl ParticipationRow {
    fn into_participation(self) -> Result<Participation, StoreError> {
        Ok(Participation {
            id: ParticipationId::from_uuid(self.id),
            dispute_id: DisputeId::from_uuid(self.dispute_id),
            user_id: UserId::from_uuid(self.user_id),
            status: self.status.parse().map_err(StoreError::backend)?,
            result: self.result.parse().map_err(StoreError::backend)?,
            vote: self.vote,
            claim: self.claim,
        })
    }
}

#[async_trait]
impl ParticipationStore for PgLedger {
    async fn insert_participation(&self, row: &Participation) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO participations (id, dispute_id, user_id, status, result, vote, claim)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(row.id.as_uuid())
        .bind(row.dispute_id.as_uuid())
        .bind(row.user_id.as_uuid())
        .bind(row.status.as_str())
        .bind(row.result.as_str())
        .bind(row.vote)
        .bind(row.claim)
        .execute(self.pool())
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn participation(
        &self,
        dispute: DisputeId,
        user: UserId,
    ) -> Result<Participation, StoreError> {
        let row = sqlx::query_as::<_, ParticipationRow>(
            "SELECT id, dispute_id, user_id, status, result, vote, claim
             FROM participations
             WHERE dispute_id = $1 AND user_id = $2",
        )
        .bind(dispute.as_uuid())
        .bind(user.as_uuid())
        .fetch_one(self.pool())
        .await
        .map_err(db_err)?;
        row.into_participation()
    }

    async fn update_participation(
        &self,
        id: ParticipationId,
        patch: ParticipationPatch,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE participations
             SET status = COALESCE($1, status),
                 result = COALESCE($2, result),
                 vote = COALESCE($3, vote),
                 claim = COALESCE($4, claim)
             WHERE id = $5",
        )
        .bind(patch.status.map(|status| status.as_str()))
        .bind(patch.result.map(|result| result.as_str()))
        .bind(patch.vote)
        .bind(patch.claim)
        .bind(id.as_uuid())
        .execute(self.pool())
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn opponent_id(&self, dispute: DisputeId, user: UserId) -> Result<UserId, StoreError> {
        let id: Uuid = sqlx::query_scalar(
            "SELECT user_id FROM participations WHERE dispute_id = $1 AND user_id != $2",
        )
        .bind(dispute.as_uuid())
        .bind(user.as_uuid())
        .fetch_one(self.pool())
        .await
        .map_err(db_err)?;
        Ok(UserId::from_uuid(id))
    }
}
