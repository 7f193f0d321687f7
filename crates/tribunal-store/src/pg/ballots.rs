//! Juror ballot persistence operations.
//!
//! Unvoted ballots store the empty string in the `vote` column; the purge
//! on investigation closure keys off it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use tribunal_core::{
    BallotId, InvestigationId, JurorBallot, JurorChoice, StoreError, User, UserId,
};
use tribunal_engine::ledger::{BallotPatch, BallotStore};

use super::{db_err, PgLedger};

/// Decode the `vote` column: empty means the ballot was never cast.
pub(crate) fn vote_from_column(raw: &str) -> Result<Option<JurorChoice>, StoreError> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some).map_err(StoreError::backend)
}

fn vote_to_column(vote: Option<JurorChoice>) -> &'static str {
    vote.map_or("", |choice| choice.as_str())
}

#[derive(sqlx::FromRow)]
struct BallotRow {
    id: Uuid,
    investigation_id: Uuid,
    user_id: Uuid,
    vote: String,
    result: String,
}

impl BallotRow {
    fn into_ballot(self) -> Result<JurorBallot, StoreError> {
        Ok(JurorBallot {
            id: BallotId::from_uuid(self.id),
            investigation_id: InvestigationId::from_uuid(self.investigation_id),
            user_id: UserId::from_uuid(self.user_id),
            vote: vote_from_column(&self.vote)?,
            result: self.result.parse().map_err(StoreError::backend)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DisputantRow {
    id: Uuid,
    username: String,
    channel_id: i64,
    notifications_enabled: bool,
    ready: bool,
    min_stake: i64,
    rating: i64,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl BallotStore for PgLedger {
    async fn broadcast_ballots(
        &self,
        investigation: InvestigationId,
        exclude: [UserId; 2],
    ) -> Result<Vec<UserId>, StoreError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "INSERT INTO ballots (id, investigation_id, user_id, vote, result)
             SELECT gen_random_uuid(), $1, u.id, '', 'new'
             FROM users u
             WHERE u.id <> $2 AND u.id <> $3
             RETURNING user_id",
        )
        .bind(investigation.as_uuid())
        .bind(exclude[0].as_uuid())
        .bind(exclude[1].as_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(db_err)?;
        Ok(ids.into_iter().map(UserId::from_uuid).collect())
    }

    async fn ballot(
        &self,
        investigation: InvestigationId,
        user: UserId,
    ) -> Result<JurorBallot, StoreError> {
        let row = sqlx::query_as::<_, BallotRow>(
            "SELECT id, investigation_id, user_id, vote, result
             FROM ballots
             WHERE investigation_id = $1 AND user_id = $2",
        )
        .bind(investigation.as_uuid())
        .bind(user.as_uuid())
        .fetch_one(self.pool())
        .await
        .map_err(db_err)?;
        row.into_ballot()
    }

    async fn update_ballot(&self, id: BallotId, patch: BallotPatch) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE ballots
             SET vote = COALESCE($1, vote),
                 result = COALESCE($2, result)
             WHERE id = $3",
        )
        .bind(patch.vote.map(|vote| vote_to_column(Some(vote))))
        .bind(patch.result.map(|result| result.as_str()))
        .bind(id.as_uuid())
        .execute(self.pool())
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn purge_unvoted(&self, investigation: InvestigationId) -> Result<u64, StoreError> {
        let result =
            sqlx::query("DELETE FROM ballots WHERE investigation_id = $1 AND vote = ''")
                .bind(investigation.as_uuid())
                .execute(self.pool())
                .await
                .map_err(db_err)?;
        Ok(result.rows_affected())
    }

    async fn voters_by_choice(
        &self,
        investigation: InvestigationId,
        choice: JurorChoice,
    ) -> Result<Vec<UserId>, StoreError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM ballots WHERE investigation_id = $1 AND vote = $2",
        )
        .bind(investigation.as_uuid())
        .bind(choice.as_str())
        .fetch_all(self.pool())
        .await
        .map_err(db_err)?;
        Ok(ids.into_iter().map(UserId::from_uuid).collect())
    }

    async fn mark_ballots(
        &self,
        investigation: InvestigationId,
        correct: &[UserId],
    ) -> Result<(), StoreError> {
        let correct_ids: Vec<Uuid> = correct.iter().map(|id| *id.as_uuid()).collect();

        sqlx::query(
            "UPDATE ballots SET result = 'correct'
             WHERE investigation_id = $1 AND user_id = ANY($2)",
        )
        .bind(investigation.as_uuid())
        .bind(&correct_ids)
        .execute(self.pool())
        .await
        .map_err(db_err)?;

        sqlx::query(
            "UPDATE ballots SET result = 'incorrect'
             WHERE investigation_id = $1 AND user_id <> ALL($2)",
        )
        .bind(investigation.as_uuid())
        .bind(&correct_ids)
        .execute(self.pool())
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn disputants(&self, investigation: InvestigationId) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, DisputantRow>(
            "SELECT u.id, u.username, u.channel_id, u.notifications_enabled, u.ready,
                    u.min_stake, u.rating, u.created_at
             FROM evidence e
             JOIN users u ON e.user_id = u.id
             WHERE e.dispute_id = (SELECT dispute_id FROM investigations WHERE id = $1)
             ORDER BY e.submitted_at",
        )
        .bind(investigation.as_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|row| User {
                id: UserId::from_uuid(row.id),
                username: row.username,
                channel_id: row.channel_id,
                notifications_enabled: row.notifications_enabled,
                ready: row.ready,
                min_stake: row.min_stake,
                rating: row.rating,
                created_at: row.created_at,
            })
            .collect())
    }
}
