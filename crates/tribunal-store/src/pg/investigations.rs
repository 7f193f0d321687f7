//! Investigation persistence operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use tribunal_core::{DisputeId, Investigation, InvestigationId, StoreError, UserId};
use tribunal_engine::ledger::{
    InvestigationFilter, InvestigationPatch, InvestigationStore, InvestigationView,
};

use super::{db_err, PgLedger};
use crate::pg::ballots::vote_from_column;

#[derive(sqlx::FromRow)]
struct InvestigationRow {
    id: Uuid,
    dispute_id: Uuid,
    title: String,
    total: i32,
    p1: i32,
    p2: i32,
    draw: i32,
    status: String,
    created_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
}

impl InvestigationRow {
    fn into_investigation(self) -> Result<Investigation, StoreError> {
        Ok(Investigation {
            id: InvestigationId::from_uuid(self.id),
            dispute_id: DisputeId::from_uuid(self.dispute_id),
            title: self.title,
            total: self.total,
            p1: self.p1,
            p2: self.p2,
            draw: self.draw,
            status: self.status.parse().map_err(StoreError::backend)?,
            created_at: self.created_at,
            ends_at: self.ends_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct InvestigationViewRow {
    id: Uuid,
    dispute_id: Uuid,
    title: String,
    status: String,
    created_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    ballot_result: String,
    ballot_vote: String,
}

impl InvestigationViewRow {
    fn into_view(self) -> Result<InvestigationView, StoreError> {
        Ok(InvestigationView {
            id: InvestigationId::from_uuid(self.id),
            dispute_id: DisputeId::from_uuid(self.dispute_id),
            title: self.title,
            status: self.status.parse().map_err(StoreError::backend)?,
            created_at: self.created_at,
            ends_at: self.ends_at,
            ballot_result: self.ballot_result.parse().map_err(StoreError::backend)?,
            ballot_vote: vote_from_column(&self.ballot_vote)?,
        })
    }
}

const VIEW_COLUMNS: &str = "i.id, i.dispute_id, i.title, i.status, i.created_at, i.ends_at, \
     b.result AS ballot_result, b.vote AS ballot_vote";

#[async_trait]
impl InvestigationStore for PgLedger {
    async fn insert_investigation(&self, investigation: &Investigation) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO investigations (id, dispute_id, title, total, p1, p2, draw, status, created_at, ends_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(investigation.id.as_uuid())
        .bind(investigation.dispute_id.as_uuid())
        .bind(&investigation.title)
        .bind(investigation.total)
        .bind(investigation.p1)
        .bind(investigation.p2)
        .bind(investigation.draw)
        .bind(investigation.status.as_str())
        .bind(investigation.created_at)
        .bind(investigation.ends_at)
        .execute(self.pool())
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn investigation(&self, id: InvestigationId) -> Result<Investigation, StoreError> {
        let row = sqlx::query_as::<_, InvestigationRow>(
            "SELECT id, dispute_id, title, total, p1, p2, draw, status, created_at, ends_at
             FROM investigations WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_one(self.pool())
        .await
        .map_err(db_err)?;
        row.into_investigation()
    }

    async fn investigation_for(
        &self,
        id: InvestigationId,
        user: UserId,
    ) -> Result<InvestigationView, StoreError> {
        let row = sqlx::query_as::<_, InvestigationViewRow>(&format!(
            "SELECT {VIEW_COLUMNS}
             FROM investigations i
             JOIN ballots b ON i.id = b.investigation_id
             WHERE i.id = $1 AND b.user_id = $2"
        ))
        .bind(id.as_uuid())
        .bind(user.as_uuid())
        .fetch_one(self.pool())
        .await
        .map_err(db_err)?;
        row.into_view()
    }

    async fn list_investigations(
        &self,
        user: UserId,
        filter: &InvestigationFilter,
    ) -> Result<Vec<InvestigationView>, StoreError> {
        let mut clauses = vec!["b.user_id = $1".to_string()];
        let mut idx = 1;

        if filter.status.is_some() {
            idx += 1;
            clauses.push(format!("i.status = ${idx}"));
        }
        if filter.cursor.is_some() {
            idx += 1;
            clauses.push(format!("i.created_at <= ${idx}"));
        }
        idx += 1;

        let sql = format!(
            "SELECT {VIEW_COLUMNS}
             FROM investigations i
             JOIN ballots b ON i.id = b.investigation_id
             WHERE {}
             ORDER BY i.created_at DESC
             LIMIT ${idx}",
            clauses.join(" AND "),
        );

        let mut query = sqlx::query_as::<_, InvestigationViewRow>(&sql).bind(user.as_uuid());
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }
        if let Some(cursor) = filter.cursor {
            query = query.bind(cursor.timestamp());
        }
        query = query.bind((filter.limit + 1) as i64);

        let rows = query.fetch_all(self.pool()).await.map_err(db_err)?;
        rows.into_iter().map(InvestigationViewRow::into_view).collect()
    }

    async fn update_investigation(
        &self,
        id: InvestigationId,
        patch: InvestigationPatch,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE investigations
             SET status = COALESCE($1, status),
                 p1 = COALESCE($2, p1),
                 p2 = COALESCE($3, p2),
                 draw = COALESCE($4, draw),
                 total = COALESCE($5, total)
             WHERE id = $6",
        )
        .bind(patch.status.map(|status| status.as_str()))
        .bind(patch.p1)
        .bind(patch.p2)
        .bind(patch.draw)
        .bind(patch.total)
        .bind(id.as_uuid())
        .execute(self.pool())
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
