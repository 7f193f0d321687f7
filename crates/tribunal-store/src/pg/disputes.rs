//! Dispute persistence operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use tribunal_core::{Attachment, Dispute, DisputeId, Stake, StoreError, UserId};
use tribunal_engine::ledger::{DisputeBrief, DisputeFilter, DisputeStore, DisputeView};

use super::{db_err, PgLedger};

#[derive(sqlx::FromRow)]
struct DisputeViewRow {
    id: Uuid,
    title: String,
    description: String,
    currency: String,
    amount: i64,
    image_data: Option<Vec<u8>>,
    image_mime: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    result: String,
    claim: bool,
    vote: bool,
}

impl DisputeViewRow {
    fn into_view(self) -> Result<DisputeView, StoreError> {
        let result = self.result.parse().map_err(StoreError::backend)?;
        Ok(DisputeView {
            dispute: Dispute {
                id: DisputeId::from_uuid(self.id),
                title: self.title,
                description: self.description,
                stake: Stake {
                    amount: self.amount,
                    currency: self.currency,
                },
                image: attachment(self.image_data, self.image_mime),
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            result,
            claim: self.claim,
            vote: self.vote,
            opponent: None,
        })
    }
}

fn attachment(data: Option<Vec<u8>>, mime: Option<String>) -> Option<Attachment> {
    match (data, mime) {
        (Some(data), Some(mime)) => Some(Attachment { data, mime }),
        _ => None,
    }
}

const VIEW_COLUMNS: &str = "d.id, d.title, d.description, d.currency, d.amount, \
     d.image_data, d.image_mime, d.created_at, d.updated_at, \
     p.result, p.claim, p.vote";

#[async_trait]
impl DisputeStore for PgLedger {
    async fn insert_dispute(&self, dispute: &Dispute) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO disputes (id, title, description, currency, amount, image_data, image_mime, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(dispute.id.as_uuid())
        .bind(&dispute.title)
        .bind(&dispute.description)
        .bind(&dispute.stake.currency)
        .bind(dispute.stake.amount)
        .bind(dispute.image.as_ref().map(|image| image.data.clone()))
        .bind(dispute.image.as_ref().map(|image| image.mime.clone()))
        .bind(dispute.created_at)
        .bind(dispute.updated_at)
        .execute(self.pool())
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn dispute_for(
        &self,
        dispute: DisputeId,
        user: UserId,
    ) -> Result<DisputeView, StoreError> {
        let row = sqlx::query_as::<_, DisputeViewRow>(&format!(
            "SELECT {VIEW_COLUMNS}
             FROM disputes d
             JOIN participations p ON d.id = p.dispute_id
             WHERE d.id = $1 AND p.user_id = $2"
        ))
        .bind(dispute.as_uuid())
        .bind(user.as_uuid())
        .fetch_one(self.pool())
        .await
        .map_err(db_err)?;
        row.into_view()
    }

    async fn list_disputes(
        &self,
        user: UserId,
        filter: &DisputeFilter,
    ) -> Result<Vec<DisputeView>, StoreError> {
        // Dynamic WHERE clause: each optional filter claims the next
        // placeholder, and binds are applied in the same order below.
        let mut clauses = vec!["p.user_id = $1".to_string()];
        let mut idx = 1;

        if filter.status.is_some() {
            idx += 1;
            clauses.push(format!("p.status = ${idx}"));
        }
        if filter.result.is_some() {
            idx += 1;
            clauses.push(format!("p.result = ${idx}"));
        }
        if filter.cursor.is_some() {
            idx += 1;
            clauses.push(format!("d.created_at <= ${idx}"));
        }
        idx += 1;

        let sql = format!(
            "SELECT {VIEW_COLUMNS}
             FROM disputes d
             JOIN participations p ON d.id = p.dispute_id
             WHERE {}
             ORDER BY d.created_at DESC
             LIMIT ${idx}",
            clauses.join(" AND "),
        );

        let mut query = sqlx::query_as::<_, DisputeViewRow>(&sql).bind(user.as_uuid());
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }
        if let Some(result) = filter.result {
            query = query.bind(result.as_str());
        }
        if let Some(cursor) = filter.cursor {
            query = query.bind(cursor.timestamp());
        }
        query = query.bind((filter.limit + 1) as i64);

        let rows = query.fetch_all(self.pool()).await.map_err(db_err)?;
        rows.into_iter().map(DisputeViewRow::into_view).collect()
    }

    async fn dispute_brief(&self, dispute: DisputeId) -> Result<DisputeBrief, StoreError> {
        #[derive(sqlx::FromRow)]
        struct BriefRow {
            id: Uuid,
            title: String,
            description: String,
            image_data: Option<Vec<u8>>,
            image_mime: Option<String>,
        }

        let row = sqlx::query_as::<_, BriefRow>(
            "SELECT id, title, description, image_data, image_mime FROM disputes WHERE id = $1",
        )
        .bind(dispute.as_uuid())
        .fetch_one(self.pool())
        .await
        .map_err(db_err)?;

        Ok(DisputeBrief {
            id: DisputeId::from_uuid(row.id),
            title: row.title,
            description: row.description,
            image: attachment(row.image_data, row.image_mime),
        })
    }
}
