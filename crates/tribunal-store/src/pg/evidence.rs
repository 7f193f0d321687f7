//! Evidence persistence operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use tribunal_core::{Attachment, DisputeId, Evidence, EvidenceId, StoreError, UserId};
use tribunal_engine::ledger::EvidenceStore;

use super::{db_err, PgLedger};

#[derive(sqlx::FromRow)]
struct EvidenceRow {
    id: Uuid,
    dispute_id: Uuid,
    user_id: Uuid,
    description: String,
    image_data: Vec<u8>,
    image_mime: String,
    submitted_at: DateTime<Utc>,
}

impl EvidenceRow {
    fn into_evidence(self) -> Evidence {
        Evidence {
            id: EvidenceId::from_uuid(self.id),
            dispute_id: DisputeId::from_uuid(self.dispute_id),
            user_id: UserId::from_uuid(self.user_id),
            description: self.description,
            image: Attachment {
                data: self.image_data,
                mime: self.image_mime,
            },
            submitted_at: self.submitted_at,
        }
    }
}

#[async_trait]
impl EvidenceStore for PgLedger {
    async fn insert_evidence(&self, evidence: &Evidence) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO evidence (id, dispute_id, user_id, description, image_data, image_mime, submitted_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(evidence.id.as_uuid())
        .bind(evidence.dispute_id.as_uuid())
        .bind(evidence.user_id.as_uuid())
        .bind(&evidence.description)
        .bind(&evidence.image.data)
        .bind(&evidence.image.mime)
        .bind(evidence.submitted_at)
        .execute(self.pool())
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn evidence_count(&self, dispute: DisputeId) -> Result<i64, StoreError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM evidence WHERE dispute_id = $1")
            .bind(dispute.as_uuid())
            .fetch_one(self.pool())
            .await
            .map_err(db_err)
    }

    async fn evidence_for(&self, dispute: DisputeId) -> Result<Vec<Evidence>, StoreError> {
        let rows = sqlx::query_as::<_, EvidenceRow>(
            "SELECT id, dispute_id, user_id, description, image_data, image_mime, submitted_at
             FROM evidence
             WHERE dispute_id = $1
             ORDER BY submitted_at",
        )
        .bind(dispute.as_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(EvidenceRow::into_evidence).collect())
    }
}
