//! User persistence operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use tribunal_core::{StoreError, User, UserId};
use tribunal_engine::ledger::{UserPatch, UserStore};

use super::{db_err, PgLedger};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    channel_id: i64,
    notifications_enabled: bool,
    ready: bool,
    min_stake: i64,
    rating: i64,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: UserId::from_uuid(self.id),
            username: self.username,
            channel_id: self.channel_id,
            notifications_enabled: self.notifications_enabled,
            ready: self.ready,
            min_stake: self.min_stake,
            rating: self.rating,
            created_at: self.created_at,
        }
    }
}

const USER_COLUMNS: &str =
    "id, username, channel_id, notifications_enabled, ready, min_stake, rating, created_at";

fn uuids(ids: &[UserId]) -> Vec<Uuid> {
    ids.iter().map(|id| *id.as_uuid()).collect()
}

#[async_trait]
impl UserStore for PgLedger {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (id, username, channel_id, notifications_enabled, ready, min_stake, rating, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(user.channel_id)
        .bind(user.notifications_enabled)
        .bind(user.ready)
        .bind(user.min_stake)
        .bind(user.rating)
        .bind(user.created_at)
        .execute(self.pool())
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn user_by_id(&self, id: UserId) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_one(self.pool())
        .await
        .map_err(db_err)?;
        Ok(row.into_user())
    }

    async fn user_by_username(&self, username: &str) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_one(self.pool())
        .await
        .map_err(db_err)?;
        Ok(row.into_user())
    }

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(self.pool())
                .await
                .map_err(db_err)?;
        Ok(exists)
    }

    async fn count_users(&self) -> Result<i64, StoreError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool())
            .await
            .map_err(db_err)
    }

    async fn users_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"
        ))
        .bind(uuids(ids))
        .fetch_all(self.pool())
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(UserRow::into_user).collect())
    }

    async fn top_by_rating(&self, limit: i64) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY rating DESC, username LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(UserRow::into_user).collect())
    }

    async fn add_rating(&self, ids: &[UserId], delta: i64) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET rating = rating + $2 WHERE id = ANY($1)")
            .bind(uuids(ids))
            .bind(delta)
            .execute(self.pool())
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn update_user(&self, username: &str, patch: UserPatch) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE users
             SET notifications_enabled = COALESCE($1, notifications_enabled),
                 ready = COALESCE($2, ready),
                 min_stake = COALESCE($3, min_stake),
                 rating = COALESCE($4, rating),
                 channel_id = COALESCE($5, channel_id)
             WHERE username = $6",
        )
        .bind(patch.notifications_enabled)
        .bind(patch.ready)
        .bind(patch.min_stake)
        .bind(patch.rating)
        .bind(patch.channel_id)
        .bind(username)
        .execute(self.pool())
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
