//! # User Engine
//!
//! Registration, profile settings, and the jury leaderboard. Ratings are
//! not writable here — only settlement and jury-correctness outcomes in
//! the other engines touch them.

use std::sync::Arc;

use tribunal_core::{EngineError, User};

use crate::ledger::{missing, storage, Ledger, UserPatch};

/// Settings a user may change about themselves.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    /// Turn notifications on or off.
    pub notifications_enabled: Option<bool>,
    /// Become (un)available for challenges.
    pub ready: Option<bool>,
    /// Minimum acceptable stake.
    pub min_stake: Option<i64>,
    /// External notification channel address.
    pub channel_id: Option<i64>,
}

/// User registration and profile operations.
pub struct UserEngine {
    ledger: Arc<dyn Ledger>,
}

impl UserEngine {
    /// Assemble the engine over a ledger.
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    /// Register a user unless the username is already taken. Idempotent.
    pub async fn register_if_absent(&self, username: &str) -> Result<(), EngineError> {
        if username.trim().is_empty() {
            return Err(EngineError::InvalidInput(
                "username must be provided".to_string(),
            ));
        }
        if self
            .ledger
            .username_exists(username)
            .await
            .map_err(storage)?
        {
            tracing::debug!(username, "user already registered");
            return Ok(());
        }
        let user = User::register(username);
        self.ledger.insert_user(&user).await.map_err(storage)?;
        tracing::info!(username, "user registered");
        Ok(())
    }

    /// Look a user up by username.
    pub async fn by_username(&self, username: &str) -> Result<User, EngineError> {
        self.ledger
            .user_by_username(username)
            .await
            .map_err(missing("user"))
    }

    /// Apply profile settings to one's own account.
    pub async fn update_settings(
        &self,
        username: &str,
        settings: SettingsUpdate,
    ) -> Result<(), EngineError> {
        // Ensure the user exists so an update on a missing row surfaces as
        // NotFound rather than silently writing nothing.
        self.by_username(username).await?;
        self.ledger
            .update_user(
                username,
                UserPatch {
                    notifications_enabled: settings.notifications_enabled,
                    ready: settings.ready,
                    min_stake: settings.min_stake,
                    channel_id: settings.channel_id,
                    rating: None,
                },
            )
            .await
            .map_err(storage)
    }

    /// The top-rated jurors.
    pub async fn leaderboard(&self, limit: i64) -> Result<Vec<User>, EngineError> {
        let limit = if limit <= 0 { 10 } else { limit };
        self.ledger.top_by_rating(limit).await.map_err(storage)
    }
}
