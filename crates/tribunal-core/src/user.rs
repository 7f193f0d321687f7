//! User records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// A registered user.
///
/// ## Invariants
///
/// - `rating` only ever increases: +1 for casting a juror ballot, +3 when
///   the ballot matches the investigation outcome. No operation decrements
///   it and users are never deleted.
/// - A user can only be challenged to a dispute while `ready` is true, and
///   only for stakes of at least `min_stake`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Unique login name, the public handle other users challenge.
    pub username: String,
    /// External notification channel address.
    pub channel_id: i64,
    /// Whether the user receives notifications at all.
    pub notifications_enabled: bool,
    /// Readiness flag. Must be true for the user to be challenged.
    pub ready: bool,
    /// Minimum stake the user will accept in a dispute.
    pub min_stake: i64,
    /// Monotonically increasing jury rating score.
    pub rating: i64,
    /// When the user registered (UTC).
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Register a new user with notifications off and readiness unset.
    pub fn register(username: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            channel_id: 0,
            notifications_enabled: false,
            ready: false,
            min_stake: 0,
            rating: 0,
            created_at: Utc::now(),
        }
    }
}
