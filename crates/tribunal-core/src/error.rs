//! # Error Hierarchy
//!
//! Three layers of failure, kept distinct so callers can react precisely:
//!
//! - [`StoreError`] — what a ledger backend reports: a row is absent, or the
//!   backend itself failed. Engines translate `NotFound` into the
//!   context-appropriate [`EngineError`] variant instead of letting it leak
//!   as a generic storage fault.
//! - [`EngineError`] — the business-level error kinds. Validation failures
//!   are detected before any mutation; state-precondition failures surface
//!   as [`EngineError::InvalidState`] and make every logical operation safe
//!   to retry.
//! - [`DeliveryError`] — a notification could not be delivered. Delivery is
//!   best-effort relative to committed state and never rolls it back.

use thiserror::Error;

/// Error from a ledger backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row matched the query.
    #[error("not found")]
    NotFound,

    /// The backend failed in a way the caller cannot reason about.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Wrap an opaque backend failure.
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Business-level error returned by the dispute, evidence, and
/// investigation engines.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// A required field is missing or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The operation is not permitted from the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The challenged opponent is not a registered user.
    #[error("opponent {0} not found")]
    OpponentNotFound(String),

    /// The challenged opponent has not enabled dispute readiness.
    #[error("opponent {0} is not ready for disputes")]
    OpponentUnready(String),

    /// The stake is below the opponent's configured minimum.
    #[error("stake {amount} is below the opponent's minimum of {minimum}")]
    BelowMinimum { amount: i64, minimum: i64 },

    /// A ledger operation failed mid-flight. The caller may retry the whole
    /// logical operation; state preconditions make the retry safe.
    #[error("storage failure: {0}")]
    Storage(String),
}

/// A notification could not be delivered to a user's channel.
#[derive(Debug, Error)]
#[error("delivery to channel {channel} failed: {reason}")]
pub struct DeliveryError {
    /// The notification channel address the send targeted.
    pub channel: i64,
    /// Channel-specific failure description.
    pub reason: String,
}

/// A persisted or user-supplied string did not match any variant of a
/// closed enumeration.
#[derive(Debug, Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct UnknownVariant {
    /// Which enumeration was being parsed.
    pub kind: &'static str,
    /// The offending input.
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
