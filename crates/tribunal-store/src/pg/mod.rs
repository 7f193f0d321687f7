//! # PostgreSQL Ledger
//!
//! SQLx-backed implementation of the ledger contracts, one module per
//! entity. State machine constraints are enforced at the engine layer, not
//! in SQL; partial updates compile to `COALESCE` writes so a `None` patch
//! field leaves the column untouched.

mod ballots;
mod disputes;
mod evidence;
mod investigations;
mod participations;
mod users;

use sqlx::PgPool;

use tribunal_core::StoreError;

/// Ledger over a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    /// Wrap an initialized pool. Run migrations first via
    /// [`crate::init_pool`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Map a SQLx error onto the store contract: an empty result is
/// `NotFound`, everything else an opaque backend failure.
pub(crate) fn db_err(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        other => StoreError::backend(other),
    }
}
