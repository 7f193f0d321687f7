//! # tribunal-store — Ledger Backends
//!
//! Implementations of the [`tribunal_engine::ledger`] contracts:
//!
//! - [`MemoryLedger`] ([`memory`]): thread-safe in-memory maps. The test
//!   backend, and what the API falls back to when no database is
//!   configured.
//! - [`PgLedger`] ([`pg`]): PostgreSQL via SQLx, one module per entity,
//!   schema applied through embedded migrations.
//!
//! Backends hold no business logic; state-machine rules live in the
//! engines.

pub mod memory;
pub mod pg;

pub use memory::MemoryLedger;
pub use pg::PgLedger;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!(
                "DATABASE_URL not set — running in-memory only mode. \
                 State will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}
