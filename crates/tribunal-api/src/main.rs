//! # tribunal-api — Binary Entry Point
//!
//! Starts the Axum HTTP server. Binds to a configurable port (default
//! 8080). With `DATABASE_URL` set the ledger is PostgreSQL; without it
//! the server runs on the in-memory ledger.

use std::sync::Arc;

use tribunal_api::state::AppState;
use tribunal_engine::LogNotifier;
use tribunal_store::PgLedger;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(8080);

    // Initialize the ledger (Postgres when configured, in-memory
    // otherwise). Delivery goes to the log until a real channel client is
    // wired at the perimeter.
    let pool = tribunal_store::init_pool().await.map_err(|err| {
        tracing::error!("database initialization failed: {err}");
        err
    })?;
    let state = match pool {
        Some(pool) => AppState::new(Arc::new(PgLedger::new(pool)), Arc::new(LogNotifier)),
        None => AppState::in_memory(),
    };

    let app = tribunal_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Tribunal API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
