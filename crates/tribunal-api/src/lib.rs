//! # tribunal-api — Axum HTTP Surface
//!
//! JSON API over the Tribunal engines.
//!
//! ## API Surface
//!
//! | Prefix                 | Module                      | Domain            |
//! |------------------------|-----------------------------|-------------------|
//! | `/v1/disputes/*`       | [`routes::disputes`]        | Dispute lifecycle |
//! | `/v1/disputes/*/evidence` | [`routes::evidence`]     | Evidence intake   |
//! | `/v1/investigations/*` | [`routes::investigations`]  | Jury arbitration  |
//! | `/v1/users/*`          | [`routes::users`]           | Users             |
//!
//! Health probes (`/health/*`) and the OpenAPI document
//! (`/openapi.json`) are unauthenticated; everything else reads the
//! acting username from the `x-actor` header.

pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::state::AppState;

/// Liveness probe.
async fn health_live() -> impl IntoResponse {
    StatusCode::OK
}

/// Readiness probe.
async fn health_ready() -> impl IntoResponse {
    StatusCode::OK
}

/// Serve the assembled OpenAPI document.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi::ApiDoc::openapi())
}

/// Assemble the full application router.
///
/// Body size limit: 2 MiB, enough for evidence image payloads while
/// bounding memory per request.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::disputes::router())
        .merge(routes::evidence::router())
        .merge(routes::investigations::router())
        .merge(routes::users::router())
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        .route("/openapi.json", get(openapi_json))
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
