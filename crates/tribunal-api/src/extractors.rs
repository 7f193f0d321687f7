//! # Request Extractors
//!
//! Small extractors shared by the route modules.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;

/// Header carrying the acting username.
///
/// Session issuance is outside this service; the perimeter authenticates
/// the caller and forwards the username here.
pub const ACTOR_HEADER: &str = "x-actor";

/// The acting username, taken from the [`ACTOR_HEADER`] header.
#[derive(Debug, Clone)]
pub struct Actor(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| Actor(name.to_string()))
            .ok_or_else(|| AppError::Unauthorized(format!("missing {ACTOR_HEADER} header")))
    }
}
