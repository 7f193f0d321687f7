//! # API Route Modules
//!
//! Route modules for the Tribunal API surface:
//!
//! - `disputes` — dispute lifecycle: create, accept/reject, the two-party
//!   vote, claiming, and list/detail projections.
//! - `evidence` — evidence submission and listing for escalated disputes,
//!   plus the evidence-screen dispute brief.
//! - `investigations` — juror-facing list/detail views and ballot voting.
//! - `users` — registration, profiles, settings, and the leaderboard.
//!
//! Every `/v1/*` route resolves the acting user from the `x-actor` header
//! (see [`crate::extractors::Actor`]); identity issuance itself lives at
//! the perimeter, not in this service.

pub mod disputes;
pub mod evidence;
pub mod investigations;
pub mod users;
