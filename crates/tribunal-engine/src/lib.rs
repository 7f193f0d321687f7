//! # tribunal-engine — Business Engines
//!
//! The arbitration core of Tribunal:
//!
//! - **Ledger contracts** ([`ledger`]): the data-access traits every engine
//!   consumes. Storage backends implement them; the engines never touch SQL
//!   or any other backend detail.
//!
//! - **Notifier** ([`notify`]): best-effort outbound notification contract
//!   and the user-facing message texts. Delivery failures are observable
//!   but never roll back committed state.
//!
//! - **Aggregate locks** ([`locks`]): per-aggregate serialization of every
//!   multi-row logical operation. Concurrent votes on the same dispute or
//!   investigation are applied one at a time.
//!
//! - **Dispute engine** ([`dispute`]): creation, acceptance/rejection, the
//!   two-party voting protocol, reward claiming, and read projections.
//!
//! - **Evidence intake** ([`evidence`]): first/second submission handling
//!   and investigation kickoff with juror broadcast.
//!
//! - **Investigation engine** ([`investigation`]): ballot tallying, the
//!   exactly-once closure, juror rating accounting, and propagation of the
//!   outcome back into the disputants' participations.
//!
//! - **User engine** ([`users`]): registration, settings, and the
//!   leaderboard.
//!
//! ## Consistency model
//!
//! Validation happens before any write. Multi-step settlement operations
//! write in a fixed order; a mid-flight storage failure surfaces as
//! [`EngineError::Storage`](tribunal_core::EngineError::Storage) and the
//! caller retries the whole logical operation — state preconditions make
//! the retry safe because an already-applied transition fails its
//! precondition instead of reapplying.

pub mod dispute;
pub mod evidence;
pub mod investigation;
pub mod ledger;
pub mod locks;
pub mod notify;
pub mod users;

// Re-export primary types for ergonomic imports.

pub use dispute::{DisputeEngine, NewDispute};
pub use evidence::{EvidenceIntake, NewEvidence};
pub use investigation::InvestigationEngine;
pub use ledger::{
    BallotPatch, BallotStore, DisputeBrief, DisputeFilter, DisputeStore, DisputeView,
    EvidenceStore, InvestigationFilter, InvestigationPatch, InvestigationStore,
    InvestigationView, Ledger, ParticipationPatch, ParticipationStore, UserPatch, UserStore,
};
pub use locks::AggregateLocks;
pub use notify::{messages, LogNotifier, Notifier};
pub use users::{SettingsUpdate, UserEngine};
