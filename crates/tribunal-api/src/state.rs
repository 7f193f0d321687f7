//! # Application State
//!
//! Shared state for the Axum application: the four engines over one
//! ledger, one notifier, and one aggregate-lock registry. Handlers receive
//! it via the `State` extractor.

use std::sync::Arc;

use tribunal_engine::{
    AggregateLocks, DisputeEngine, EvidenceIntake, InvestigationEngine, Ledger, LogNotifier,
    Notifier, UserEngine,
};
use tribunal_store::MemoryLedger;

/// Engines shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub disputes: Arc<DisputeEngine>,
    pub evidence: Arc<EvidenceIntake>,
    pub investigations: Arc<InvestigationEngine>,
    pub users: Arc<UserEngine>,
}

impl AppState {
    /// Assemble the engines over the given backends. The lock registry is
    /// shared so dispute- and investigation-level operations serialize
    /// consistently no matter which engine they enter through.
    pub fn new(ledger: Arc<dyn Ledger>, notifier: Arc<dyn Notifier>) -> Self {
        let locks = Arc::new(AggregateLocks::new());
        Self {
            disputes: Arc::new(DisputeEngine::new(
                ledger.clone(),
                notifier.clone(),
                locks.clone(),
            )),
            evidence: Arc::new(EvidenceIntake::new(
                ledger.clone(),
                notifier.clone(),
                locks.clone(),
            )),
            investigations: Arc::new(InvestigationEngine::new(
                ledger.clone(),
                notifier,
                locks,
            )),
            users: Arc::new(UserEngine::new(ledger)),
        }
    }

    /// State over the in-memory ledger and the log notifier. Used by tests
    /// and by deployments without a configured database.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryLedger::new()), Arc::new(LogNotifier))
    }
}
