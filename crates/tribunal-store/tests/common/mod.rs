//! Shared harness for the engine scenario tests: an in-memory ledger,
//! a recording notifier, and all four engines wired together.

// Each test binary compiles this module independently and uses a different
// subset of it.
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use tribunal_core::{DeliveryError, User};
use tribunal_engine::{
    AggregateLocks, DisputeEngine, EvidenceIntake, InvestigationEngine, Ledger, Notifier,
    SettingsUpdate, UserEngine,
};
use tribunal_store::MemoryLedger;

/// Notifier that records every delivery.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(i64, String)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, channel: i64, text: &str) -> Result<(), DeliveryError> {
        self.sent.lock().push((channel, text.to_string()));
        Ok(())
    }
}

impl RecordingNotifier {
    /// All texts delivered to the given channel.
    pub fn texts_for(&self, channel: i64) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter(|(to, _)| *to == channel)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

/// Notifier that fails every delivery.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, channel: i64, _text: &str) -> Result<(), DeliveryError> {
        Err(DeliveryError {
            channel,
            reason: "channel unreachable".into(),
        })
    }
}

/// Everything a scenario needs, sharing one ledger and one lock registry.
pub struct Harness {
    pub ledger: Arc<MemoryLedger>,
    pub notifier: Arc<RecordingNotifier>,
    pub disputes: DisputeEngine,
    pub evidence: EvidenceIntake,
    pub investigations: InvestigationEngine,
    pub users: UserEngine,
}

impl Harness {
    pub fn new() -> Self {
        let ledger = Arc::new(MemoryLedger::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let shared: Arc<dyn Ledger> = ledger.clone();
        let locks = Arc::new(AggregateLocks::new());
        Self {
            disputes: DisputeEngine::new(shared.clone(), notifier.clone(), locks.clone()),
            evidence: EvidenceIntake::new(shared.clone(), notifier.clone(), locks.clone()),
            investigations: InvestigationEngine::new(shared.clone(), notifier.clone(), locks),
            users: UserEngine::new(shared),
            ledger,
            notifier,
        }
    }

    /// Register a ready user with notifications on and a distinct channel.
    pub async fn register(&self, username: &str, channel: i64) -> User {
        self.users.register_if_absent(username).await.unwrap();
        self.users
            .update_settings(
                username,
                SettingsUpdate {
                    notifications_enabled: Some(true),
                    ready: Some(true),
                    channel_id: Some(channel),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        self.users.by_username(username).await.unwrap()
    }
}
