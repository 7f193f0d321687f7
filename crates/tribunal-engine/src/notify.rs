//! # Notifier Contract
//!
//! Best-effort outbound notifications. The engines send after their state
//! writes have committed; a delivery failure is logged and reported, never
//! rolled back into the state change. Users who disabled notifications are
//! skipped before the contract is ever invoked.

use async_trait::async_trait;

use tribunal_core::{DeliveryError, User};

/// Delivery of a text message to a user's external channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text` to the channel address. Failures are observable but
    /// carry no transactional weight.
    async fn send(&self, channel: i64, text: &str) -> Result<(), DeliveryError>;
}

/// Notifier that writes deliveries to the log instead of a real channel.
///
/// The default backend for development and for deployments without a
/// configured messaging channel.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, channel: i64, text: &str) -> Result<(), DeliveryError> {
        tracing::info!(channel, text, "notification");
        Ok(())
    }
}

/// Send to a user, honoring their notification setting and swallowing
/// delivery failures into a warning.
pub(crate) async fn notify_user(notifier: &dyn Notifier, user: &User, text: &str) {
    if !user.notifications_enabled {
        return;
    }
    if let Err(err) = notifier.send(user.channel_id, text).await {
        tracing::warn!(user = %user.username, error = %err, "notification delivery failed");
    }
}

/// User-facing message texts.
pub mod messages {
    /// A new dispute invitation arrived.
    pub fn new_dispute(creator: &str) -> String {
        format!("You have a new dispute from {creator}")
    }

    /// The invited opponent accepted.
    pub fn dispute_accepted(title: &str, by: &str) -> String {
        format!("Your dispute {title} was accepted by {by}")
    }

    /// The invited opponent declined; the stake is returned.
    pub fn dispute_cancelled(title: &str, by: &str) -> String {
        format!("Your dispute {title} was cancelled by {by}")
    }

    /// Both parties conceded.
    pub fn dispute_draw(title: &str, with: &str) -> String {
        format!("Your dispute {title} with {with} ended in a draw. Collect your reward!")
    }

    /// The recipient lost the dispute.
    pub fn dispute_lost(title: &str, with: &str) -> String {
        format!("Your dispute {title} with {with} ended in defeat.")
    }

    /// The recipient won the dispute.
    pub fn dispute_won(title: &str, with: &str) -> String {
        format!("Your dispute {title} with {with} ended in victory. Collect your reward!")
    }

    /// Both parties claim victory; evidence is now required.
    pub fn evidence_required(title: &str, with: &str) -> String {
        format!("Your dispute {title} with {with} requires evidence.")
    }

    /// A juror received a new investigation.
    pub fn investigation_available() -> String {
        "A new investigation is available to you!".to_string()
    }

    /// The jury found a draw; both disputants may collect.
    pub fn investigation_draw(title: &str) -> String {
        format!("The investigation {title} ended in a draw, you can collect your stake!")
    }

    /// The jury found in the recipient's favor.
    pub fn investigation_won(title: &str) -> String {
        format!("The investigation {title} ended in your victory, you can collect your stake!")
    }

    /// The jury found against the recipient.
    pub fn investigation_lost(title: &str) -> String {
        format!("The investigation {title} ended in your defeat.")
    }

    /// A juror's ballot matched the outcome.
    pub fn juror_correct(title: &str) -> String {
        format!("You judged the investigation {title} correctly")
    }
}
