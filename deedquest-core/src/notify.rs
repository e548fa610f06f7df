//! Outbound notifications. Fire-and-forget from the engine's point of view.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ActivityApproved,
    ActivityRejected,
    ChallengeAnswered,
    ChallengeAnswerApproved,
    ChallengeWon,
    HappeningCompletionApproved,
    HappeningCompletionRejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub recipient_email: String,
    pub activity_id: Uuid,
    pub activity_title: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<()>;
}

/// Writes notifications to the log instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: Notification) -> Result<()> {
        tracing::info!(
            kind = ?notification.kind,
            to = %notification.recipient_email,
            activity_id = %notification.activity_id,
            "Notification: {}",
            notification.activity_title
        );
        Ok(())
    }
}
