use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which collection a media row belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MediaOwner {
    PendingActivity,
    Activity,
    /// Completion photos of a happening, staged until moderation.
    HappeningCompletion,
    ChallengeAnswer,
}

impl MediaOwner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingActivity => "pending_activity",
            Self::Activity => "activity",
            Self::HappeningCompletion => "happening_completion",
            Self::ChallengeAnswer => "challenge_answer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending_activity" => Some(Self::PendingActivity),
            "activity" => Some(Self::Activity),
            "happening_completion" => Some(Self::HappeningCompletion),
            "challenge_answer" => Some(Self::ChallengeAnswer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    pub id: Uuid,
    pub owner: MediaOwner,
    pub owner_id: Uuid,
    pub public_id: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}
