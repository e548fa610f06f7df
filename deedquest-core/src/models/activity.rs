use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Media;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    GoodDeed,
    Joke,
    Quote,
    Puzzle,
    Happening,
    Challenge,
}

impl ActivityType {
    pub const ALL: [ActivityType; 6] = [
        Self::GoodDeed,
        Self::Joke,
        Self::Quote,
        Self::Puzzle,
        Self::Happening,
        Self::Challenge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GoodDeed => "good_deed",
            Self::Joke => "joke",
            Self::Quote => "quote",
            Self::Puzzle => "puzzle",
            Self::Happening => "happening",
            Self::Challenge => "challenge",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "good_deed" => Some(Self::GoodDeed),
            "joke" => Some(Self::Joke),
            "quote" => Some(Self::Quote),
            "puzzle" => Some(Self::Puzzle),
            "happening" => Some(Self::Happening),
            "challenge" => Some(Self::Challenge),
            _ => None,
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submission waiting for moderation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingActivity {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub activity_type: ActivityType,
    pub title: String,
    pub description: Option<String>,
    pub answer: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// An approved activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub activity_type: ActivityType,
    pub title: String,
    pub description: Option<String>,
    /// Puzzle solution. Never serialized to clients.
    #[serde(skip_serializing, default)]
    pub answer: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// `None` while a challenge is unresolved.
    pub xp_reward: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub approved_at: DateTime<Utc>,
}

impl Activity {
    /// Materializes an approved activity from its pending submission.
    pub fn from_pending(pending: &PendingActivity, approved_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            creator_id: pending.creator_id,
            activity_type: pending.activity_type,
            title: pending.title.clone(),
            description: pending.description.clone(),
            answer: pending.answer.clone(),
            location: pending.location.clone(),
            start_date: pending.start_date,
            end_date: pending.end_date,
            xp_reward: None,
            created_at: pending.created_at,
            approved_at,
        }
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end_date.is_some_and(|end| end <= now)
    }

    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.start_date.map_or(true, |start| start <= now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityWithMedia {
    #[serde(flatten)]
    pub activity: Activity,
    pub media: Vec<Media>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePendingActivityInput {
    pub activity_type: ActivityType,
    pub title: String,
    pub description: Option<String>,
    pub answer: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl CreatePendingActivityInput {
    pub fn new(activity_type: ActivityType, title: impl Into<String>) -> Self {
        Self {
            activity_type,
            title: title.into(),
            description: None,
            answer: None,
            location: None,
            start_date: None,
            end_date: None,
        }
    }
}

/// Outcome of a moderation decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    Approved { activity: Activity },
    Disapproved { pending_id: Uuid },
}

/// Marks a user as having solved a puzzle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PuzzleAnswer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_id: Uuid,
    pub created_at: DateTime<Utc>,
}
