use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReviewType {
    None,
    Poor,
    Good,
    Awesome,
}

impl ReviewType {
    pub const ALL: [ReviewType; 4] = [Self::None, Self::Poor, Self::Good, Self::Awesome];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Poor => "poor",
            Self::Good => "good",
            Self::Awesome => "awesome",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "poor" => Some(Self::Poor),
            "good" => Some(Self::Good),
            "awesome" => Some(Self::Awesome),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_id: Uuid,
    pub review_type: ReviewType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub review: Review,
    /// Signed XP change applied to the activity creator.
    pub xp_delta: i64,
}
