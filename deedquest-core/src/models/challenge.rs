use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Activity, Media};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeAnswer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_id: Uuid,
    pub description: String,
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeAnswerWithMedia {
    #[serde(flatten)]
    pub answer: ChallengeAnswer,
    pub media: Vec<Media>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeResolution {
    pub activity: Activity,
    pub winner_id: Uuid,
    pub xp_reward: i64,
    pub removed_answers: usize,
}
