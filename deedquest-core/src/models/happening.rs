use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendance {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_id: Uuid,
    /// Set once the attendee has confirmed they were there.
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendeeReward {
    pub user_id: Uuid,
    pub xp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HappeningSettlement {
    pub activity_id: Uuid,
    pub approved: bool,
    pub attendee_rewards: Vec<AttendeeReward>,
    pub creator_reward: i64,
    pub removed_attendances: usize,
}
