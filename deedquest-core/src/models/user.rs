use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ActivityType;

pub const MAX_SKILL_LEVEL: u8 = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub xp: i64,
    /// Cached level, raised one step at a time by leveling up.
    pub level: u32,
    pub special_title: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_type: ActivityType,
    pub level: u8,
}

impl Skill {
    pub fn is_maxed(&self) -> bool {
        self.level >= MAX_SKILL_LEVEL
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreationCounter {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_type: ActivityType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub skills: Vec<Skill>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelProgress {
    pub xp: i64,
    pub level: u32,
    pub potential_level: u32,
    /// XP threshold of `level + 1`, `None` at the top of the table.
    pub next_level_xp: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserInput {
    pub id: Uuid,
    pub email: String,
}
