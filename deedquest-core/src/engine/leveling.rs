use rusqlite::Connection;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{load_activity, load_user, Effects, Engine};
use crate::db::{media, users};
use crate::error::{Error, Result};
use crate::models::{
    ActivityType, ActivityWithMedia, LevelProgress, MediaOwner, RegisterUserInput, Skill, User,
    UserProfile,
};

impl Engine {
    /// Creates the engine-side profile for an identity-provided user id.
    #[instrument(skip(self, input), fields(user_id = %input.id))]
    pub async fn register_user(&self, input: RegisterUserInput) -> Result<User> {
        let email = input.email.trim();
        if !email.contains('@') {
            return Err(Error::Invalid(format!("{:?} is not an email address", email)));
        }
        let user = User {
            id: input.id,
            email: email.to_string(),
            xp: 0,
            level: 1,
            special_title: None,
            created_at: self.now(),
        };

        let result = self.db.transaction(|conn| {
            if users::get_user(conn, user.id)?.is_some() {
                return Err(Error::Invalid("user is already registered".into()));
            }
            users::insert_user(conn, &user)?;
            Ok((user, Effects::default()))
        });

        let user = self.settle(result, &[]).await?;
        info!(user_id = %user.id, "Registered user");
        Ok(user)
    }

    /// Spends one earned level on the skill for `activity_type`.
    ///
    /// Reaching the top skill level recomputes the special title from the
    /// user's maxed skills.
    #[instrument(skip(self))]
    pub async fn level_up(&self, user_id: Uuid, activity_type: ActivityType) -> Result<UserProfile> {
        let result = self.db.transaction(|conn| {
            let mut user = load_user(conn, user_id)?;
            if self.tables.potential_level(user.xp) <= user.level {
                return Err(Error::NotEnoughXp);
            }

            let mut skill = users::get_skill(conn, user_id, activity_type)?.unwrap_or(Skill {
                id: Uuid::new_v4(),
                user_id,
                activity_type,
                level: 0,
            });
            if skill.is_maxed() {
                return Err(Error::SkillMaxed(activity_type));
            }
            skill.level += 1;
            users::upsert_skill(conn, &skill)?;

            user.level += 1;
            let skills = users::get_skills(conn, user_id)?;
            if skill.is_maxed() {
                user.special_title = self.title_for(&skills);
            }
            users::update_progression(conn, user_id, user.level, user.special_title.as_deref())?;

            Ok((UserProfile { user, skills }, Effects::default()))
        });

        let profile = self.settle(result, &[]).await?;
        info!(
            %user_id,
            level = profile.user.level,
            skill = %activity_type,
            "Leveled up"
        );
        Ok(profile)
    }

    fn title_for(&self, skills: &[Skill]) -> Option<String> {
        let mut maxed: Vec<ActivityType> = skills
            .iter()
            .filter(|skill| skill.is_maxed())
            .map(|skill| skill.activity_type)
            .collect();
        maxed.sort();
        self.tables
            .special_title(maxed.first().copied(), maxed.get(1).copied())
            .map(str::to_string)
    }

    pub fn get_user(&self, user_id: Uuid) -> Result<UserProfile> {
        self.db.read(|conn| profile(conn, user_id))
    }

    pub fn level_progress(&self, user_id: Uuid) -> Result<LevelProgress> {
        let user = self.db.read(|conn| load_user(conn, user_id))?;
        Ok(LevelProgress {
            xp: user.xp,
            level: user.level,
            potential_level: self.tables.potential_level(user.xp),
            next_level_xp: self.tables.level_threshold(user.level + 1),
        })
    }

    pub fn get_activity(&self, activity_id: Uuid) -> Result<ActivityWithMedia> {
        self.db.read(|conn| {
            let activity = load_activity(conn, activity_id)?;
            let media = media::list_media(conn, MediaOwner::Activity, activity.id)?;
            Ok(ActivityWithMedia { activity, media })
        })
    }
}

fn profile(conn: &Connection, user_id: Uuid) -> Result<UserProfile> {
    let user = load_user(conn, user_id)?;
    let skills = users::get_skills(conn, user_id)?;
    Ok(UserProfile { user, skills })
}
