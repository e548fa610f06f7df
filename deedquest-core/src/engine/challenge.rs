use rusqlite::Connection;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    attach_media, load_activity, load_user, require_not_creator, require_type, Effects, Engine,
    UploadPolicy,
};
use crate::db::{activities, interactions, media, users};
use crate::error::{Error, Result};
use crate::media::MediaUpload;
use crate::models::{
    Activity, ActivityType, ChallengeAnswer, ChallengeAnswerWithMedia, ChallengeResolution,
    MediaOwner,
};
use crate::notify::NotificationKind;
use crate::rewards::scale;

impl Engine {
    /// Submits or replaces the caller's answer to a challenge.
    ///
    /// A replaced answer loses its old media and its confirmation, since the
    /// creator confirmed content that no longer exists.
    #[instrument(skip(self, description, files))]
    pub async fn answer_to_challenge(
        &self,
        activity_id: Uuid,
        user_id: Uuid,
        description: &str,
        files: Vec<MediaUpload>,
    ) -> Result<ChallengeAnswerWithMedia> {
        let description = description.trim();
        if description.is_empty() {
            return Err(Error::Invalid("answer description must not be empty".into()));
        }
        let now = self.now();

        self.db
            .read(|conn| open_challenge_for(conn, activity_id, user_id).map(drop))?;

        let uploaded = self.upload_all(files, UploadPolicy::AllOrNothing).await?;

        let result = self.db.transaction(|conn| {
            let activity = open_challenge_for(conn, activity_id, user_id)?;
            let mut effects = Effects::default();

            let answer = match interactions::find_answer(conn, user_id, activity_id)? {
                Some(mut answer) => {
                    let stale = media::take_media(conn, MediaOwner::ChallengeAnswer, answer.id)?;
                    effects.delete_media(stale);
                    answer.description = description.to_string();
                    // Goes beyond a plain overwrite: a rewritten answer needs a fresh pick.
                    answer.confirmed = false;
                    answer.updated_at = now;
                    interactions::update_answer(conn, &answer)?;
                    answer
                }
                None => {
                    let answer = ChallengeAnswer {
                        id: Uuid::new_v4(),
                        user_id,
                        activity_id,
                        description: description.to_string(),
                        confirmed: false,
                        created_at: now,
                        updated_at: now,
                    };
                    interactions::insert_answer(conn, &answer)?;
                    let creator = load_user(conn, activity.creator_id)?;
                    effects.notify(
                        NotificationKind::ChallengeAnswered,
                        &creator,
                        activity.id,
                        &activity.title,
                    );
                    answer
                }
            };

            let media = attach_media(conn, MediaOwner::ChallengeAnswer, answer.id, &uploaded, now)?;
            Ok((ChallengeAnswerWithMedia { answer, media }, effects))
        });

        let answer = self.settle(result, &uploaded).await?;
        info!(%activity_id, %user_id, answer_id = %answer.answer.id, "Answered challenge");
        Ok(answer)
    }

    /// Marks an answer as the creator's pick, un-confirming any previous pick.
    #[instrument(skip(self))]
    pub async fn confirm_challenge_answer(
        &self,
        answer_id: Uuid,
        user_id: Uuid,
    ) -> Result<ChallengeAnswer> {
        let now = self.now();

        let result = self.db.transaction(|conn| {
            let mut answer = load_answer(conn, answer_id)?;
            let activity = load_activity(conn, answer.activity_id)?;
            require_type(&activity, ActivityType::Challenge)?;
            if activity.creator_id != user_id {
                return Err(Error::Unauthorized);
            }
            if activity.xp_reward.is_some() {
                return Err(Error::AlreadyResolved);
            }
            if answer.confirmed {
                return Err(Error::AlreadyConfirmed);
            }

            // Clear the previous pick first so the unique index never sees two.
            for mut other in interactions::list_answers(conn, activity.id)? {
                if other.confirmed && other.id != answer.id {
                    other.confirmed = false;
                    other.updated_at = now;
                    interactions::update_answer(conn, &other)?;
                }
            }

            answer.confirmed = true;
            answer.updated_at = now;
            interactions::update_answer(conn, &answer)?;
            Ok((answer, Effects::default()))
        });

        let answer = self.settle(result, &[]).await?;
        info!(%answer_id, activity_id = %answer.activity_id, "Confirmed challenge answer");
        Ok(answer)
    }

    /// Resolves a challenge in favour of its confirmed answer.
    ///
    /// The reward is the sum of review XP the challenge has collected so far,
    /// scaled by the winner's challenge skill. Losing answers are removed.
    #[instrument(skip(self))]
    pub async fn approve_challenge_answer(&self, answer_id: Uuid) -> Result<ChallengeResolution> {
        let result = self.db.transaction(|conn| {
            let answer = load_answer(conn, answer_id)?;
            if !answer.confirmed {
                return Err(Error::NotConfirmed);
            }
            let mut activity = load_activity(conn, answer.activity_id)?;
            require_type(&activity, ActivityType::Challenge)?;
            if activity.xp_reward.is_some() {
                return Err(Error::AlreadyResolved);
            }
            let creator = load_user(conn, activity.creator_id)?;
            let winner = load_user(conn, answer.user_id)?;
            let mut effects = Effects::default();

            media::reassign_media(
                conn,
                (MediaOwner::ChallengeAnswer, answer.id),
                (MediaOwner::Activity, activity.id),
            )?;
            activity.description = Some(match activity.description.take() {
                Some(existing) if !existing.trim().is_empty() => {
                    format!("{}\n\n{}", existing, answer.description)
                }
                _ => answer.description.clone(),
            });

            let base: i64 = interactions::list_reviews(conn, activity.id)?
                .iter()
                .map(|review| self.tables.review_xp(activity.activity_type, review.review_type))
                .sum();
            let winner_skill = users::skill_level(conn, winner.id, ActivityType::Challenge)?;
            let xp_reward = scale(base, self.tables.xp_multiplier(winner_skill));

            activity.xp_reward = Some(xp_reward);
            activities::update_activity(conn, &activity)?;
            users::add_xp(conn, winner.id, xp_reward)?;

            let mut removed_answers = 0;
            for other in interactions::list_answers(conn, activity.id)? {
                if other.id == answer.id {
                    continue;
                }
                let stale = media::take_media(conn, MediaOwner::ChallengeAnswer, other.id)?;
                effects.delete_media(stale);
                interactions::delete_answer(conn, other.id)?;
                removed_answers += 1;
            }

            effects.notify(
                NotificationKind::ChallengeAnswerApproved,
                &creator,
                activity.id,
                &activity.title,
            );
            effects.notify(
                NotificationKind::ChallengeWon,
                &winner,
                activity.id,
                &activity.title,
            );

            Ok((
                ChallengeResolution {
                    activity,
                    winner_id: winner.id,
                    xp_reward,
                    removed_answers,
                },
                effects,
            ))
        });

        let resolution = self.settle(result, &[]).await?;
        info!(
            %answer_id,
            activity_id = %resolution.activity.id,
            xp_reward = resolution.xp_reward,
            "Resolved challenge"
        );
        Ok(resolution)
    }

    pub fn list_challenge_answers(&self, activity_id: Uuid) -> Result<Vec<ChallengeAnswerWithMedia>> {
        self.db.read(|conn| {
            load_activity(conn, activity_id)?;
            interactions::list_answers(conn, activity_id)?
                .into_iter()
                .map(|answer| {
                    let media = media::list_media(conn, MediaOwner::ChallengeAnswer, answer.id)?;
                    Ok(ChallengeAnswerWithMedia { answer, media })
                })
                .collect()
        })
    }
}

fn load_answer(conn: &Connection, id: Uuid) -> Result<ChallengeAnswer> {
    interactions::get_answer(conn, id)?.ok_or(Error::NotFound("Challenge answer"))
}

/// An unresolved challenge that `user_id` is allowed to answer.
fn open_challenge_for(conn: &Connection, activity_id: Uuid, user_id: Uuid) -> Result<Activity> {
    let activity = load_activity(conn, activity_id)?;
    require_type(&activity, ActivityType::Challenge)?;
    require_not_creator(&activity, user_id)?;
    if activity.xp_reward.is_some() {
        return Err(Error::AlreadyResolved);
    }
    load_user(conn, user_id)?;
    Ok(activity)
}
