use chrono::{DateTime, Duration, Utc};
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
    Activity, ActivityType, Attendance, AttendeeReward, HappeningSettlement, Media, MediaOwner,
};
use crate::notify::NotificationKind;
use crate::rewards::scale;

/// Days after the end of a happening during which it can be completed.
pub const COMPLETION_WINDOW_DAYS: i64 = 7;

impl Engine {
    /// Registers (`attend = true`) or withdraws the caller's intent to attend.
    ///
    /// Returns the new attendance, or `None` after withdrawing.
    #[instrument(skip(self))]
    pub async fn attend_happening(
        &self,
        activity_id: Uuid,
        user_id: Uuid,
        attend: bool,
    ) -> Result<Option<Attendance>> {
        let now = self.now();

        let result = self.db.transaction(|conn| {
            let activity = load_activity(conn, activity_id)?;
            require_type(&activity, ActivityType::Happening)?;
            if activity.has_ended(now) {
                return Err(Error::HappeningEnded);
            }
            require_not_creator(&activity, user_id)?;
            load_user(conn, user_id)?;

            let attendance = match (attend, interactions::find_attendance(conn, user_id, activity_id)?) {
                (true, Some(_)) | (false, None) => return Err(Error::AlreadyReacted),
                (true, None) => {
                    let attendance = Attendance {
                        id: Uuid::new_v4(),
                        user_id,
                        activity_id,
                        confirmed: false,
                        created_at: now,
                    };
                    interactions::insert_attendance(conn, &attendance)?;
                    Some(attendance)
                }
                (false, Some(existing)) => {
                    interactions::delete_attendance(conn, existing.id)?;
                    None
                }
            };

            Ok((attendance, Effects::default()))
        });

        let attendance = self.settle(result, &[]).await?;
        info!(%activity_id, %user_id, attend, "Updated happening attendance");
        Ok(attendance)
    }

    /// Confirms the caller was at the happening, attending implicitly if needed.
    #[instrument(skip(self))]
    pub async fn confirm_attendance(&self, activity_id: Uuid, user_id: Uuid) -> Result<Attendance> {
        let now = self.now();

        let result = self.db.transaction(|conn| {
            let activity = load_activity(conn, activity_id)?;
            require_type(&activity, ActivityType::Happening)?;
            if activity.has_ended(now) {
                return Err(Error::HappeningEnded);
            }
            if !activity.has_started(now) {
                return Err(Error::HappeningNotStarted);
            }
            require_not_creator(&activity, user_id)?;
            load_user(conn, user_id)?;

            let attendance = match interactions::find_attendance(conn, user_id, activity_id)? {
                Some(existing) if existing.confirmed => return Err(Error::AlreadyReacted),
                Some(mut existing) => {
                    interactions::confirm_attendance(conn, existing.id)?;
                    existing.confirmed = true;
                    existing
                }
                None => {
                    let attendance = Attendance {
                        id: Uuid::new_v4(),
                        user_id,
                        activity_id,
                        confirmed: true,
                        created_at: now,
                    };
                    interactions::insert_attendance(conn, &attendance)?;
                    attendance
                }
            };

            Ok((attendance, Effects::default()))
        });

        let attendance = self.settle(result, &[]).await?;
        info!(%activity_id, %user_id, "Confirmed attendance");
        Ok(attendance)
    }

    /// Stages completion photos for moderation. Creator only, within
    /// [`COMPLETION_WINDOW_DAYS`] after the happening ended.
    #[instrument(skip(self, files))]
    pub async fn complete_happening(
        &self,
        activity_id: Uuid,
        user_id: Uuid,
        files: Vec<MediaUpload>,
    ) -> Result<Vec<Media>> {
        if files.is_empty() {
            return Err(Error::Invalid("completion needs at least one photo".into()));
        }
        let now = self.now();

        self.db
            .read(|conn| completable_happening(conn, activity_id, user_id, now).map(drop))?;

        let uploaded = self.upload_all(files, UploadPolicy::AllOrNothing).await?;

        let result = self.db.transaction(|conn| {
            let activity = completable_happening(conn, activity_id, user_id, now)?;
            let staged = attach_media(
                conn,
                MediaOwner::HappeningCompletion,
                activity.id,
                &uploaded,
                now,
            )?;
            Ok((staged, Effects::default()))
        });

        let staged = self.settle(result, &uploaded).await?;
        info!(%activity_id, photos = staged.len(), "Submitted happening completion");
        Ok(staged)
    }

    /// Settles a completed happening.
    ///
    /// On approval the staged photos go public, every confirmed attendee gets
    /// the attendance reward scaled by their own happening skill, unconfirmed
    /// attendances are dropped, and the creator earns the attendance reward
    /// per confirmed attendee scaled by their skill. On rejection the staged
    /// photos are deleted and the creator may complete again.
    #[instrument(skip(self))]
    pub async fn approve_happening_completion(
        &self,
        activity_id: Uuid,
        approve: bool,
    ) -> Result<HappeningSettlement> {
        let result = self.db.transaction(|conn| {
            let mut activity = load_activity(conn, activity_id)?;
            require_type(&activity, ActivityType::Happening)?;
            if activity.xp_reward.is_some() {
                return Err(Error::AlreadyResolved);
            }
            if media::list_media(conn, MediaOwner::HappeningCompletion, activity.id)?.is_empty() {
                return Err(Error::NotCompleted);
            }
            let creator = load_user(conn, activity.creator_id)?;
            let mut effects = Effects::default();

            let mut settlement = HappeningSettlement {
                activity_id,
                approved: approve,
                attendee_rewards: Vec::new(),
                creator_reward: 0,
                removed_attendances: 0,
            };

            if approve {
                media::reassign_media(
                    conn,
                    (MediaOwner::HappeningCompletion, activity.id),
                    (MediaOwner::Activity, activity.id),
                )?;

                let base = self.tables.happening_attendance_xp();
                for attendance in interactions::list_attendances(conn, activity.id)? {
                    if !attendance.confirmed {
                        interactions::delete_attendance(conn, attendance.id)?;
                        settlement.removed_attendances += 1;
                        continue;
                    }
                    let skill =
                        users::skill_level(conn, attendance.user_id, ActivityType::Happening)?;
                    let xp = scale(base, self.tables.xp_multiplier(skill));
                    users::add_xp(conn, attendance.user_id, xp)?;
                    settlement.attendee_rewards.push(AttendeeReward {
                        user_id: attendance.user_id,
                        xp,
                    });
                }

                let creator_skill =
                    users::skill_level(conn, creator.id, ActivityType::Happening)?;
                let attendees = settlement.attendee_rewards.len() as i64;
                settlement.creator_reward =
                    scale(base * attendees, self.tables.xp_multiplier(creator_skill));
                users::add_xp(conn, creator.id, settlement.creator_reward)?;

                activity.xp_reward = Some(settlement.creator_reward);
                activities::update_activity(conn, &activity)?;

                effects.notify(
                    NotificationKind::HappeningCompletionApproved,
                    &creator,
                    activity.id,
                    &activity.title,
                );
            } else {
                let stale = media::take_media(conn, MediaOwner::HappeningCompletion, activity.id)?;
                effects.delete_media(stale);
                effects.notify(
                    NotificationKind::HappeningCompletionRejected,
                    &creator,
                    activity.id,
                    &activity.title,
                );
            }

            Ok((settlement, effects))
        });

        let settlement = self.settle(result, &[]).await?;
        info!(
            %activity_id,
            approve,
            attendees = settlement.attendee_rewards.len(),
            creator_reward = settlement.creator_reward,
            "Settled happening completion"
        );
        Ok(settlement)
    }

    pub fn list_attendances(&self, activity_id: Uuid) -> Result<Vec<Attendance>> {
        self.db.read(|conn| {
            let activity = load_activity(conn, activity_id)?;
            require_type(&activity, ActivityType::Happening)?;
            interactions::list_attendances(conn, activity_id)
        })
    }
}

/// A happening `user_id` may submit completion photos for right now.
fn completable_happening(
    conn: &Connection,
    activity_id: Uuid,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Activity> {
    let activity = load_activity(conn, activity_id)?;
    require_type(&activity, ActivityType::Happening)?;
    if activity.creator_id != user_id {
        return Err(Error::Unauthorized);
    }
    if activity.xp_reward.is_some() {
        return Err(Error::AlreadyResolved);
    }
    let end = activity.end_date.ok_or(Error::HappeningNotEnded)?;
    if now <= end {
        return Err(Error::HappeningNotEnded);
    }
    if now > end + Duration::days(COMPLETION_WINDOW_DAYS) {
        return Err(Error::CompletionWindowClosed);
    }
    if !media::list_media(conn, MediaOwner::HappeningCompletion, activity.id)?.is_empty() {
        return Err(Error::AlreadyCompleted);
    }
    Ok(activity)
}
