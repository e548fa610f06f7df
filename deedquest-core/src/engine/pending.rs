use rusqlite::Connection;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{attach_media, load_user, Effects, Engine, UploadPolicy};
use crate::db::{activities, media, users};
use crate::error::{Error, Result};
use crate::media::MediaUpload;
use crate::models::{
    Activity, ActivityType, CreatePendingActivityInput, CreationCounter, MediaOwner,
    PendingActivity, Resolution,
};
use crate::notify::NotificationKind;
use crate::rewards::{creation_count_since, window_start, CREATION_WINDOW_DAYS};

impl Engine {
    /// Submits an activity for moderation, consuming one creation slot.
    #[instrument(skip(self, input, files), fields(activity_type = %input.activity_type))]
    pub async fn create_pending_activity(
        &self,
        user_id: Uuid,
        input: CreatePendingActivityInput,
        files: Vec<MediaUpload>,
    ) -> Result<PendingActivity> {
        validate_input(&input)?;
        let now = self.now();

        self.db.read(|conn| {
            load_user(conn, user_id)?;
            self.check_quota(conn, user_id, input.activity_type, now)
        })?;

        let uploaded = self.upload_all(files, UploadPolicy::SkipFailed).await?;

        let result = self.db.transaction(|conn| {
            load_user(conn, user_id)?;
            let purged = users::purge_counters(
                conn,
                user_id,
                window_start(now, CREATION_WINDOW_DAYS),
            )?;
            if purged > 0 {
                debug!(%user_id, purged, "Purged stale creation counters");
            }
            self.check_quota(conn, user_id, input.activity_type, now)?;

            let pending = PendingActivity {
                id: Uuid::new_v4(),
                creator_id: user_id,
                activity_type: input.activity_type,
                title: input.title.trim().to_string(),
                description: input.description.clone(),
                answer: input.answer.clone(),
                location: input.location.clone(),
                start_date: input.start_date,
                end_date: input.end_date,
                created_at: now,
            };
            activities::insert_pending(conn, &pending)?;
            attach_media(conn, MediaOwner::PendingActivity, pending.id, &uploaded, now)?;
            users::insert_counter(
                conn,
                &CreationCounter {
                    id: Uuid::new_v4(),
                    user_id,
                    activity_type: input.activity_type,
                    created_at: now,
                },
            )?;

            Ok((pending, Effects::default()))
        });

        let pending = self.settle(result, &uploaded).await?;
        info!(pending_id = %pending.id, %user_id, "Submitted activity for moderation");
        Ok(pending)
    }

    fn check_quota(
        &self,
        conn: &Connection,
        user_id: Uuid,
        activity_type: ActivityType,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<()> {
        let counters = users::get_counters(conn, user_id, activity_type)?;
        let used = creation_count_since(&counters, activity_type, now, CREATION_WINDOW_DAYS);
        let cap = self
            .tables
            .creation_cap(users::skill_level(conn, user_id, activity_type)?);

        if used >= cap as usize {
            return Err(Error::QuotaExceeded {
                activity_type,
                used,
                cap,
            });
        }
        Ok(())
    }

    /// Approves or disapproves a pending activity. The pending row is gone
    /// afterwards either way.
    #[instrument(skip(self))]
    pub async fn resolve_pending_activity(
        &self,
        pending_id: Uuid,
        approve: bool,
    ) -> Result<Resolution> {
        let now = self.now();

        let result = self.db.transaction(|conn| {
            let pending =
                activities::get_pending(conn, pending_id)?.ok_or(Error::NotFound("Pending activity"))?;
            let creator = load_user(conn, pending.creator_id)?;
            let mut effects = Effects::default();

            let resolution = if approve {
                let activity = Activity::from_pending(&pending, now);
                activities::insert_activity(conn, &activity)?;
                media::reassign_media(
                    conn,
                    (MediaOwner::PendingActivity, pending.id),
                    (MediaOwner::Activity, activity.id),
                )?;
                effects.notify(
                    NotificationKind::ActivityApproved,
                    &creator,
                    activity.id,
                    &activity.title,
                );
                Resolution::Approved { activity }
            } else {
                let stale = media::take_media(conn, MediaOwner::PendingActivity, pending.id)?;
                effects.delete_media(stale);
                effects.notify(
                    NotificationKind::ActivityRejected,
                    &creator,
                    pending.id,
                    &pending.title,
                );
                Resolution::Disapproved {
                    pending_id: pending.id,
                }
            };

            activities::delete_pending(conn, pending.id)?;
            Ok((resolution, effects))
        });

        let resolution = self.settle(result, &[]).await?;
        match &resolution {
            Resolution::Approved { activity } => {
                info!(%pending_id, activity_id = %activity.id, "Approved pending activity")
            }
            Resolution::Disapproved { .. } => info!(%pending_id, "Disapproved pending activity"),
        }
        Ok(resolution)
    }

    /// Moderation queue, oldest first.
    pub fn list_pending_activities(&self) -> Result<Vec<PendingActivity>> {
        self.db.read(activities::list_pending)
    }

    pub fn list_user_pending(&self, user_id: Uuid) -> Result<Vec<PendingActivity>> {
        self.db
            .read(|conn| activities::list_pending_by_creator(conn, user_id))
    }
}

fn validate_input(input: &CreatePendingActivityInput) -> Result<()> {
    if input.title.trim().is_empty() {
        return Err(Error::Invalid("title must not be empty".into()));
    }

    match input.activity_type {
        ActivityType::Puzzle => {
            if input.answer.as_deref().map_or(true, |a| a.trim().is_empty()) {
                return Err(Error::Invalid("a puzzle needs an answer".into()));
            }
        }
        ActivityType::Happening => match (input.start_date, input.end_date) {
            (Some(start), Some(end)) if start < end => {}
            (Some(_), Some(_)) => {
                return Err(Error::Invalid("a happening must start before it ends".into()))
            }
            _ => {
                return Err(Error::Invalid(
                    "a happening needs a start and an end date".into(),
                ))
            }
        },
        _ => {}
    }
    Ok(())
}
