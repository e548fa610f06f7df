//! Activity lifecycle, review and leveling engine.
//!
//! Each public operation is one unit of work: optional media uploads first,
//! then a single store transaction that validates and mutates, then
//! best-effort side effects (media cleanup, notifications) once the commit
//! has succeeded. A failed transaction discards the uploads it was given.

mod challenge;
mod happening;
mod leveling;
mod pending;
mod puzzle;
mod review;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::warn;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::db::{self, Database};
use crate::error::{Error, Result};
use crate::media::{MediaService, MediaUpload, StoredMedia};
use crate::models::{Activity, ActivityType, Media, MediaOwner, User};
use crate::notify::{Notification, NotificationKind, Notifier};
use crate::rewards::RewardTables;

#[derive(Clone)]
pub struct Engine {
    db: Database,
    tables: Arc<RewardTables>,
    media: Arc<dyn MediaService>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl Engine {
    pub fn new(
        db: Database,
        tables: Arc<RewardTables>,
        media: Arc<dyn MediaService>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            db,
            tables,
            media,
            notifier,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn tables(&self) -> &RewardTables {
        &self.tables
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    async fn upload_all(
        &self,
        files: Vec<MediaUpload>,
        policy: UploadPolicy,
    ) -> Result<Vec<StoredMedia>> {
        let mut stored = Vec::with_capacity(files.len());
        for file in files {
            let file_name = file.file_name.clone();
            match self.media.upload(file).await {
                Ok(media) => stored.push(media),
                Err(e) if policy == UploadPolicy::SkipFailed => {
                    warn!(file = %file_name, error = %e, "Skipping media that failed to upload");
                }
                Err(e) => {
                    self.discard(&stored).await;
                    return Err(e);
                }
            }
        }
        Ok(stored)
    }

    async fn discard(&self, stored: &[StoredMedia]) {
        for media in stored {
            self.delete_media(&media.public_id).await;
        }
    }

    async fn delete_media(&self, public_id: &str) {
        if let Err(e) = self.media.delete(public_id).await {
            warn!(public_id, error = %e, "Failed to delete media");
        }
    }

    /// Runs post-commit effects for a committed result, or discards the
    /// uploads that belonged to a failed one.
    async fn settle<T>(
        &self,
        result: Result<(T, Effects)>,
        uploaded: &[StoredMedia],
    ) -> Result<T> {
        match result {
            Ok((value, effects)) => {
                self.apply(effects).await;
                Ok(value)
            }
            Err(e) => {
                self.discard(uploaded).await;
                Err(e)
            }
        }
    }

    async fn apply(&self, effects: Effects) {
        for public_id in &effects.stale_media {
            self.delete_media(public_id).await;
        }
        for notification in effects.notifications {
            let kind = notification.kind;
            if let Err(e) = self.notifier.notify(notification).await {
                warn!(?kind, error = %e, "Failed to send notification");
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadPolicy {
    /// Drop files that fail and keep going.
    SkipFailed,
    /// Abort the use case on the first failure.
    AllOrNothing,
}

/// Work deferred until after the store commit.
#[derive(Debug, Default)]
struct Effects {
    stale_media: Vec<String>,
    notifications: Vec<Notification>,
}

impl Effects {
    fn delete_media(&mut self, public_ids: impl IntoIterator<Item = String>) {
        self.stale_media.extend(public_ids);
    }

    fn notify(&mut self, kind: NotificationKind, recipient: &User, activity_id: Uuid, title: &str) {
        self.notifications.push(Notification {
            kind,
            recipient_email: recipient.email.clone(),
            activity_id,
            activity_title: title.to_string(),
        });
    }
}

fn load_user(conn: &Connection, id: Uuid) -> Result<User> {
    db::users::get_user(conn, id)?.ok_or(Error::NotFound("User"))
}

fn load_activity(conn: &Connection, id: Uuid) -> Result<Activity> {
    db::activities::get_activity(conn, id)?.ok_or(Error::NotFound("Activity"))
}

fn require_type(activity: &Activity, expected: ActivityType) -> Result<()> {
    if activity.activity_type != expected {
        return Err(Error::WrongActivityType {
            expected,
            actual: activity.activity_type,
        });
    }
    Ok(())
}

/// Rejects users acting on their own activity.
fn require_not_creator(activity: &Activity, user_id: Uuid) -> Result<()> {
    if activity.creator_id == user_id {
        return Err(Error::OwnActivity);
    }
    Ok(())
}

fn attach_media(
    conn: &Connection,
    owner: MediaOwner,
    owner_id: Uuid,
    stored: &[StoredMedia],
    now: DateTime<Utc>,
) -> Result<Vec<Media>> {
    let mut attached = Vec::with_capacity(stored.len());
    for file in stored {
        let media = Media {
            id: Uuid::new_v4(),
            owner,
            owner_id,
            public_id: file.public_id.clone(),
            url: file.url.clone(),
            created_at: now,
        };
        db::media::insert_media(conn, &media)?;
        attached.push(media);
    }
    Ok(attached)
}
