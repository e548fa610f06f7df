#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use deedquest_core::clock::ManualClock;
use deedquest_core::db::users;
use deedquest_core::models::*;
use deedquest_core::{
    Database, Engine, Error, InMemoryMediaService, MediaService, MediaUpload, Notification,
    NotificationKind, Notifier, RewardTables, StoredMedia,
};

/// Records notifications instead of sending them. When `failing` is set it
/// still records each attempt but reports a delivery error.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    pub failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.sent.lock().unwrap().iter().map(|n| n.kind).collect()
    }

    pub fn sent_to(&self, email: &str) -> Vec<NotificationKind> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.recipient_email == email)
            .map(|n| n.kind)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) -> deedquest_core::Result<()> {
        let recipient = notification.recipient_email.clone();
        self.sent.lock().unwrap().push(notification);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Invalid(format!("mailbox {} unavailable", recipient)));
        }
        Ok(())
    }
}

/// In-memory media that refuses files whose name starts with "broken", and
/// refuses every delete while `failing_deletes` is set.
#[derive(Default)]
pub struct FlakyMedia {
    pub inner: InMemoryMediaService,
    pub failing_deletes: AtomicBool,
}

#[async_trait]
impl MediaService for FlakyMedia {
    async fn upload(&self, file: MediaUpload) -> deedquest_core::Result<StoredMedia> {
        if file.file_name.starts_with("broken") {
            return Err(Error::Media(format!("cannot store {}", file.file_name)));
        }
        self.inner.upload(file).await
    }

    async fn delete(&self, public_id: &str) -> deedquest_core::Result<()> {
        if self.failing_deletes.load(Ordering::SeqCst) {
            return Err(Error::Media(format!("cannot delete {}", public_id)));
        }
        self.inner.delete(public_id).await
    }
}

pub struct Harness {
    pub engine: Engine,
    pub clock: Arc<ManualClock>,
    pub media: Arc<FlakyMedia>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn start() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

pub fn harness() -> Harness {
    let db = Database::open_memory().expect("Failed to create test database");
    db.migrate().expect("Failed to migrate test database");

    let clock = Arc::new(ManualClock::new(start()));
    let media = Arc::new(FlakyMedia::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = Engine::new(
        db,
        Arc::new(RewardTables::default()),
        media.clone(),
        notifier.clone(),
    )
    .with_clock(clock.clone());

    Harness {
        engine,
        clock,
        media,
        notifier,
    }
}

impl Harness {
    /// Makes every media delete and every notification fail from now on.
    pub fn break_collaborators(&self) {
        self.media.failing_deletes.store(true, Ordering::SeqCst);
        self.notifier.failing.store(true, Ordering::SeqCst);
    }

    /// Media rows the store still tracks, whatever their owner.
    pub fn media_rows(&self) -> i64 {
        self.engine
            .db()
            .read(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM media", [], |row| row.get(0))?))
            .unwrap()
    }

    pub fn user(&self, email: &str) -> Uuid {
        let id = Uuid::new_v4();
        tokio_test::block_on(self.engine.register_user(RegisterUserInput {
            id,
            email: email.to_string(),
        }))
        .expect("Failed to register user");
        id
    }

    pub fn xp(&self, user_id: Uuid) -> i64 {
        self.engine.get_user(user_id).unwrap().user.xp
    }

    pub fn give_xp(&self, user_id: Uuid, xp: i64) {
        self.engine
            .db()
            .transaction(|conn| users::add_xp(conn, user_id, xp))
            .unwrap();
    }

    pub fn set_skill(&self, user_id: Uuid, activity_type: ActivityType, level: u8) {
        let skill = Skill {
            id: Uuid::new_v4(),
            user_id,
            activity_type,
            level,
        };
        self.engine
            .db()
            .transaction(|conn| users::upsert_skill(conn, &skill))
            .unwrap();
    }

    pub fn submit(&self, creator: Uuid, input: CreatePendingActivityInput) -> PendingActivity {
        tokio_test::block_on(self.engine.create_pending_activity(creator, input, vec![]))
            .expect("Failed to submit activity")
    }

    pub fn approve(&self, pending: &PendingActivity) -> Activity {
        match tokio_test::block_on(self.engine.resolve_pending_activity(pending.id, true)) {
            Ok(Resolution::Approved { activity }) => activity,
            other => panic!("expected approval, got {:?}", other),
        }
    }

    pub fn approved(&self, creator: Uuid, activity_type: ActivityType) -> Activity {
        let pending = self.submit(creator, input_for(activity_type));
        self.approve(&pending)
    }
}

/// A valid submission of the given type, relative to [`start`].
pub fn input_for(activity_type: ActivityType) -> CreatePendingActivityInput {
    let mut input = CreatePendingActivityInput::new(activity_type, format!("A {}", activity_type));
    match activity_type {
        ActivityType::Puzzle => input.answer = Some("A Shadow".into()),
        ActivityType::Happening => {
            input.start_date = Some(start() + Duration::days(1));
            input.end_date = Some(start() + Duration::days(1) + Duration::hours(4));
        }
        _ => {}
    }
    input
}

pub fn photo(name: &str) -> MediaUpload {
    MediaUpload::new(name, vec![0xFF, 0xD8, 0xFF])
}
