//! Core library for DeedQuest.
//!
//! This crate provides the domain models, the SQLite entity store, the reward
//! tables and the activity lifecycle / review / leveling engine, independent
//! of any transport layer.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use deedquest_core::{Database, Engine, InMemoryMediaService, LogNotifier, RewardTables};
//!
//! let db = Database::open_default()?;
//! db.migrate()?;
//!
//! let engine = Engine::new(
//!     db,
//!     Arc::new(RewardTables::default()),
//!     Arc::new(InMemoryMediaService::default()),
//!     Arc::new(LogNotifier),
//! );
//! # let _ = engine;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod clock;
pub mod db;
pub mod engine;
pub mod error;
pub mod media;
pub mod models;
pub mod notify;
pub mod rewards;

// Re-export commonly used types at crate root
pub use clock::{Clock, SystemClock};
pub use db::Database;
pub use engine::Engine;
pub use error::{Error, ErrorKind, Result};
pub use media::{InMemoryMediaService, MediaService, MediaUpload, StoredMedia};
pub use notify::{LogNotifier, Notification, NotificationKind, Notifier};
pub use rewards::RewardTables;
