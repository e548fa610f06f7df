//! Media storage collaborator.
//!
//! Uploads return a public id and URL. Deletes are best-effort: the engine
//! logs failures and moves on.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// A file handed to the engine for upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl MediaUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }
}

/// Where an uploaded file ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMedia {
    pub public_id: String,
    pub url: String,
}

#[async_trait]
pub trait MediaService: Send + Sync {
    async fn upload(&self, file: MediaUpload) -> Result<StoredMedia>;

    async fn delete(&self, public_id: &str) -> Result<()>;
}

/// Keeps uploads in memory. Used by tests and local runs without a media backend.
#[derive(Debug, Default)]
pub struct InMemoryMediaService {
    files: Mutex<HashMap<String, MediaUpload>>,
}

impl InMemoryMediaService {
    pub fn contains(&self, public_id: &str) -> bool {
        self.files
            .lock()
            .map(|files| files.contains_key(public_id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.files.lock().map(|files| files.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MediaService for InMemoryMediaService {
    async fn upload(&self, file: MediaUpload) -> Result<StoredMedia> {
        if file.bytes.is_empty() {
            return Err(Error::Media(format!("{} is empty", file.file_name)));
        }

        let public_id = Uuid::new_v4().simple().to_string();
        let url = format!("memory://media/{}/{}", public_id, file.file_name);
        self.files
            .lock()
            .map_err(|e| Error::Media(format!("Lock poisoned: {}", e)))?
            .insert(public_id.clone(), file);

        Ok(StoredMedia { public_id, url })
    }

    async fn delete(&self, public_id: &str) -> Result<()> {
        let removed = self
            .files
            .lock()
            .map_err(|e| Error::Media(format!("Lock poisoned: {}", e)))?
            .remove(public_id);

        match removed {
            Some(_) => Ok(()),
            None => Err(Error::Media(format!("Unknown media {}", public_id))),
        }
    }
}
