//! HTTP client for the external media service.
//!
//! `POST {base}/upload` takes the raw file body and answers with
//! `{ "public_id": ..., "url": ... }`. `DELETE {base}/{public_id}` removes it.

use async_trait::async_trait;
use deedquest_core::{Error, MediaService, MediaUpload, Result, StoredMedia};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};

pub struct HttpMediaService {
    client: Client,
    base: Url,
}

impl HttpMediaService {
    pub fn new(base: &str) -> anyhow::Result<Self> {
        let mut base = Url::parse(base)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client: Client::new(),
            base,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| Error::Media(format!("Invalid media path {}: {}", path, e)))
    }
}

fn media_error(e: reqwest::Error) -> Error {
    Error::Media(e.to_string())
}

#[async_trait]
impl MediaService for HttpMediaService {
    async fn upload(&self, file: MediaUpload) -> Result<StoredMedia> {
        let content_type = file
            .content_type
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let stored = self
            .client
            .post(self.endpoint("upload")?)
            .query(&[("file_name", file.file_name.as_str())])
            .header(CONTENT_TYPE, content_type)
            .body(file.bytes)
            .send()
            .await
            .map_err(media_error)?
            .error_for_status()
            .map_err(media_error)?
            .json::<StoredMedia>()
            .await
            .map_err(media_error)?;

        tracing::debug!(public_id = %stored.public_id, "Uploaded media");
        Ok(stored)
    }

    async fn delete(&self, public_id: &str) -> Result<()> {
        self.client
            .delete(self.endpoint(public_id)?)
            .send()
            .await
            .map_err(media_error)?
            .error_for_status()
            .map_err(media_error)?;
        Ok(())
    }
}
