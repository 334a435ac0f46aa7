//! `MediaStorage`: the facade request handlers use to persist pictures.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Client;
use restkit_config::MediaSettings;
use restkit_telemetry::log_execution_time;
use tracing::info;
use url::Url;

use crate::error::{StorageError, StorageResult};
use crate::keys::{Delivery, object_key};
use crate::uploader::{MediaUploader, StoredMedia, UploadFile};

/// Where the bytes of a picture come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// Content already in memory.
    Bytes(UploadFile),
    /// A file on local disk.
    File(PathBuf),
}

/// Saves pictures under deterministic keys and builds their delivery URLs.
#[derive(Clone)]
pub struct MediaStorage {
    uploader: Arc<dyn MediaUploader>,
    delivery: Delivery,
    client: Client,
    max_download_bytes: usize,
}

impl MediaStorage {
    /// Storage writing through `uploader` and serving from `delivery`.
    #[must_use]
    pub fn new(uploader: Arc<dyn MediaUploader>, delivery: Delivery) -> Self {
        Self::with_client(uploader, delivery, Client::new())
    }

    /// Same as [`MediaStorage::new`] with a shared HTTP client for URL fetches.
    #[must_use]
    pub fn with_client(uploader: Arc<dyn MediaUploader>, delivery: Delivery, client: Client) -> Self {
        Self {
            uploader,
            delivery,
            client,
            max_download_bytes: MediaSettings::DEFAULT_MAX_DOWNLOAD_BYTES,
        }
    }

    /// Cap pictures fetched from a URL at `bytes`.
    #[must_use]
    pub const fn with_download_limit(mut self, bytes: usize) -> Self {
        self.max_download_bytes = bytes;
        self
    }

    /// Delivery URL builder in use.
    #[must_use]
    pub const fn delivery(&self) -> &Delivery {
        &self.delivery
    }

    /// Store `source` as `{directory}/{key}`, replacing any previous object.
    ///
    /// # Errors
    ///
    /// Returns an error when the source cannot be read or the upload fails.
    pub async fn save_picture_for_object(
        &self,
        key: &str,
        source: MediaSource,
        directory: Option<&str>,
    ) -> StorageResult<StoredMedia> {
        info!(directory = directory.unwrap_or_default(), key, "saving picture");
        let public_id = object_key(directory, key);
        let file = read_source(source).await?;
        log_execution_time("save_file", self.uploader.upload(&public_id, file)).await
    }

    /// Fetch `url` and store it as `{directory}/{key}`.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL is invalid, the fetch fails, or the
    /// upload fails.
    pub async fn save_picture_url_for_object(
        &self,
        key: &str,
        url: &str,
        directory: Option<&str>,
    ) -> StorageResult<StoredMedia> {
        info!(url, directory = directory.unwrap_or_default(), key, "saving picture from url");
        let public_id = object_key(directory, key);
        log_execution_time("save_file_from_url", async {
            let file = self.download(url).await?;
            log_execution_time("save_file", self.uploader.upload(&public_id, file)).await
        })
        .await
    }

    /// See [`Delivery::download_url`].
    #[must_use]
    pub fn download_url(
        &self,
        public_id: &str,
        version: Option<i64>,
        width: Option<u32>,
        height: Option<u32>,
        now: DateTime<Utc>,
    ) -> String {
        self.delivery
            .download_url(public_id, version, width, height, now)
    }

    async fn download(&self, raw: &str) -> StorageResult<UploadFile> {
        let url = Url::parse(raw)
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .ok_or_else(|| StorageError::InvalidUrl {
                value: raw.to_string(),
            })?;
        let file_name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .unwrap_or("download")
            .to_string();

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| StorageError::Download {
                url: raw.to_string(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::DownloadStatus {
                url: raw.to_string(),
                status: status.as_u16(),
            });
        }
        let limit = self.max_download_bytes;
        let too_large = || StorageError::DownloadTooLarge {
            url: raw.to_string(),
            limit,
        };
        if response
            .content_length()
            .is_some_and(|length| length > u64::try_from(limit).unwrap_or(u64::MAX))
        {
            return Err(too_large());
        }

        let mut content = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|source| StorageError::Download {
                url: raw.to_string(),
                source,
            })?
        {
            if content.len() + chunk.len() > limit {
                return Err(too_large());
            }
            content.extend_from_slice(&chunk);
        }
        Ok(UploadFile { file_name, content })
    }
}

async fn read_source(source: MediaSource) -> StorageResult<UploadFile> {
    match source {
        MediaSource::Bytes(file) => Ok(file),
        MediaSource::File(path) => {
            let content = tokio::fs::read(&path)
                .await
                .map_err(|source| StorageError::ReadSource {
                    path: path.clone(),
                    source,
                })?;
            let file_name = path
                .file_name()
                .map_or_else(|| "upload".to_string(), |name| name.to_string_lossy().into_owned());
            Ok(UploadFile { file_name, content })
        }
    }
}
