//! Signed multipart uploads to the Cloudinary upload API.
//!
//! # Design
//! - Requests are signed with SHA-256 over the alphabetically sorted,
//!   `&`-joined upload parameters followed by the API secret.
//! - `file`, `api_key`, and the signature fields themselves are never signed.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use restkit_config::MediaSettings;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::{StorageError, StorageResult};
use crate::uploader::{MediaUploader, StoredMedia, UploadFile};

/// [`MediaUploader`] backed by the Cloudinary upload API.
#[derive(Debug, Clone)]
pub struct CloudinaryUploader {
    client: Client,
    settings: MediaSettings,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorMessage,
}

#[derive(Deserialize)]
struct ErrorMessage {
    message: String,
}

impl CloudinaryUploader {
    /// Uploader using a default HTTP client.
    #[must_use]
    pub fn new(settings: MediaSettings) -> Self {
        Self::with_client(Client::new(), settings)
    }

    /// Uploader sharing an existing HTTP client.
    #[must_use]
    pub const fn with_client(client: Client, settings: MediaSettings) -> Self {
        Self { client, settings }
    }

    /// Account name the uploader writes to.
    #[must_use]
    pub fn cloud_name(&self) -> &str {
        &self.settings.cloud_name
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}/image/upload",
            self.settings.api_base_url.trim_end_matches('/'),
            self.settings.cloud_name
        )
    }
}

#[async_trait]
impl MediaUploader for CloudinaryUploader {
    async fn upload(&self, public_id: &str, file: UploadFile) -> StorageResult<StoredMedia> {
        let timestamp = Utc::now().timestamp().to_string();
        let params = [
            ("overwrite", "true"),
            ("public_id", public_id),
            ("timestamp", timestamp.as_str()),
        ];
        let signature = sign(&params, &self.settings.api_secret);

        let mut form = Form::new().part(
            "file",
            Part::bytes(file.content).file_name(file.file_name),
        );
        for (name, value) in params {
            form = form.text(name, value.to_string());
        }
        let form = form
            .text("api_key", self.settings.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let response = self
            .client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await
            .map_err(|source| StorageError::Upload { source })?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|source| StorageError::Upload { source })?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .map(|body| body.error.message);
            return Err(StorageError::UploadRejected {
                status: status.as_u16(),
                message,
            });
        }
        serde_json::from_slice(&body).map_err(|source| StorageError::InvalidResponse { source })
    }
}

fn sign(params: &[(&str, &str)], secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_unstable_by_key(|(name, _)| *name);
    let joined = sorted
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}
