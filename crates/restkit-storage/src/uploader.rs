//! The seam between `MediaStorage` and a concrete media store.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::StorageResult;

/// File content handed to an uploader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// File name reported to the store.
    pub file_name: String,
    /// Raw bytes.
    pub content: Vec<u8>,
}

/// Identity of a stored object as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoredMedia {
    /// Key the object is stored under.
    pub public_id: String,
    /// Store-assigned version, used to bust caches in delivery URLs.
    pub version: i64,
}

/// A media store that accepts uploads under a caller-chosen key.
#[async_trait]
pub trait MediaUploader: Send + Sync {
    /// Store `file` under `public_id`, overwriting any existing object.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be reached or rejects the file.
    async fn upload(&self, public_id: &str, file: UploadFile) -> StorageResult<StoredMedia>;
}

/// Process-local store, for tests and for running without credentials.
#[derive(Debug, Default)]
pub struct InMemoryUploader {
    objects: Mutex<HashMap<String, (i64, UploadFile)>>,
}

impl InMemoryUploader {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored content and version for `public_id`.
    #[must_use]
    pub fn get(&self, public_id: &str) -> Option<(i64, UploadFile)> {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(public_id)
            .cloned()
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MediaUploader for InMemoryUploader {
    async fn upload(&self, public_id: &str, file: UploadFile) -> StorageResult<StoredMedia> {
        let mut objects = self.objects.lock().unwrap_or_else(PoisonError::into_inner);
        let version = objects.get(public_id).map_or(1, |(version, _)| version + 1);
        objects.insert(public_id.to_string(), (version, file));
        Ok(StoredMedia {
            public_id: public_id.to_string(),
            version,
        })
    }
}
