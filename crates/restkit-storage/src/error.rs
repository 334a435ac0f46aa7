//! Error types for media storage operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised while reading, fetching, or uploading media.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A local source file could not be read.
    #[error("failed to read media source")]
    ReadSource {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A remote URL was not a valid absolute http(s) URL.
    #[error("invalid media url")]
    InvalidUrl {
        /// Offending URL.
        value: String,
    },
    /// Fetching a remote source failed.
    #[error("failed to download media")]
    Download {
        /// URL being fetched.
        url: String,
        /// Underlying transport error.
        source: reqwest::Error,
    },
    /// The remote source is larger than the configured download cap.
    #[error("media download too large")]
    DownloadTooLarge {
        /// URL being fetched.
        url: String,
        /// Cap in bytes.
        limit: usize,
    },
    /// The remote source answered with a non-success status.
    #[error("media download rejected")]
    DownloadStatus {
        /// URL being fetched.
        url: String,
        /// HTTP status returned.
        status: u16,
    },
    /// The upload request could not be sent or read.
    #[error("failed to upload media")]
    Upload {
        /// Underlying transport error.
        source: reqwest::Error,
    },
    /// The store rejected the upload.
    #[error("media upload rejected")]
    UploadRejected {
        /// HTTP status returned by the store.
        status: u16,
        /// Error message reported by the store, when present.
        message: Option<String>,
    },
    /// The store's response did not carry `public_id` and `version`.
    #[error("unexpected upload response")]
    InvalidResponse {
        /// Underlying decode error.
        source: serde_json::Error,
    },
}
