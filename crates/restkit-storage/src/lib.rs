#![forbid(unsafe_code)]
#![deny(
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Media storage adapter: deterministic object keys, delivery URLs, and
//! uploads to a Cloudinary-compatible store.
//!
//! Layout: `keys.rs` (key paths and delivery URLs), `uploader.rs` (the
//! `MediaUploader` seam and an in-memory store), `cloudinary.rs` (signed
//! HTTP uploads), `storage.rs` (`MediaStorage` facade), `error.rs`.

pub mod cloudinary;
pub mod error;
pub mod keys;
pub mod storage;
pub mod uploader;

pub use cloudinary::CloudinaryUploader;
pub use error::{StorageError, StorageResult};
pub use keys::{DEFAULT_DELIVERY_BASE_URL, DEFAULT_DIRECTORY, Delivery, download_url, object_key};
pub use storage::{MediaSource, MediaStorage};
pub use uploader::{InMemoryUploader, MediaUploader, StoredMedia, UploadFile};
