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

//! Environment-specific settings for restkit services.
//!
//! Layout: `model.rs` (typed settings), `loader.rs` (defaults, YAML file and
//! environment overrides), `error.rs`.

pub mod error;
pub mod loader;
pub mod model;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    ENV_BIND_ADDR, ENV_CLOUDINARY_API_BASE_URL, ENV_CLOUDINARY_API_KEY,
    ENV_CLOUDINARY_API_SECRET, ENV_CLOUDINARY_CLOUD_NAME, ENV_CONFIG_FILE, ENV_ENVIRONMENT,
    ENV_IDENTITY_HEADER, ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_MAX_BODY_BYTES,
    ENV_MEDIA_MAX_DOWNLOAD_BYTES,
};
pub use model::{AppEnvironment, DEFAULT_MAX_BODY_BYTES, MediaSettings, Settings};
