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

//! Service bootstrap wiring configuration, telemetry, storage, and the API.
//!
//! Layout: `bootstrap.rs` (boot sequence), `error.rs` (application errors).

/// Boot sequence from settings to a serving HTTP listener.
pub mod bootstrap;
/// Application-level error type.
pub mod error;

pub use bootstrap::{build_server, run_app, run_app_with};
pub use error::{AppError, AppResult};
