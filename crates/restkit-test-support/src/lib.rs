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

//! Shared test helpers used across restkit suites.
//! Layout: logs.rs (captured tracing output), fixtures.rs (env lookups and JSON helpers).

pub mod fixtures;
pub mod logs;

pub use fixtures::{env_lookup, json_object};
pub use logs::CapturedLogs;
