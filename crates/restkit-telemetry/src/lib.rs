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

//! Telemetry primitives shared across the restkit workspace.
//!
//! Layout: `init.rs` (subscriber installation), `context.rs` (request context
//! and request-id layers), `access_log.rs` (per-request log line and field
//! truncation), `timing.rs` (execution-time logging), `panic_capture.rs` (panic location
//! and stack capture), `error.rs`.

pub mod access_log;
pub mod context;
pub mod error;
pub mod init;
pub mod panic_capture;
pub mod timing;

pub use access_log::{AccessLogEntry, FIELD_BUDGET_BYTES, PLACEHOLDER, snapshot_body, snapshot_json};
pub use context::{
    GlobalContextGuard, RequestContext, current_request_id, propagate_request_id_layer,
    set_request_id_layer, with_request_context,
};
pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
pub use panic_capture::{
    PanicReport, install_panic_capture, take_current_panic_report, take_task_panic_report,
};
pub use timing::log_execution_time;
