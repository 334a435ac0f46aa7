//! HTTP surface: router, middleware, and built-in endpoints.

/// Access logging and failure translation middleware.
pub(crate) mod access_log;
/// Liveness endpoint.
pub(crate) mod health;
/// Media delivery and upload endpoints.
pub(crate) mod media;
/// Exception catalog endpoint.
pub(crate) mod meta;
/// Router construction and server host.
pub mod router;
/// Failure-to-envelope translation.
pub(crate) mod translate;
