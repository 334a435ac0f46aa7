//! Error value raised by handlers and the envelope callers receive.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::standard::kinds;

/// Exception raised by request handling code, identified by its kind name.
///
/// The kind's code, status, and default message are resolved by an
/// `ExceptionRegistry` when the exception is translated into a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiException {
    kind: &'static str,
    detail: Option<String>,
}

impl ApiException {
    /// Exception of the given kind using the kind's default message.
    #[must_use]
    pub const fn new(kind: &'static str) -> Self {
        Self { kind, detail: None }
    }

    /// Override the default message.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Kind name.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        self.kind
    }

    /// Message override, if one was supplied.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Request input failed validation.
    #[must_use]
    pub fn invalid_parameters(detail: impl Into<String>) -> Self {
        Self::new(kinds::INVALID_PARAMETERS).with_detail(detail)
    }

    /// Requested object does not exist.
    #[must_use]
    pub const fn object_not_found() -> Self {
        Self::new(kinds::OBJECT_NOT_FOUND)
    }

    /// Credentials were rejected.
    #[must_use]
    pub const fn login_failed() -> Self {
        Self::new(kinds::LOGIN_FAILED)
    }

    /// Generic internal failure.
    #[must_use]
    pub const fn system_error() -> Self {
        Self::new(kinds::SYSTEM_ERROR)
    }

    /// Fault inside the request-handling framework itself.
    #[must_use]
    pub const fn framework() -> Self {
        Self::new(kinds::FRAMEWORK_EXCEPTION)
    }

    /// A versioned write lost an optimistic concurrency race.
    #[must_use]
    pub const fn concurrency_conflict() -> Self {
        Self::new(kinds::OPTIMISTIC_CONCURRENCY_CONTROL_FAILED)
    }

    /// An upstream HTTP dependency failed.
    #[must_use]
    pub const fn upstream_http() -> Self {
        Self::new(kinds::STUB_HTTP_ERROR)
    }

    /// Request body could not be parsed.
    #[must_use]
    pub fn parse_error(detail: impl Into<String>) -> Self {
        Self::new(kinds::PARSE_ERROR).with_detail(detail)
    }

    /// Request carried no usable credentials.
    #[must_use]
    pub const fn not_authenticated() -> Self {
        Self::new(kinds::NOT_AUTHENTICATED)
    }

    /// No route matched the request path.
    #[must_use]
    pub const fn not_found() -> Self {
        Self::new(kinds::NOT_FOUND)
    }

    /// The route exists but not for this method.
    #[must_use]
    pub fn method_not_allowed(method: &str) -> Self {
        Self::new(kinds::METHOD_NOT_ALLOWED).with_detail(format!("Method \"{method}\" not allowed."))
    }

    /// Request body exceeded the configured limit.
    #[must_use]
    pub const fn payload_too_large() -> Self {
        Self::new(kinds::PAYLOAD_TOO_LARGE)
    }
}

impl Display for ApiException {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(formatter, "{}: {detail}", self.kind),
            None => formatter.write_str(self.kind),
        }
    }
}

impl Error for ApiException {}

/// Uniform failure body: `{"error_code": ..., "detail": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Resolved numeric code of the failure kind.
    pub error_code: i64,
    /// Human-readable message.
    pub detail: String,
}
