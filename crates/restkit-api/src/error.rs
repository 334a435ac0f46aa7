//! Error types for endpoint definition and request handling.

use std::backtrace::Backtrace;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use restkit_errors::ApiException;
use thiserror::Error;

use crate::dispatch::Method;

/// Failure raised by an endpoint handler.
///
/// Converting into a response only marks it; the translation middleware
/// turns the mark into the `{error_code, detail}` envelope.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Failure belonging to the exception taxonomy.
    #[error(transparent)]
    Api(#[from] ApiException),
    /// Anything else; reported as the fallback system error.
    #[error("{error}")]
    Unexpected {
        /// Underlying failure.
        error: anyhow::Error,
        /// Stack captured where the failure became a handler error.
        stack: Arc<Backtrace>,
    },
}

impl HandlerError {
    /// Unexpected failure carrying a stack captured elsewhere, such as the
    /// frame a panic was raised in.
    #[must_use]
    pub fn unexpected_with_stack(error: anyhow::Error, stack: Backtrace) -> Self {
        Self::Unexpected {
            error,
            stack: Arc::new(stack),
        }
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(error: anyhow::Error) -> Self {
        Self::unexpected_with_stack(error, Backtrace::force_capture())
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response.extensions_mut().insert(Failure(Arc::new(self)));
        response
    }
}

/// Handler failure carried on a response until it is translated.
#[derive(Debug, Clone)]
pub(crate) struct Failure(pub(crate) Arc<HandlerError>);

/// Problems detected while binding schemas to an endpoint's handlers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DefinitionError {
    /// The endpoint registered no handlers.
    #[error("endpoint has no handlers")]
    NoHandlers {
        /// Endpoint name.
        endpoint: &'static str,
    },
    /// Two handlers were registered for one method.
    #[error("duplicate handler for method")]
    DuplicateHandler {
        /// Endpoint name.
        endpoint: &'static str,
        /// Method registered twice.
        method: Method,
    },
    /// A body-carrying method has neither a binding nor a default schema.
    #[error("no schema resolved for method")]
    MissingSchema {
        /// Endpoint name.
        endpoint: &'static str,
        /// Method without a schema.
        method: Method,
    },
    /// The handler's payload type does not match the resolved schema.
    #[error("handler payload does not match the resolved schema")]
    PayloadMismatch {
        /// Endpoint name.
        endpoint: &'static str,
        /// Method whose handler disagrees.
        method: Method,
        /// Payload implied by the binding.
        expected: &'static str,
        /// Payload the handler accepts.
        found: &'static str,
    },
    /// A schema was bound to a method that has no handler.
    #[error("schema bound to a method without a handler")]
    UnhandledBinding {
        /// Endpoint name.
        endpoint: &'static str,
        /// Method carrying the stray binding.
        method: Method,
    },
}
