//! Single translation point from handler failures to the error envelope.

use std::any::Any;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use restkit_errors::{ApiException, Category, ExceptionRegistry, Translation};
use restkit_telemetry::take_current_panic_report;
use tracing::{error, info, warn};

use crate::error::HandlerError;

/// Convert `failure` into its envelope response, logging it by category.
///
/// Failures outside the taxonomy get the registry fallback; their cause and
/// captured stack are logged but never sent to the caller.
pub(crate) fn translate(registry: &ExceptionRegistry, failure: &HandlerError) -> Response {
    let translation = match failure {
        HandlerError::Api(exception) => registry.translate(exception),
        HandlerError::Unexpected { error, .. } => error.downcast_ref::<ApiException>().map_or_else(
            || registry.fallback_translation(),
            |exception| registry.translate(exception),
        ),
    };
    record(failure, &translation);
    let status =
        StatusCode::from_u16(translation.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(translation.envelope)).into_response()
}

fn record(failure: &HandlerError, translation: &Translation) {
    let error_code = translation.envelope.error_code;
    let detail = translation.envelope.detail.as_str();
    match failure {
        HandlerError::Unexpected { error: cause, stack } if !translation.recognized => {
            error!(error_code, backtrace = ?stack, error = ?cause, "unhandled exception");
        }
        HandlerError::Api(exception) if !translation.recognized => {
            error!(error_code, kind = exception.kind(), "exception kind is not registered");
        }
        HandlerError::Unexpected { error: cause, stack } => match translation.category {
            Category::Business => warn!(error_code, detail, error = ?cause, "business exception"),
            Category::Framework | Category::Root => {
                info!(error_code, detail, error = ?cause, "request rejected");
            }
            Category::System => {
                error!(error_code, detail, backtrace = ?stack, error = ?cause, "system exception");
            }
        },
        HandlerError::Api(exception) => match translation.category {
            Category::Business => warn!(error_code, detail, kind = exception.kind(), "business exception"),
            Category::Framework | Category::Root => {
                info!(error_code, detail, kind = exception.kind(), "request rejected");
            }
            Category::System => error!(error_code, detail, kind = exception.kind(), "system exception"),
        },
    }
}

/// Response for a handler that panicked; translated like any unexpected failure.
///
/// The panic location and stack come from the capture hook when it saw the
/// panic; otherwise the stack is taken here.
pub(crate) fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(ToString::to_string))
        .unwrap_or_else(|| "non-string panic payload".to_string());
    let failure = match take_current_panic_report() {
        Some(report) => {
            let error = anyhow::anyhow!("handler panicked: {message} (at {})", report.location());
            HandlerError::unexpected_with_stack(error, report.into_backtrace())
        }
        None => HandlerError::from(anyhow::anyhow!("handler panicked: {message}")),
    };
    failure.into_response()
}
