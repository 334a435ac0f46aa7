//! Context propagation helpers for request and application spans.
//!
//! # Design
//! - Keeps request identifiers and view names in task-local storage so nested
//!   code (validation, background submission) can tag its own log lines.
//! - Provides an application-level span guard so top-level spans carry the
//!   environment and build info.

use std::future::Future;
use std::sync::Arc;

use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::{Span, span::Entered};

use crate::init::build_sha;

/// Guard that keeps the application-level span entered for the lifetime of the process.
pub struct GlobalContextGuard {
    _guard: Entered<'static>,
}

impl GlobalContextGuard {
    /// Enter the application-level tracing span for the lifetime of the guard.
    #[must_use]
    pub fn new(environment: impl Into<String>) -> Self {
        let environment = environment.into();
        let span: &'static Span = Box::leak(Box::new(tracing::info_span!(
            "app",
            environment = %environment,
            build_sha = %build_sha()
        )));
        let guard = span.enter();
        Self { _guard: guard }
    }
}

/// Identity of the request being served, carried across `.await` points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    request_id: Arc<str>,
    view: Arc<str>,
}

tokio::task_local! {
    static ACTIVE_REQUEST_CONTEXT: RequestContext;
}

impl RequestContext {
    /// Context for `request_id` served by `view`.
    #[must_use]
    pub fn new(request_id: impl Into<String>, view: impl Into<String>) -> Self {
        Self {
            request_id: Arc::from(request_id.into()),
            view: Arc::from(view.into()),
        }
    }

    /// Context of the request being served by the current task, if any.
    ///
    /// Spawned tasks do not inherit it; capture it before spawning and
    /// re-enter it with [`RequestContext::scope`].
    #[must_use]
    pub fn current() -> Option<Self> {
        ACTIVE_REQUEST_CONTEXT.try_with(Clone::clone).ok()
    }

    /// Request identifier, empty when the caller sent none.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Name of the view (endpoint) serving the request.
    #[must_use]
    pub fn view(&self) -> &str {
        &self.view
    }

    /// Run `fut` with this context visible to nested code.
    pub async fn scope<Fut>(self, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        ACTIVE_REQUEST_CONTEXT.scope(self, fut).await
    }
}

/// Request identifier of the request being served, if any.
#[must_use]
pub fn current_request_id() -> Option<String> {
    RequestContext::current().map(|ctx| ctx.request_id().to_string())
}

/// Run `fut` inside a fresh request context.
pub async fn with_request_context<Fut, T>(
    request_id: impl Into<String>,
    view: impl Into<String>,
    fut: Fut,
) -> T
where
    Fut: Future<Output = T>,
{
    RequestContext::new(request_id, view).scope(fut).await
}

/// Factory for the `x-request-id` generator layer.
#[must_use]
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Layer that copies the `x-request-id` header onto the response.
#[must_use]
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}
