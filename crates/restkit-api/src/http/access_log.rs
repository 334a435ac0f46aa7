//! Per-request access logging and failure translation middleware.
//!
//! # Design
//! - Buffers the request body once, enforcing the configured limit, so both
//!   the access log and the endpoint see the same bytes.
//! - Translates any marked handler failure before the response is logged,
//!   so the logged status and body are what the caller receives.

use std::sync::Arc;
use std::time::Instant;

use axum::body::{Body, Bytes, to_bytes};
use axum::extract::{Request, State};
use axum::http::header::{CONTENT_LENGTH, HOST};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use restkit_errors::ApiException;
use restkit_telemetry::{AccessLogEntry, PLACEHOLDER, snapshot_body, snapshot_json, with_request_context};
use tracing::warn;

use crate::dispatch::{Identity, ViewName, query_params};
use crate::error::{Failure, HandlerError};
use crate::http::translate::translate;
use crate::state::ApiState;

const X_REQUEST_ID: &str = "x-request-id";
const UNROUTED_VIEW: &str = "-";

/// Time the request, translate failures, and emit one `ACCESS_LOG` line.
pub(crate) async fn access_log(
    State(state): State<Arc<ApiState>>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let uri = absolute_uri(&request);
    let query = query_params(request.uri().query());
    let identity = Identity::from_headers(request.headers(), state.identity_header());
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let route = request.uri().path().to_string();

    let (mut parts, body) = request.into_parts();
    let (response, data) = match read_body(&parts.headers, body, state.max_body_bytes()).await {
        Ok(bytes) => {
            let data = snapshot_body(&bytes);
            parts.extensions.insert(identity.clone());
            let request = Request::from_parts(parts, Body::from(bytes));
            let response = with_request_context(request_id, route, next.run(request)).await;
            (response, data)
        }
        Err(exception) => (
            HandlerError::from(exception).into_response(),
            PLACEHOLDER.to_string(),
        ),
    };

    let view = response
        .extensions()
        .get::<ViewName>()
        .map_or(UNROUTED_VIEW, |view| view.0);
    let response = match response.extensions().get::<Failure>().cloned() {
        Some(Failure(failure)) => translate(state.registry(), &failure),
        None => response,
    };
    let (response, content) = buffer_response(response).await;

    AccessLogEntry {
        view: view.to_string(),
        uri,
        user: identity.to_string(),
        method,
        duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        query_params: snapshot_json(&query),
        data,
        response_status: response.status().as_u16(),
        response_content: content,
    }
    .emit();
    response
}

async fn read_body(headers: &HeaderMap, body: Body, limit: usize) -> Result<Bytes, ApiException> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());
    if declared.is_some_and(|length| length > limit) {
        return Err(ApiException::payload_too_large());
    }
    to_bytes(body, limit)
        .await
        .map_err(|_| ApiException::payload_too_large())
}

async fn buffer_response(response: Response) -> (Response, String) {
    let (parts, body) = response.into_parts();
    match to_bytes(body, usize::MAX).await {
        Ok(bytes) => {
            let content = snapshot_body(&bytes);
            (Response::from_parts(parts, Body::from(bytes)), content)
        }
        Err(err) => {
            warn!(error = %err, "response body could not be buffered");
            (Response::from_parts(parts, Body::empty()), PLACEHOLDER.to_string())
        }
    }
}

fn absolute_uri(request: &Request) -> String {
    if request.uri().scheme().is_some() {
        return request.uri().to_string();
    }
    let host = request
        .headers()
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    let path = request
        .uri()
        .path_and_query()
        .map_or("/", |path| path.as_str());
    format!("http://{host}{path}")
}
