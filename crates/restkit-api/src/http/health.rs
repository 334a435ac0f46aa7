//! Liveness endpoint.

use std::sync::Arc;

use axum::Json;
use restkit_config::AppEnvironment;
use restkit_telemetry::build_sha;
use serde::Serialize;

use crate::dispatch::{Endpoint, EndpointRequest, Unvalidated};
use crate::error::{DefinitionError, HandlerError};
use crate::state::ApiState;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
    pub(crate) environment: AppEnvironment,
    pub(crate) build: &'static str,
}

pub(crate) fn endpoint(state: &Arc<ApiState>) -> Result<Endpoint, DefinitionError> {
    let environment = state.environment();
    Endpoint::builder("health")
        .get(move |_request: EndpointRequest, _payload: Unvalidated| async move {
            Ok::<_, HandlerError>(Json(HealthResponse {
                status: "ok",
                environment,
                build: build_sha(),
            }))
        })
        .build()
}
