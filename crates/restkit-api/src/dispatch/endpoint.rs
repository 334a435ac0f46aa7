//! Endpoint definitions: handlers plus the schema each method is validated with.
//!
//! # Design
//! - Bindings resolve once in [`EndpointBuilder::build`]: a method-specific
//!   binding wins, then the endpoint default schema, then no validation for
//!   GET only. POST and PUT without a schema fail at definition time.
//! - A handler names its payload type (`Validated<T>` or `Unvalidated`), so a
//!   handler cannot be wired to a schema whose output it does not accept.
//! - Validation runs exactly once per request, before the handler.

use std::any::type_name;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use axum::routing::MethodRouter;
use restkit_errors::ApiException;
use restkit_telemetry::{current_request_id, with_request_context};
use serde_json::{Map, Value};
use tracing::debug;

use crate::dispatch::payload::{ParsedPayload, Payload, SchemaBinding, SchemaRef, Unvalidated};
use crate::dispatch::request::{EndpointRequest, Identity, Method, query_params};
use crate::dispatch::validation::Validate;
use crate::error::{DefinitionError, HandlerError};

type HandlerFuture = Pin<Box<dyn Future<Output = Result<Response, HandlerError>> + Send>>;
type ErasedHandler = Arc<dyn Fn(EndpointRequest, Option<ParsedPayload>) -> HandlerFuture + Send + Sync>;

/// Name of the endpoint that produced a response, read by access logging.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ViewName(pub(crate) &'static str);

struct HandlerSlot {
    method: Method,
    payload: Option<SchemaRef>,
    payload_name: &'static str,
    call: ErasedHandler,
}

/// Collects handlers and schema bindings for one endpoint.
pub struct EndpointBuilder {
    name: &'static str,
    default_schema: Option<SchemaRef>,
    bindings: Vec<(Method, SchemaBinding)>,
    handlers: Vec<HandlerSlot>,
}

impl EndpointBuilder {
    /// Schema used by every method without its own binding.
    #[must_use]
    pub fn default_schema<S: Validate>(mut self) -> Self {
        self.default_schema = Some(SchemaRef::of::<S>());
        self
    }

    /// Validate `method` with schema `S`.
    #[must_use]
    pub fn schema_for<S: Validate>(mut self, method: Method) -> Self {
        self.bindings
            .push((method, SchemaBinding::Validate(SchemaRef::of::<S>())));
        self
    }

    /// Run `method` without validation, overriding any default schema.
    #[must_use]
    pub fn no_schema(mut self, method: Method) -> Self {
        self.bindings.push((method, SchemaBinding::Skip));
        self
    }

    /// Register the GET handler.
    #[must_use]
    pub fn get<P, F, Fut, R>(self, handler: F) -> Self
    where
        P: Payload,
        F: Fn(EndpointRequest, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
        R: IntoResponse,
    {
        self.handler(Method::Get, handler)
    }

    /// Register the POST handler.
    #[must_use]
    pub fn post<P, F, Fut, R>(self, handler: F) -> Self
    where
        P: Payload,
        F: Fn(EndpointRequest, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
        R: IntoResponse,
    {
        self.handler(Method::Post, handler)
    }

    /// Register the PUT handler.
    #[must_use]
    pub fn put<P, F, Fut, R>(self, handler: F) -> Self
    where
        P: Payload,
        F: Fn(EndpointRequest, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
        R: IntoResponse,
    {
        self.handler(Method::Put, handler)
    }

    fn handler<P, F, Fut, R>(mut self, method: Method, handler: F) -> Self
    where
        P: Payload,
        F: Fn(EndpointRequest, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
        R: IntoResponse,
    {
        let endpoint = self.name;
        let handler = Arc::new(handler);
        let call: ErasedHandler = Arc::new(
            move |request: EndpointRequest, parsed: Option<ParsedPayload>| -> HandlerFuture {
                let handler = Arc::clone(&handler);
                Box::pin(async move {
                    let payload = P::from_parsed(parsed).ok_or_else(|| {
                        anyhow::anyhow!("payload for {endpoint} {method} did not match its schema")
                    })?;
                    let response = (*handler)(request, payload).await?;
                    Ok(response.into_response())
                })
            },
        );
        self.handlers.push(HandlerSlot {
            method,
            payload: P::schema(),
            payload_name: type_name::<P>(),
            call,
        });
        self
    }

    /// Resolve every binding and freeze the endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError`] when a POST/PUT handler has no schema, a
    /// handler's payload disagrees with its schema, a binding targets a method
    /// without a handler, a method is registered twice, or nothing is registered.
    pub fn build(self) -> Result<Endpoint, DefinitionError> {
        let Self {
            name,
            default_schema,
            bindings,
            handlers,
        } = self;

        if handlers.is_empty() {
            return Err(DefinitionError::NoHandlers { endpoint: name });
        }
        if let Some((method, _)) = bindings
            .iter()
            .find(|(method, _)| !handlers.iter().any(|slot| slot.method == *method))
        {
            return Err(DefinitionError::UnhandledBinding {
                endpoint: name,
                method: *method,
            });
        }

        let mut routes: Vec<Route> = Vec::with_capacity(handlers.len());
        for slot in handlers {
            if routes.iter().any(|route| route.method == slot.method) {
                return Err(DefinitionError::DuplicateHandler {
                    endpoint: name,
                    method: slot.method,
                });
            }
            let binding = bindings
                .iter()
                .rev()
                .find(|(method, _)| *method == slot.method)
                .map(|(_, binding)| *binding);
            let schema = match (binding, default_schema, slot.method) {
                (Some(SchemaBinding::Validate(schema)), _, _) | (None, Some(schema), _) => {
                    Some(schema)
                }
                (Some(SchemaBinding::Skip), _, _) | (None, None, Method::Get) => None,
                (None, None, method) => {
                    return Err(DefinitionError::MissingSchema {
                        endpoint: name,
                        method,
                    });
                }
            };
            if slot.payload != schema {
                return Err(DefinitionError::PayloadMismatch {
                    endpoint: name,
                    method: slot.method,
                    expected: schema.map_or(type_name::<Unvalidated>(), |schema| {
                        schema.name()
                    }),
                    found: slot.payload_name,
                });
            }
            debug!(
                endpoint = name,
                method = %slot.method,
                schema = schema.map_or("none", |schema| schema.name()),
                "endpoint method bound"
            );
            routes.push(Route {
                method: slot.method,
                schema,
                call: slot.call,
            });
        }

        Ok(Endpoint {
            inner: Arc::new(EndpointInner { name, routes }),
        })
    }
}

struct Route {
    method: Method,
    schema: Option<SchemaRef>,
    call: ErasedHandler,
}

struct EndpointInner {
    name: &'static str,
    routes: Vec<Route>,
}

/// A named set of method handlers with resolved schema bindings.
#[derive(Clone)]
pub struct Endpoint {
    inner: Arc<EndpointInner>,
}

impl Endpoint {
    /// Start defining an endpoint; `name` identifies it in access logs.
    #[must_use]
    pub const fn builder(name: &'static str) -> EndpointBuilder {
        EndpointBuilder {
            name,
            default_schema: None,
            bindings: Vec::new(),
            handlers: Vec::new(),
        }
    }

    /// Endpoint name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Methods with a registered handler, in registration order.
    #[must_use]
    pub fn methods(&self) -> Vec<Method> {
        self.inner.routes.iter().map(|route| route.method).collect()
    }

    /// Resolved schema for `method`: `None` when the method is not routed,
    /// `Some(None)` when it runs unvalidated.
    #[must_use]
    pub fn schema(&self, method: Method) -> Option<Option<SchemaRef>> {
        self.route(method).map(|route| route.schema)
    }

    /// Validate the request input for its method and call the handler.
    ///
    /// GET input comes from `request.query`; POST and PUT input is `body`
    /// parsed as JSON, where an empty body reads as an empty object.
    ///
    /// # Errors
    ///
    /// `method_not_allowed` for unrouted methods, `parse_error` for malformed
    /// JSON, `invalid_parameters` with the formatted field failures, or
    /// whatever the handler raises.
    pub async fn dispatch(
        &self,
        request: EndpointRequest,
        body: &[u8],
    ) -> Result<Response, HandlerError> {
        let Some(route) = self.route(request.method) else {
            return Err(ApiException::method_not_allowed(request.method.as_str()).into());
        };
        let parsed = match route.schema {
            None => None,
            Some(schema) => {
                let input = match request.method {
                    Method::Get => Value::Object(request.query.clone()),
                    Method::Post | Method::Put => parse_body(body)?,
                };
                let parsed = schema.parse(&input).map_err(|errors| {
                    ApiException::invalid_parameters(errors.format_errors())
                })?;
                Some(parsed)
            }
        };
        (route.call)(request, parsed).await
    }

    /// Axum method router serving every registered method; other methods
    /// answer with `method_not_allowed`.
    #[must_use]
    pub fn into_method_router<S>(self) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let mut router = MethodRouter::new();
        for method in self.methods() {
            let endpoint = self.clone();
            let handler = move |request: Request<Body>| async move {
                endpoint.serve(method, request).await
            };
            router = match method {
                Method::Get => router.get(handler),
                Method::Post => router.post(handler),
                Method::Put => router.put(handler),
            };
        }
        router.fallback(reject_method)
    }

    fn route(&self, method: Method) -> Option<&Route> {
        self.inner.routes.iter().find(|route| route.method == method)
    }

    async fn serve(&self, method: Method, request: Request<Body>) -> Response {
        let (parts, body) = request.into_parts();
        // The access-log middleware has already enforced the body limit.
        let body = match to_bytes(body, usize::MAX).await {
            Ok(body) => body,
            Err(err) => {
                return HandlerError::from(ApiException::parse_error(format!(
                    "Request body could not be read - {err}"
                )))
                .into_response();
            }
        };
        let request = EndpointRequest {
            method,
            query: query_params(parts.uri.query()),
            identity: parts
                .extensions
                .get::<Identity>()
                .cloned()
                .unwrap_or_default(),
            uri: parts.uri,
            headers: parts.headers,
        };
        let request_id = current_request_id().unwrap_or_default();
        let outcome = with_request_context(request_id, self.name(), self.dispatch(request, &body)).await;
        let mut response = outcome.unwrap_or_else(IntoResponse::into_response);
        response.extensions_mut().insert(ViewName(self.name()));
        response
    }
}

async fn reject_method(method: axum::http::Method) -> Response {
    HandlerError::from(ApiException::method_not_allowed(method.as_str())).into_response()
}

fn parse_body(body: &[u8]) -> Result<Value, ApiException> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(body)
        .map_err(|err| ApiException::parse_error(format!("JSON parse error - {err}")))
}
