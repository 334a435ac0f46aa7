//! Router construction and server host for the API.

use std::future::{Future, pending};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    Router,
    http::{HeaderName, Method, Request, header::CONTENT_TYPE},
    middleware,
    response::{IntoResponse, Response},
};
use restkit_errors::ApiException;
use restkit_telemetry::build_sha;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::Span;

use crate::dispatch::Endpoint;
use crate::error::HandlerError;
use crate::http::access_log::access_log;
use crate::http::translate::handle_panic;
use crate::http::{health, media, meta};
use crate::state::ApiState;

const HEADER_REQUEST_ID: &str = "x-request-id";

/// Axum router wrapper that hosts the restkit API.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Server exposing the built-in endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in endpoint definition is inconsistent.
    pub fn new(state: ApiState) -> Result<Self> {
        Self::with_endpoints(state, Vec::new())
    }

    /// Server exposing the built-in endpoints plus `endpoints`, each mounted
    /// at its path.
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in endpoint definition is inconsistent.
    pub fn with_endpoints<I>(state: ApiState, endpoints: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'static str, Endpoint)>,
    {
        restkit_telemetry::install_panic_capture();
        let state = Arc::new(state);
        let mut router = Self::builtin_routes(&state)?;
        for (path, endpoint) in endpoints {
            router = router.route(path, endpoint.into_method_router());
        }

        let mut allowed_headers = vec![CONTENT_TYPE, HeaderName::from_static(HEADER_REQUEST_ID)];
        allowed_headers.extend(state.identity_header().cloned());
        let cors_layer = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers(allowed_headers);
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(HEADER_REQUEST_ID)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                tracing::info_span!(
                    "http.request",
                    method = %request.method(),
                    route = %request.uri().path(),
                    request_id = %request_id,
                    build_sha = %build_sha(),
                    status_code = tracing::field::Empty,
                    latency_ms = tracing::field::Empty
                )
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(|response: &Response, latency: Duration, span: &Span| {
                span.record("status_code", response.status().as_u16());
                let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                span.record("latency_ms", latency_ms);
            });
        let layered = ServiceBuilder::new()
            .layer(restkit_telemetry::set_request_id_layer())
            .layer(restkit_telemetry::propagate_request_id_layer())
            .layer(trace_layer)
            .layer(middleware::from_fn_with_state(Arc::clone(&state), access_log))
            .layer(CatchPanicLayer::custom(handle_panic));

        let router = router
            .fallback(not_found)
            .layer(layered)
            .layer(cors_layer)
            .with_state(state);
        Ok(Self { router })
    }

    fn builtin_routes(state: &Arc<ApiState>) -> Result<Router<Arc<ApiState>>> {
        let mut router = Router::new()
            .route("/health", health::endpoint(state)?.into_method_router())
            .route(
                "/_meta/exceptions",
                meta::endpoint(state)?.into_method_router(),
            );
        if let Some(storage) = state.media() {
            router = router
                .route(
                    "/media",
                    media::upload_endpoint(storage.clone(), state.executor().clone())?
                        .into_method_router(),
                )
                .route(
                    "/media/url",
                    media::url_endpoint(storage.clone())?.into_method_router(),
                );
        }
        Ok(router)
    }

    /// Serve HTTP traffic on `addr` until the process exits.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the listener or serving fails.
    pub async fn serve(self, addr: SocketAddr) -> Result<()> {
        self.serve_with_shutdown(addr, pending()).await
    }

    /// Serve HTTP traffic on `addr` until `shutdown` resolves, then drain
    /// in-flight requests.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the listener or serving fails.
    pub async fn serve_with_shutdown<F>(self, addr: SocketAddr, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!("Starting API on {}", addr);
        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }

    /// Consume the server, returning the fully layered router.
    #[must_use]
    pub fn into_router(self) -> Router {
        self.router
    }
}

async fn not_found() -> Response {
    HandlerError::from(ApiException::not_found()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{
        EndpointRequest, FieldErrors, FieldReader, Method as EndpointMethod, Unvalidated,
        Validate, Validated,
    };
    use axum::body::Body;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use restkit_config::Settings;
    use restkit_errors::{ExceptionRegistry, ROOT_CODE};
    use restkit_runtime::BackgroundExecutor;
    use restkit_storage::{Delivery, InMemoryUploader, MediaStorage};
    use restkit_test_support::CapturedLogs;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    #[derive(Debug)]
    struct CreateUser {
        name: String,
    }

    impl Validate for CreateUser {
        fn validate(input: &Value) -> Result<Self, FieldErrors> {
            let mut reader = FieldReader::new(input);
            let name = reader.required_str("name");
            reader.finish(name.map(|name| Self { name }))
        }
    }

    fn users() -> Result<Endpoint> {
        Ok(Endpoint::builder("users")
            .default_schema::<CreateUser>()
            .no_schema(EndpointMethod::Get)
            .get(|request: EndpointRequest, _payload: Unvalidated| async move {
                Ok::<_, HandlerError>(axum::Json(json!({"user": request.identity.to_string()})))
            })
            .post(|_request: EndpointRequest, payload: Validated<CreateUser>| async move {
                Ok::<_, HandlerError>((
                    StatusCode::CREATED,
                    axum::Json(json!({"name": payload.into_inner().name})),
                ))
            })
            .build()?)
    }

    fn failing() -> Result<Endpoint> {
        Ok(Endpoint::builder("failing")
            .get(|_request: EndpointRequest, _payload: Unvalidated| async {
                let cause = anyhow::anyhow!("database exploded").context("loading profile");
                Err::<String, _>(HandlerError::from(cause))
            })
            .build()?)
    }

    fn panicking() -> Result<Endpoint> {
        Ok(Endpoint::builder("panicking")
            .get(|_request: EndpointRequest, _payload: Unvalidated| async {
                if std::hint::black_box(true) {
                    panic!("handler blew up");
                }
                Ok::<_, HandlerError>("unreachable")
            })
            .build()?)
    }

    fn state(settings: &Settings) -> Result<ApiState> {
        ApiState::new(
            settings,
            Arc::new(ExceptionRegistry::standard()?),
            BackgroundExecutor::new(),
        )
    }

    fn app_with(settings: &Settings) -> Result<Router> {
        let server = ApiServer::with_endpoints(
            state(settings)?,
            vec![
                ("/users", users()?),
                ("/failing", failing()?),
                ("/panicking", panicking()?),
            ],
        )?;
        Ok(server.into_router())
    }

    fn app() -> Result<Router> {
        app_with(&Settings::default())
    }

    async fn body_json(response: Response) -> Result<Value> {
        let bytes = response.into_body().collect().await?.to_bytes();
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn post_json(uri: &str, body: &str) -> Result<Request<Body>> {
        Ok(Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))?)
    }

    fn get(uri: &str) -> Result<Request<Body>> {
        Ok(Request::builder().uri(uri).body(Body::empty())?)
    }

    #[tokio::test]
    async fn health_reports_ok_and_echoes_a_request_id() -> Result<()> {
        let response = app()?.oneshot(get("/health")?).await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(HEADER_REQUEST_ID));
        let body = body_json(response).await?;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["environment"], "local");
        Ok(())
    }

    #[tokio::test]
    async fn blank_name_is_rejected_with_invalid_parameters() -> Result<()> {
        let logs = CapturedLogs::new();
        let _guard = logs.install();

        let response = app()?
            .oneshot(post_json("/users", r#"{"name": ""}"#)?)
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await?,
            json!({
                "error_code": 10000,
                "detail": "name: This field may not be blank.",
            })
        );
        assert_eq!(logs.lines_containing("business exception").len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn valid_bodies_reach_the_handler() -> Result<()> {
        let response = app()?
            .oneshot(post_json("/users", r#"{"name": "ada"}"#)?)
            .await?;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await?, json!({"name": "ada"}));
        Ok(())
    }

    #[tokio::test]
    async fn malformed_json_is_a_parse_error() -> Result<()> {
        let response = app()?.oneshot(post_json("/users", "{nope")?).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await?;
        assert_eq!(body["error_code"], json!(ROOT_CODE));
        assert!(
            body["detail"]
                .as_str()
                .is_some_and(|detail| detail.starts_with("JSON parse error"))
        );
        Ok(())
    }

    #[tokio::test]
    async fn unexpected_errors_are_logged_and_hidden() -> Result<()> {
        let logs = CapturedLogs::new();
        let _guard = logs.install();

        let response = app()?.oneshot(get("/failing")?).await?;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await?,
            json!({
                "error_code": 9999,
                "detail": "Internal system error. Please try again later.",
            })
        );
        let contents = logs.contents();
        let error_line = logs.lines_containing("unhandled exception");
        assert_eq!(error_line.len(), 1);
        assert!(error_line[0].contains("ERROR"));
        assert!(error_line[0].contains("backtrace=Backtrace ["));
        assert!(contents.contains("loading profile"));
        assert!(contents.contains("database exploded"));
        Ok(())
    }

    #[tokio::test]
    async fn panics_are_translated_to_the_system_error() -> Result<()> {
        let logs = CapturedLogs::new();
        let _guard = logs.install();

        let response = app()?.oneshot(get("/panicking")?).await?;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await?["error_code"], json!(9999));
        let error_line = logs.lines_containing("handler panicked: handler blew up");
        assert_eq!(error_line.len(), 1);
        assert!(error_line[0].contains("ERROR"));
        assert!(error_line[0].contains("(at "));
        assert!(error_line[0].contains("router.rs"));
        assert!(error_line[0].contains("backtrace=Backtrace ["));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_routes_and_methods_use_framework_kinds() -> Result<()> {
        let response = app()?.oneshot(get("/missing")?).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await?,
            json!({"error_code": ROOT_CODE, "detail": "Not found."})
        );

        let request = Request::builder()
            .method("DELETE")
            .uri("/users")
            .body(Body::empty())?;
        let response = app()?.oneshot(request).await?;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            body_json(response).await?,
            json!({"error_code": ROOT_CODE, "detail": "Method \"DELETE\" not allowed."})
        );
        Ok(())
    }

    #[tokio::test]
    async fn oversized_bodies_are_rejected() -> Result<()> {
        let settings = Settings {
            max_body_bytes: 16,
            ..Settings::default()
        };
        let body = format!(r#"{{"name": "{}"}}"#, "a".repeat(64));
        let response = app_with(&settings)?
            .oneshot(post_json("/users", &body)?)
            .await?;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            body_json(response).await?,
            json!({"error_code": ROOT_CODE, "detail": "Request payload too large."})
        );
        Ok(())
    }

    #[tokio::test]
    async fn each_request_emits_one_access_log_line() -> Result<()> {
        let logs = CapturedLogs::new();
        let _guard = logs.install();
        let settings = Settings {
            identity_header: Some("x-remote-user".into()),
            ..Settings::default()
        };

        let request = Request::builder()
            .uri("/users?page=2")
            .header("x-remote-user", "ada")
            .body(Body::empty())?;
        let response = app_with(&settings)?.oneshot(request).await?;
        assert_eq!(body_json(response).await?, json!({"user": "ada"}));

        let lines = logs.lines_containing("ACCESS_LOG");
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert!(line.contains("view=users"));
        assert!(line.contains("user=ada"));
        assert!(line.contains("method=GET"));
        assert!(line.contains("uri=http://localhost/users?page=2"));
        assert!(line.contains(r#"query_params={"page":"2"}"#));
        assert!(line.contains("response_status=200"));
        Ok(())
    }

    #[tokio::test]
    async fn failed_requests_log_the_translated_response() -> Result<()> {
        let logs = CapturedLogs::new();
        let _guard = logs.install();

        let response = app()?.oneshot(get("/missing")?).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let lines = logs.lines_containing("ACCESS_LOG");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("view=-"));
        assert!(lines[0].contains("user=AnonymousUser"));
        assert!(lines[0].contains("response_status=404"));
        assert!(lines[0].contains(r#""detail":"Not found.""#));
        Ok(())
    }

    #[tokio::test]
    async fn exception_catalog_lists_the_taxonomy() -> Result<()> {
        let response = app()?.oneshot(get("/_meta/exceptions")?).await?;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await?;
        let kinds = body["kinds"]
            .as_array()
            .ok_or_else(|| anyhow::anyhow!("kinds missing"))?;
        assert_eq!(kinds.len(), 14);
        assert_eq!(body["tree"][0], json!(format!("(api_exception, {ROOT_CODE}) [unique]")));
        Ok(())
    }

    mod media_routes {
        use super::*;
        use httpmock::MockServer;

        fn media_app(uploader: Arc<InMemoryUploader>) -> Result<Router> {
            let storage = MediaStorage::new(uploader, Delivery::new("demo"));
            let state = state(&Settings::default())?.with_media(storage);
            Ok(ApiServer::new(state)?.into_router())
        }

        #[tokio::test]
        async fn media_routes_are_absent_without_storage() -> Result<()> {
            let response = app()?.oneshot(get("/media/url?public_id=a")?).await?;
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            Ok(())
        }

        #[tokio::test]
        async fn download_urls_follow_the_query() -> Result<()> {
            let app = media_app(Arc::new(InMemoryUploader::new()))?;
            let response = app
                .clone()
                .oneshot(get("/media/url?public_id=avatars/1&version=5&width=10&height=20")?)
                .await?;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                body_json(response).await?,
                json!({
                    "url": "https://res.cloudinary.com/demo/image/upload/c_fill,h_20,w_10/v5/avatars/1"
                })
            );

            let response = app.oneshot(get("/media/url?width=10")?).await?;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                body_json(response).await?,
                json!({"error_code": 10000, "detail": "public_id: This field is required."})
            );
            Ok(())
        }

        #[tokio::test]
        async fn uploads_run_inline_when_waiting() -> Result<()> {
            let server = MockServer::start_async().await;
            let mock = server.mock(|when, then| {
                when.method(httpmock::Method::GET).path("/cat.png");
                then.status(200).body("png-bytes");
            });
            let uploader = Arc::new(InMemoryUploader::new());
            let app = media_app(Arc::clone(&uploader))?;

            let body = json!({
                "key": "42",
                "directory": "avatars",
                "url": server.url("/cat.png"),
                "wait": true,
            });
            let response = app
                .oneshot(post_json("/media", &body.to_string())?)
                .await?;
            assert_eq!(response.status(), StatusCode::CREATED);
            assert_eq!(
                body_json(response).await?,
                json!({"public_id": "avatars/42", "version": 1, "status": "stored"})
            );
            mock.assert();
            assert!(uploader.get("avatars/42").is_some());
            Ok(())
        }

        #[tokio::test]
        async fn upload_failures_surface_as_upstream_errors() -> Result<()> {
            let server = MockServer::start_async().await;
            server.mock(|when, then| {
                when.method(httpmock::Method::GET).path("/gone.png");
                then.status(404);
            });
            let app = media_app(Arc::new(InMemoryUploader::new()))?;

            let body = json!({"key": "42", "url": server.url("/gone.png"), "wait": true});
            let response = app
                .oneshot(post_json("/media", &body.to_string())?)
                .await?;
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(
                body_json(response).await?,
                json!({"error_code": 20, "detail": "HTTP error."})
            );
            Ok(())
        }

        #[tokio::test]
        async fn uploads_default_to_the_background() -> Result<()> {
            let server = MockServer::start_async().await;
            server.mock(|when, then| {
                when.method(httpmock::Method::GET).path("/dog.png");
                then.status(200).body("png-bytes");
            });
            let uploader = Arc::new(InMemoryUploader::new());
            let storage = MediaStorage::new(uploader.clone(), Delivery::new("demo"));
            let executor = BackgroundExecutor::new();
            let state = ApiState::new(
                &Settings::default(),
                Arc::new(ExceptionRegistry::standard()?),
                executor.clone(),
            )?
            .with_media(storage);
            let app = ApiServer::new(state)?.into_router();

            let body = json!({"key": "7", "url": server.url("/dog.png")});
            let response = app
                .oneshot(post_json("/media", &body.to_string())?)
                .await?;
            assert_eq!(response.status(), StatusCode::ACCEPTED);
            assert_eq!(
                body_json(response).await?,
                json!({"public_id": "default/7", "version": null, "status": "accepted"})
            );

            executor.shutdown().await;
            assert!(uploader.get("default/7").is_some());
            Ok(())
        }
    }
}
