//! Shared HTTP client and error types for the CLI.

use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use anyhow::anyhow;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode, Url};
use restkit_errors::ErrorEnvelope;

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

/// Context passed to command handlers that talk to a running server.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) client: Client,
    pub(crate) base_url: Url,
}

impl AppContext {
    /// HTTP client tagging every request with `trace_id`.
    pub(crate) fn new(base_url: Url, timeout_secs: u64, trace_id: &str) -> CliResult<Self> {
        let mut default_headers = HeaderMap::new();
        let request_id = HeaderValue::from_str(trace_id).map_err(|_| {
            CliError::failure(anyhow!("trace identifier contains invalid characters"))
        })?;
        default_headers.insert(HEADER_REQUEST_ID, request_id);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))?;
        Ok(Self { client, base_url })
    }

    pub(crate) fn endpoint(&self, path: &str) -> CliResult<Url> {
        self.base_url
            .join(path)
            .map_err(|err| CliError::failure(anyhow!("invalid base URL: {err}")))
    }
}

/// Classify a failed HTTP response into a CLI error.
///
/// Envelopes for caller mistakes (4xx) become validation errors carrying the
/// server's detail; everything else is an operational failure.
pub(crate) async fn classify_envelope(response: reqwest::Response) -> CliError {
    let status = response.status();
    let bytes = response.bytes().await.unwrap_or_default();
    let envelope = serde_json::from_slice::<ErrorEnvelope>(&bytes).ok();

    match envelope {
        Some(envelope) if status.is_client_error() && status != StatusCode::NOT_FOUND => {
            CliError::validation(format!("{} (code {})", envelope.detail, envelope.error_code))
        }
        Some(envelope) => CliError::failure(anyhow!(
            "{} (code {}, status {status})",
            envelope.detail,
            envelope.error_code
        )),
        None => {
            let body = String::from_utf8_lossy(&bytes);
            if body.trim().is_empty() {
                CliError::failure(anyhow!("request failed with status {status}"))
            } else {
                CliError::failure(anyhow!("{} (status {status})", body.trim()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use httpmock::MockServer;
    use httpmock::prelude::*;

    #[test]
    fn exit_codes_separate_validation_from_failures() {
        let validation = CliError::validation("bad flag");
        assert_eq!(validation.exit_code(), 2);
        assert_eq!(validation.display_message(), "bad flag");

        let failure = CliError::failure(anyhow!("connection refused").context("fetching catalog"));
        assert_eq!(failure.exit_code(), 3);
        assert_eq!(
            failure.display_message(),
            "fetching catalog: connection refused"
        );
    }

    #[test]
    fn invalid_trace_ids_are_rejected() -> Result<()> {
        let base_url = Url::parse("http://127.0.0.1:8000")?;
        assert!(AppContext::new(base_url, 5, "bad\nid").is_err());
        Ok(())
    }

    #[tokio::test]
    async fn envelopes_are_classified_by_status() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/rejected");
            then.status(400)
                .json_body(serde_json::json!({"error_code": 10000, "detail": "name: bad"}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/broken");
            then.status(502).body("upstream down");
        });

        let ctx = AppContext::new(Url::parse(&server.base_url())?, 5, "trace")?;
        let response = ctx.client.get(ctx.endpoint("/rejected")?).send().await?;
        let error = classify_envelope(response).await;
        assert_eq!(error.exit_code(), 2);
        assert_eq!(error.display_message(), "name: bad (code 10000)");

        let response = ctx.client.get(ctx.endpoint("/broken")?).send().await?;
        let error = classify_envelope(response).await;
        assert_eq!(error.exit_code(), 3);
        assert!(error.display_message().contains("upstream down"));
        Ok(())
    }
}
