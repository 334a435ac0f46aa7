//! Per-request access log line.
//!
//! # Design
//! - Every captured payload passes through a snapshot helper that serialises it
//!   compactly and replaces anything unserialisable or larger than
//!   [`FIELD_BUDGET_BYTES`] with [`PLACEHOLDER`], so a bad payload never aborts
//!   the log line.
//! - One `ACCESS_LOG` event per request, emitted at info level.

use serde::Serialize;
use serde_json::Value;

/// Maximum serialised size of a single logged payload.
pub const FIELD_BUDGET_BYTES: usize = 4096;

/// Token written in place of a payload that cannot be logged.
pub const PLACEHOLDER: &str = "...";

/// Serialise `value` compactly, or return [`PLACEHOLDER`] when serialisation
/// fails or the result exceeds the budget.
#[must_use]
pub fn snapshot_json<T>(value: &T) -> String
where
    T: Serialize + ?Sized,
{
    match serde_json::to_string(value) {
        Ok(encoded) if encoded.len() <= FIELD_BUDGET_BYTES => encoded,
        _ => PLACEHOLDER.to_string(),
    }
}

/// Snapshot a raw JSON body. An empty body logs as `{}`; anything that is not
/// JSON logs as [`PLACEHOLDER`].
#[must_use]
pub fn snapshot_body(bytes: &[u8]) -> String {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return "{}".to_string();
    }
    if bytes.len() > FIELD_BUDGET_BYTES * 4 {
        return PLACEHOLDER.to_string();
    }
    serde_json::from_slice::<Value>(bytes)
        .map_or_else(|_| PLACEHOLDER.to_string(), |value| snapshot_json(&value))
}

/// Everything recorded about one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessLogEntry {
    /// Name of the endpoint that served the request (`-` when unrouted).
    pub view: String,
    /// Absolute request URI.
    pub uri: String,
    /// Caller identity as displayed in logs.
    pub user: String,
    /// HTTP method.
    pub method: String,
    /// Wall-clock handling time.
    pub duration_ms: u64,
    /// Snapshot of the query parameters.
    pub query_params: String,
    /// Snapshot of the request body.
    pub data: String,
    /// Response status code.
    pub response_status: u16,
    /// Snapshot of the response body.
    pub response_content: String,
}

impl AccessLogEntry {
    /// Emit the entry as a single info-level event.
    pub fn emit(&self) {
        tracing::info!(
            view = %self.view,
            uri = %self.uri,
            user = %self.user,
            method = %self.method,
            duration_ms = self.duration_ms,
            query_params = %self.query_params,
            data = %self.data,
            response_status = self.response_status,
            response_content = %self.response_content,
            "ACCESS_LOG"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restkit_test_support::CapturedLogs;
    use serde::ser::{Error as _, Serializer};
    use serde_json::json;

    struct Unserialisable;

    impl Serialize for Unserialisable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("not serialisable"))
        }
    }

    #[test]
    fn snapshot_keeps_small_payloads() {
        assert_eq!(snapshot_json(&json!({"name": "x"})), r#"{"name":"x"}"#);
    }

    #[test]
    fn snapshot_replaces_oversize_and_unserialisable_payloads() {
        let large = "a".repeat(FIELD_BUDGET_BYTES);
        assert_eq!(snapshot_json(&large), PLACEHOLDER);
        let fits = "a".repeat(FIELD_BUDGET_BYTES - 2);
        assert_eq!(snapshot_json(&fits).len(), FIELD_BUDGET_BYTES);
        assert_eq!(snapshot_json(&Unserialisable), PLACEHOLDER);
    }

    #[test]
    fn body_snapshot_handles_empty_and_invalid_bodies() {
        assert_eq!(snapshot_body(b""), "{}");
        assert_eq!(snapshot_body(b"{not json"), PLACEHOLDER);
        assert_eq!(snapshot_body(br#"{ "name" : "" }"#), r#"{"name":""}"#);
    }

    #[test]
    fn emit_writes_one_access_log_line() {
        let logs = CapturedLogs::new();
        let _guard = logs.install();
        AccessLogEntry {
            view: "media_url".into(),
            uri: "http://localhost/media/url?public_id=a".into(),
            user: "AnonymousUser".into(),
            method: "GET".into(),
            duration_ms: 3,
            query_params: r#"{"public_id":"a"}"#.into(),
            data: "{}".into(),
            response_status: 200,
            response_content: PLACEHOLDER.into(),
        }
        .emit();
        let lines = logs.lines_containing("ACCESS_LOG");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("INFO"));
        assert!(lines[0].contains("view=media_url"));
        assert!(lines[0].contains("response_status=200"));
        assert!(lines[0].contains("user=AnonymousUser"));
    }
}
