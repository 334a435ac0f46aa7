//! Request metadata handed to endpoint handlers.

use std::fmt::{self, Display, Formatter};

use axum::http::{HeaderMap, HeaderName, Uri};
use serde_json::{Map, Value};

/// HTTP methods an endpoint can customise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Reads; input comes from the query string.
    Get,
    /// Creates; input comes from the JSON body.
    Post,
    /// Replaces; input comes from the JSON body.
    Put,
}

impl Method {
    /// Uppercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

impl Display for Method {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Caller identity as seen by access logging and handlers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Identity {
    /// No identity header was supplied.
    #[default]
    Anonymous,
    /// Caller named by the configured identity header.
    User(String),
}

impl Identity {
    /// Read the caller from `header`, when one is configured and present.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, header: Option<&HeaderName>) -> Self {
        header
            .and_then(|name| headers.get(name))
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map_or(Self::Anonymous, |user| Self::User(user.to_string()))
    }

    /// `true` for a named caller.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::User(_))
    }
}

impl Display for Identity {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => formatter.write_str("AnonymousUser"),
            Self::User(name) => formatter.write_str(name),
        }
    }
}

/// Everything a handler may need besides its payload.
#[derive(Debug, Clone)]
pub struct EndpointRequest {
    /// Method being served.
    pub method: Method,
    /// Request URI as received.
    pub uri: Uri,
    /// Request headers.
    pub headers: HeaderMap,
    /// Resolved caller.
    pub identity: Identity,
    /// Decoded query parameters; repeated keys keep the last value.
    pub query: Map<String, Value>,
}

/// Decode a query string into a JSON object of string values.
#[must_use]
pub fn query_params(query: Option<&str>) -> Map<String, Value> {
    query
        .map(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
                .collect()
        })
        .unwrap_or_default()
}
