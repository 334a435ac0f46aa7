#![forbid(unsafe_code)]
#![deny(
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! HTTP surface of restkit: request validation dispatch, failure
//! translation, access logging, and the router hosting built-in endpoints.
//!
//! Layout: `dispatch/` (schemas, payloads, endpoint binding), `http/`
//! (router, middleware, built-in endpoints), `state.rs`, `error.rs`.

pub mod dispatch;
pub mod error;
pub mod http;
pub mod state;

pub use dispatch::{
    Endpoint, EndpointBuilder, EndpointRequest, FieldError, FieldErrors, FieldReader, Identity,
    Method, Payload, SchemaBinding, SchemaRef, Unvalidated, Validate, Validated,
};
pub use error::{DefinitionError, HandlerError};
pub use http::router::ApiServer;
pub use state::ApiState;
