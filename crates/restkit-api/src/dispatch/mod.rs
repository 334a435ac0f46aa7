//! Request validation dispatch.
//!
//! Layout: `validation.rs` (the `Validate` trait, field errors, field
//! readers), `payload.rs` (schema handles and handler payload types),
//! `request.rs` (methods, caller identity, request metadata), `endpoint.rs`
//! (binding resolution and per-request dispatch).

pub mod endpoint;
pub mod payload;
pub mod request;
pub mod validation;

pub use endpoint::{Endpoint, EndpointBuilder};
pub(crate) use endpoint::ViewName;
pub use payload::{ParsedPayload, Payload, SchemaBinding, SchemaRef, Unvalidated, Validated};
pub use request::{EndpointRequest, Identity, Method, query_params};
pub use validation::{FieldError, FieldErrors, FieldReader, NON_FIELD_ERRORS, Validate};
