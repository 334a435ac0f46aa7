//! Schema references, bindings, and the payload types handlers receive.

use std::any::{Any, TypeId, type_name};
use std::fmt::{self, Debug, Formatter};

use serde_json::Value;

use crate::dispatch::validation::{FieldErrors, Validate};

/// Output of a schema before it is handed to the matching payload type.
pub type ParsedPayload = Box<dyn Any + Send>;

/// Type-erased handle on a [`Validate`] implementation.
#[derive(Clone, Copy)]
pub struct SchemaRef {
    type_id: TypeId,
    name: &'static str,
    parse: fn(&Value) -> Result<ParsedPayload, FieldErrors>,
}

impl SchemaRef {
    /// Handle on schema `S`.
    #[must_use]
    pub fn of<S: Validate>() -> Self {
        Self {
            type_id: TypeId::of::<S>(),
            name: type_name::<S>(),
            parse: parse_with::<S>,
        }
    }

    /// Type name of the schema.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn parse(&self, input: &Value) -> Result<ParsedPayload, FieldErrors> {
        (self.parse)(input)
    }
}

impl PartialEq for SchemaRef {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for SchemaRef {}

impl Debug for SchemaRef {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.debug_tuple("SchemaRef").field(&self.name).finish()
    }
}

fn parse_with<S: Validate>(input: &Value) -> Result<ParsedPayload, FieldErrors> {
    S::validate(input).map(|schema| Box::new(schema) as ParsedPayload)
}

/// Explicit per-method schema choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaBinding {
    /// Validate input with this schema before the handler runs.
    Validate(SchemaRef),
    /// The method deliberately takes no schema.
    Skip,
}

/// Payload produced by a successful validation against schema `T`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated<T>(pub T);

impl<T> Validated<T> {
    /// Unwrap the parsed schema.
    pub fn into_inner(self) -> T {
        self.0
    }
}

/// Marker payload for methods that run without validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unvalidated;

/// Second handler argument; ties a handler to the schema it expects.
pub trait Payload: Send + Sized + 'static {
    /// Schema this payload is produced by, `None` when validation is skipped.
    fn schema() -> Option<SchemaRef>;

    /// Recover the payload from the dispatcher's parsed value.
    fn from_parsed(parsed: Option<ParsedPayload>) -> Option<Self>;
}

impl<T: Validate> Payload for Validated<T> {
    fn schema() -> Option<SchemaRef> {
        Some(SchemaRef::of::<T>())
    }

    fn from_parsed(parsed: Option<ParsedPayload>) -> Option<Self> {
        parsed?.downcast::<T>().ok().map(|schema| Self(*schema))
    }
}

impl Payload for Unvalidated {
    fn schema() -> Option<SchemaRef> {
        None
    }

    fn from_parsed(parsed: Option<ParsedPayload>) -> Option<Self> {
        parsed.is_none().then_some(Self)
    }
}
