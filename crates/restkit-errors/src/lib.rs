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

//! Exception taxonomy shared by every restkit surface.
//!
//! Layout: `kind.rs` (declarations and resolved kinds), `registry.rs`
//! (`ExceptionRegistry` bookkeeping and translation), `tree.rs` (hierarchy
//! rendering), `standard.rs` (built-in taxonomy), `exception.rs` (the error
//! value raised by handlers).

pub mod exception;
pub mod kind;
pub mod registry;
pub mod standard;
pub mod tree;

pub use exception::{ApiException, ErrorEnvelope};
pub use kind::{Category, KindId, KindSpec, ResolvedKind};
pub use registry::{ExceptionRegistry, RegistryError, RegistryResult, Translation};
pub use standard::{ROOT_CODE, kinds};
pub use tree::{CodeMarker, TreeLine, TreeLines};
