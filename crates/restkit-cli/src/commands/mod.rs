//! Command handlers grouped by concern.

pub(crate) mod exceptions;
pub(crate) mod media;
