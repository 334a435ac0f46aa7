//! Exception kind declarations and their resolved form.
//!
//! # Design
//! - A `KindSpec` only carries what the declaration sets explicitly.
//! - Everything left unset is inherited from the nearest ancestor when the kind
//!   is registered, so a `ResolvedKind` is always complete.

use std::fmt::{self, Display, Formatter};

use serde::Serialize;

/// Category of an exception kind; drives log severity and response shaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// The taxonomy root, used for API failures that fit no narrower family.
    Root,
    /// Protocol-level failures detected by the HTTP layer.
    Framework,
    /// Caller-caused failures whose message is safe to expose.
    Business,
    /// Internal or infrastructure faults.
    System,
}

impl Category {
    /// Stable lowercase identifier used in logs and catalogs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Framework => "framework",
            Self::Business => "business",
            Self::System => "system",
        }
    }
}

impl Display for Category {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Declaration of an exception kind prior to registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindSpec {
    pub(crate) name: &'static str,
    pub(crate) code: Option<i64>,
    pub(crate) status: Option<u16>,
    pub(crate) message: Option<&'static str>,
    pub(crate) category: Option<Category>,
}

impl KindSpec {
    /// Start a declaration that inherits every attribute from its parent.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            code: None,
            status: None,
            message: None,
            category: None,
        }
    }

    /// Declare an explicit numeric error code.
    #[must_use]
    pub const fn code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }

    /// Declare an explicit HTTP status.
    #[must_use]
    pub const fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Declare an explicit default message.
    #[must_use]
    pub const fn message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }

    /// Declare an explicit category.
    #[must_use]
    pub const fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Name of the declared kind.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Explicitly declared code, if any.
    #[must_use]
    pub const fn declared_code(&self) -> Option<i64> {
        self.code
    }
}

/// Handle to a kind inside one `ExceptionRegistry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct KindId(pub(crate) usize);

impl KindId {
    /// Position of the kind in registration order.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A registered kind with every inheritable attribute resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedKind {
    #[serde(skip)]
    pub(crate) id: KindId,
    pub(crate) name: &'static str,
    pub(crate) parent: Option<&'static str>,
    #[serde(skip)]
    pub(crate) parent_id: Option<KindId>,
    pub(crate) code: i64,
    pub(crate) status: u16,
    pub(crate) message: &'static str,
    pub(crate) category: Category,
    pub(crate) depth: usize,
}

impl ResolvedKind {
    /// Registry handle of this kind.
    #[must_use]
    pub const fn id(&self) -> KindId {
        self.id
    }

    /// Unique kind name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Name of the direct parent; `None` for the root.
    #[must_use]
    pub const fn parent(&self) -> Option<&'static str> {
        self.parent
    }

    /// Handle of the direct parent; `None` for the root.
    #[must_use]
    pub const fn parent_id(&self) -> Option<KindId> {
        self.parent_id
    }

    /// Resolved numeric error code.
    #[must_use]
    pub const fn code(&self) -> i64 {
        self.code
    }

    /// Resolved HTTP status.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Resolved default message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        self.message
    }

    /// Resolved category.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Distance from the root (the root itself is at depth zero).
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_records_only_explicit_attributes() {
        let spec = KindSpec::new("login_failed").code(30).status(401);
        assert_eq!(spec.name(), "login_failed");
        assert_eq!(spec.declared_code(), Some(30));
        assert_eq!(spec.status, Some(401));
        assert!(spec.message.is_none());
        assert!(spec.category.is_none());
    }

    #[test]
    fn category_display_matches_serde_name() -> anyhow::Result<()> {
        for category in [
            Category::Root,
            Category::Framework,
            Category::Business,
            Category::System,
        ] {
            let encoded = serde_json::to_value(category)?;
            assert_eq!(encoded, serde_json::Value::from(category.to_string()));
        }
        Ok(())
    }
}
