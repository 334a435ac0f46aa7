//! Process-wide bookkeeping of the exception taxonomy.
//!
//! # Design
//! - The registry is an explicitly owned value built during startup, then
//!   shared read-only (typically behind an `Arc`).
//! - Inheritable attributes are resolved once at registration; lookups never
//!   walk the parent chain.
//! - Code sharing is allowed and only surfaced for inspection.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::exception::{ApiException, ErrorEnvelope};
use crate::kind::{Category, KindId, KindSpec, ResolvedKind};
use crate::tree::TreeLines;

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors raised while declaring exception kinds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The kind name was already registered.
    #[error("exception kind already registered")]
    DuplicateKind {
        /// Name that was declared twice.
        name: &'static str,
    },
    /// The parent was not registered before the child.
    #[error("parent exception kind is not registered")]
    UnknownParent {
        /// Kind being registered.
        name: &'static str,
        /// Parent name that could not be found.
        parent: String,
    },
    /// The root declaration left an attribute unset; it has nothing to inherit from.
    #[error("root exception kind is incomplete")]
    IncompleteRoot {
        /// Root kind name.
        name: &'static str,
        /// Attribute that was not declared.
        attribute: &'static str,
    },
    /// The requested fallback kind is not registered.
    #[error("fallback exception kind is not registered")]
    UnknownFallback {
        /// Name that could not be found.
        name: String,
    },
}

/// Response shape produced for one failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    /// HTTP status to respond with.
    pub status: u16,
    /// Body sent to the caller.
    pub envelope: ErrorEnvelope,
    /// Category of the kind that produced the envelope.
    pub category: Category,
    /// `false` when the failure was not part of the taxonomy and was coerced to the fallback.
    pub recognized: bool,
}

/// Registry of exception kinds, their resolved codes, and the hierarchy.
#[derive(Debug, Clone)]
pub struct ExceptionRegistry {
    kinds: Vec<ResolvedKind>,
    by_name: HashMap<&'static str, KindId>,
    by_code: BTreeMap<i64, Vec<KindId>>,
    children: Vec<Vec<KindId>>,
    fallback: KindId,
}

impl ExceptionRegistry {
    /// Create a registry rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::IncompleteRoot`] when the root does not declare
    /// a code, status, message, and category.
    pub fn new(root: KindSpec) -> RegistryResult<Self> {
        let missing = |attribute| RegistryError::IncompleteRoot {
            name: root.name,
            attribute,
        };
        let code = root.code.ok_or_else(|| missing("code"))?;
        let status = root.status.ok_or_else(|| missing("status"))?;
        let message = root.message.ok_or_else(|| missing("message"))?;
        let category = root.category.ok_or_else(|| missing("category"))?;

        let id = KindId(0);
        let mut registry = Self {
            kinds: Vec::new(),
            by_name: HashMap::new(),
            by_code: BTreeMap::new(),
            children: Vec::new(),
            fallback: id,
        };
        registry.insert(ResolvedKind {
            id,
            name: root.name,
            parent: None,
            parent_id: None,
            code,
            status,
            message,
            category,
            depth: 0,
        });
        Ok(registry)
    }

    /// Register `spec` under the already registered kind named `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateKind`] when the name is taken and
    /// [`RegistryError::UnknownParent`] when the parent has not been registered yet.
    pub fn register(&mut self, spec: KindSpec, parent: &str) -> RegistryResult<KindId> {
        if self.by_name.contains_key(spec.name) {
            return Err(RegistryError::DuplicateKind { name: spec.name });
        }
        let parent_id = self
            .lookup(parent)
            .ok_or_else(|| RegistryError::UnknownParent {
                name: spec.name,
                parent: parent.to_string(),
            })?;
        let ancestor = &self.kinds[parent_id.0];

        let id = KindId(self.kinds.len());
        let resolved = ResolvedKind {
            id,
            name: spec.name,
            parent: Some(ancestor.name),
            parent_id: Some(parent_id),
            code: spec.code.unwrap_or(ancestor.code),
            status: spec.status.unwrap_or(ancestor.status),
            message: spec.message.unwrap_or(ancestor.message),
            category: spec.category.unwrap_or(ancestor.category),
            depth: ancestor.depth + 1,
        };
        self.children[parent_id.0].push(id);
        self.insert(resolved);
        Ok(id)
    }

    fn insert(&mut self, kind: ResolvedKind) {
        self.by_name.insert(kind.name, kind.id);
        self.by_code.entry(kind.code).or_default().push(kind.id);
        self.children.push(Vec::new());
        self.kinds.push(kind);
    }

    /// Designate the kind used for failures outside the taxonomy.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownFallback`] when `name` is not registered.
    pub fn set_fallback(&mut self, name: &str) -> RegistryResult<()> {
        self.fallback = self
            .lookup(name)
            .ok_or_else(|| RegistryError::UnknownFallback {
                name: name.to_string(),
            })?;
        Ok(())
    }

    /// The taxonomy root.
    #[must_use]
    pub fn root(&self) -> &ResolvedKind {
        &self.kinds[0]
    }

    /// Kind used for failures outside the taxonomy.
    #[must_use]
    pub fn fallback(&self) -> &ResolvedKind {
        &self.kinds[self.fallback.0]
    }

    /// Number of registered kinds, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Always `false`: the root is registered on construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Handle for the kind named `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<KindId> {
        self.by_name.get(name).copied()
    }

    /// Resolved kind for a handle.
    #[must_use]
    pub fn get(&self, id: KindId) -> Option<&ResolvedKind> {
        self.kinds.get(id.0)
    }

    /// Resolved kind by name.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&ResolvedKind> {
        self.lookup(name).and_then(|id| self.get(id))
    }

    /// Resolved code for a handle.
    #[must_use]
    pub fn code_for(&self, id: KindId) -> Option<i64> {
        self.get(id).map(ResolvedKind::code)
    }

    /// Resolved code by kind name.
    #[must_use]
    pub fn code_of(&self, name: &str) -> Option<i64> {
        self.resolve(name).map(ResolvedKind::code)
    }

    /// Direct children of a kind, in registration order.
    #[must_use]
    pub fn children(&self, id: KindId) -> &[KindId] {
        self.children.get(id.0).map_or(&[], Vec::as_slice)
    }

    /// Kinds resolving to `code`, in registration order.
    #[must_use]
    pub fn kinds_with_code(&self, code: i64) -> &[KindId] {
        self.by_code.get(&code).map_or(&[], Vec::as_slice)
    }

    /// Whether two or more kinds resolve to `code`.
    #[must_use]
    pub fn is_ambiguous(&self, code: i64) -> bool {
        self.kinds_with_code(code).len() > 1
    }

    /// Codes shared by more than one kind, ascending.
    pub fn ambiguous_codes(&self) -> impl Iterator<Item = (i64, &[KindId])> + '_ {
        self.by_code
            .iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(code, ids)| (*code, ids.as_slice()))
    }

    /// Whether `id` equals `ancestor` or sits anywhere below it.
    #[must_use]
    pub fn is_descendant(&self, id: KindId, ancestor: KindId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.get(current).and_then(ResolvedKind::parent_id);
        }
        false
    }

    /// All kinds in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedKind> {
        self.kinds.iter()
    }

    /// Lazily render the hierarchy, depth-first from the root.
    #[must_use]
    pub fn render_tree(&self) -> TreeLines<'_> {
        TreeLines::new(self)
    }

    /// Shape the response for an exception raised by a handler.
    ///
    /// Kinds missing from the registry are coerced to the fallback kind with
    /// its generic message; the caller never sees their detail.
    #[must_use]
    pub fn translate(&self, exception: &ApiException) -> Translation {
        let Some(kind) = self.resolve(exception.kind()) else {
            return self.fallback_translation();
        };
        let detail = exception.detail().unwrap_or(kind.message).to_string();
        Translation {
            status: kind.status,
            envelope: ErrorEnvelope {
                error_code: kind.code,
                detail,
            },
            category: kind.category,
            recognized: true,
        }
    }

    /// Response shape for failures outside the taxonomy.
    #[must_use]
    pub fn fallback_translation(&self) -> Translation {
        let kind = self.fallback();
        Translation {
            status: kind.status,
            envelope: ErrorEnvelope {
                error_code: kind.code,
                detail: kind.message.to_string(),
            },
            category: kind.category,
            recognized: false,
        }
    }
}
