//! Lazy rendering of the exception hierarchy.

use std::fmt::{self, Display, Formatter};

use crate::kind::KindId;
use crate::registry::ExceptionRegistry;

/// Whether a line's code belongs to exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeMarker {
    /// The code labels a single kind (the root line is always unique).
    Unique,
    /// Two or more kinds resolve to this code.
    Ambiguous,
}

impl CodeMarker {
    /// Lowercase label used in rendered lines.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unique => "unique",
            Self::Ambiguous => "ambiguous",
        }
    }
}

/// One printable line of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeLine<'a> {
    /// Distance from the root.
    pub depth: usize,
    /// Indentation and connector glyphs preceding the node.
    pub prefix: String,
    /// Kind name.
    pub name: &'a str,
    /// Resolved code.
    pub code: i64,
    /// Code uniqueness annotation.
    pub marker: CodeMarker,
}

impl Display for TreeLine<'_> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{}({}, {}) [{}]",
            self.prefix,
            self.name,
            self.code,
            self.marker.as_str()
        )
    }
}

struct Frame {
    id: KindId,
    depth: usize,
    last: bool,
}

/// Depth-first iterator over the hierarchy; siblings keep registration order.
pub struct TreeLines<'a> {
    registry: &'a ExceptionRegistry,
    pending: Vec<Frame>,
    // Entry `i` records whether the ancestor at depth `i + 1` was its parent's last child.
    ancestors_last: Vec<bool>,
}

impl<'a> TreeLines<'a> {
    pub(crate) fn new(registry: &'a ExceptionRegistry) -> Self {
        Self {
            registry,
            pending: vec![Frame {
                id: registry.root().id(),
                depth: 0,
                last: true,
            }],
            ancestors_last: Vec::new(),
        }
    }

    fn prefix(&self, depth: usize, last: bool) -> String {
        if depth == 0 {
            return String::new();
        }
        let mut prefix = String::with_capacity(depth * 4);
        for ancestor_last in &self.ancestors_last[..depth - 1] {
            prefix.push_str(if *ancestor_last { "    " } else { "|   " });
        }
        prefix.push_str(if last { "\\-- " } else { "|-- " });
        prefix
    }
}

impl<'a> Iterator for TreeLines<'a> {
    type Item = TreeLine<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.pending.pop()?;
        let kind = self.registry.get(frame.id)?;

        self.ancestors_last.truncate(frame.depth.saturating_sub(1));
        let prefix = self.prefix(frame.depth, frame.last);
        if frame.depth > 0 {
            self.ancestors_last.push(frame.last);
        }

        let children = self.registry.children(frame.id);
        for (index, child) in children.iter().enumerate().rev() {
            self.pending.push(Frame {
                id: *child,
                depth: frame.depth + 1,
                last: index + 1 == children.len(),
            });
        }

        let marker = if frame.depth == 0 || !self.registry.is_ambiguous(kind.code()) {
            CodeMarker::Unique
        } else {
            CodeMarker::Ambiguous
        };
        Some(TreeLine {
            depth: frame.depth,
            prefix,
            name: kind.name(),
            code: kind.code(),
            marker,
        })
    }
}
