//! Execution-context tags that let one AST element map to several nodes.
//!
//! A [`Split`] marks a control path that revisits the same element under a
//! different context: the copies of a `finally` block per suspended
//! completion, the lexical scope of a specific catch clause, or a branch of
//! a condition already known true or false. A node's identity is its
//! element together with its [`SplitSet`].
//!
//! Each split survives exactly while control stays inside its region: the
//! finally block of the recorded `try`, the catch clause, or the single
//! split element. The builder recomputes the surviving set on every edge.

use serde::Serialize;
use smallvec::SmallVec;

use crate::ast::ElementId;

use super::completion::Completion;

/// One context tag attached to a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Split {
    /// Execution inside the `finally` block of `try_stmt` while the
    /// suspended completion waits to be resumed.
    Finally {
        /// The `try` statement owning the finally block.
        try_stmt: ElementId,
        /// The non-normal completion the finally must resume.
        suspended: Completion,
    },
    /// Execution inside the lexical scope of a specific catch clause.
    Handler {
        /// The catch clause.
        clause: ElementId,
    },
    /// A branch of a condition already known to have this value.
    Boolean {
        /// The known truth value.
        value: bool,
    },
}

/// Ordered, immutable set of splits; part of node identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct SplitSet(SmallVec<[Split; 2]>);

impl SplitSet {
    /// The empty set.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a canonical (sorted, deduplicated) set.
    #[must_use]
    pub fn from_splits(mut splits: SmallVec<[Split; 2]>) -> Self {
        splits.sort();
        splits.dedup();
        Self(splits)
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of splits in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates the splits in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &Split> {
        self.0.iter()
    }

    /// Whether the set contains exactly this split.
    #[must_use]
    pub fn contains(&self, split: &Split) -> bool {
        self.0.contains(split)
    }

    /// The suspended completion recorded for `try_stmt`, if any.
    #[must_use]
    pub fn suspended_for(&self, try_stmt: ElementId) -> Option<&Completion> {
        self.0.iter().find_map(|s| match s {
            Split::Finally {
                try_stmt: t,
                suspended,
            } if *t == try_stmt => Some(suspended),
            _ => None,
        })
    }

    /// Whether any finally split for `try_stmt` is present.
    #[must_use]
    pub fn has_finally_for(&self, try_stmt: ElementId) -> bool {
        self.suspended_for(try_stmt).is_some()
    }

    /// The known boolean value, when a boolean split is present.
    #[must_use]
    pub fn bool_value(&self) -> Option<bool> {
        self.0.iter().find_map(|s| match s {
            Split::Boolean { value } => Some(*value),
            _ => None,
        })
    }
}

impl<'a> IntoIterator for &'a SplitSet {
    type Item = &'a Split;
    type IntoIter = std::slice::Iter<'a, Split>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
