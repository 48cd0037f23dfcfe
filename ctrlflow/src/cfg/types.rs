//! Node and edge records of the per-callable graph.

use serde::Serialize;

use crate::ast::ElementId;

use super::completion::SuccessorType;
use super::splits::SplitSet;

/// Index of a node in a callable's graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a basic block in a callable's graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BlockId(pub u32);

impl BlockId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    /// The distinguished entry node of the callable.
    Entry,
    /// The distinguished exit node of the callable.
    Exit,
    /// An AST element, possibly one of several split copies.
    Element(ElementId),
}

/// One materialized node: an element (or entry/exit) plus its split context.
#[derive(Debug, Clone, Serialize)]
pub struct NodeData {
    /// What the node stands for.
    pub kind: NodeKind,
    /// Context tags distinguishing this copy of the element.
    pub splits: SplitSet,
}

impl NodeData {
    /// The element this node stands for, if it is not entry or exit.
    #[must_use]
    pub fn element(&self) -> Option<ElementId> {
        match self.kind {
            NodeKind::Element(e) => Some(e),
            NodeKind::Entry | NodeKind::Exit => None,
        }
    }
}

/// Serializable summary of a whole graph, used for snapshots and
/// determinism checks. Nodes and edges are listed in construction order,
/// which is itself deterministic.
#[derive(Debug, Serialize)]
pub struct GraphDump {
    /// All nodes, indexed by [`NodeId`].
    pub nodes: Vec<NodeDump>,
    /// All edges, ordered by source then target.
    pub edges: Vec<EdgeDump>,
}

/// One node of a [`GraphDump`].
#[derive(Debug, Serialize)]
pub struct NodeDump {
    /// Node index.
    pub id: u32,
    /// Rendered element kind, or `entry` / `exit`.
    pub label: String,
    /// Rendered splits, empty for unsplit nodes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub splits: Vec<String>,
}

/// One edge of a [`GraphDump`].
#[derive(Debug, Serialize)]
pub struct EdgeDump {
    /// Source node index.
    pub from: u32,
    /// Target node index.
    pub to: u32,
    /// Edge classification.
    pub kind: SuccessorType,
}
