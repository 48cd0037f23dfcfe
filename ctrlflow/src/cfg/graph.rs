//! The per-callable graph and its query interface.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::ast::{Ast, Callable, ElementId};

use super::blocks::{self, BasicBlock};
use super::builder::Builder;
use super::completion::SuccessorType;
use super::dominance::Dominance;
use super::splits::SplitSet;
use super::types::{BlockId, EdgeDump, GraphDump, NodeData, NodeDump, NodeId, NodeKind};

/// The control-flow graph of one callable: nodes, typed edges, basic
/// blocks and (post-)dominance, derived once from the immutable AST.
#[derive(Debug)]
pub struct ControlFlowGraph {
    entry: NodeId,
    exit: NodeId,
    nodes: Vec<NodeData>,
    succs: Vec<Vec<(NodeId, SuccessorType)>>,
    preds: Vec<Vec<(NodeId, SuccessorType)>>,
    blocks: Vec<BasicBlock>,
    node_block: Vec<BlockId>,
    entry_block: BlockId,
    exit_block: BlockId,
    dominance: Dominance,
}

impl ControlFlowGraph {
    /// Builds the whole graph for `callable`. Pure function of the AST;
    /// building twice yields an identical graph.
    #[must_use]
    pub fn build(ast: &Ast, callable: &Callable) -> Self {
        let raw = Builder::new(ast).run(callable);
        let block_graph = blocks::assemble(&raw);
        let dominance = Dominance::compute(&block_graph);
        Self {
            entry: raw.entry,
            exit: raw.exit,
            nodes: raw.nodes,
            succs: raw.succs,
            preds: raw.preds,
            entry_block: block_graph.entry_block,
            exit_block: block_graph.exit_block,
            blocks: block_graph.blocks,
            node_block: block_graph.node_block,
            dominance,
        }
    }

    /// The distinguished entry node.
    #[must_use]
    pub fn entry_node(&self) -> NodeId {
        self.entry
    }

    /// The distinguished exit node. It has only incoming edges; with no
    /// terminating path it has none at all.
    #[must_use]
    pub fn exit_node(&self) -> NodeId {
        self.exit
    }

    /// Number of nodes, entry and exit included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterates all node ids in construction order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(|i| NodeId(u32::try_from(i).unwrap_or(u32::MAX)))
    }

    /// Iterates all edges as `(from, to, type)`, in construction order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId, &SuccessorType)> + '_ {
        self.nodes().flat_map(move |n| {
            self.succs[n.index()]
                .iter()
                .map(move |(to, ty)| (n, *to, ty))
        })
    }

    /// The element a node stands for, `None` for entry and exit.
    #[must_use]
    pub fn element(&self, node: NodeId) -> Option<ElementId> {
        self.nodes[node.index()].element()
    }

    /// All nodes materialized for an element: none when the element is
    /// unreachable, several when split contexts apply.
    #[must_use]
    pub fn nodes_of(&self, element: ElementId) -> Vec<NodeId> {
        self.nodes()
            .filter(|&n| self.element(n) == Some(element))
            .collect()
    }

    /// Split context of a node.
    #[must_use]
    pub fn splits(&self, node: NodeId) -> &SplitSet {
        &self.nodes[node.index()].splits
    }

    /// Successor edges of a node, with their types.
    #[must_use]
    pub fn successors(&self, node: NodeId) -> &[(NodeId, SuccessorType)] {
        &self.succs[node.index()]
    }

    /// Successors reached over edges of the given type.
    pub fn successors_by_type<'a>(
        &'a self,
        node: NodeId,
        ty: &'a SuccessorType,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.succs[node.index()]
            .iter()
            .filter(move |(_, t)| t == ty)
            .map(|(n, _)| *n)
    }

    /// Predecessor edges of a node, with their types.
    #[must_use]
    pub fn predecessors(&self, node: NodeId) -> &[(NodeId, SuccessorType)] {
        &self.preds[node.index()]
    }

    /// Predecessors reaching this node over edges of the given type.
    pub fn predecessors_by_type<'a>(
        &'a self,
        node: NodeId,
        ty: &'a SuccessorType,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.preds[node.index()]
            .iter()
            .filter(move |(_, t)| t == ty)
            .map(|(n, _)| *n)
    }

    /// The basic block containing a node.
    #[must_use]
    pub fn basic_block(&self, node: NodeId) -> BlockId {
        self.node_block[node.index()]
    }

    /// A block by id.
    #[must_use]
    pub fn block(&self, block: BlockId) -> &BasicBlock {
        &self.blocks[block.index()]
    }

    /// All basic blocks.
    #[must_use]
    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    /// The block containing the entry node.
    #[must_use]
    pub fn entry_block(&self) -> BlockId {
        self.entry_block
    }

    /// The block containing the exit node.
    #[must_use]
    pub fn exit_block(&self) -> BlockId {
        self.exit_block
    }

    /// Whether a block ends in a node with successor edges of more than
    /// one type.
    #[must_use]
    pub fn is_condition_block(&self, block: BlockId) -> bool {
        let Some(&last) = self.blocks[block.index()].nodes.last() else {
            return false;
        };
        let succs = &self.succs[last.index()];
        succs
            .iter()
            .any(|(_, t)| succs.first().is_some_and(|(_, t0)| t0 != t))
    }

    /// Reflexive block-level dominance.
    #[must_use]
    pub fn block_dominates(&self, a: BlockId, b: BlockId) -> bool {
        self.dominance.dominates(a, b)
    }

    /// Reflexive block-level post-dominance.
    #[must_use]
    pub fn block_post_dominates(&self, a: BlockId, b: BlockId) -> bool {
        self.dominance.post_dominates(a, b)
    }

    /// Immediate dominator of a block.
    #[must_use]
    pub fn immediate_dominator(&self, block: BlockId) -> Option<BlockId> {
        self.dominance.immediate_dominator(block)
    }

    /// Immediate post-dominator of a block.
    #[must_use]
    pub fn immediate_post_dominator(&self, block: BlockId) -> Option<BlockId> {
        self.dominance.immediate_post_dominator(block)
    }

    /// Reflexive node-level dominance. Within one block this degrades to
    /// an index comparison.
    #[must_use]
    pub fn dominates(&self, a: NodeId, b: NodeId) -> bool {
        let (ba, bb) = (self.basic_block(a), self.basic_block(b));
        if ba == bb {
            self.index_in_block(a) <= self.index_in_block(b)
        } else {
            self.block_dominates(ba, bb)
        }
    }

    /// Strict node-level dominance.
    #[must_use]
    pub fn strictly_dominates(&self, a: NodeId, b: NodeId) -> bool {
        a != b && self.dominates(a, b)
    }

    /// Reflexive node-level post-dominance.
    #[must_use]
    pub fn post_dominates(&self, a: NodeId, b: NodeId) -> bool {
        let (ba, bb) = (self.basic_block(a), self.basic_block(b));
        if ba == bb {
            self.index_in_block(a) >= self.index_in_block(b)
        } else {
            self.block_post_dominates(ba, bb)
        }
    }

    /// Strict node-level post-dominance.
    #[must_use]
    pub fn strictly_post_dominates(&self, a: NodeId, b: NodeId) -> bool {
        a != b && self.post_dominates(a, b)
    }

    fn index_in_block(&self, node: NodeId) -> usize {
        let block = &self.blocks[self.basic_block(node).index()];
        block.nodes.iter().position(|&n| n == node).unwrap_or(0)
    }

    /// Serializable summary of the graph, in deterministic order.
    #[must_use]
    pub fn dump(&self, ast: &Ast) -> GraphDump {
        let nodes = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, data)| NodeDump {
                id: u32::try_from(i).unwrap_or(u32::MAX),
                label: match data.kind {
                    NodeKind::Entry => "entry".to_owned(),
                    NodeKind::Exit => "exit".to_owned(),
                    NodeKind::Element(e) => format!("{:?}#{}", ast.kind(e), e.0),
                },
                splits: data.splits.iter().map(|s| format!("{s:?}")).collect(),
            })
            .collect();
        let mut edges: Vec<EdgeDump> = self
            .edges()
            .map(|(from, to, ty)| EdgeDump {
                from: from.0,
                to: to.0,
                kind: ty.clone(),
            })
            .collect();
        edges.sort_by_key(|e| (e.from, e.to));
        GraphDump {
            nodes,
            edges,
        }
    }
}

/// On-demand cache of per-callable graphs, keyed by the callable's body.
/// Compute-once, read-many; invalidation after an AST change is the
/// owner's concern.
#[derive(Debug, Default)]
pub struct GraphCache {
    graphs: FxHashMap<ElementId, Rc<ControlFlowGraph>>,
}

impl GraphCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The graph for `callable`, building it on first request.
    pub fn get(&mut self, ast: &Ast, callable: &Callable) -> Rc<ControlFlowGraph> {
        Rc::clone(
            self.graphs
                .entry(callable.body)
                .or_insert_with(|| Rc::new(ControlFlowGraph::build(ast, callable))),
        )
    }

    /// Drops the cached graph for `callable`.
    pub fn invalidate(&mut self, callable: &Callable) {
        self.graphs.remove(&callable.body);
    }

    /// Drops every cached graph.
    pub fn clear(&mut self) {
        self.graphs.clear();
    }
}
