//! Basic-block assembly over the node graph.
//!
//! A node leads a block when it is the entry or exit node, has anything
//! other than exactly one predecessor, or follows a node with more than
//! one successor edge. Straight-line runs between leaders collapse into a
//! single block.

use rustc_hash::FxHashSet;

use super::builder::RawGraph;
use super::types::{BlockId, NodeId};

/// A maximal straight-line run of nodes.
#[derive(Debug, Clone)]
pub struct BasicBlock {
    /// Block index.
    pub id: BlockId,
    /// Member nodes in execution order.
    pub nodes: Vec<NodeId>,
    /// Successor blocks.
    pub successors: Vec<BlockId>,
    /// Predecessor blocks.
    pub predecessors: Vec<BlockId>,
}

/// The block graph of one callable.
#[derive(Debug)]
pub(crate) struct BlockGraph {
    pub blocks: Vec<BasicBlock>,
    /// Block of each node, indexed by node id.
    pub node_block: Vec<BlockId>,
    pub entry_block: BlockId,
    pub exit_block: BlockId,
}

pub(crate) fn assemble(graph: &RawGraph) -> BlockGraph {
    let n = graph.nodes.len();
    let mut is_leader = vec![false; n];
    for (i, leader) in is_leader.iter_mut().enumerate() {
        let preds = &graph.preds[i];
        let distinct_preds: FxHashSet<NodeId> = preds.iter().map(|(p, _)| *p).collect();
        *leader = i == graph.entry.index()
            || i == graph.exit.index()
            || distinct_preds.len() != 1
            || preds
                .first()
                .is_some_and(|(p, _)| graph.succs[p.index()].len() > 1);
    }

    let mut blocks: Vec<BasicBlock> = Vec::new();
    let mut node_block = vec![BlockId(0); n];
    for i in 0..n {
        if !is_leader[i] {
            continue;
        }
        let id = BlockId(u32::try_from(blocks.len()).unwrap_or(u32::MAX));
        let mut nodes = vec![NodeId(u32::try_from(i).unwrap_or(u32::MAX))];
        node_block[i] = id;
        let mut cur = i;
        loop {
            let succs = &graph.succs[cur];
            if succs.len() != 1 {
                break;
            }
            let next = succs[0].0;
            if is_leader[next.index()] {
                break;
            }
            nodes.push(next);
            node_block[next.index()] = id;
            cur = next.index();
        }
        blocks.push(BasicBlock {
            id,
            nodes,
            successors: Vec::new(),
            predecessors: Vec::new(),
        });
    }

    for b in 0..blocks.len() {
        let id = blocks[b].id;
        let last = *blocks[b].nodes.last().unwrap_or(&graph.entry);
        let mut succ_blocks: Vec<BlockId> = Vec::new();
        for (succ, _) in &graph.succs[last.index()] {
            let sb = node_block[succ.index()];
            if !succ_blocks.contains(&sb) {
                succ_blocks.push(sb);
            }
        }
        for &sb in &succ_blocks {
            blocks[sb.index()].predecessors.push(id);
        }
        blocks[b].successors = succ_blocks;
    }

    BlockGraph {
        entry_block: node_block[graph.entry.index()],
        exit_block: node_block[graph.exit.index()],
        blocks,
        node_block,
    }
}

impl BasicBlock {
    /// Whether the block's first node has more than one predecessor.
    #[must_use]
    pub fn is_join(&self) -> bool {
        self.predecessors.len() > 1
    }
}
