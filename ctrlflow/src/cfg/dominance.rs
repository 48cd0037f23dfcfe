//! Dominance and post-dominance over the basic-block graph.
//!
//! Iterative immediate-dominator computation in reverse postorder (the
//! Cooper/Harvey/Kennedy scheme); post-dominance is the same computation
//! over the reversed graph from the exit block. Blocks that cannot reach
//! the exit (infinite loops) have no post-dominator entry.

use super::blocks::BlockGraph;
use super::types::BlockId;

/// Immediate (post-)dominator trees of one callable's block graph.
#[derive(Debug)]
pub(crate) struct Dominance {
    idom: Vec<Option<BlockId>>,
    ipostdom: Vec<Option<BlockId>>,
    entry: BlockId,
    exit: BlockId,
}

impl Dominance {
    pub(crate) fn compute(graph: &BlockGraph) -> Self {
        let n = graph.blocks.len();
        let succs: Vec<Vec<BlockId>> = graph.blocks.iter().map(|b| b.successors.clone()).collect();
        let preds: Vec<Vec<BlockId>> = graph
            .blocks
            .iter()
            .map(|b| b.predecessors.clone())
            .collect();
        Self {
            idom: idoms(n, graph.entry_block, &succs, &preds),
            ipostdom: idoms(n, graph.exit_block, &preds, &succs),
            entry: graph.entry_block,
            exit: graph.exit_block,
        }
    }

    /// Immediate dominator, `None` for the entry block and unreachable
    /// blocks.
    pub(crate) fn immediate_dominator(&self, block: BlockId) -> Option<BlockId> {
        if block == self.entry {
            return None;
        }
        self.idom[block.index()]
    }

    /// Immediate post-dominator, `None` for the exit block and blocks that
    /// never reach it.
    pub(crate) fn immediate_post_dominator(&self, block: BlockId) -> Option<BlockId> {
        if block == self.exit {
            return None;
        }
        self.ipostdom[block.index()]
    }

    /// Reflexive dominance.
    pub(crate) fn dominates(&self, a: BlockId, b: BlockId) -> bool {
        in_tree(&self.idom, self.entry, a, b)
    }

    /// Reflexive post-dominance.
    pub(crate) fn post_dominates(&self, a: BlockId, b: BlockId) -> bool {
        in_tree(&self.ipostdom, self.exit, a, b)
    }
}

/// Whether `a` is on the tree path from `b` to `root`.
fn in_tree(idom: &[Option<BlockId>], root: BlockId, a: BlockId, b: BlockId) -> bool {
    let mut cur = b;
    loop {
        if cur == a {
            return true;
        }
        if cur == root {
            return false;
        }
        match idom[cur.index()] {
            Some(next) => cur = next,
            None => return false,
        }
    }
}

/// Iterative immediate-dominator computation from `root` over the graph
/// given by `succs`/`preds`. Swapping the two adjacency views yields
/// post-dominators.
fn idoms(
    n: usize,
    root: BlockId,
    succs: &[Vec<BlockId>],
    preds: &[Vec<BlockId>],
) -> Vec<Option<BlockId>> {
    // Reverse postorder from the root.
    let mut order: Vec<BlockId> = Vec::with_capacity(n);
    let mut state = vec![0u8; n];
    let mut stack = vec![(root, 0usize)];
    state[root.index()] = 1;
    while let Some(&mut (block, ref mut next)) = stack.last_mut() {
        let block_succs = &succs[block.index()];
        if *next < block_succs.len() {
            let s = block_succs[*next];
            *next += 1;
            if state[s.index()] == 0 {
                state[s.index()] = 1;
                stack.push((s, 0));
            }
        } else {
            order.push(block);
            stack.pop();
        }
    }
    order.reverse();

    let mut rpo_index = vec![usize::MAX; n];
    for (i, &b) in order.iter().enumerate() {
        rpo_index[b.index()] = i;
    }

    let mut idom: Vec<Option<BlockId>> = vec![None; n];
    idom[root.index()] = Some(root);
    let mut changed = true;
    while changed {
        changed = false;
        for &b in order.iter().skip(1) {
            let mut new_idom: Option<BlockId> = None;
            for &p in &preds[b.index()] {
                if idom[p.index()].is_none() {
                    continue;
                }
                new_idom = Some(match new_idom {
                    None => p,
                    Some(cur) => intersect(&idom, &rpo_index, p, cur),
                });
            }
            if new_idom.is_some() && idom[b.index()] != new_idom {
                idom[b.index()] = new_idom;
                changed = true;
            }
        }
    }
    idom[root.index()] = None;
    idom
}

fn intersect(
    idom: &[Option<BlockId>],
    rpo_index: &[usize],
    a: BlockId,
    b: BlockId,
) -> BlockId {
    let mut x = a;
    let mut y = b;
    while x != y {
        while rpo_index[x.index()] > rpo_index[y.index()] {
            x = idom[x.index()].unwrap_or(y);
        }
        while rpo_index[y.index()] > rpo_index[x.index()] {
            y = idom[y.index()].unwrap_or(x);
        }
    }
    x
}
