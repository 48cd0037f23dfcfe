//! Control-flow graph construction and queries.
//!
//! The pieces, leaves first: the completion model ([`completion`])
//! classifies how an element can finish; the split tagger ([`splits`])
//! supplies the context tags that let one element map to several nodes;
//! the builder derives guarded edges from AST structure and keeps only
//! nodes reachable from the entry; [`blocks`] groups straight-line runs
//! into basic blocks; and [`dominance`] computes dominator and
//! post-dominator relations over them. [`ControlFlowGraph`] ties the
//! layers together behind one query interface.

pub mod blocks;
mod builder;
pub mod completion;
mod dominance;
mod graph;
pub mod splits;
mod types;

pub use blocks::BasicBlock;
pub use completion::{Completion, SuccessorType};
pub use graph::{ControlFlowGraph, GraphCache};
pub use splits::{Split, SplitSet};
pub use types::{BlockId, GraphDump, NodeId, NodeKind};

#[cfg(test)]
mod tests;
