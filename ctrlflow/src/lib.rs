//! Intraprocedural control-flow graph construction.
//!
//! Given the typed AST of a callable body, this crate derives a precise
//! control-flow graph: short-circuit evaluation, exception propagation and
//! unwinding through `try`/`catch`/`finally`, labeled loops, `switch`
//! fallthrough and `goto case`, `goto`, and iteration-emptiness tests are all
//! modeled as explicit, typed edges. On top of the node graph it assembles
//! basic blocks and computes dominance and post-dominance.
//!
//! Construction is a pure function of the immutable AST: the graph for a
//! callable is derived once and never mutated, and contains exactly the nodes
//! reachable from the callable's entry. One AST element may map to several
//! graph nodes distinguished by [`cfg::splits::SplitSet`] context tags (for
//! example the copies of a `finally` block per suspended completion), or to
//! none at all when the element is dead code.
//!
//! # Example
//!
//! ```
//! use ctrlflow::ast::{Ast, Callable};
//! use ctrlflow::cfg::ControlFlowGraph;
//!
//! let mut ast = Ast::new();
//! let cond = ast.name("flag");
//! let ret = ast.ret();
//! let then = ast.block(vec![ret]);
//! let stmt = ast.if_stmt(cond, then);
//! let body = ast.block(vec![stmt]);
//! let callable = Callable::new("example", body);
//!
//! let graph = ControlFlowGraph::build(&ast, &callable);
//! assert!(graph.node_count() > 0);
//! ```

pub mod ast;
pub mod cfg;
