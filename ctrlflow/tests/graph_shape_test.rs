//! End-to-end graph shape checks over complete callables.

use ctrlflow::ast::{Ast, Callable, ElementId};
use ctrlflow::cfg::{ControlFlowGraph, NodeId, SuccessorType};

fn node(g: &ControlFlowGraph, e: ElementId) -> NodeId {
    let nodes = g.nodes_of(e);
    assert_eq!(nodes.len(), 1, "expected exactly one node for {e:?}");
    nodes[0]
}

fn has_edge(g: &ControlFlowGraph, from: NodeId, ty: &SuccessorType, to: NodeId) -> bool {
    g.successors(from).iter().any(|(n, t)| *n == to && t == ty)
}

#[test]
fn test_trivial_return_dump() {
    let mut ast = Ast::new();
    let ret = ast.ret();
    let body = ast.block(vec![ret]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    let dump = serde_json::to_value(g.dump(&ast)).expect("serializable dump");
    assert_eq!(
        dump,
        serde_json::json!({
            "nodes": [
                { "id": 0, "label": "entry" },
                { "id": 1, "label": "exit" },
                { "id": 2, "label": "Block#1" },
                { "id": 3, "label": "Return#0" },
            ],
            "edges": [
                { "from": 0, "to": 2, "kind": "Normal" },
                { "from": 2, "to": 3, "kind": "Normal" },
                { "from": 3, "to": 1, "kind": "Return" },
            ],
        })
    );
}

// A loop whose body throws into a catch that continues, with a finally
// in between: exercises exception dispatch, suspended-completion copies
// of the finally block, and the loop back edges in one callable.
//
//   while (more) {
//     try {
//       if (bad) { throw Error; }
//       handle();
//     } catch (Error) {
//       continue;
//     } finally {
//       cleanup();
//     }
//     count = count + 1;
//   }
//   done = true;
#[test]
fn test_loop_with_catch_continue_through_finally() {
    let mut ast = Ast::new();
    let bad = ast.name("bad");
    let thr = ast.throw("Error", None);
    let then = ast.block(vec![thr]);
    let iff = ast.if_stmt(bad, then);
    let handle = ast.call("handle", vec![]);
    let handle_stmt = ast.expr_stmt(handle);
    let try_body = ast.block(vec![iff, handle_stmt]);

    let cont = ast.cont();
    let catch_body = ast.block(vec![cont]);
    let clause = ast.catch_clause("Error", catch_body);

    let cleanup = ast.call("cleanup", vec![]);
    let cleanup_stmt = ast.expr_stmt(cleanup);
    let fin = ast.block(vec![cleanup_stmt]);

    let t = ast.try_stmt(try_body, vec![clause], Some(fin));
    let count_stmt = {
        let target = ast.name("count");
        let read = ast.name("count");
        let one = ast.lit("1");
        let sum = ast.binary("+", read, one);
        let assign = ast.assign(target, sum);
        ast.expr_stmt(assign)
    };
    let loop_body = ast.block(vec![t, count_stmt]);
    let more = ast.name("more");
    let w = ast.while_stmt(more, loop_body);
    let done_stmt = {
        let target = ast.name("done");
        let value = ast.bool_lit(true);
        let assign = ast.assign(target, value);
        ast.expr_stmt(assign)
    };
    let body = ast.block(vec![w, done_stmt]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("process", body));

    let error = SuccessorType::Exception("Error".into());

    // Loop header.
    assert!(has_edge(
        &g,
        node(&g, more),
        &SuccessorType::True,
        node(&g, loop_body)
    ));
    assert!(has_edge(
        &g,
        node(&g, more),
        &SuccessorType::False,
        node(&g, done_stmt)
    ));

    // The throw lands on the only clause, which always matches.
    assert!(has_edge(&g, node(&g, thr), &error, node(&g, clause)));
    assert!(has_edge(
        &g,
        node(&g, clause),
        &SuccessorType::Match,
        node(&g, catch_body)
    ));

    // The finally exists twice: once for plain fall-through and once for
    // the suspended continue. The suspended copy resumes the continue at
    // the loop condition; the plain copy falls through to the counter.
    let copies = g.nodes_of(cleanup);
    assert_eq!(copies.len(), 2);
    for n in copies {
        if g.splits(n).is_empty() {
            assert!(has_edge(
                &g,
                n,
                &SuccessorType::Normal,
                node(&g, count_stmt)
            ));
        } else {
            assert!(has_edge(&g, n, &SuccessorType::Continue, node(&g, more)));
        }
    }
    // The continue itself enters the suspended copy of the finally.
    let fin_copies = g.nodes_of(fin);
    assert_eq!(fin_copies.len(), 2);
    let suspended = fin_copies
        .iter()
        .copied()
        .find(|&n| !g.splits(n).is_empty())
        .expect("suspended finally copy");
    assert!(has_edge(
        &g,
        node(&g, cont),
        &SuccessorType::Continue,
        suspended
    ));

    // Counter increment closes the loop.
    let count_assign = ast.children(count_stmt)[0];
    assert!(has_edge(
        &g,
        node(&g, count_assign),
        &SuccessorType::Normal,
        node(&g, more)
    ));
}

#[test]
fn test_switch_fallthrough_into_default() {
    let mut ast = Ast::new();
    let scrutinee = ast.name("mode");
    let s1 = {
        let target = ast.name("a");
        let one = ast.lit("1");
        let assign = ast.assign(target, one);
        ast.expr_stmt(assign)
    };
    let case1 = ast.case("fast", vec![s1]);
    let gd = ast.goto_default();
    let case2 = ast.case("slow", vec![gd]);
    let s2 = {
        let target = ast.name("b");
        let two = ast.lit("2");
        let assign = ast.assign(target, two);
        ast.expr_stmt(assign)
    };
    let dflt = ast.default_case(vec![s2]);
    let sw = ast.switch(scrutinee, vec![case1, case2, dflt]);
    let after = {
        let target = ast.name("c");
        let three = ast.lit("3");
        let assign = ast.assign(target, three);
        ast.expr_stmt(assign)
    };
    let body = ast.block(vec![sw, after]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("dispatch", body));

    // The jump enters the default section's body, past the match test.
    assert!(has_edge(
        &g,
        node(&g, gd),
        &SuccessorType::GotoDefault,
        node(&g, s2)
    ));
    assert_eq!(g.successors(node(&g, gd)).len(), 1);
    // A section without a break falls out of the switch normally.
    let s1_assign = ast.children(s1)[0];
    assert!(has_edge(
        &g,
        node(&g, s1_assign),
        &SuccessorType::Normal,
        node(&g, after)
    ));
}
