use super::*;
use crate::ast::{Ast, Callable, ElementId};
use compact_str::CompactString;

fn node(g: &ControlFlowGraph, e: ElementId) -> NodeId {
    let nodes = g.nodes_of(e);
    assert_eq!(nodes.len(), 1, "expected exactly one node for {e:?}");
    nodes[0]
}

fn has_edge(g: &ControlFlowGraph, from: NodeId, ty: &SuccessorType, to: NodeId) -> bool {
    g.successors(from).iter().any(|(n, t)| *n == to && t == ty)
}

fn edge(g: &ControlFlowGraph, from: ElementId, ty: &SuccessorType, to: ElementId) -> bool {
    has_edge(g, node(g, from), ty, node(g, to))
}

fn assign_stmt(ast: &mut Ast, name: &str, value: &str) -> ElementId {
    let target = ast.name(name);
    let value = ast.lit(value);
    let assign = ast.assign(target, value);
    ast.expr_stmt(assign)
}

/// The assignment expression node inside a statement built by `assign_stmt`.
fn assign_of(ast: &Ast, stmt: ElementId) -> ElementId {
    ast.children(stmt)[0]
}

#[test]
fn test_if_else_branches_and_join() {
    let mut ast = Ast::new();
    let cond = ast.name("c");
    let s1 = assign_stmt(&mut ast, "x", "1");
    let then = ast.block(vec![s1]);
    let s2 = assign_stmt(&mut ast, "y", "2");
    let els = ast.block(vec![s2]);
    let iff = ast.if_else(cond, then, els);
    let after = assign_stmt(&mut ast, "z", "3");
    let body = ast.block(vec![iff, after]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    assert!(edge(&g, cond, &SuccessorType::True, then));
    assert!(edge(&g, cond, &SuccessorType::False, els));
    // Both branch exits converge at the statement after the if.
    assert!(edge(&g, assign_of(&ast, s1), &SuccessorType::Normal, after));
    assert!(edge(&g, assign_of(&ast, s2), &SuccessorType::Normal, after));

    let cond_block = g.basic_block(node(&g, cond));
    let after_block = g.basic_block(node(&g, after));
    assert!(g.is_condition_block(cond_block));
    assert!(g.block(after_block).is_join());
    assert!(g.block_dominates(cond_block, after_block));
    assert!(g.block_post_dominates(after_block, cond_block));
}

#[test]
fn test_if_without_else_false_edge() {
    let mut ast = Ast::new();
    let cond = ast.name("c");
    let s1 = assign_stmt(&mut ast, "x", "1");
    let then = ast.block(vec![s1]);
    let iff = ast.if_stmt(cond, then);
    let after = assign_stmt(&mut ast, "z", "3");
    let body = ast.block(vec![iff, after]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    assert!(edge(&g, cond, &SuccessorType::True, then));
    assert!(edge(&g, cond, &SuccessorType::False, after));
}

#[test]
fn test_logical_and_short_circuit() {
    let mut ast = Ast::new();
    let a = ast.name("a");
    let b = ast.name("b");
    let and = ast.and(a, b);
    let then = ast.block(vec![]);
    let els = ast.block(vec![]);
    let iff = ast.if_else(and, then, els);
    let body = ast.block(vec![iff]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    // False from `a` skips `b` entirely; true from `a` evaluates `b`.
    assert!(edge(&g, a, &SuccessorType::True, b));
    assert!(edge(&g, a, &SuccessorType::False, els));
    assert!(edge(&g, b, &SuccessorType::True, then));
    assert!(edge(&g, b, &SuccessorType::False, els));
    // Short-circuit operators are not evaluation steps of their own.
    assert!(g.nodes_of(and).is_empty());
}

#[test]
fn test_while_loop_shape() {
    let mut ast = Ast::new();
    let cond = ast.name("c");
    let s1 = assign_stmt(&mut ast, "x", "1");
    let loop_body = ast.block(vec![s1]);
    let w = ast.while_stmt(cond, loop_body);
    let after = assign_stmt(&mut ast, "z", "3");
    let body = ast.block(vec![w, after]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    assert!(edge(&g, cond, &SuccessorType::True, loop_body));
    assert!(edge(&g, cond, &SuccessorType::False, after));
    assert!(edge(&g, assign_of(&ast, s1), &SuccessorType::Normal, cond));
}

#[test]
fn test_for_loop_back_edge() {
    let mut ast = Ast::new();
    let init_target = ast.name("i");
    let init_zero = ast.lit("0");
    let init = ast.assign(init_target, init_zero);
    let cond_left = ast.name("i");
    let cond_right = ast.name("n");
    let cond = ast.binary("<", cond_left, cond_right);
    let upd_target = ast.name("i");
    let upd_one = ast.lit("1");
    let upd = ast.compound_assign("+", upd_target, upd_one);
    let s1 = assign_stmt(&mut ast, "x", "1");
    let loop_body = ast.block(vec![s1]);
    let f = ast.for_stmt(Some(init), Some(cond), Some(upd), loop_body);
    let after = assign_stmt(&mut ast, "z", "3");
    let body = ast.block(vec![f, after]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    // Exactly one back-edge, from the body's last element to the update.
    let body_last = node(&g, assign_of(&ast, s1));
    assert_eq!(g.successors(body_last).len(), 1);
    assert!(edge(
        &g,
        assign_of(&ast, s1),
        &SuccessorType::Normal,
        upd_target
    ));
    // The update flows back to the condition, the false condition leaves.
    assert!(edge(&g, upd, &SuccessorType::Normal, cond_left));
    assert!(edge(&g, cond, &SuccessorType::False, after));
    assert!(edge(&g, cond, &SuccessorType::True, loop_body));
    // The initializer target is evaluated before its value.
    assert!(edge(&g, init_target, &SuccessorType::Normal, init_zero));
}

#[test]
fn test_foreach_emptiness_test() {
    let mut ast = Ast::new();
    let iterable = ast.name("xs");
    let s1 = assign_stmt(&mut ast, "x", "1");
    let loop_body = ast.block(vec![s1]);
    let fe = ast.foreach("x", iterable, loop_body);
    let after = assign_stmt(&mut ast, "z", "3");
    let body = ast.block(vec![fe, after]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    // The iterable is evaluated first, then the loop node tests emptiness.
    assert!(edge(&g, iterable, &SuccessorType::Normal, fe));
    assert!(edge(&g, fe, &SuccessorType::NonEmpty, loop_body));
    assert!(edge(&g, fe, &SuccessorType::Empty, after));
    assert!(edge(&g, assign_of(&ast, s1), &SuccessorType::Normal, fe));
}

#[test]
fn test_try_finally_resumes_suspended_throw() {
    let mut ast = Ast::new();
    let thr = ast.throw("E", None);
    let try_body = ast.block(vec![thr]);
    let s1 = assign_stmt(&mut ast, "x", "1");
    let fin = ast.block(vec![s1]);
    let t = ast.try_stmt(try_body, vec![], Some(fin));
    let body = ast.block(vec![t]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    let exception = SuccessorType::Exception(CompactString::from("E"));
    // The throw runs the finally first, and the finally's normal
    // completion re-raises the suspended exception at the boundary.
    assert!(edge(&g, thr, &exception, fin));
    let fin_last = node(&g, assign_of(&ast, s1));
    assert!(has_edge(&g, fin_last, &exception, g.exit_node()));
    assert!(g.splits(fin_last).contains(&Split::Finally {
        try_stmt: t,
        suspended: Completion::Throw(CompactString::from("E")),
    }));
}

#[test]
fn test_finally_duplicated_per_suspended_completion() {
    let mut ast = Ast::new();
    let cond = ast.name("c");
    let ret = ast.ret();
    let then = ast.block(vec![ret]);
    let iff = ast.if_stmt(cond, then);
    let try_body = ast.block(vec![iff]);
    let s1 = assign_stmt(&mut ast, "y", "2");
    let fin = ast.block(vec![s1]);
    let t = ast.try_stmt(try_body, vec![], Some(fin));
    let after = assign_stmt(&mut ast, "z", "3");
    let body = ast.block(vec![t, after]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    // One copy per suspended completion plus the plain fall-through copy.
    let copies = g.nodes_of(assign_of(&ast, s1));
    assert_eq!(copies.len(), 2);
    let (mut saw_return, mut saw_plain) = (false, false);
    for n in copies {
        if g.splits(n).is_empty() {
            saw_plain = true;
            assert!(has_edge(&g, n, &SuccessorType::Normal, node(&g, after)));
        } else {
            saw_return = true;
            assert!(has_edge(&g, n, &SuccessorType::Return, g.exit_node()));
        }
    }
    assert!(saw_return && saw_plain);
}

#[test]
fn test_catch_dispatch_skips_impossible_clause() {
    let mut ast = Ast::new();
    ast.add_subtype("Io", "Exception");
    ast.add_subtype("Net", "Exception");
    let thr = ast.throw("Io", None);
    let try_body = ast.block(vec![thr]);
    let h1 = assign_stmt(&mut ast, "a", "1");
    let net_body = ast.block(vec![h1]);
    let net_clause = ast.catch_clause("Net", net_body);
    let h2 = assign_stmt(&mut ast, "b", "2");
    let io_body = ast.block(vec![h2]);
    let io_clause = ast.catch_clause("Io", io_body);
    let t = ast.try_stmt(try_body, vec![net_clause, io_clause], None);
    let after = assign_stmt(&mut ast, "z", "3");
    let body = ast.block(vec![t, after]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    // A clause that can never match materializes no nodes at all.
    assert!(g.nodes_of(net_clause).is_empty());
    assert!(g.nodes_of(h1).is_empty());
    let exception = SuccessorType::Exception(CompactString::from("Io"));
    assert!(edge(&g, thr, &exception, io_clause));
    assert!(edge(&g, io_clause, &SuccessorType::Match, io_body));
    assert!(edge(&g, assign_of(&ast, h2), &SuccessorType::Normal, after));
    // The catch body carries its clause's handler context.
    let handler = node(&g, io_body);
    assert!(g
        .splits(handler)
        .contains(&Split::Handler { clause: io_clause }));
}

#[test]
fn test_catch_maybe_match_propagates_unmatched() {
    let mut ast = Ast::new();
    ast.add_subtype("Io", "Exception");
    let thr = ast.throw("Exception", None);
    let try_body = ast.block(vec![thr]);
    let h1 = assign_stmt(&mut ast, "a", "1");
    let io_body = ast.block(vec![h1]);
    let io_clause = ast.catch_clause("Io", io_body);
    let t = ast.try_stmt(try_body, vec![io_clause], None);
    let body = ast.block(vec![t]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    let exception = SuccessorType::Exception(CompactString::from("Exception"));
    assert!(edge(&g, thr, &exception, io_clause));
    assert!(edge(&g, io_clause, &SuccessorType::Match, io_body));
    // The unmatched path leaves the callable still throwing.
    assert!(has_edge(&g, node(&g, io_clause), &exception, g.exit_node()));
}

#[test]
fn test_rethrow_resolves_enclosing_clause_type() {
    let mut ast = Ast::new();
    ast.add_subtype("Io", "Exception");
    let thr = ast.throw("Io", None);
    let try_body = ast.block(vec![thr]);
    let re = ast.rethrow();
    let io_body = ast.block(vec![re]);
    let io_clause = ast.catch_clause("Io", io_body);
    let t = ast.try_stmt(try_body, vec![io_clause], None);
    let body = ast.block(vec![t]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    let exception = SuccessorType::Exception(CompactString::from("Io"));
    assert!(has_edge(&g, node(&g, re), &exception, g.exit_node()));
}

#[test]
fn test_break_and_continue_edges() {
    let mut ast = Ast::new();
    let cond = ast.name("c");
    let inner_cond = ast.name("d");
    let brk = ast.brk();
    let brk_then = ast.block(vec![brk]);
    let brk_if = ast.if_stmt(inner_cond, brk_then);
    let s1 = assign_stmt(&mut ast, "x", "1");
    let loop_body = ast.block(vec![brk_if, s1]);
    let w = ast.while_stmt(cond, loop_body);
    let after = assign_stmt(&mut ast, "z", "3");
    let body = ast.block(vec![w, after]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    assert!(edge(&g, brk, &SuccessorType::Break, after));
    assert!(edge(&g, assign_of(&ast, s1), &SuccessorType::Normal, cond));
}

#[test]
fn test_labeled_break_crosses_loops() {
    let mut ast = Ast::new();
    let inner_cond = ast.name("d");
    let brk = ast.brk_to("outer");
    let inner_body = ast.block(vec![brk]);
    let inner = ast.while_stmt(inner_cond, inner_body);
    let outer_cond = ast.name("c");
    let outer_body = ast.block(vec![inner]);
    let outer = ast.while_stmt(outer_cond, outer_body);
    let labeled = ast.labeled("outer", outer);
    let after = assign_stmt(&mut ast, "z", "3");
    let body = ast.block(vec![labeled, after]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    // The labeled break leaves both loops in one step.
    assert!(edge(&g, brk, &SuccessorType::Break, after));
}

#[test]
fn test_continue_restarts_condition() {
    let mut ast = Ast::new();
    let cond = ast.name("c");
    let inner_cond = ast.name("d");
    let cont = ast.cont();
    let cont_then = ast.block(vec![cont]);
    let cont_if = ast.if_stmt(inner_cond, cont_then);
    let loop_body = ast.block(vec![cont_if]);
    let w = ast.while_stmt(cond, loop_body);
    let body = ast.block(vec![w]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    assert!(edge(&g, cont, &SuccessorType::Continue, cond));
}

#[test]
fn test_switch_dispatch_and_goto_case() {
    let mut ast = Ast::new();
    let scrutinee = ast.name("s");
    let s1 = assign_stmt(&mut ast, "x", "1");
    let brk = ast.brk();
    let case1 = ast.case("1", vec![s1, brk]);
    let gc = ast.goto_case("1");
    let case2 = ast.case("2", vec![gc]);
    let s2 = assign_stmt(&mut ast, "y", "2");
    let dflt = ast.default_case(vec![s2]);
    let sw = ast.switch(scrutinee, vec![case1, case2, dflt]);
    let after = assign_stmt(&mut ast, "z", "3");
    let body = ast.block(vec![sw, after]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    assert!(edge(&g, scrutinee, &SuccessorType::Normal, case1));
    assert!(edge(&g, case1, &SuccessorType::Match, s1));
    assert!(edge(&g, case1, &SuccessorType::NoMatch, case2));
    assert!(edge(&g, case2, &SuccessorType::NoMatch, dflt));
    assert!(edge(&g, dflt, &SuccessorType::Match, s2));
    assert!(edge(&g, gc, &SuccessorType::GotoCase, s1));
    assert!(edge(&g, brk, &SuccessorType::Break, after));
    assert!(edge(&g, assign_of(&ast, s2), &SuccessorType::Normal, after));
}

#[test]
fn test_goto_case_bypasses_match_test() {
    let mut ast = Ast::new();
    let scrutinee = ast.name("s");
    let s1 = assign_stmt(&mut ast, "x", "1");
    let brk1 = ast.brk();
    let case1 = ast.case("1", vec![s1, brk1]);
    let gc = ast.goto_case("1");
    let case2 = ast.case("2", vec![gc]);
    let s2 = assign_stmt(&mut ast, "y", "2");
    let brk2 = ast.brk();
    let case3 = ast.case("3", vec![s2, brk2]);
    let sw = ast.switch(scrutinee, vec![case1, case2, case3]);
    let after = assign_stmt(&mut ast, "z", "3");
    let body = ast.block(vec![sw, after]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    // The jump enters the resolved section's body directly; landing on the
    // match-test node would admit its NoMatch edge as a continuation of
    // the jump, reaching the next section infeasibly.
    assert!(edge(&g, gc, &SuccessorType::GotoCase, s1));
    let gc_node = node(&g, gc);
    assert_eq!(g.successors(gc_node).len(), 1);
    assert!(!has_edge(
        &g,
        gc_node,
        &SuccessorType::GotoCase,
        node(&g, case1)
    ));
}

#[test]
fn test_goto_case_to_empty_section_completes_switch() {
    let mut ast = Ast::new();
    let scrutinee = ast.name("s");
    let case1 = ast.case("1", vec![]);
    let gc = ast.goto_case("1");
    let case2 = ast.case("2", vec![gc]);
    let sw = ast.switch(scrutinee, vec![case1, case2]);
    let after = assign_stmt(&mut ast, "z", "3");
    let body = ast.block(vec![sw, after]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    assert!(edge(&g, gc, &SuccessorType::Break, after));
}

#[test]
fn test_dead_code_yields_no_nodes() {
    let mut ast = Ast::new();
    let ret = ast.ret();
    let s1 = assign_stmt(&mut ast, "x", "1");
    let body = ast.block(vec![ret, s1]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    assert!(g.nodes_of(s1).is_empty());
    assert!(g.nodes_of(assign_of(&ast, s1)).is_empty());
    assert!(has_edge(
        &g,
        node(&g, ret),
        &SuccessorType::Return,
        g.exit_node()
    ));
}

#[test]
fn test_constant_true_condition_has_no_exit() {
    let mut ast = Ast::new();
    let cond = ast.bool_lit(true);
    let s1 = assign_stmt(&mut ast, "x", "1");
    let loop_body = ast.block(vec![s1]);
    let w = ast.while_stmt(cond, loop_body);
    let body = ast.block(vec![w]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    // `while (true)` produces no false branch and no terminating path.
    let cond_node = node(&g, cond);
    assert!(g
        .successors(cond_node)
        .iter()
        .all(|(_, t)| *t == SuccessorType::True));
    assert!(g.predecessors(g.exit_node()).is_empty());
}

#[test]
fn test_conditional_expression_branches() {
    let mut ast = Ast::new();
    let cond = ast.name("c");
    let a = ast.name("a");
    let b = ast.name("b");
    let pick = ast.conditional(cond, a, b);
    let target = ast.name("x");
    let assign = ast.assign(target, pick);
    let stmt = ast.expr_stmt(assign);
    let body = ast.block(vec![stmt]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    // The assignment target is evaluated before the picked value, and the
    // operation itself completes after either branch.
    assert!(edge(&g, target, &SuccessorType::Normal, cond));
    assert!(edge(&g, cond, &SuccessorType::True, a));
    assert!(edge(&g, cond, &SuccessorType::False, b));
    assert!(edge(&g, a, &SuccessorType::Normal, assign));
    assert!(edge(&g, b, &SuccessorType::Normal, assign));
}

#[test]
fn test_conditional_access_short_circuits_on_null() {
    let mut ast = Ast::new();
    let q = ast.name("a");
    let access = ast.cond_access(q, "b");
    let stmt = ast.expr_stmt(access);
    let after = assign_stmt(&mut ast, "z", "3");
    let body = ast.block(vec![stmt, after]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    assert!(edge(&g, q, &SuccessorType::NonNull, access));
    assert!(edge(&g, q, &SuccessorType::Null, after));
    assert!(edge(&g, access, &SuccessorType::Normal, after));
}

#[test]
fn test_coalesce_evaluates_right_on_null() {
    let mut ast = Ast::new();
    let a = ast.name("a");
    let b = ast.name("b");
    let co = ast.coalesce(a, b);
    let target = ast.name("x");
    let assign = ast.assign(target, co);
    let stmt = ast.expr_stmt(assign);
    let body = ast.block(vec![stmt]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    assert!(edge(&g, a, &SuccessorType::Null, b));
    assert!(edge(&g, a, &SuccessorType::NonNull, assign));
    assert!(edge(&g, b, &SuccessorType::Normal, assign));
}

#[test]
fn test_logical_not_splits_by_delivered_value() {
    let mut ast = Ast::new();
    let a = ast.name("a");
    let not = ast.not(a);
    let then = ast.block(vec![]);
    let els = ast.block(vec![]);
    let iff = ast.if_else(not, then, els);
    let body = ast.block(vec![iff]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    let copies = g.nodes_of(not);
    assert_eq!(copies.len(), 2);
    for n in copies {
        match g.splits(n).bool_value() {
            Some(true) => assert!(has_edge(&g, n, &SuccessorType::True, node(&g, then))),
            Some(false) => assert!(has_edge(&g, n, &SuccessorType::False, node(&g, els))),
            None => panic!("negation copy without boolean split"),
        }
    }
}

#[test]
fn test_exit_abrupt_bypasses_finally() {
    let mut ast = Ast::new();
    let call = ast.call_never_returns("abort", vec![]);
    let stmt = ast.expr_stmt(call);
    let try_body = ast.block(vec![stmt]);
    let s1 = assign_stmt(&mut ast, "y", "2");
    let fin = ast.block(vec![s1]);
    let t = ast.try_stmt(try_body, vec![], Some(fin));
    let body = ast.block(vec![t]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    // Process exit never unwinds: the finally block never runs.
    assert!(has_edge(
        &g,
        node(&g, call),
        &SuccessorType::ExitAbrupt,
        g.exit_node()
    ));
    assert!(g.nodes_of(fin).is_empty());
}

#[test]
fn test_goto_reaches_backward_label() {
    let mut ast = Ast::new();
    let s1 = assign_stmt(&mut ast, "x", "1");
    let labeled = ast.labeled("top", s1);
    let cond = ast.name("c");
    let go = ast.goto("top");
    let go_then = ast.block(vec![go]);
    let iff = ast.if_stmt(cond, go_then);
    let body = ast.block(vec![labeled, iff]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    assert!(edge(&g, go, &SuccessorType::GotoLabel, labeled));
}

#[test]
#[should_panic(expected = "unresolved jump")]
fn test_unresolved_goto_is_reported() {
    let mut ast = Ast::new();
    let go = ast.goto("nowhere");
    let body = ast.block(vec![go]);
    let _ = ControlFlowGraph::build(&ast, &Callable::new("f", body));
}

#[test]
fn test_initializer_runs_before_body() {
    let mut ast = Ast::new();
    let target = ast.name("x");
    let one = ast.lit("1");
    let init = ast.assign(target, one);
    let s1 = assign_stmt(&mut ast, "y", "2");
    let body = ast.block(vec![s1]);
    let callable = Callable::new("ctor", body).with_initializer(init);
    let g = ControlFlowGraph::build(&ast, &callable);

    assert!(has_edge(
        &g,
        g.entry_node(),
        &SuccessorType::Normal,
        node(&g, target)
    ));
    assert!(edge(&g, init, &SuccessorType::Normal, body));
}

#[test]
fn test_opaque_fallback_visits_children_in_order() {
    let mut ast = Ast::new();
    let a = ast.name("a");
    let b = ast.name("b");
    let mystery = ast.opaque(vec![a, b]);
    let stmt = ast.expr_stmt(mystery);
    let body = ast.block(vec![stmt]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    assert!(edge(&g, a, &SuccessorType::Normal, b));
    assert!(edge(&g, b, &SuccessorType::Normal, mystery));
}

#[test]
fn test_no_dangling_adjacency() {
    let mut ast = Ast::new();
    let cond = ast.name("c");
    let ret = ast.ret();
    let then = ast.block(vec![ret]);
    let iff = ast.if_stmt(cond, then);
    let after = assign_stmt(&mut ast, "z", "3");
    let body = ast.block(vec![iff, after]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    for n in g.nodes() {
        for (s, ty) in g.successors(n) {
            assert!(s.index() < g.node_count());
            assert!(g.predecessors(*s).iter().any(|(p, t)| *p == n && t == ty));
        }
        for (p, ty) in g.predecessors(n) {
            assert!(p.index() < g.node_count());
            assert!(g.successors(*p).iter().any(|(s, t)| *s == n && t == ty));
        }
    }
    // Exit has only incoming edges.
    assert!(g.successors(g.exit_node()).is_empty());
}

#[test]
fn test_dominance_partial_order_axioms() {
    let mut ast = Ast::new();
    let cond = ast.name("c");
    let s1 = assign_stmt(&mut ast, "x", "1");
    let then = ast.block(vec![s1]);
    let s2 = assign_stmt(&mut ast, "y", "2");
    let els = ast.block(vec![s2]);
    let iff = ast.if_else(cond, then, els);
    let after = assign_stmt(&mut ast, "z", "3");
    let body = ast.block(vec![iff, after]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    let blocks: Vec<BlockId> = g.blocks().iter().map(|b| b.id).collect();
    for &a in &blocks {
        assert!(g.block_dominates(a, a));
        assert!(g.block_post_dominates(a, a));
        for &b in &blocks {
            if g.block_dominates(a, b) && g.block_dominates(b, a) {
                assert_eq!(a, b);
            }
            for &c in &blocks {
                if g.block_dominates(a, b) && g.block_dominates(b, c) {
                    assert!(g.block_dominates(a, c));
                }
            }
        }
    }
}

#[test]
fn test_element_dominance_within_block_is_positional() {
    let mut ast = Ast::new();
    let s1 = assign_stmt(&mut ast, "x", "1");
    let s2 = assign_stmt(&mut ast, "y", "2");
    let body = ast.block(vec![s1, s2]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    let (n1, n2) = (node(&g, s1), node(&g, s2));
    assert_eq!(g.basic_block(n1), g.basic_block(n2));
    assert!(g.strictly_dominates(n1, n2));
    assert!(!g.dominates(n2, n1));
    assert!(g.strictly_post_dominates(n2, n1));
}

#[test]
fn test_rebuild_is_deterministic() {
    let mut ast = Ast::new();
    let cond = ast.name("c");
    let ret = ast.ret();
    let then = ast.block(vec![ret]);
    let iff = ast.if_stmt(cond, then);
    let s1 = assign_stmt(&mut ast, "x", "1");
    let body = ast.block(vec![iff, s1]);
    let callable = Callable::new("f", body);

    let g1 = ControlFlowGraph::build(&ast, &callable);
    let g2 = ControlFlowGraph::build(&ast, &callable);
    let d1 = serde_json::to_value(g1.dump(&ast)).unwrap();
    let d2 = serde_json::to_value(g2.dump(&ast)).unwrap();
    assert_eq!(d1, d2);
}

#[test]
fn test_graph_cache_reuses_graphs() {
    let mut ast = Ast::new();
    let ret = ast.ret();
    let body = ast.block(vec![ret]);
    let callable = Callable::new("f", body);

    let mut cache = GraphCache::new();
    let g1 = cache.get(&ast, &callable);
    let g2 = cache.get(&ast, &callable);
    assert!(std::rc::Rc::ptr_eq(&g1, &g2));
    cache.invalidate(&callable);
    let g3 = cache.get(&ast, &callable);
    assert!(!std::rc::Rc::ptr_eq(&g1, &g3));
}

#[test]
fn test_logical_or_short_circuit() {
    let mut ast = Ast::new();
    let a = ast.name("a");
    let b = ast.name("b");
    let or = ast.or(a, b);
    let then = ast.block(vec![]);
    let els = ast.block(vec![]);
    let iff = ast.if_else(or, then, els);
    let body = ast.block(vec![iff]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    // True from `a` skips `b` entirely; false from `a` evaluates `b`.
    assert!(edge(&g, a, &SuccessorType::True, then));
    assert!(edge(&g, a, &SuccessorType::False, b));
    assert!(edge(&g, b, &SuccessorType::True, then));
    assert!(edge(&g, b, &SuccessorType::False, els));
    assert!(g.nodes_of(or).is_empty());
}

#[test]
fn test_do_while_runs_body_first() {
    let mut ast = Ast::new();
    let s1 = assign_stmt(&mut ast, "x", "1");
    let loop_body = ast.block(vec![s1]);
    let cond = ast.name("c");
    let dw = ast.do_while(loop_body, cond);
    let after = assign_stmt(&mut ast, "z", "3");
    let body = ast.block(vec![dw, after]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    assert!(edge(&g, dw, &SuccessorType::Normal, loop_body));
    assert!(edge(&g, assign_of(&ast, s1), &SuccessorType::Normal, cond));
    assert!(edge(&g, cond, &SuccessorType::True, loop_body));
    assert!(edge(&g, cond, &SuccessorType::False, after));
}

#[test]
fn test_labeled_continue_crosses_loops() {
    let mut ast = Ast::new();
    let inner_cond = ast.name("d");
    let test = ast.name("e");
    let cont = ast.cont_to("outer");
    let cont_then = ast.block(vec![cont]);
    let cont_if = ast.if_stmt(test, cont_then);
    let inner_body = ast.block(vec![cont_if]);
    let inner = ast.while_stmt(inner_cond, inner_body);
    let outer_cond = ast.name("c");
    let outer_body = ast.block(vec![inner]);
    let outer = ast.while_stmt(outer_cond, outer_body);
    let labeled = ast.labeled("outer", outer);
    let body = ast.block(vec![labeled]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    // The labeled continue restarts the outer loop's condition, not the
    // inner one's.
    assert!(edge(&g, cont, &SuccessorType::Continue, outer_cond));
    assert_eq!(g.successors(node(&g, cont)).len(), 1);
}

#[test]
fn test_type_operands_are_not_evaluated() {
    let mut ast = Ast::new();
    let a = ast.name("a");
    let is_e = ast.is_expr(a, "T");
    let s1 = ast.expr_stmt(is_e);
    let b = ast.name("b");
    let cast_e = ast.cast(b, "T");
    let s2 = ast.expr_stmt(cast_e);
    let c = ast.name("c");
    let as_e = ast.as_expr(c, "T");
    let s3 = ast.expr_stmt(as_e);
    let after = assign_stmt(&mut ast, "z", "3");
    let body = ast.block(vec![s1, s2, s3, after]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    // Each test or conversion flows operand to node with nothing between.
    assert!(edge(&g, a, &SuccessorType::Normal, is_e));
    assert!(edge(&g, is_e, &SuccessorType::Normal, s2));
    assert!(edge(&g, b, &SuccessorType::Normal, cast_e));
    assert!(edge(&g, cast_e, &SuccessorType::Normal, s3));
    assert!(edge(&g, c, &SuccessorType::Normal, as_e));
    assert!(edge(&g, as_e, &SuccessorType::Normal, after));
    assert_eq!(g.successors(node(&g, a)).len(), 1);
}

#[test]
fn test_array_creation_starts_at_first_dimension() {
    let mut ast = Ast::new();
    let d1 = ast.lit("2");
    let d2 = ast.lit("3");
    let arr = ast.array_new(vec![d1, d2]);
    let target = ast.name("x");
    let assign = ast.assign(target, arr);
    let s1 = ast.expr_stmt(assign);
    let empty = ast.array_new(vec![]);
    let target2 = ast.name("y");
    let assign2 = ast.assign(target2, empty);
    let s2 = ast.expr_stmt(assign2);
    let body = ast.block(vec![s1, s2]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    assert!(edge(&g, target, &SuccessorType::Normal, d1));
    assert!(edge(&g, d1, &SuccessorType::Normal, d2));
    assert!(edge(&g, d2, &SuccessorType::Normal, arr));
    assert!(edge(&g, arr, &SuccessorType::Normal, assign));
    // Without dimension expressions the node itself comes first.
    assert!(edge(&g, target2, &SuccessorType::Normal, empty));
    assert!(edge(&g, empty, &SuccessorType::Normal, assign2));
}

#[test]
fn test_splits_serialize_as_arrays() {
    let mut ast = Ast::new();
    let thr = ast.throw("E", None);
    let try_body = ast.block(vec![thr]);
    let s1 = assign_stmt(&mut ast, "x", "1");
    let fin = ast.block(vec![s1]);
    let t = ast.try_stmt(try_body, vec![], Some(fin));
    let body = ast.block(vec![t]);
    let g = ControlFlowGraph::build(&ast, &Callable::new("f", body));

    let split_node = node(&g, fin);
    let json = serde_json::to_value(g.splits(split_node)).unwrap();
    let splits = json.as_array().expect("split set serializes as an array");
    assert_eq!(splits.len(), 1);
    // The rendered dump carries the split context on the node records.
    let dump = serde_json::to_value(g.dump(&ast)).unwrap();
    let nodes = dump["nodes"].as_array().unwrap();
    assert!(nodes
        .iter()
        .any(|n| n["splits"].as_array().is_some_and(|s| !s.is_empty())));
}

#[test]
fn test_completion_validity() {
    let mut ast = Ast::new();
    let cond = ast.name("c");
    let then = ast.block(vec![]);
    let _iff = ast.if_stmt(cond, then);
    // A condition can complete with either boolean outcome but never with
    // a return.
    assert!(completion::valid_for(
        &ast,
        cond,
        &Completion::Boolean(true)
    ));
    assert!(completion::valid_for(
        &ast,
        cond,
        &Completion::Boolean(false)
    ));
    assert!(!completion::valid_for(&ast, cond, &Completion::Return));

    let mut ast = Ast::new();
    let t = ast.bool_lit(true);
    let body = ast.block(vec![]);
    let _w = ast.while_stmt(t, body);
    // A constant-true condition only completes true.
    assert!(completion::valid_for(&ast, t, &Completion::Boolean(true)));
    assert!(!completion::valid_for(&ast, t, &Completion::Boolean(false)));
}
