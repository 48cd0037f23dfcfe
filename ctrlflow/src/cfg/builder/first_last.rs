//! The `first`/`last` structural recursion.
//!
//! `first(e)` is the element actually executed first when `e` begins:
//! statements are pre-order (the statement node is its own entry marker),
//! expressions are post-order (the left-most operand first, recursively),
//! with the overrides documented on each arm. `lasts(e)` computes the
//! relation of potential final elements of `e` paired with the completion
//! produced there; computing it also records the raw edges internal to
//! `e`, so each element is wired exactly once.

use std::rc::Rc;

use smallvec::{smallvec, SmallVec};

use crate::ast::{CatchMatch, ElementId, ElementKind, ExceptionName, Label, EXCEPTION_ROOT};

use super::super::completion::{
    expr_context, valid_for, value_completions, Completion, ExprContext, SuccessorType,
};
use super::super::splits::Split;
use super::{Builder, Guard, LastPair, Target};

impl Builder<'_> {
    /// The element executed first when `e` begins executing.
    pub(crate) fn first(&self, e: ElementId) -> ElementId {
        let ast = self.ast;
        match ast.kind(e) {
            // A foreach is represented by evaluating its iterable first;
            // the loop node itself stands for the emptiness test.
            ElementKind::Foreach { .. } => self.first(ast.children(e)[0]),
            // A throw ends at itself, so it starts at its operand.
            ElementKind::Throw { .. }
            | ElementKind::Unary { .. }
            | ElementKind::Binary { .. }
            | ElementKind::Assign { .. }
            | ElementKind::Call { .. }
            | ElementKind::MemberAccess { .. }
            | ElementKind::IndexAccess
            | ElementKind::IsExpr { .. }
            | ElementKind::CastExpr { .. }
            | ElementKind::AsExpr { .. }
            | ElementKind::ArrayCreation
            | ElementKind::LogicalAnd
            | ElementKind::LogicalOr
            | ElementKind::LogicalNot
            | ElementKind::Coalesce
            | ElementKind::Conditional
            | ElementKind::CondAccess { .. }
            | ElementKind::Opaque => ast
                .children(e)
                .first()
                .map_or(e, |&child| self.first(child)),
            _ => e,
        }
    }

    /// The `last` relation for `e`; memoized, and wires `e`'s internal
    /// edges on first computation.
    pub(crate) fn lasts(&mut self, e: ElementId) -> Rc<Vec<LastPair>> {
        if let Some(cached) = self.last_memo.get(&e) {
            return Rc::clone(cached);
        }
        let pairs = Rc::new(self.compute_lasts(e));
        debug_assert!(
            pairs
                .iter()
                .filter(|p| p.at == e)
                .all(|p| valid_for(self.ast, e, &p.completion)),
            "completion invalid for its originating element {e:?}"
        );
        self.last_memo.insert(e, Rc::clone(&pairs));
        pairs
    }

    #[allow(clippy::too_many_lines)]
    fn compute_lasts(&mut self, e: ElementId) -> Vec<LastPair> {
        let kind = self.ast.kind(e).clone();
        let children: Vec<ElementId> = self.ast.children(e).to_vec();
        match kind {
            ElementKind::Block => self.wire_block(e, &children),
            ElementKind::If { has_else } => self.wire_if(e, &children, has_else),
            ElementKind::While => self.wire_while(e, &children),
            ElementKind::DoWhile => self.wire_do_while(e, &children),
            ElementKind::For {
                has_init,
                has_cond,
                has_update,
            } => self.wire_for(e, &children, has_init, has_cond, has_update),
            ElementKind::Foreach { .. } => self.wire_foreach(e, &children),
            ElementKind::Switch => self.wire_switch(e, &children),
            ElementKind::Try {
                catches,
                has_finally,
            } => self.wire_try(e, &children, catches, has_finally),
            ElementKind::Throw { ty } => self.wire_throw(e, &children, ty),
            ElementKind::Return => self.wire_return(e, &children),
            ElementKind::Break { label } => {
                vec![LastPair::new(e, Completion::Break(label))]
            }
            ElementKind::Continue { label } => {
                vec![LastPair::new(e, Completion::Continue(label))]
            }
            ElementKind::Goto { label } => vec![LastPair::new(e, Completion::Goto(label))],
            ElementKind::GotoCase { value } => {
                vec![LastPair::new(e, Completion::GotoCase(value))]
            }
            ElementKind::GotoDefault => vec![LastPair::new(e, Completion::GotoDefault)],
            ElementKind::Labeled { .. } | ElementKind::ExprStmt => {
                self.marker(e, children[0]);
                self.lasts(children[0]).as_ref().clone()
            }
            ElementKind::LocalDecl { .. } => match children.first() {
                Some(&init) => {
                    self.marker(e, init);
                    self.lasts(init).as_ref().clone()
                }
                None => vec![LastPair::new(e, Completion::Simple)],
            },
            ElementKind::LogicalAnd => self.wire_short_circuit(
                e,
                &children,
                Completion::Boolean(true),
                Completion::Boolean(false),
            ),
            ElementKind::LogicalOr => self.wire_short_circuit(
                e,
                &children,
                Completion::Boolean(false),
                Completion::Boolean(true),
            ),
            ElementKind::Coalesce => self.wire_short_circuit(
                e,
                &children,
                Completion::Nullness(true),
                Completion::Nullness(false),
            ),
            ElementKind::LogicalNot => self.wire_not(e, &children),
            ElementKind::Conditional => self.wire_conditional(e, &children),
            ElementKind::CondAccess { .. } => self.wire_cond_access(e, &children),
            ElementKind::Literal { .. }
            | ElementKind::BoolLiteral { .. }
            | ElementKind::Name { .. } => value_completions(self.ast, e)
                .into_iter()
                .map(|c| LastPair::new(e, c))
                .collect(),
            // Post-order expressions, and the graceful fallback for
            // unrecognized forms: children in index order, then the node.
            ElementKind::Unary { .. }
            | ElementKind::Binary { .. }
            | ElementKind::Assign { .. }
            | ElementKind::Call { .. }
            | ElementKind::MemberAccess { .. }
            | ElementKind::IndexAccess
            | ElementKind::IsExpr { .. }
            | ElementKind::CastExpr { .. }
            | ElementKind::AsExpr { .. }
            | ElementKind::ArrayCreation
            | ElementKind::Opaque
            | ElementKind::Case { .. }
            | ElementKind::Catch { .. } => self.wire_post_order(e, &children, &kind),
        }
    }

    /// Chains `items` sequentially: normal completions flow to the next
    /// item, everything else (and the last item's normal completions)
    /// escapes to the caller.
    fn chain(&mut self, items: &[ElementId]) -> Vec<LastPair> {
        let mut out = Vec::new();
        for (i, &item) in items.iter().enumerate() {
            let next = items.get(i + 1).map(|&n| self.first(n));
            let pairs = self.lasts(item);
            for p in pairs.iter() {
                match (p.completion.is_normal(), next) {
                    (true, Some(target)) => self.edge(p, Target::Element(target)),
                    _ => out.push(p.clone()),
                }
            }
        }
        out
    }

    fn wire_block(&mut self, e: ElementId, children: &[ElementId]) -> Vec<LastPair> {
        let Some(&head) = children.first() else {
            return vec![LastPair::new(e, Completion::Simple)];
        };
        self.marker(e, head);
        let pairs = self.chain(children);
        let mut out = Vec::new();
        for p in pairs {
            // Gotos resolve against labeled statements of this block, in
            // either direction; unresolved ones keep bubbling up.
            if let Completion::Goto(label) = &p.completion {
                let target = children.iter().copied().find(|&c| {
                    matches!(self.ast.kind(c), ElementKind::Labeled { label: l } if l == label)
                });
                if let Some(target) = target {
                    let target_first = self.first(target);
                    self.edge(&p, Target::Element(target_first));
                    continue;
                }
            }
            out.push(p);
        }
        out
    }

    fn wire_if(&mut self, e: ElementId, children: &[ElementId], has_else: bool) -> Vec<LastPair> {
        let (cond, then) = (children[0], children[1]);
        let els = has_else.then(|| children[2]);
        self.marker(e, cond);
        let then_first = self.first(then);
        let else_first = els.map(|x| self.first(x));
        let mut out = Vec::new();
        let cond_pairs = self.lasts(cond);
        for p in cond_pairs.iter() {
            match &p.completion {
                Completion::Boolean(true) => self.edge(p, Target::Element(then_first)),
                Completion::Boolean(false) => match else_first {
                    Some(target) => self.edge(p, Target::Element(target)),
                    None => out.push(p.clone()),
                },
                c if c.is_normal() => {
                    // Untyped condition outcome: take both branches.
                    self.edge(p, Target::Element(then_first));
                    match else_first {
                        Some(target) => self.edge(p, Target::Element(target)),
                        None => out.push(p.clone()),
                    }
                }
                _ => out.push(p.clone()),
            }
        }
        out.extend(self.lasts(then).iter().cloned());
        if let Some(els) = els {
            out.extend(self.lasts(els).iter().cloned());
        }
        out
    }

    fn wire_while(&mut self, e: ElementId, children: &[ElementId]) -> Vec<LastPair> {
        let (cond, body) = (children[0], children[1]);
        self.marker(e, cond);
        let cond_first = self.first(cond);
        let body_first = self.first(body);
        let mut out = Vec::new();
        self.wire_condition(cond, body_first, &mut out);
        self.wire_loop_body(e, body, cond_first, &mut out);
        out
    }

    fn wire_do_while(&mut self, e: ElementId, children: &[ElementId]) -> Vec<LastPair> {
        let (body, cond) = (children[0], children[1]);
        self.marker(e, body);
        let cond_first = self.first(cond);
        let body_first = self.first(body);
        let mut out = Vec::new();
        self.wire_condition(cond, body_first, &mut out);
        self.wire_loop_body(e, body, cond_first, &mut out);
        out
    }

    fn wire_for(
        &mut self,
        e: ElementId,
        children: &[ElementId],
        has_init: bool,
        has_cond: bool,
        has_update: bool,
    ) -> Vec<LastPair> {
        let mut i = 0;
        let mut take = |present: bool| {
            if present {
                let c = children[i];
                i += 1;
                Some(c)
            } else {
                None
            }
        };
        let init = take(has_init);
        let cond = take(has_cond);
        let update = take(has_update);
        let body = children[i];

        // Re-entry point of each iteration, and where the body continues.
        let head = cond.unwrap_or(body);
        let after_body = update.unwrap_or(head);
        self.marker(e, init.unwrap_or(head));
        let head_first = self.first(head);
        let after_body_first = self.first(after_body);

        let mut out = Vec::new();
        if let Some(init) = init {
            let pairs = self.lasts(init);
            for p in pairs.iter() {
                if p.completion.is_normal() {
                    self.edge(p, Target::Element(head_first));
                } else {
                    out.push(p.clone());
                }
            }
        }
        if let Some(cond) = cond {
            let body_first = self.first(body);
            self.wire_condition(cond, body_first, &mut out);
        }
        self.wire_loop_body(e, body, after_body_first, &mut out);
        if let Some(update) = update {
            let pairs = self.lasts(update);
            for p in pairs.iter() {
                if p.completion.is_normal() {
                    self.edge(p, Target::Element(head_first));
                } else {
                    out.push(p.clone());
                }
            }
        }
        out
    }

    /// Condition of a loop: `true` enters the body, `false` becomes the
    /// loop's normal exit, anything else propagates.
    fn wire_condition(&mut self, cond: ElementId, body_first: ElementId, out: &mut Vec<LastPair>) {
        let pairs = self.lasts(cond);
        for p in pairs.iter() {
            match &p.completion {
                Completion::Boolean(true) => self.edge(p, Target::Element(body_first)),
                Completion::Boolean(false) => out.push(p.clone()),
                c if c.is_normal() => {
                    self.edge(p, Target::Element(body_first));
                    out.push(p.clone());
                }
                _ => out.push(p.clone()),
            }
        }
    }

    /// Body of a loop: normal completions and matching continues re-test,
    /// matching breaks become the loop's break-normal exit, everything
    /// else propagates.
    fn wire_loop_body(
        &mut self,
        loop_stmt: ElementId,
        body: ElementId,
        retest_first: ElementId,
        out: &mut Vec<LastPair>,
    ) {
        let own_label = self.loop_label(loop_stmt);
        let pairs = self.lasts(body);
        for p in pairs.iter() {
            match &p.completion {
                c if c.is_normal() => self.edge(p, Target::Element(retest_first)),
                Completion::Continue(l) if matches_label(l.as_ref(), own_label.as_ref()) => {
                    self.edge(p, Target::Element(retest_first));
                }
                Completion::Break(l) if matches_label(l.as_ref(), own_label.as_ref()) => {
                    out.push(LastPair {
                        at: p.at,
                        completion: Completion::BreakNormal,
                        guards: p.guards.clone(),
                    });
                }
                _ => out.push(p.clone()),
            }
        }
    }

    fn loop_label(&self, loop_stmt: ElementId) -> Option<Label> {
        let parent = self.ast.parent(loop_stmt)?;
        match self.ast.kind(parent) {
            ElementKind::Labeled { label } => Some(label.clone()),
            _ => None,
        }
    }

    fn wire_foreach(&mut self, e: ElementId, children: &[ElementId]) -> Vec<LastPair> {
        let (iterable, body) = (children[0], children[1]);
        let mut out = Vec::new();
        let pairs = self.lasts(iterable);
        for p in pairs.iter() {
            if p.completion.is_normal() {
                self.edge(p, Target::Element(e));
            } else {
                out.push(p.clone());
            }
        }
        // The loop node is the emptiness test.
        let body_first = self.first(body);
        self.raw(
            e,
            SuccessorType::NonEmpty,
            SmallVec::new(),
            Target::Element(body_first),
            None,
        );
        out.push(LastPair::new(e, Completion::Emptiness(true)));
        self.wire_loop_body(e, body, e, &mut out);
        out
    }

    fn wire_switch(&mut self, e: ElementId, children: &[ElementId]) -> Vec<LastPair> {
        let scrutinee = children[0];
        let cases: Vec<ElementId> = children[1..].to_vec();
        self.marker(e, scrutinee);
        let mut out = Vec::new();
        let pairs = self.lasts(scrutinee);
        for p in pairs.iter() {
            match (p.completion.is_normal(), cases.first()) {
                (true, Some(&head)) => self.edge(p, Target::Element(head)),
                _ => out.push(p.clone()),
            }
        }
        let default = cases.iter().copied().find(|&c| {
            matches!(self.ast.kind(c), ElementKind::Case { value: None })
        });
        for (i, &case) in cases.iter().enumerate() {
            let ElementKind::Case { value } = self.ast.kind(case).clone() else {
                continue;
            };
            let stmts: Vec<ElementId> = self.ast.children(case).to_vec();
            match stmts.first() {
                Some(&head) => {
                    let head_first = self.first(head);
                    self.raw(
                        case,
                        SuccessorType::Match,
                        SmallVec::new(),
                        Target::Element(head_first),
                        None,
                    );
                }
                None => out.push(LastPair::new(case, Completion::Matching(true))),
            }
            if value.is_some() {
                // Non-match falls to the next section; past the last one
                // the switch completes without running anything.
                match cases.get(i + 1) {
                    Some(&next) => self.raw(
                        case,
                        SuccessorType::NoMatch,
                        SmallVec::new(),
                        Target::Element(next),
                        None,
                    ),
                    None => out.push(LastPair::new(case, Completion::Matching(false))),
                }
            }
            if stmts.is_empty() {
                continue;
            }
            let section_pairs = self.chain(&stmts);
            for p in section_pairs {
                match &p.completion {
                    Completion::Break(None) => out.push(LastPair {
                        at: p.at,
                        completion: Completion::BreakNormal,
                        guards: p.guards.clone(),
                    }),
                    Completion::GotoCase(v) => {
                        let target = cases.iter().copied().find(|&c| {
                            matches!(self.ast.kind(c),
                                ElementKind::Case { value: Some(cv) } if cv == v)
                        });
                        match target {
                            Some(target) => self.jump_into_section(&p, target, &mut out),
                            None => out.push(p),
                        }
                    }
                    Completion::GotoDefault => match default {
                        Some(target) => self.jump_into_section(&p, target, &mut out),
                        None => out.push(p),
                    },
                    _ => out.push(p),
                }
            }
        }
        out
    }

    /// A resolved `goto case`/`goto default` enters its target section's
    /// first statement directly, past the already-decided match test. A
    /// jump to an empty section completes the switch, same as matching it.
    fn jump_into_section(&mut self, p: &LastPair, case: ElementId, out: &mut Vec<LastPair>) {
        match self.ast.children(case).first().copied() {
            Some(head) => {
                let head_first = self.first(head);
                self.edge(p, Target::Element(head_first));
            }
            None => out.push(LastPair {
                at: p.at,
                completion: Completion::BreakNormal,
                guards: p.guards.clone(),
            }),
        }
    }

    fn wire_try(
        &mut self,
        e: ElementId,
        children: &[ElementId],
        catches: usize,
        has_finally: bool,
    ) -> Vec<LastPair> {
        let body = children[0];
        let clauses: Vec<ElementId> = children[1..=catches].to_vec();
        let finally = has_finally.then(|| children[children.len() - 1]);
        self.marker(e, body);

        let mut outcomes: Vec<LastPair> = Vec::new();
        let body_pairs = self.lasts(body);
        for p in body_pairs.iter() {
            if let Completion::Throw(ex) = &p.completion {
                self.dispatch_throw(p, ex.clone(), &clauses, &mut outcomes);
            } else {
                outcomes.push(p.clone());
            }
        }
        // Catch-body completions join the body's outcomes; exceptions from
        // a catch body are not offered to sibling clauses.
        for &clause in &clauses {
            if let Some(&clause_body) = self.ast.children(clause).first() {
                let body_first = self.first(clause_body);
                self.raw(
                    clause,
                    SuccessorType::Match,
                    SmallVec::new(),
                    Target::Element(body_first),
                    None,
                );
                let pairs = self.lasts(clause_body);
                outcomes.extend(pairs.iter().cloned());
            }
        }

        let Some(finally) = finally else {
            return outcomes;
        };

        // Every outcome passes through the finally first. Non-normal
        // completions are suspended in a split so the matching copy of the
        // finally resumes them afterward; an abnormal completion of the
        // finally itself overrides whatever was suspended. Process exit
        // never unwinds, so it skips the redirect.
        let finally_first = self.first(finally);
        let finally_lasts = self.lasts(finally);
        let mut out = Vec::new();
        let mut suspended: Vec<Completion> = Vec::new();
        let mut any_normal = false;
        for p in &outcomes {
            match &p.completion {
                Completion::ExitAbrupt => out.push(p.clone()),
                c if c.is_normal() => {
                    any_normal = true;
                    self.edge(p, Target::Element(finally_first));
                }
                c => {
                    if !suspended.contains(c) {
                        suspended.push(c.clone());
                    }
                    self.edge_push(
                        p,
                        Target::Element(finally_first),
                        Split::Finally {
                            try_stmt: e,
                            suspended: c.clone(),
                        },
                    );
                }
            }
        }
        for completion in &suspended {
            for fp in finally_lasts.iter().filter(|fp| fp.completion.is_normal()) {
                let mut guards = fp.guards.clone();
                guards.push(Guard::FinallyIs {
                    try_stmt: e,
                    suspended: completion.clone(),
                });
                out.push(LastPair {
                    at: fp.at,
                    completion: completion.clone(),
                    guards,
                });
            }
        }
        if any_normal {
            for fp in finally_lasts.iter().filter(|fp| fp.completion.is_normal()) {
                let mut guards = fp.guards.clone();
                guards.push(Guard::NoFinally { try_stmt: e });
                out.push(LastPair {
                    at: fp.at,
                    completion: fp.completion.clone(),
                    guards,
                });
            }
        }
        for fp in finally_lasts.iter().filter(|fp| !fp.completion.is_normal()) {
            out.push(fp.clone());
        }
        out
    }

    /// Walks a propagating exception through the catch clauses in order.
    /// `Never` clauses are skipped entirely, which is what keeps clauses
    /// that cannot match out of the graph.
    fn dispatch_throw(
        &mut self,
        p: &LastPair,
        ex: ExceptionName,
        clauses: &[ElementId],
        outcomes: &mut Vec<LastPair>,
    ) {
        let mut cur = p.clone();
        let mut cur_ty = SuccessorType::Exception(ex.clone());
        for &clause in clauses {
            let ElementKind::Catch { ty } = self.ast.kind(clause) else {
                continue;
            };
            match self.ast.catch_match(&ex, &ty.clone()) {
                CatchMatch::Never => {}
                CatchMatch::Always => {
                    self.raw(cur.at, cur_ty, cur.guards.clone(), Target::Element(clause), None);
                    return;
                }
                CatchMatch::Maybe => {
                    self.raw(
                        cur.at,
                        cur_ty.clone(),
                        cur.guards.clone(),
                        Target::Element(clause),
                        None,
                    );
                    cur = LastPair::new(clause, Completion::Throw(ex.clone()));
                    cur_ty = SuccessorType::NoMatch;
                }
            }
        }
        outcomes.push(cur);
    }

    fn wire_throw(
        &mut self,
        e: ElementId,
        children: &[ElementId],
        ty: Option<ExceptionName>,
    ) -> Vec<LastPair> {
        let resolved = match ty {
            Some(ty) => ty,
            None => match self.rethrow_clause.get(&e) {
                Some(&clause) => match self.ast.kind(clause) {
                    ElementKind::Catch { ty } => ty.clone(),
                    _ => ExceptionName::from(EXCEPTION_ROOT),
                },
                None => {
                    tracing::warn!(
                        element = ?e,
                        "rethrow outside any catch clause; assuming the root exception type"
                    );
                    debug_assert!(false, "rethrow outside any catch clause: {e:?}");
                    ExceptionName::from(EXCEPTION_ROOT)
                }
            },
        };
        let mut out = Vec::new();
        if let Some(&expr) = children.first() {
            let pairs = self.lasts(expr);
            for p in pairs.iter() {
                if p.completion.is_normal() {
                    self.edge(p, Target::Element(e));
                } else {
                    out.push(p.clone());
                }
            }
        }
        out.push(LastPair::new(e, Completion::Throw(resolved)));
        out
    }

    fn wire_return(&mut self, e: ElementId, children: &[ElementId]) -> Vec<LastPair> {
        let Some(&expr) = children.first() else {
            return vec![LastPair::new(e, Completion::Return)];
        };
        self.marker(e, expr);
        let mut out = Vec::new();
        let pairs = self.lasts(expr);
        for p in pairs.iter() {
            if p.completion.is_normal() {
                out.push(LastPair {
                    at: p.at,
                    completion: Completion::Return,
                    guards: p.guards.clone(),
                });
            } else {
                out.push(p.clone());
            }
        }
        out
    }

    /// `&&`, `||` and `??`: the `enter_right` outcome of the left operand
    /// evaluates the right operand, the `skip` outcome short-circuits past
    /// it, and abnormal completions propagate immediately.
    fn wire_short_circuit(
        &mut self,
        _e: ElementId,
        children: &[ElementId],
        enter_right: Completion,
        skip: Completion,
    ) -> Vec<LastPair> {
        let (left, right) = (children[0], children[1]);
        let right_first = self.first(right);
        let mut out = Vec::new();
        let pairs = self.lasts(left);
        for p in pairs.iter() {
            match &p.completion {
                c if *c == enter_right => self.edge(p, Target::Element(right_first)),
                c if *c == skip => out.push(p.clone()),
                c if c.is_normal() => {
                    self.edge(p, Target::Element(right_first));
                    out.push(p.clone());
                }
                _ => out.push(p.clone()),
            }
        }
        out.extend(self.lasts(right).iter().cloned());
        out
    }

    /// Logical not in boolean position is reached under both truth values
    /// of its operand and is split by the value it delivers, so each copy
    /// branches correctly afterward.
    fn wire_not(&mut self, e: ElementId, children: &[ElementId]) -> Vec<LastPair> {
        let operand = children[0];
        let mut out = Vec::new();
        if expr_context(self.ast, e) == ExprContext::Boolean {
            let mut saw_untyped = false;
            let pairs = self.lasts(operand);
            for p in pairs.iter() {
                match &p.completion {
                    Completion::Boolean(value) => {
                        let push = Split::Boolean { value: !value };
                        self.edge_push(p, Target::Element(e), push);
                    }
                    c if c.is_normal() => {
                        saw_untyped = true;
                        self.edge(p, Target::Element(e));
                    }
                    _ => out.push(p.clone()),
                }
            }
            for value in [true, false] {
                out.push(LastPair {
                    at: e,
                    completion: Completion::Boolean(value),
                    guards: smallvec![Guard::BoolIs(value)],
                });
            }
            if saw_untyped {
                out.push(LastPair::new(e, Completion::Boolean(true)));
                out.push(LastPair::new(e, Completion::Boolean(false)));
            }
        } else {
            let pairs = self.lasts(operand);
            for p in pairs.iter() {
                if p.completion.is_normal() {
                    self.edge(p, Target::Element(e));
                } else {
                    out.push(p.clone());
                }
            }
            for c in value_completions(self.ast, e) {
                out.push(LastPair::new(e, c));
            }
        }
        out
    }

    fn wire_conditional(&mut self, _e: ElementId, children: &[ElementId]) -> Vec<LastPair> {
        let (cond, then, els) = (children[0], children[1], children[2]);
        let then_first = self.first(then);
        let else_first = self.first(els);
        let mut out = Vec::new();
        let pairs = self.lasts(cond);
        for p in pairs.iter() {
            match &p.completion {
                Completion::Boolean(true) => self.edge(p, Target::Element(then_first)),
                Completion::Boolean(false) => self.edge(p, Target::Element(else_first)),
                c if c.is_normal() => {
                    self.edge(p, Target::Element(then_first));
                    self.edge(p, Target::Element(else_first));
                }
                _ => out.push(p.clone()),
            }
        }
        out.extend(self.lasts(then).iter().cloned());
        out.extend(self.lasts(els).iter().cloned());
        out
    }

    /// `q?.m`: a null qualifier short-circuits past the access with the
    /// null outcome preserved; a non-null qualifier reaches the access
    /// node itself.
    fn wire_cond_access(&mut self, e: ElementId, children: &[ElementId]) -> Vec<LastPair> {
        let qualifier = children[0];
        let mut out = Vec::new();
        let pairs = self.lasts(qualifier);
        for p in pairs.iter() {
            match &p.completion {
                Completion::Nullness(false) => self.edge(p, Target::Element(e)),
                Completion::Nullness(true) => out.push(p.clone()),
                c if c.is_normal() => {
                    self.edge(p, Target::Element(e));
                    out.push(p.clone());
                }
                _ => out.push(p.clone()),
            }
        }
        for c in value_completions(self.ast, e) {
            out.push(LastPair::new(e, c));
        }
        out
    }

    /// Children in index order, then the node itself with its own
    /// completions.
    fn wire_post_order(
        &mut self,
        e: ElementId,
        children: &[ElementId],
        kind: &ElementKind,
    ) -> Vec<LastPair> {
        let mut out = Vec::new();
        for (i, &child) in children.iter().enumerate() {
            let next = children.get(i + 1).map_or(e, |&n| self.first(n));
            let pairs = self.lasts(child);
            for p in pairs.iter() {
                if p.completion.is_normal() {
                    self.edge(p, Target::Element(next));
                } else {
                    out.push(p.clone());
                }
            }
        }
        if let ElementKind::Call {
            never_returns: true,
            ..
        } = kind
        {
            out.push(LastPair::new(e, Completion::ExitAbrupt));
        } else {
            for c in value_completions(self.ast, e) {
                out.push(LastPair::new(e, c));
            }
        }
        out
    }
}

fn matches_label(requested: Option<&Label>, own: Option<&Label>) -> bool {
    match requested {
        None => true,
        Some(label) => own == Some(label),
    }
}
