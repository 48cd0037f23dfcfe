//! Builder methods for constructing well-formed elements.
//!
//! Used by tests and by embedding front-ends. Each method documents the
//! child layout it produces; the `default` section of a switch, when
//! present, must be the last section.

use compact_str::CompactString;

use super::{Ast, CaseValue, ElementId, ElementKind};

impl Ast {
    /// Name reference.
    pub fn name(&mut self, name: &str) -> ElementId {
        self.add(
            ElementKind::Name {
                name: CompactString::from(name),
            },
            vec![],
        )
    }

    /// Non-boolean literal.
    pub fn lit(&mut self, text: &str) -> ElementId {
        self.add(
            ElementKind::Literal {
                text: CompactString::from(text),
            },
            vec![],
        )
    }

    /// Boolean literal.
    pub fn bool_lit(&mut self, value: bool) -> ElementId {
        self.add(ElementKind::BoolLiteral { value }, vec![])
    }

    /// Statement block.
    pub fn block(&mut self, stmts: Vec<ElementId>) -> ElementId {
        self.add(ElementKind::Block, stmts)
    }

    /// `if` without `else`.
    pub fn if_stmt(&mut self, cond: ElementId, then: ElementId) -> ElementId {
        self.add(ElementKind::If { has_else: false }, vec![cond, then])
    }

    /// `if` with `else`.
    pub fn if_else(&mut self, cond: ElementId, then: ElementId, els: ElementId) -> ElementId {
        self.add(ElementKind::If { has_else: true }, vec![cond, then, els])
    }

    /// `while` loop.
    pub fn while_stmt(&mut self, cond: ElementId, body: ElementId) -> ElementId {
        self.add(ElementKind::While, vec![cond, body])
    }

    /// `do`/`while` loop.
    pub fn do_while(&mut self, body: ElementId, cond: ElementId) -> ElementId {
        self.add(ElementKind::DoWhile, vec![body, cond])
    }

    /// `for` loop; any of the three header expressions may be absent.
    pub fn for_stmt(
        &mut self,
        init: Option<ElementId>,
        cond: Option<ElementId>,
        update: Option<ElementId>,
        body: ElementId,
    ) -> ElementId {
        let mut children = Vec::with_capacity(4);
        children.extend(init);
        children.extend(cond);
        children.extend(update);
        children.push(body);
        self.add(
            ElementKind::For {
                has_init: init.is_some(),
                has_cond: cond.is_some(),
                has_update: update.is_some(),
            },
            children,
        )
    }

    /// `foreach` loop over `iterable`.
    pub fn foreach(&mut self, variable: &str, iterable: ElementId, body: ElementId) -> ElementId {
        self.add(
            ElementKind::Foreach {
                variable: CompactString::from(variable),
            },
            vec![iterable, body],
        )
    }

    /// `switch` statement over already-built case sections.
    pub fn switch(&mut self, scrutinee: ElementId, cases: Vec<ElementId>) -> ElementId {
        debug_assert!(
            cases
                .iter()
                .position(|&c| matches!(self.kind(c), ElementKind::Case { value: None }))
                .map_or(true, |i| i + 1 == cases.len()),
            "default section must be the last section of a switch"
        );
        let mut children = Vec::with_capacity(cases.len() + 1);
        children.push(scrutinee);
        children.extend(cases);
        self.add(ElementKind::Switch, children)
    }

    /// One `case` section.
    pub fn case(&mut self, value: &str, stmts: Vec<ElementId>) -> ElementId {
        self.add(
            ElementKind::Case {
                value: Some(CaseValue::from(value)),
            },
            stmts,
        )
    }

    /// The `default` section; must come last in the switch.
    pub fn default_case(&mut self, stmts: Vec<ElementId>) -> ElementId {
        self.add(ElementKind::Case { value: None }, stmts)
    }

    /// `try` with catch clauses and an optional `finally` block.
    pub fn try_stmt(
        &mut self,
        body: ElementId,
        catches: Vec<ElementId>,
        finally: Option<ElementId>,
    ) -> ElementId {
        let n = catches.len();
        let mut children = Vec::with_capacity(n + 2);
        children.push(body);
        children.extend(catches);
        let has_finally = finally.is_some();
        children.extend(finally);
        self.add(
            ElementKind::Try {
                catches: n,
                has_finally,
            },
            children,
        )
    }

    /// One catch clause.
    pub fn catch_clause(&mut self, ty: &str, body: ElementId) -> ElementId {
        self.add(
            ElementKind::Catch {
                ty: CompactString::from(ty),
            },
            vec![body],
        )
    }

    /// Labeled statement.
    pub fn labeled(&mut self, label: &str, stmt: ElementId) -> ElementId {
        self.add(
            ElementKind::Labeled {
                label: CompactString::from(label),
            },
            vec![stmt],
        )
    }

    /// Local variable declaration with an optional initializer.
    pub fn local_decl(&mut self, name: &str, init: Option<ElementId>) -> ElementId {
        self.add(
            ElementKind::LocalDecl {
                name: CompactString::from(name),
            },
            init.into_iter().collect(),
        )
    }

    /// Expression statement.
    pub fn expr_stmt(&mut self, expr: ElementId) -> ElementId {
        self.add(ElementKind::ExprStmt, vec![expr])
    }

    /// `return` without a value.
    pub fn ret(&mut self) -> ElementId {
        self.add(ElementKind::Return, vec![])
    }

    /// `return` with a value.
    pub fn ret_val(&mut self, value: ElementId) -> ElementId {
        self.add(ElementKind::Return, vec![value])
    }

    /// Unlabeled `break`.
    pub fn brk(&mut self) -> ElementId {
        self.add(ElementKind::Break { label: None }, vec![])
    }

    /// Labeled `break`.
    pub fn brk_to(&mut self, label: &str) -> ElementId {
        self.add(
            ElementKind::Break {
                label: Some(CompactString::from(label)),
            },
            vec![],
        )
    }

    /// Unlabeled `continue`.
    pub fn cont(&mut self) -> ElementId {
        self.add(ElementKind::Continue { label: None }, vec![])
    }

    /// Labeled `continue`.
    pub fn cont_to(&mut self, label: &str) -> ElementId {
        self.add(
            ElementKind::Continue {
                label: Some(CompactString::from(label)),
            },
            vec![],
        )
    }

    /// `goto` a label.
    pub fn goto(&mut self, label: &str) -> ElementId {
        self.add(
            ElementKind::Goto {
                label: CompactString::from(label),
            },
            vec![],
        )
    }

    /// `goto case` a constant.
    pub fn goto_case(&mut self, value: &str) -> ElementId {
        self.add(
            ElementKind::GotoCase {
                value: CaseValue::from(value),
            },
            vec![],
        )
    }

    /// `goto default`.
    pub fn goto_default(&mut self) -> ElementId {
        self.add(ElementKind::GotoDefault, vec![])
    }

    /// `throw` of an exception type, with an optional construction expression.
    pub fn throw(&mut self, ty: &str, expr: Option<ElementId>) -> ElementId {
        self.add(
            ElementKind::Throw {
                ty: Some(CompactString::from(ty)),
            },
            expr.into_iter().collect(),
        )
    }

    /// Bare rethrow inside a catch clause.
    pub fn rethrow(&mut self) -> ElementId {
        self.add(ElementKind::Throw { ty: None }, vec![])
    }

    /// Unary operator application.
    pub fn unary(&mut self, op: &str, operand: ElementId) -> ElementId {
        self.add(
            ElementKind::Unary {
                op: CompactString::from(op),
            },
            vec![operand],
        )
    }

    /// Non-short-circuit binary operator application.
    pub fn binary(&mut self, op: &str, left: ElementId, right: ElementId) -> ElementId {
        self.add(
            ElementKind::Binary {
                op: CompactString::from(op),
            },
            vec![left, right],
        )
    }

    /// Short-circuit `&&`.
    pub fn and(&mut self, left: ElementId, right: ElementId) -> ElementId {
        self.add(ElementKind::LogicalAnd, vec![left, right])
    }

    /// Short-circuit `||`.
    pub fn or(&mut self, left: ElementId, right: ElementId) -> ElementId {
        self.add(ElementKind::LogicalOr, vec![left, right])
    }

    /// Logical negation.
    pub fn not(&mut self, operand: ElementId) -> ElementId {
        self.add(ElementKind::LogicalNot, vec![operand])
    }

    /// Null-coalescing `??`.
    pub fn coalesce(&mut self, left: ElementId, right: ElementId) -> ElementId {
        self.add(ElementKind::Coalesce, vec![left, right])
    }

    /// Conditional expression `?:`.
    pub fn conditional(&mut self, cond: ElementId, then: ElementId, els: ElementId) -> ElementId {
        self.add(ElementKind::Conditional, vec![cond, then, els])
    }

    /// Simple assignment; the target is evaluated before the value.
    pub fn assign(&mut self, target: ElementId, value: ElementId) -> ElementId {
        self.add(ElementKind::Assign { compound: None }, vec![target, value])
    }

    /// Compound assignment such as `+=`, treated as expanded.
    pub fn compound_assign(&mut self, op: &str, target: ElementId, value: ElementId) -> ElementId {
        self.add(
            ElementKind::Assign {
                compound: Some(CompactString::from(op)),
            },
            vec![target, value],
        )
    }

    /// Call expression.
    pub fn call(&mut self, callee: &str, args: Vec<ElementId>) -> ElementId {
        self.add(
            ElementKind::Call {
                callee: CompactString::from(callee),
                never_returns: false,
            },
            args,
        )
    }

    /// Call of a function that never returns.
    pub fn call_never_returns(&mut self, callee: &str, args: Vec<ElementId>) -> ElementId {
        self.add(
            ElementKind::Call {
                callee: CompactString::from(callee),
                never_returns: true,
            },
            args,
        )
    }

    /// Conditional member access `qualifier?.member`.
    pub fn cond_access(&mut self, qualifier: ElementId, member: &str) -> ElementId {
        self.add(
            ElementKind::CondAccess {
                member: CompactString::from(member),
            },
            vec![qualifier],
        )
    }

    /// Member access `qualifier.member`.
    pub fn member(&mut self, qualifier: ElementId, member: &str) -> ElementId {
        self.add(
            ElementKind::MemberAccess {
                member: CompactString::from(member),
            },
            vec![qualifier],
        )
    }

    /// Index access.
    pub fn index(&mut self, target: ElementId, idx: ElementId) -> ElementId {
        self.add(ElementKind::IndexAccess, vec![target, idx])
    }

    /// `is T` test; the type operand is not evaluated.
    pub fn is_expr(&mut self, operand: ElementId, ty: &str) -> ElementId {
        self.add(
            ElementKind::IsExpr {
                ty: CompactString::from(ty),
            },
            vec![operand],
        )
    }

    /// Cast; the type operand is not evaluated.
    pub fn cast(&mut self, operand: ElementId, ty: &str) -> ElementId {
        self.add(
            ElementKind::CastExpr {
                ty: CompactString::from(ty),
            },
            vec![operand],
        )
    }

    /// `as T` conversion; the type operand is not evaluated.
    pub fn as_expr(&mut self, operand: ElementId, ty: &str) -> ElementId {
        self.add(
            ElementKind::AsExpr {
                ty: CompactString::from(ty),
            },
            vec![operand],
        )
    }

    /// Array creation with explicit dimension length expressions.
    pub fn array_new(&mut self, dims: Vec<ElementId>) -> ElementId {
        self.add(ElementKind::ArrayCreation, dims)
    }

    /// Unrecognized element form with children visited in index order.
    pub fn opaque(&mut self, children: Vec<ElementId>) -> ElementId {
        self.add(ElementKind::Opaque, children)
    }
}
