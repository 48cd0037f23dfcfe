//! The completion model: how executing an element can finish.
//!
//! Most expressions complete with [`Completion::Simple`]; conditions and
//! logical operands complete with a boolean outcome, qualifiers of `?.` and
//! left operands of `??` with a nullness outcome, case and catch tests with
//! a matching outcome, and the foreach iteration test with an emptiness
//! outcome. Control-transfer statements complete exactly with their own
//! non-normal completion and never normally.
//!
//! The per-element validity predicate [`valid_for`] answers whether an
//! element's static kind can originate a given completion; the builder only
//! generates completions this predicate admits, which is what keeps
//! impossible nodes (a false branch of `while (true)`, a `catch` clause
//! that can never match) out of the graph.

use serde::Serialize;

use crate::ast::{Ast, CaseValue, ElementId, ElementKind, ExceptionName, Label};

/// How executing an element terminated.
///
/// The `Simple`, `Boolean`, `Nullness`, `Matching`, `Emptiness` and
/// `BreakNormal` variants form the normal-completion family: enclosing
/// constructs treat them uniformly as "fell through" while edges still
/// record the finer kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Completion {
    /// Completed normally with no other outcome.
    Simple,
    /// Completed with a boolean outcome.
    Boolean(bool),
    /// Completed with a nullness outcome; `true` means the value was null.
    Nullness(bool),
    /// A pattern or catch test succeeded (`true`) or failed (`false`).
    Matching(bool),
    /// The iteration test found the iterator exhausted (`true`) or not.
    Emptiness(bool),
    /// A `break` already resolved by its target loop or switch; normal for
    /// enclosing constructs, but the exit edge still records the break.
    BreakNormal,
    /// `return` crossing out of the callable.
    Return,
    /// Unresolved `break`, optionally labeled.
    Break(Option<Label>),
    /// Unresolved `continue`, optionally labeled.
    Continue(Option<Label>),
    /// Unresolved `goto` to a label.
    Goto(Label),
    /// Unresolved `goto case`.
    GotoCase(CaseValue),
    /// Unresolved `goto default`.
    GotoDefault,
    /// An exception of the given type is propagating.
    Throw(ExceptionName),
    /// A non-returning call terminated the process; never unwinds, so it
    /// bypasses `finally` redirection.
    ExitAbrupt,
}

impl Completion {
    /// Whether this completion belongs to the normal family, i.e. enclosing
    /// constructs continue sequentially after it.
    #[must_use]
    pub fn is_normal(&self) -> bool {
        matches!(
            self,
            Self::Simple
                | Self::Boolean(_)
                | Self::Nullness(_)
                | Self::Matching(_)
                | Self::Emptiness(_)
                | Self::BreakNormal
        )
    }

    /// The successor type recorded on an edge resolving this completion.
    #[must_use]
    pub fn successor_type(&self) -> SuccessorType {
        match self {
            Self::Simple => SuccessorType::Normal,
            Self::Boolean(true) => SuccessorType::True,
            Self::Boolean(false) => SuccessorType::False,
            Self::Nullness(true) => SuccessorType::Null,
            Self::Nullness(false) => SuccessorType::NonNull,
            Self::Matching(true) => SuccessorType::Match,
            Self::Matching(false) => SuccessorType::NoMatch,
            Self::Emptiness(true) => SuccessorType::Empty,
            Self::Emptiness(false) => SuccessorType::NonEmpty,
            Self::Return => SuccessorType::Return,
            Self::Break(_) | Self::BreakNormal => SuccessorType::Break,
            Self::Continue(_) => SuccessorType::Continue,
            Self::Goto(_) => SuccessorType::GotoLabel,
            Self::GotoCase(_) => SuccessorType::GotoCase,
            Self::GotoDefault => SuccessorType::GotoDefault,
            Self::Throw(ty) => SuccessorType::Exception(ty.clone()),
            Self::ExitAbrupt => SuccessorType::ExitAbrupt,
        }
    }
}

/// Edge classification, mirroring completion kinds one-to-one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SuccessorType {
    /// Sequential fall-through.
    Normal,
    /// Condition evaluated to true.
    True,
    /// Condition evaluated to false.
    False,
    /// Qualifier or coalescing operand was null.
    Null,
    /// Qualifier or coalescing operand was non-null.
    NonNull,
    /// Pattern or catch test matched.
    Match,
    /// Pattern or catch test did not match.
    NoMatch,
    /// Iterator exhausted.
    Empty,
    /// Iterator produced an element.
    NonEmpty,
    /// Return to the caller.
    Return,
    /// Break out of a loop or switch.
    Break,
    /// Continue with the next iteration.
    Continue,
    /// Unstructured jump to a label.
    GotoLabel,
    /// Jump to a `case` section.
    GotoCase,
    /// Jump to the `default` section.
    GotoDefault,
    /// Exception of the given type propagating.
    Exception(ExceptionName),
    /// Process-terminating call.
    ExitAbrupt,
}

/// The value context an expression is evaluated in, derived from its
/// position within its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprContext {
    /// Plain value position.
    Value,
    /// Condition or logical-operand position; produces boolean outcomes.
    Boolean,
    /// Qualifier of `?.` or left operand of `??`; produces nullness outcomes.
    Nullness,
}

/// Context of `e`, from its position within its parent.
#[must_use]
pub fn expr_context(ast: &Ast, e: ElementId) -> ExprContext {
    let Some(parent) = ast.parent(e) else {
        return ExprContext::Value;
    };
    let Some(idx) = ast.child_index(e) else {
        return ExprContext::Value;
    };
    match ast.kind(parent) {
        ElementKind::If { .. } | ElementKind::While if idx == 0 => ExprContext::Boolean,
        ElementKind::DoWhile if idx == 1 => ExprContext::Boolean,
        ElementKind::For {
            has_init, has_cond, ..
        } if *has_cond && idx == usize::from(*has_init) => ExprContext::Boolean,
        ElementKind::LogicalAnd | ElementKind::LogicalOr | ElementKind::LogicalNot => {
            ExprContext::Boolean
        }
        ElementKind::Conditional if idx == 0 => ExprContext::Boolean,
        ElementKind::Conditional => expr_context(ast, parent),
        ElementKind::Coalesce if idx == 0 => ExprContext::Nullness,
        ElementKind::Coalesce => expr_context(ast, parent),
        ElementKind::CondAccess { .. } if idx == 0 => ExprContext::Nullness,
        _ => ExprContext::Value,
    }
}

/// The completions a value-producing element originates in the given
/// context. Boolean literals in boolean context yield only their own value.
#[must_use]
pub fn value_completions(ast: &Ast, e: ElementId) -> Vec<Completion> {
    match expr_context(ast, e) {
        ExprContext::Value => vec![Completion::Simple],
        ExprContext::Boolean => match ast.kind(e) {
            ElementKind::BoolLiteral { value } => vec![Completion::Boolean(*value)],
            _ => vec![Completion::Boolean(true), Completion::Boolean(false)],
        },
        ExprContext::Nullness => vec![Completion::Nullness(true), Completion::Nullness(false)],
    }
}

/// Whether `e`'s static kind can originate `completion`.
///
/// This covers origination only: a completion propagating through `e` from
/// a descendant (a `return` ending at the return value's last element, a
/// suspended completion resuming after a `finally`) is attributed to the
/// originating element, not to `e`.
#[must_use]
pub fn valid_for(ast: &Ast, e: ElementId, completion: &Completion) -> bool {
    match ast.kind(e) {
        ElementKind::Return => matches!(completion, Completion::Return),
        ElementKind::Break { label } => match completion {
            Completion::Break(l) => l == label,
            Completion::BreakNormal => true,
            _ => false,
        },
        ElementKind::Continue { label } => {
            matches!(completion, Completion::Continue(l) if l == label)
        }
        ElementKind::Goto { label } => {
            matches!(completion, Completion::Goto(l) if l == label)
        }
        ElementKind::GotoCase { value } => {
            matches!(completion, Completion::GotoCase(v) if v == value)
        }
        ElementKind::GotoDefault => matches!(completion, Completion::GotoDefault),
        ElementKind::Throw { .. } => matches!(completion, Completion::Throw(_)),
        ElementKind::Foreach { .. } => matches!(completion, Completion::Emptiness(_)),
        ElementKind::Case { .. } | ElementKind::Catch { .. } => {
            matches!(completion, Completion::Matching(_))
        }
        ElementKind::Call { never_returns, .. } if *never_returns => {
            matches!(completion, Completion::ExitAbrupt)
        }
        ElementKind::Block
        | ElementKind::If { .. }
        | ElementKind::While
        | ElementKind::DoWhile
        | ElementKind::For { .. }
        | ElementKind::Switch
        | ElementKind::Try { .. }
        | ElementKind::Labeled { .. }
        | ElementKind::LocalDecl { .. }
        | ElementKind::ExprStmt => matches!(completion, Completion::Simple),
        _ => value_completions(ast, e).contains(completion),
    }
}
