//! Typed AST facade consumed by the graph builder.
//!
//! Elements live in an arena owned by [`Ast`] and are addressed by
//! [`ElementId`]. Every element has a kind and positional children; both are
//! immutable once built. Non-evaluated type operands (the `T` of `is T`,
//! casts, catch clauses) are carried as data on the kind rather than as
//! children, so child order is exactly evaluation order.
//!
//! The facade also records declared exception supertype edges so the builder
//! can classify a thrown type against a caught type (see [`CatchMatch`]).

mod build;

use compact_str::CompactString;
use rustc_hash::FxHashMap;
use serde::Serialize;
use smallvec::SmallVec;

/// Index of an element in the [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ElementId(pub u32);

impl ElementId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Interned statement label.
pub type Label = CompactString;
/// Interned exception type name.
pub type ExceptionName = CompactString;
/// Interned type name of a non-evaluated type operand.
pub type TypeName = CompactString;
/// Constant value of a `case` pattern, compared textually.
pub type CaseValue = CompactString;

/// How a thrown exception type relates to a caught type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchMatch {
    /// The clause catches every value of the thrown type.
    Always,
    /// The clause catches some values of the thrown type (the caught type is
    /// a strict subtype of the thrown one).
    Maybe,
    /// The clause can never catch the thrown type.
    Never,
}

/// Statement and expression forms distinguished by the graph builder.
///
/// Child layout per kind is documented on the corresponding constructor in
/// the builder methods on [`Ast`]. Anything the builder does not model is
/// represented as [`ElementKind::Opaque`] and degrades to visiting children
/// in index order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ElementKind {
    /// Statement sequence; children are the statements in order.
    Block,
    /// `if` statement; children `[cond, then]` or `[cond, then, else]`.
    If {
        /// Whether an `else` branch is present as the third child.
        has_else: bool,
    },
    /// `while` loop; children `[cond, body]`.
    While,
    /// `do`/`while` loop; children `[body, cond]`.
    DoWhile,
    /// `for` loop; children `[init?, cond?, update?, body]` per the flags.
    For {
        /// An initializer expression is present.
        has_init: bool,
        /// A condition expression is present.
        has_cond: bool,
        /// An update expression is present.
        has_update: bool,
    },
    /// `foreach` loop; children `[iterable, body]`. The node itself stands
    /// for the iteration-emptiness test.
    Foreach {
        /// Name of the iteration variable.
        variable: CompactString,
    },
    /// `switch` statement; children `[scrutinee, case...]`.
    Switch,
    /// One `case` section of a switch; children are the section statements.
    /// `value: None` marks the `default` section.
    Case {
        /// Constant tested by this section, or `None` for `default`.
        value: Option<CaseValue>,
    },
    /// `try` statement; children `[body, catch..., finally?]`.
    Try {
        /// Number of catch-clause children following the body.
        catches: usize,
        /// Whether a `finally` block is present as the last child.
        has_finally: bool,
    },
    /// One catch clause; children `[body]`.
    Catch {
        /// Caught exception type.
        ty: ExceptionName,
    },
    /// Labeled statement; children `[stmt]`.
    Labeled {
        /// The label introduced by this statement.
        label: Label,
    },
    /// Local variable declaration; children `[initializer?]`.
    LocalDecl {
        /// Declared variable name.
        name: CompactString,
    },
    /// Expression statement; children `[expr]`.
    ExprStmt,
    /// `return` statement; children `[value?]`.
    Return,
    /// `break` statement, optionally labeled.
    Break {
        /// Target label, if any.
        label: Option<Label>,
    },
    /// `continue` statement, optionally labeled.
    Continue {
        /// Target label, if any.
        label: Option<Label>,
    },
    /// `goto` to a label in an enclosing block.
    Goto {
        /// Target label.
        label: Label,
    },
    /// `goto case` inside a switch section.
    GotoCase {
        /// Target case constant.
        value: CaseValue,
    },
    /// `goto default` inside a switch section.
    GotoDefault,
    /// `throw` statement; children `[expr?]`. `ty: None` is a rethrow and
    /// resolves its type from the lexically enclosing catch clause.
    Throw {
        /// Static type of the thrown exception, when known.
        ty: Option<ExceptionName>,
    },

    /// Non-boolean literal.
    Literal {
        /// Literal text, kept for diagnostics only.
        text: CompactString,
    },
    /// Boolean literal. In condition position only the matching branch
    /// completion is produced, so `while (true)` has no normal exit.
    BoolLiteral {
        /// The literal value.
        value: bool,
    },
    /// Name reference.
    Name {
        /// Referenced name.
        name: CompactString,
    },
    /// Unary operator; children `[operand]`.
    Unary {
        /// Operator spelling.
        op: CompactString,
    },
    /// Non-short-circuit binary operator; children `[left, right]`.
    Binary {
        /// Operator spelling.
        op: CompactString,
    },
    /// Short-circuit `&&`; children `[left, right]`.
    LogicalAnd,
    /// Short-circuit `||`; children `[left, right]`.
    LogicalOr,
    /// Logical negation; children `[operand]`.
    LogicalNot,
    /// Null-coalescing `??`; children `[left, right]`.
    Coalesce,
    /// Conditional expression `?:`; children `[cond, then, else]`.
    Conditional,
    /// Assignment; children `[target, value]`. The target is evaluated
    /// before the value. Compound assignments carry the operator and are
    /// treated as expanded (read, compute, store).
    Assign {
        /// Operator of a compound assignment (`+` for `+=`), or `None`.
        compound: Option<CompactString>,
    },
    /// Call expression; children are the arguments in evaluation order.
    Call {
        /// Called name, kept for diagnostics only.
        callee: CompactString,
        /// The call never returns (process-terminating).
        never_returns: bool,
    },
    /// Conditional member access `q?.member`; children `[qualifier]`.
    CondAccess {
        /// Accessed member name.
        member: CompactString,
    },
    /// Member access `q.member`; children `[qualifier]`.
    MemberAccess {
        /// Accessed member name.
        member: CompactString,
    },
    /// Index access; children `[target, index]`.
    IndexAccess,
    /// `is T` test; children `[operand]`, the type is not evaluated.
    IsExpr {
        /// Tested type.
        ty: TypeName,
    },
    /// Cast; children `[operand]`, the type is not evaluated.
    CastExpr {
        /// Target type.
        ty: TypeName,
    },
    /// `as T` conversion; children `[operand]`, the type is not evaluated.
    AsExpr {
        /// Target type.
        ty: TypeName,
    },
    /// Array creation; children are the explicit dimension length
    /// expressions, evaluated first.
    ArrayCreation,
    /// Unrecognized element form; children are visited in index order.
    Opaque,
}

/// One AST element: a kind plus positional children.
#[derive(Debug, Clone)]
pub struct Element {
    /// Structural kind of the element.
    pub kind: ElementKind,
    /// Children in evaluation-relevant order.
    pub children: Vec<ElementId>,
}

/// Arena of immutable AST elements plus declared exception subtyping.
#[derive(Debug, Default)]
pub struct Ast {
    elements: Vec<Element>,
    parents: Vec<Option<ElementId>>,
    supertypes: FxHashMap<ExceptionName, SmallVec<[ExceptionName; 1]>>,
}

/// Implicit root of the exception type hierarchy.
pub const EXCEPTION_ROOT: &str = "Exception";

impl Ast {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an element with the given kind and children.
    pub fn add(&mut self, kind: ElementKind, children: Vec<ElementId>) -> ElementId {
        let id = ElementId(u32::try_from(self.elements.len()).unwrap_or(u32::MAX));
        for &child in &children {
            self.parents[child.index()] = Some(id);
        }
        self.elements.push(Element { kind, children });
        self.parents.push(None);
        id
    }

    /// Number of elements in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the arena is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Kind of an element.
    #[must_use]
    pub fn kind(&self, id: ElementId) -> &ElementKind {
        &self.elements[id.index()].kind
    }

    /// Positional children of an element.
    #[must_use]
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        &self.elements[id.index()].children
    }

    /// Parent of an element, when it has one.
    #[must_use]
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.parents[id.index()]
    }

    /// Position of `child` within its parent's child list.
    #[must_use]
    pub fn child_index(&self, child: ElementId) -> Option<usize> {
        let parent = self.parent(child)?;
        self.children(parent).iter().position(|&c| c == child)
    }

    /// Declares `sub` to be a subtype of `sup` in the exception hierarchy.
    pub fn add_subtype(&mut self, sub: &str, sup: &str) {
        self.supertypes
            .entry(ExceptionName::from(sub))
            .or_default()
            .push(ExceptionName::from(sup));
    }

    /// Whether `sub` is `sup` or a declared (transitive) subtype of it.
    /// Every type is a subtype of the implicit [`EXCEPTION_ROOT`].
    #[must_use]
    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        if sub == sup || sup == EXCEPTION_ROOT {
            return true;
        }
        let mut stack: Vec<&str> = vec![sub];
        let mut seen: Vec<&str> = Vec::new();
        while let Some(ty) = stack.pop() {
            if seen.contains(&ty) {
                continue;
            }
            seen.push(ty);
            if let Some(sups) = self.supertypes.get(ty) {
                for s in sups {
                    if s.as_str() == sup {
                        return true;
                    }
                    stack.push(s.as_str());
                }
            }
        }
        false
    }

    /// Classifies a thrown type against a caught type.
    #[must_use]
    pub fn catch_match(&self, thrown: &str, caught: &str) -> CatchMatch {
        if self.is_subtype(thrown, caught) {
            CatchMatch::Always
        } else if self.is_subtype(caught, thrown) {
            CatchMatch::Maybe
        } else {
            CatchMatch::Never
        }
    }
}

/// A callable whose body the graph is built for.
///
/// A constructor initializer, when present, executes before the body.
#[derive(Debug, Clone)]
pub struct Callable {
    /// Callable name, used for diagnostics.
    pub name: CompactString,
    /// Body statement, normally a block.
    pub body: ElementId,
    /// Constructor initializer expression, if any.
    pub initializer: Option<ElementId>,
}

impl Callable {
    /// Creates a callable over `body`.
    #[must_use]
    pub fn new(name: &str, body: ElementId) -> Self {
        Self {
            name: CompactString::from(name),
            body,
            initializer: None,
        }
    }

    /// Attaches a constructor initializer that runs before the body.
    #[must_use]
    pub fn with_initializer(mut self, initializer: ElementId) -> Self {
        self.initializer = Some(initializer);
        self
    }
}
