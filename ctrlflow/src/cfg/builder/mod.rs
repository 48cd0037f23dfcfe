//! Graph construction: structural recursion over the AST followed by a
//! reachability fixpoint over split contexts.
//!
//! Construction runs in two phases. The first phase walks the AST once and
//! records *raw edges*: `(source element, successor type, guards, target)`
//! tuples derived from the `first`/`last` recursion in [`first_last`]. A
//! guard restricts an edge to node copies carrying (or lacking) a specific
//! split, which is how the several continuations of a `finally` block stay
//! apart. The second phase is a worklist traversal from the entry node that
//! interns `(element, split set)` pairs as nodes, follows only edges whose
//! guards the current splits satisfy, and recomputes the surviving split
//! set per edge. Elements never reached yield no nodes at all.

mod first_last;

use std::rc::Rc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::ast::{Ast, Callable, ElementId, ElementKind};

use super::completion::{Completion, SuccessorType};
use super::splits::{Split, SplitSet};
use super::types::{NodeData, NodeId, NodeKind};

/// Restriction of a raw edge to node copies with matching splits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Guard {
    /// The node must carry a finally split for `try_stmt` suspending
    /// exactly this completion.
    FinallyIs {
        try_stmt: ElementId,
        suspended: Completion,
    },
    /// The node must carry no finally split for `try_stmt`.
    NoFinally { try_stmt: ElementId },
    /// The node must carry a boolean split with this value.
    BoolIs(bool),
}

pub(crate) type Guards = SmallVec<[Guard; 1]>;

/// One entry of the `last` relation: a potential final element of some
/// construct, the completion it produces there, and the splits gating it.
#[derive(Debug, Clone)]
pub(crate) struct LastPair {
    pub at: ElementId,
    pub completion: Completion,
    pub guards: Guards,
}

impl LastPair {
    pub(crate) fn new(at: ElementId, completion: Completion) -> Self {
        Self {
            at,
            completion,
            guards: SmallVec::new(),
        }
    }
}

/// Where a raw edge leads.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Target {
    Element(ElementId),
    Exit,
}

/// A guarded edge between elements, prior to split resolution.
#[derive(Debug, Clone)]
pub(crate) struct RawEdge {
    pub ty: SuccessorType,
    pub guards: Guards,
    pub to: Target,
    /// Split attached to the target node, for edges entering a finally
    /// region with a suspended completion or a boolean-split element.
    pub push: Option<Split>,
}

/// The node graph before basic-block assembly.
#[derive(Debug)]
pub(crate) struct RawGraph {
    pub nodes: Vec<NodeData>,
    pub succs: Vec<Vec<(NodeId, SuccessorType)>>,
    pub preds: Vec<Vec<(NodeId, SuccessorType)>>,
    pub entry: NodeId,
    pub exit: NodeId,
}

pub(crate) struct Builder<'a> {
    ast: &'a Ast,
    edges: FxHashMap<ElementId, Vec<RawEdge>>,
    last_memo: FxHashMap<ElementId, Rc<Vec<LastPair>>>,
    /// Per element, the `try` statements whose finally block encloses it.
    enclosing_finallys: FxHashMap<ElementId, SmallVec<[ElementId; 1]>>,
    /// Per element, the catch clauses enclosing it, outermost first.
    enclosing_catches: FxHashMap<ElementId, SmallVec<[ElementId; 1]>>,
    /// Per bare rethrow, the innermost enclosing catch clause.
    rethrow_clause: FxHashMap<ElementId, ElementId>,
}

impl<'a> Builder<'a> {
    pub(crate) fn new(ast: &'a Ast) -> Self {
        Self {
            ast,
            edges: FxHashMap::default(),
            last_memo: FxHashMap::default(),
            enclosing_finallys: FxHashMap::default(),
            enclosing_catches: FxHashMap::default(),
            rethrow_clause: FxHashMap::default(),
        }
    }

    /// Builds the node graph for `callable`.
    pub(crate) fn run(mut self, callable: &Callable) -> RawGraph {
        tracing::trace!(callable = %callable.name, "building control-flow graph");
        self.scan_regions(callable.body);
        if let Some(init) = callable.initializer {
            self.scan_regions(init);
        }

        // The constructor initializer, when present, runs before the body.
        let start = callable.initializer.unwrap_or(callable.body);
        let entry_target = self.first(start);

        if let Some(init) = callable.initializer {
            let body_first = self.first(callable.body);
            let pairs = self.lasts(init);
            for p in pairs.iter() {
                if p.completion.is_normal() {
                    self.edge(p, Target::Element(body_first));
                } else {
                    self.exit_pair(p, &callable.name);
                }
            }
        }
        let body_pairs = self.lasts(callable.body);
        for p in body_pairs.iter() {
            self.exit_pair(p, &callable.name);
        }

        self.traverse(entry_target)
    }

    /// Emits the callable-exit edge for a completion escaping the body.
    /// Unstructured jumps never cross a callable boundary; one surviving to
    /// this point is an internal consistency bug upstream, reported loudly
    /// in debug builds and dropped in release builds.
    fn exit_pair(&mut self, p: &LastPair, callable: &str) {
        match &p.completion {
            Completion::Break(_)
            | Completion::Continue(_)
            | Completion::Goto(_)
            | Completion::GotoCase(_)
            | Completion::GotoDefault => {
                tracing::warn!(
                    callable,
                    completion = ?p.completion,
                    "unresolved jump reached the callable boundary; dropping edge"
                );
                debug_assert!(
                    false,
                    "unresolved jump completion at callable exit: {:?}",
                    p.completion
                );
            }
            _ => self.raw(
                p.at,
                p.completion.successor_type(),
                p.guards.clone(),
                Target::Exit,
                None,
            ),
        }
    }

    pub(crate) fn raw(
        &mut self,
        from: ElementId,
        ty: SuccessorType,
        guards: Guards,
        to: Target,
        push: Option<Split>,
    ) {
        self.edges
            .entry(from)
            .or_default()
            .push(RawEdge { ty, guards, to, push });
    }

    pub(crate) fn edge(&mut self, p: &LastPair, to: Target) {
        self.raw(p.at, p.completion.successor_type(), p.guards.clone(), to, None);
    }

    pub(crate) fn edge_push(&mut self, p: &LastPair, to: Target, push: Split) {
        self.raw(
            p.at,
            p.completion.successor_type(),
            p.guards.clone(),
            to,
            Some(push),
        );
    }

    /// Pre-order entry edge from a statement to its first executed child.
    pub(crate) fn marker(&mut self, stmt: ElementId, child: ElementId) {
        let target = self.first(child);
        self.raw(
            stmt,
            SuccessorType::Normal,
            SmallVec::new(),
            Target::Element(target),
            None,
        );
    }

    /// Records, for every element under `root`, the finally regions and
    /// catch clauses lexically enclosing it, and resolves bare rethrows to
    /// their clause.
    fn scan_regions(&mut self, root: ElementId) {
        let mut finallys = Vec::new();
        let mut catches = Vec::new();
        self.scan_element(root, &mut finallys, &mut catches);
    }

    fn scan_element(
        &mut self,
        e: ElementId,
        finallys: &mut Vec<ElementId>,
        catches: &mut Vec<ElementId>,
    ) {
        let ast = self.ast;
        let entered_catch = matches!(ast.kind(e), ElementKind::Catch { .. });
        if entered_catch {
            catches.push(e);
        }
        let mut entered_finally = None;
        if let Some(parent) = ast.parent(e) {
            if let ElementKind::Try {
                has_finally: true, ..
            } = ast.kind(parent)
            {
                if ast.children(parent).last() == Some(&e) {
                    entered_finally = Some(parent);
                }
            }
        }
        if let Some(try_stmt) = entered_finally {
            finallys.push(try_stmt);
        }

        if !finallys.is_empty() {
            self.enclosing_finallys
                .insert(e, SmallVec::from_slice(finallys));
        }
        if !catches.is_empty() {
            self.enclosing_catches
                .insert(e, SmallVec::from_slice(catches));
        }
        if let ElementKind::Throw { ty: None } = ast.kind(e) {
            if let Some(&clause) = catches.last() {
                self.rethrow_clause.insert(e, clause);
            }
        }

        for &child in ast.children(e) {
            self.scan_element(child, finallys, catches);
        }

        if entered_finally.is_some() {
            finallys.pop();
        }
        if entered_catch {
            catches.pop();
        }
    }

    /// The split set of a node for `target`, reached from a node carrying
    /// `current` over an edge attaching `push`. Finally splits survive only
    /// while the target stays inside their finally block, handler splits
    /// are recomputed from the target's lexical position, and boolean
    /// splits never outlive their single element.
    fn splits_for(
        &self,
        target: ElementId,
        current: &SplitSet,
        push: Option<&Split>,
    ) -> SplitSet {
        let mut out: SmallVec<[Split; 2]> = SmallVec::new();
        for split in current {
            if let Split::Finally { try_stmt, .. } = split {
                let inside = self
                    .enclosing_finallys
                    .get(&target)
                    .is_some_and(|v| v.contains(try_stmt));
                if inside {
                    out.push(split.clone());
                }
            }
        }
        if let Some(clauses) = self.enclosing_catches.get(&target) {
            for &clause in clauses {
                out.push(Split::Handler { clause });
            }
        }
        if let Some(split) = push {
            out.push(split.clone());
        }
        SplitSet::from_splits(out)
    }

    /// Worklist fixpoint over `(element, splits)` nodes reachable from the
    /// entry node; only reached nodes materialize.
    fn traverse(self, entry_target: ElementId) -> RawGraph {
        let entry = NodeId(0);
        let exit = NodeId(1);
        let mut nodes = vec![
            NodeData {
                kind: NodeKind::Entry,
                splits: SplitSet::empty(),
            },
            NodeData {
                kind: NodeKind::Exit,
                splits: SplitSet::empty(),
            },
        ];
        let mut succs: Vec<Vec<(NodeId, SuccessorType)>> = vec![Vec::new(), Vec::new()];
        let mut preds: Vec<Vec<(NodeId, SuccessorType)>> = vec![Vec::new(), Vec::new()];
        let mut interned: FxHashMap<(ElementId, SplitSet), NodeId> = FxHashMap::default();
        let mut work: Vec<NodeId> = Vec::new();

        let first_splits = self.splits_for(entry_target, &SplitSet::empty(), None);
        let first_node = intern(
            &mut nodes,
            &mut succs,
            &mut preds,
            &mut interned,
            &mut work,
            entry_target,
            first_splits,
        );
        add_edge(&mut succs, &mut preds, entry, first_node, SuccessorType::Normal);

        while let Some(node) = work.pop() {
            let NodeKind::Element(element) = nodes[node.index()].kind else {
                continue;
            };
            let splits = nodes[node.index()].splits.clone();
            let Some(raw_edges) = self.edges.get(&element) else {
                continue;
            };
            for raw in raw_edges {
                if !guards_ok(&raw.guards, &splits) {
                    continue;
                }
                match raw.to {
                    Target::Exit => {
                        add_edge(&mut succs, &mut preds, node, exit, raw.ty.clone());
                    }
                    Target::Element(target) => {
                        let target_splits =
                            self.splits_for(target, &splits, raw.push.as_ref());
                        let target_node = intern(
                            &mut nodes,
                            &mut succs,
                            &mut preds,
                            &mut interned,
                            &mut work,
                            target,
                            target_splits,
                        );
                        add_edge(&mut succs, &mut preds, node, target_node, raw.ty.clone());
                    }
                }
            }
        }

        RawGraph {
            nodes,
            succs,
            preds,
            entry,
            exit,
        }
    }
}

fn guards_ok(guards: &Guards, splits: &SplitSet) -> bool {
    guards.iter().all(|guard| match guard {
        Guard::FinallyIs {
            try_stmt,
            suspended,
        } => splits.suspended_for(*try_stmt) == Some(suspended),
        Guard::NoFinally { try_stmt } => !splits.has_finally_for(*try_stmt),
        Guard::BoolIs(value) => splits.bool_value() == Some(*value),
    })
}

fn intern(
    nodes: &mut Vec<NodeData>,
    succs: &mut Vec<Vec<(NodeId, SuccessorType)>>,
    preds: &mut Vec<Vec<(NodeId, SuccessorType)>>,
    interned: &mut FxHashMap<(ElementId, SplitSet), NodeId>,
    work: &mut Vec<NodeId>,
    element: ElementId,
    splits: SplitSet,
) -> NodeId {
    if let Some(&id) = interned.get(&(element, splits.clone())) {
        return id;
    }
    let id = NodeId(u32::try_from(nodes.len()).unwrap_or(u32::MAX));
    nodes.push(NodeData {
        kind: NodeKind::Element(element),
        splits: splits.clone(),
    });
    succs.push(Vec::new());
    preds.push(Vec::new());
    interned.insert((element, splits), id);
    work.push(id);
    id
}

fn add_edge(
    succs: &mut [Vec<(NodeId, SuccessorType)>],
    preds: &mut [Vec<(NodeId, SuccessorType)>],
    from: NodeId,
    to: NodeId,
    ty: SuccessorType,
) {
    if !succs[from.index()].contains(&(to, ty.clone())) {
        succs[from.index()].push((to, ty.clone()));
        preds[to.index()].push((from, ty));
    }
}
