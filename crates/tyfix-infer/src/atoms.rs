//! The resolved-atom forest of one call.
//!
//! Atoms live in an [`AtomArena`] and refer to each other by [`AtomId`].
//! A node's children only become visible once the node is analyzed, so
//! every traversal here descends into analyzed nodes only and has to be
//! re-run whenever an analysis may have revealed new atoms.

use rustc_hash::FxHashSet;
use tyfix_types::{AtomId, Ty, TyVid};

/// A fully resolved call together with the variables its generic
/// instantiation introduced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCallAtom {
    pub callee: String,
    pub fresh_variables: Vec<TyVid>,
    pub return_type: Ty,
}

/// A callable reference whose candidate has been chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCallableReferenceAtom {
    pub reference: String,
    pub candidate_type: Ty,
    pub fresh_variables: Vec<TyVid>,
}

/// Placeholder atom owning a single variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubResolvedAtom {
    pub variable: TyVid,
}

/// A lambda with a function-shaped signature.
///
/// It is postponed until an analyzer has checked its body against
/// `parameters` and `return_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLambdaAtom {
    /// Source text of the lambda, used by analyzers and diagnostics.
    pub label: String,
    pub parameters: Vec<Ty>,
    pub return_type: Ty,
    /// Set when `return_type` is a variable minted for this lambda.
    pub return_type_variable: Option<TyVid>,
    /// Variables minted for parameters nobody could tell the type of.
    pub parameter_variables: Vec<TyVid>,
    pub is_return_argument_of_another_lambda: bool,
}

impl ResolvedLambdaAtom {
    pub fn function_type(&self) -> Ty {
        Ty::function(self.parameters.clone(), self.return_type.clone())
    }
}

/// Parameter and return variables minted for a lambda during `PARTIAL`
/// completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticSignature {
    /// Declared parameter types, with fresh variables for unknown ones.
    pub parameters: Vec<Ty>,
    pub return_type: TyVid,
    /// The variables created for unknown parameters, in parameter order.
    pub fresh_parameters: Vec<TyVid>,
}

impl SyntheticSignature {
    pub fn function_type(&self) -> Ty {
        Ty::function(self.parameters.clone(), Ty::Var(self.return_type))
    }

    pub fn variables(&self) -> impl Iterator<Item = TyVid> + '_ {
        self.fresh_parameters.iter().copied().chain(std::iter::once(self.return_type))
    }
}

/// A lambda whose expected type is still a bare type variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaWithTypeVariableAsExpectedTypeAtom {
    pub label: String,
    pub expected_type: Ty,
    /// Explicitly written parameters; `None` marks one without a type.
    pub parameters: Vec<Option<Ty>>,
    pub synthetic: Option<SyntheticSignature>,
    pub is_return_argument_of_another_lambda: bool,
}

impl LambdaWithTypeVariableAsExpectedTypeAtom {
    pub fn has_unknown_parameters(&self) -> bool {
        self.parameters.iter().any(Option::is_none)
    }
}

/// A callable reference waiting for its expected type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostponedCallableReferenceAtom {
    pub reference: String,
    pub expected_type: Option<Ty>,
    pub return_type_variable: Option<TyVid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallableReferenceWithTypeVariableAsExpectedTypeAtom {
    pub reference: String,
    pub expected_type: Ty,
}

/// An argument whose checking was deferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostponedResolvedAtom {
    Lambda(ResolvedLambdaAtom),
    LambdaWithTypeVariableAsExpectedType(LambdaWithTypeVariableAsExpectedTypeAtom),
    CallableReference(PostponedCallableReferenceAtom),
    CallableReferenceWithTypeVariableAsExpectedType(CallableReferenceWithTypeVariableAsExpectedTypeAtom),
}

impl PostponedResolvedAtom {
    pub fn expected_type(&self) -> Option<Ty> {
        match self {
            PostponedResolvedAtom::Lambda(lambda) => Some(lambda.function_type()),
            PostponedResolvedAtom::LambdaWithTypeVariableAsExpectedType(lambda) => Some(lambda.expected_type.clone()),
            PostponedResolvedAtom::CallableReference(reference) => reference.expected_type.clone(),
            PostponedResolvedAtom::CallableReferenceWithTypeVariableAsExpectedType(reference) => {
                Some(reference.expected_type.clone())
            }
        }
    }

    /// The variable standing for the whole expected type, for the kinds that
    /// are waiting on one.
    pub fn expected_type_variable(&self) -> Option<TyVid> {
        match self {
            PostponedResolvedAtom::LambdaWithTypeVariableAsExpectedType(lambda) => lambda.expected_type.as_var(),
            PostponedResolvedAtom::CallableReferenceWithTypeVariableAsExpectedType(reference) => {
                reference.expected_type.as_var()
            }
            _ => None,
        }
    }

    /// Types that must be known before this atom can be analyzed.
    pub fn input_types(&self) -> Vec<Ty> {
        match self {
            PostponedResolvedAtom::Lambda(lambda) => lambda.parameters.clone(),
            PostponedResolvedAtom::LambdaWithTypeVariableAsExpectedType(lambda) => vec![lambda.expected_type.clone()],
            PostponedResolvedAtom::CallableReference(reference) => match &reference.expected_type {
                Some(expected) => match expected.as_function() {
                    Some((params, _)) => params.to_vec(),
                    None => vec![expected.clone()],
                },
                None => Vec::new(),
            },
            PostponedResolvedAtom::CallableReferenceWithTypeVariableAsExpectedType(reference) => {
                vec![reference.expected_type.clone()]
            }
        }
    }

    /// The type this atom produces once analyzed, if it is known to be one.
    pub fn output_type(&self) -> Option<Ty> {
        match self {
            PostponedResolvedAtom::Lambda(lambda) => Some(lambda.return_type.clone()),
            PostponedResolvedAtom::CallableReference(reference) => reference
                .expected_type
                .as_ref()
                .and_then(|expected| expected.as_function().map(|(_, ret)| ret.clone())),
            PostponedResolvedAtom::LambdaWithTypeVariableAsExpectedType(_)
            | PostponedResolvedAtom::CallableReferenceWithTypeVariableAsExpectedType(_) => None,
        }
    }

    pub fn is_return_argument_of_another_lambda(&self) -> bool {
        match self {
            PostponedResolvedAtom::Lambda(lambda) => lambda.is_return_argument_of_another_lambda,
            PostponedResolvedAtom::LambdaWithTypeVariableAsExpectedType(lambda) => {
                lambda.is_return_argument_of_another_lambda
            }
            _ => false,
        }
    }

    pub fn is_callable_reference(&self) -> bool {
        matches!(
            self,
            PostponedResolvedAtom::CallableReference(_)
                | PostponedResolvedAtom::CallableReferenceWithTypeVariableAsExpectedType(_)
        )
    }

    pub fn is_lambda_with_type_variable(&self) -> bool {
        matches!(self, PostponedResolvedAtom::LambdaWithTypeVariableAsExpectedType(_))
    }

    fn collect_introduced_variables(&self, out: &mut Vec<TyVid>) {
        match self {
            PostponedResolvedAtom::Lambda(lambda) => {
                out.extend(lambda.parameter_variables.iter().copied());
                out.extend(lambda.return_type_variable);
            }
            PostponedResolvedAtom::LambdaWithTypeVariableAsExpectedType(lambda) => {
                if let Some(synthetic) = &lambda.synthetic {
                    out.extend(synthetic.variables());
                }
            }
            PostponedResolvedAtom::CallableReference(reference) => out.extend(reference.return_type_variable),
            PostponedResolvedAtom::CallableReferenceWithTypeVariableAsExpectedType(_) => {}
        }
    }
}

/// One argument of a call, or the call itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedAtom {
    Call(ResolvedCallAtom),
    CallableReference(ResolvedCallableReferenceAtom),
    Stub(StubResolvedAtom),
    Postponed(PostponedResolvedAtom),
}

impl ResolvedAtom {
    pub fn is_postponed(&self) -> bool {
        matches!(self, ResolvedAtom::Postponed(_))
    }

    pub fn as_postponed(&self) -> Option<&PostponedResolvedAtom> {
        match self {
            ResolvedAtom::Postponed(postponed) => Some(postponed),
            _ => None,
        }
    }

    /// Variables created on behalf of this atom, in declaration order.
    pub fn introduced_variables(&self) -> Vec<TyVid> {
        let mut out = Vec::new();
        match self {
            ResolvedAtom::Call(call) => out.extend(call.fresh_variables.iter().copied()),
            ResolvedAtom::CallableReference(reference) => out.extend(reference.fresh_variables.iter().copied()),
            ResolvedAtom::Stub(stub) => out.push(stub.variable),
            ResolvedAtom::Postponed(postponed) => postponed.collect_introduced_variables(&mut out),
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomNode {
    pub atom: ResolvedAtom,
    analyzed: bool,
    sub_atoms: Vec<AtomId>,
}

impl AtomNode {
    pub fn analyzed(&self) -> bool {
        self.analyzed
    }

    pub fn sub_atoms(&self) -> &[AtomId] {
        &self.sub_atoms
    }
}

/// Owner of every atom of a completion, including those revealed while it
/// runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomArena {
    nodes: Vec<AtomNode>,
}

impl AtomArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a root-level atom. Postponed atoms start out unanalyzed, all
    /// others are considered analyzed from the start.
    pub fn alloc(&mut self, atom: ResolvedAtom) -> AtomId {
        let id = AtomId(self.nodes.len() as u32);
        let analyzed = !atom.is_postponed();
        self.nodes.push(AtomNode {
            atom,
            analyzed,
            sub_atoms: Vec::new(),
        });
        id
    }

    /// Adds an atom as the last child of `parent`.
    pub fn alloc_child(&mut self, parent: AtomId, atom: ResolvedAtom) -> AtomId {
        let id = self.alloc(atom);
        self.add_sub_atom(parent, id);
        id
    }

    fn add_sub_atom(&mut self, parent: AtomId, child: AtomId) {
        self.nodes[parent.index()].sub_atoms.push(child);
    }

    fn node(&self, id: AtomId) -> &AtomNode {
        &self.nodes[id.index()]
    }

    pub fn atom(&self, id: AtomId) -> &ResolvedAtom {
        &self.nodes[id.index()].atom
    }

    pub fn atom_mut(&mut self, id: AtomId) -> &mut ResolvedAtom {
        &mut self.nodes[id.index()].atom
    }

    pub fn postponed(&self, id: AtomId) -> Option<&PostponedResolvedAtom> {
        self.atom(id).as_postponed()
    }

    pub fn is_analyzed(&self, id: AtomId) -> bool {
        self.nodes[id.index()].analyzed
    }

    pub fn mark_analyzed(&mut self, id: AtomId) {
        self.nodes[id.index()].analyzed = true;
    }

    pub fn sub_atoms(&self, id: AtomId) -> &[AtomId] {
        &self.nodes[id.index()].sub_atoms
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn analyzed_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.analyzed).count()
    }

    /// Depth-first pre-order walk from `roots`, entering the children of
    /// analyzed atoms only. Each atom is visited at most once.
    pub fn preorder(&self, roots: &[AtomId]) -> Vec<AtomId> {
        let mut visited = FxHashSet::default();
        let mut order = Vec::new();
        let mut stack: Vec<AtomId> = roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            order.push(id);
            let node = self.node(id);
            if node.analyzed {
                stack.extend(node.sub_atoms.iter().rev().copied());
            }
        }
        order
    }
}

/// Every variable introduced by the atoms reachable from `roots`, in
/// traversal order and without duplicates.
pub fn ordered_type_variables(arena: &AtomArena, roots: &[AtomId]) -> Vec<TyVid> {
    let mut seen = FxHashSet::default();
    arena
        .preorder(roots)
        .into_iter()
        .flat_map(|id| arena.atom(id).introduced_variables())
        .filter(|var| seen.insert(*var))
        .collect()
}

pub fn ordered_not_analyzed_postponed_atoms(arena: &AtomArena, roots: &[AtomId]) -> Vec<AtomId> {
    arena
        .preorder(roots)
        .into_iter()
        .filter(|id| arena.atom(*id).is_postponed() && !arena.is_analyzed(*id))
        .collect()
}

/// The first atom, in traversal order, that introduced `var`.
pub fn find_atom_introducing(arena: &AtomArena, roots: &[AtomId], var: TyVid) -> Option<AtomId> {
    arena
        .preorder(roots)
        .into_iter()
        .find(|id| arena.atom(*id).introduced_variables().contains(&var))
}
