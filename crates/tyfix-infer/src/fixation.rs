//! Choosing which variable to fix next.

use rustc_hash::{FxHashMap, FxHashSet};
use tyfix_types::{AtomId, Constraint, ConstraintPosition, Ty, TyVid};

use crate::atoms::AtomArena;
use crate::completer::CompletionMode;
use crate::context::ConstraintQuery;

/// How much a variable would benefit from being fixed now. Later variants
/// win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeVariableFixationReadiness {
    Forbidden,
    WithoutProperArgumentConstraint,
    WithTrivialOrNonProperConstraints,
    RelatedToAnyOutputType,
    ReadyForFixation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableForFixation {
    pub variable: TyVid,
    pub has_proper_constraint: bool,
}

pub trait VariableFixationFinder {
    /// Picks the next variable to fix among `variables`, or `None` if none
    /// of them may be fixed at this point.
    fn find_first_variable_for_fixation<C: ConstraintQuery + ?Sized>(
        &self,
        ctx: &C,
        arena: &AtomArena,
        variables: &[TyVid],
        postponed_atoms: &[AtomId],
        mode: CompletionMode,
        top_level_type: &Ty,
    ) -> Option<VariableForFixation>;
}

/// Relations between not-fixed variables, built from their constraints and
/// from the pending postponed atoms.
#[derive(Debug, Default)]
pub struct TypeVariableDependencyProvider {
    // Undirected: `a` mentions `b` in a bound, or the other way round.
    shallow: FxHashMap<TyVid, FxHashSet<TyVid>>,
    // Output variable of a postponed atom -> its input variables.
    postponed_edges: FxHashMap<TyVid, FxHashSet<TyVid>>,
    related_to_output_types: FxHashSet<TyVid>,
    related_to_top_level_type: FxHashSet<TyVid>,
}

impl TypeVariableDependencyProvider {
    /// `top_level_type` is only consulted when it is `Some`; `FULL`
    /// completion passes `None`.
    pub fn new<C: ConstraintQuery + ?Sized>(
        ctx: &C,
        arena: &AtomArena,
        postponed_atoms: &[AtomId],
        top_level_type: Option<&Ty>,
    ) -> Self {
        let mut provider = Self::default();
        let not_fixed = ctx.not_fixed_type_variables();
        let open_variables = |ty: &Ty| -> Vec<TyVid> {
            ctx.substitute(ty)
                .type_variables()
                .into_iter()
                .filter(|var| not_fixed.contains_key(var))
                .collect()
        };

        for (var, variable) in not_fixed {
            for constraint in variable.constraints() {
                for other in open_variables(&constraint.ty) {
                    provider.add_shallow(*var, other);
                }
            }
        }

        let mut output_roots = Vec::new();
        for id in postponed_atoms {
            if arena.is_analyzed(*id) {
                continue;
            }
            let Some(atom) = arena.postponed(*id) else {
                continue;
            };
            let inputs: Vec<TyVid> = atom.input_types().iter().flat_map(|ty| open_variables(ty)).collect();
            let outputs = atom.output_type().map(|ty| open_variables(&ty)).unwrap_or_default();
            for output in &outputs {
                provider
                    .postponed_edges
                    .entry(*output)
                    .or_default()
                    .extend(inputs.iter().copied());
            }
            if !atom.is_return_argument_of_another_lambda() {
                output_roots.extend(outputs);
            }
        }

        let mut related = FxHashSet::default();
        provider.collect_related(output_roots, false, &mut related);
        provider.related_to_output_types = related;

        if let Some(top_level_type) = top_level_type {
            let mut related = FxHashSet::default();
            provider.collect_related(open_variables(top_level_type), true, &mut related);
            provider.related_to_top_level_type = related;
        }
        provider
    }

    fn add_shallow(&mut self, a: TyVid, b: TyVid) {
        if a == b {
            return;
        }
        self.shallow.entry(a).or_default().insert(b);
        self.shallow.entry(b).or_default().insert(a);
    }

    fn collect_related(&self, start: Vec<TyVid>, include_postponed_edges: bool, into: &mut FxHashSet<TyVid>) {
        let mut stack = start;
        while let Some(var) = stack.pop() {
            if !into.insert(var) {
                continue;
            }
            if let Some(related) = self.shallow.get(&var) {
                stack.extend(related.iter().copied());
            }
            if include_postponed_edges {
                if let Some(inputs) = self.postponed_edges.get(&var) {
                    stack.extend(inputs.iter().copied());
                }
            }
        }
    }

    pub fn is_related_to_any_output_type(&self, var: TyVid) -> bool {
        self.related_to_output_types.contains(&var)
    }

    pub fn is_related_to_top_level_type(&self, var: TyVid) -> bool {
        self.related_to_top_level_type.contains(&var)
    }

    pub fn shallow_related(&self, var: TyVid) -> impl Iterator<Item = TyVid> + '_ {
        self.shallow.get(&var).into_iter().flat_map(|set| set.iter().copied())
    }
}

/// Proper, informative and not merely a declared bound.
pub fn is_proper_argument_constraint<C: ConstraintQuery + ?Sized>(ctx: &C, constraint: &Constraint) -> bool {
    constraint.position != ConstraintPosition::DeclaredUpperBound
        && !constraint.ty.is_error()
        && ctx.is_proper_constraint(constraint)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFixationFinder;

impl DefaultFixationFinder {
    pub fn readiness<C: ConstraintQuery + ?Sized>(
        &self,
        ctx: &C,
        dependencies: &TypeVariableDependencyProvider,
        var: TyVid,
    ) -> TypeVariableFixationReadiness {
        let Some(variable) = ctx.not_fixed_type_variables().get(&var) else {
            return TypeVariableFixationReadiness::Forbidden;
        };
        if dependencies.is_related_to_top_level_type(var) {
            return TypeVariableFixationReadiness::Forbidden;
        }
        let constraints = variable.constraints();
        if !constraints.iter().any(|c| is_proper_argument_constraint(ctx, c)) {
            return TypeVariableFixationReadiness::WithoutProperArgumentConstraint;
        }
        if constraints.iter().all(|c| c.is_trivial() || !ctx.is_proper_constraint(c)) {
            return TypeVariableFixationReadiness::WithTrivialOrNonProperConstraints;
        }
        if dependencies.is_related_to_any_output_type(var) {
            return TypeVariableFixationReadiness::RelatedToAnyOutputType;
        }
        TypeVariableFixationReadiness::ReadyForFixation
    }
}

impl VariableFixationFinder for DefaultFixationFinder {
    fn find_first_variable_for_fixation<C: ConstraintQuery + ?Sized>(
        &self,
        ctx: &C,
        arena: &AtomArena,
        variables: &[TyVid],
        postponed_atoms: &[AtomId],
        mode: CompletionMode,
        top_level_type: &Ty,
    ) -> Option<VariableForFixation> {
        let top_level_type = match mode {
            CompletionMode::Partial => Some(top_level_type),
            CompletionMode::Full => None,
        };
        let dependencies = TypeVariableDependencyProvider::new(ctx, arena, postponed_atoms, top_level_type);

        // First variable with the highest readiness.
        let mut best: Option<(TyVid, TypeVariableFixationReadiness)> = None;
        for var in variables {
            let readiness = self.readiness(ctx, &dependencies, *var);
            if best.map_or(true, |(_, current)| readiness > current) {
                best = Some((*var, readiness));
            }
        }

        let (variable, readiness) = best?;
        log::trace!("Fixation candidate {} is {:?}", variable, readiness);
        match readiness {
            TypeVariableFixationReadiness::Forbidden => None,
            TypeVariableFixationReadiness::WithoutProperArgumentConstraint => Some(VariableForFixation {
                variable,
                has_proper_constraint: false,
            }),
            _ => Some(VariableForFixation {
                variable,
                has_proper_constraint: true,
            }),
        }
    }
}
