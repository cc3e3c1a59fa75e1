//! Tests for choosing the next variable to fix

use tyfix_types::{AtomId, ConstraintPosition, Ty, TyVid, TypeVariableOrigin};

use crate::atoms::{AtomArena, PostponedResolvedAtom, ResolvedAtom, ResolvedLambdaAtom};
use crate::completer::CompletionMode;
use crate::context::ConstraintBuilder;
use crate::fixation::{
    DefaultFixationFinder, TypeVariableDependencyProvider, TypeVariableFixationReadiness, VariableFixationFinder,
    VariableForFixation,
};
use crate::store::ConstraintStore;

fn store_with_variables(count: u32) -> (ConstraintStore, Vec<TyVid>) {
    let mut store = ConstraintStore::new();
    let vars = (0..count)
        .map(|index| store.create_type_variable(TypeVariableOrigin::Stub { atom: AtomId(index) }))
        .collect();
    (store, vars)
}

fn lower(store: &mut ConstraintStore, var: TyVid, ty: Ty) {
    store.add_subtype_constraint(ty, Ty::Var(var), ConstraintPosition::ExpectedType);
}

/// A lambda returning `ret` that nobody has analyzed yet.
fn pending_lambda(arena: &mut AtomArena, ret: TyVid, is_return_argument_of_another_lambda: bool) -> AtomId {
    arena.alloc(ResolvedAtom::Postponed(PostponedResolvedAtom::Lambda(ResolvedLambdaAtom {
        label: "{ ... }".to_string(),
        parameters: Vec::new(),
        return_type: Ty::Var(ret),
        return_type_variable: Some(ret),
        parameter_variables: Vec::new(),
        is_return_argument_of_another_lambda,
    })))
}

fn find(
    store: &ConstraintStore,
    arena: &AtomArena,
    variables: &[TyVid],
    postponed: &[AtomId],
    mode: CompletionMode,
    top_level_type: &Ty,
) -> Option<VariableForFixation> {
    DefaultFixationFinder.find_first_variable_for_fixation(store, arena, variables, postponed, mode, top_level_type)
}

#[test]
fn test_proper_evidence_beats_order() {
    let (mut store, vars) = store_with_variables(2);
    lower(&mut store, vars[1], Ty::int());

    let found = find(&store, &AtomArena::new(), &vars, &[], CompletionMode::Full, &Ty::unit());
    assert_eq!(
        found,
        Some(VariableForFixation {
            variable: vars[1],
            has_proper_constraint: true,
        })
    );
}

#[test]
fn test_ties_go_to_the_first_variable() {
    let (mut store, vars) = store_with_variables(2);
    lower(&mut store, vars[0], Ty::int());
    lower(&mut store, vars[1], Ty::string());

    let arena = AtomArena::new();
    let found = find(&store, &arena, &vars, &[], CompletionMode::Full, &Ty::unit());
    assert_eq!(found.map(|candidate| candidate.variable), Some(vars[0]));

    let reversed = [vars[1], vars[0]];
    let found = find(&store, &arena, &reversed, &[], CompletionMode::Full, &Ty::unit());
    assert_eq!(found.map(|candidate| candidate.variable), Some(vars[1]));
}

#[test]
fn test_declared_upper_bound_is_not_evidence() {
    let (mut store, vars) = store_with_variables(1);
    store.add_subtype_constraint(Ty::Var(vars[0]), Ty::any(), ConstraintPosition::DeclaredUpperBound);

    let found = find(&store, &AtomArena::new(), &vars, &[], CompletionMode::Full, &Ty::unit());
    assert_eq!(
        found,
        Some(VariableForFixation {
            variable: vars[0],
            has_proper_constraint: false,
        })
    );
}

#[test]
fn test_partial_mode_forbids_variables_of_the_result() {
    let (mut store, vars) = store_with_variables(2);
    lower(&mut store, vars[0], Ty::int());
    store.add_subtype_constraint(Ty::Var(vars[1]), Ty::Var(vars[0]), ConstraintPosition::ExpectedType);
    let arena = AtomArena::new();
    let result = Ty::named("List", vec![Ty::Var(vars[0])]);

    assert_eq!(find(&store, &arena, &vars, &[], CompletionMode::Partial, &result), None);
    assert!(find(&store, &arena, &vars, &[], CompletionMode::Full, &result).is_some());
}

#[test]
fn test_output_types_wait_for_their_lambda() {
    let (mut store, vars) = store_with_variables(2);
    lower(&mut store, vars[0], Ty::int());
    lower(&mut store, vars[1], Ty::int());

    let mut arena = AtomArena::new();
    let pending = pending_lambda(&mut arena, vars[0], false);
    let found = find(&store, &arena, &vars, &[pending], CompletionMode::Full, &Ty::unit());
    assert_eq!(found.map(|candidate| candidate.variable), Some(vars[1]));

    let finder = DefaultFixationFinder;
    let dependencies = TypeVariableDependencyProvider::new(&store, &arena, &[pending], None);
    assert_eq!(
        finder.readiness(&store, &dependencies, vars[0]),
        TypeVariableFixationReadiness::RelatedToAnyOutputType
    );
    assert_eq!(
        finder.readiness(&store, &dependencies, vars[1]),
        TypeVariableFixationReadiness::ReadyForFixation
    );
}

#[test]
fn test_nested_lambda_returns_are_not_outputs() {
    let (mut store, vars) = store_with_variables(2);
    lower(&mut store, vars[0], Ty::int());
    lower(&mut store, vars[1], Ty::int());

    let mut arena = AtomArena::new();
    let pending = pending_lambda(&mut arena, vars[0], true);
    let found = find(&store, &arena, &vars, &[pending], CompletionMode::Full, &Ty::unit());
    assert_eq!(found.map(|candidate| candidate.variable), Some(vars[0]));
}

#[test]
fn test_trivial_bounds_rank_below_informative_ones() {
    let (mut store, vars) = store_with_variables(3);
    lower(&mut store, vars[0], Ty::nothing());
    lower(&mut store, vars[1], Ty::Var(vars[2]));

    let finder = DefaultFixationFinder;
    let dependencies = TypeVariableDependencyProvider::new(&store, &AtomArena::new(), &[], None);
    assert_eq!(
        finder.readiness(&store, &dependencies, vars[0]),
        TypeVariableFixationReadiness::WithTrivialOrNonProperConstraints
    );
    assert_eq!(
        finder.readiness(&store, &dependencies, vars[1]),
        TypeVariableFixationReadiness::WithoutProperArgumentConstraint
    );
    assert_eq!(
        dependencies.shallow_related(vars[1]).collect::<Vec<_>>(),
        vec![vars[2]]
    );
    assert!(TypeVariableFixationReadiness::Forbidden < TypeVariableFixationReadiness::WithoutProperArgumentConstraint);
}
