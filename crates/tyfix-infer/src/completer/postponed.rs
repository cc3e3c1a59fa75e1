//! Postponed atoms whose expected type is a bare type variable.
//!
//! Such an atom cannot be analyzed until something tells us which function
//! type the variable stands for. The helpers here recover that shape from
//! the variable's constraints and rewrite the atom into a function-shaped
//! one, registering fresh variables for whatever is still unknown.

use rustc_hash::FxHashSet;
use tyfix_types::{AtomId, ConstraintPosition, Ty, TyVid, TypeVariableOrigin};

use super::{ConstraintSystemCompleter, Session};
use crate::analyzer::PostponedArgumentAnalyzer;
use crate::atoms::{
    AtomArena, PostponedCallableReferenceAtom, PostponedResolvedAtom, ResolvedAtom, ResolvedLambdaAtom,
    SyntheticSignature,
};
use crate::context::{CompletionContext, ConstraintQuery};
use crate::error::{CompletionError, CompletionResult};
use crate::fixation::VariableFixationFinder;
use crate::resolver::ResultTypeResolver;

/// Looks for the function type `var` will most likely become.
///
/// Only equality and lower bounds count as evidence. A bound that is itself
/// a not-fixed variable is followed into that variable's bounds; cycles
/// between variables are cut by a visited set. The first function type whose
/// parameter types mention no variable wins.
pub fn find_functional_shape<C: ConstraintQuery + ?Sized>(ctx: &C, var: TyVid) -> Option<Ty> {
    let mut visited = FxHashSet::default();
    find_functional_shape_guarded(ctx, var, &mut visited)
}

fn find_functional_shape_guarded<C: ConstraintQuery + ?Sized>(
    ctx: &C,
    var: TyVid,
    visited: &mut FxHashSet<TyVid>,
) -> Option<Ty> {
    if !visited.insert(var) {
        return None;
    }
    let variable = ctx.not_fixed_type_variables().get(&var)?;
    for constraint in variable.constraints() {
        let ty = ctx.substitute(&constraint.ty);
        if let Some(other) = ty.as_var() {
            if ctx.not_fixed_type_variables().contains_key(&other) {
                if let Some(shape) = find_functional_shape_guarded(ctx, other, visited) {
                    return Some(shape);
                }
                continue;
            }
        }
        if !constraint.kind.is_lower_or_equality() {
            continue;
        }
        if let Some((params, _)) = ty.as_function() {
            if params.iter().all(|param| !param.has_type_variables()) {
                return Some(ty);
            }
        }
    }
    None
}

/// Rewrites a lambda whose expected type is a variable into a
/// [`ResolvedLambdaAtom`] and returns the new atom.
///
/// Declared parameter types and the declared arity always win. An
/// untyped parameter takes its type from `shape` when the arities agree,
/// then from the synthetic signature, and is a fresh variable otherwise. A
/// lambda without a parameter clause takes all of `shape`'s parameters. The
/// return type is kept from `shape` when proper and is a fresh variable
/// otherwise. The new atom becomes a child of `atom`, `atom` is marked
/// analyzed, and the new function type is constrained to be a subtype of
/// the old expected type.
pub fn prepare_lambda_for_analysis<C: CompletionContext + ?Sized>(
    ctx: &mut C,
    arena: &mut AtomArena,
    atom: AtomId,
    shape: Option<Ty>,
) -> CompletionResult<AtomId> {
    let lambda = match arena.postponed(atom) {
        Some(PostponedResolvedAtom::LambdaWithTypeVariableAsExpectedType(lambda)) => lambda.clone(),
        _ => {
            return Err(CompletionError::Internal(format!(
                "{} is not a lambda waiting on a type variable",
                atom
            )))
        }
    };

    let function = shape.as_ref().and_then(Ty::as_function);
    let mut parameter_variables = Vec::new();
    let parameters = match function {
        // Without a parameter clause the lambda takes the shape's parameters.
        Some((params, _)) if lambda.parameters.is_empty() => params.to_vec(),
        _ => {
            let from_shape = function
                .map(|(params, _)| params)
                .filter(|params| params.len() == lambda.parameters.len());
            let mut parameters = Vec::with_capacity(lambda.parameters.len());
            for (index, declared) in lambda.parameters.iter().enumerate() {
                let known = declared
                    .clone()
                    .or_else(|| from_shape.and_then(|params| params.get(index).cloned()))
                    .or_else(|| {
                        lambda
                            .synthetic
                            .as_ref()
                            .and_then(|signature| signature.parameters.get(index).cloned())
                    });
                let ty = match known {
                    Some(ty) => ty,
                    None => {
                        let var = ctx.create_type_variable(TypeVariableOrigin::LambdaParameter { atom, index });
                        parameter_variables.push(var);
                        Ty::Var(var)
                    }
                };
                parameters.push(ty);
            }
            parameters
        }
    };

    let known_return = match function {
        Some((_, ret)) => Some(ret.clone()).filter(|ret| ctx.can_be_proper(ret)),
        None => lambda.synthetic.as_ref().map(|signature| Ty::Var(signature.return_type)),
    };
    let mut return_type_variable = None;
    let return_type = match known_return {
        Some(ty) => ty,
        None => {
            let var = ctx.create_type_variable(TypeVariableOrigin::LambdaReturn { atom });
            return_type_variable = Some(var);
            Ty::Var(var)
        }
    };

    let revised = ResolvedLambdaAtom {
        label: lambda.label,
        parameters,
        return_type,
        return_type_variable,
        parameter_variables,
        is_return_argument_of_another_lambda: lambda.is_return_argument_of_another_lambda,
    };
    let function_type = revised.function_type();
    let revised = arena.alloc_child(atom, ResolvedAtom::Postponed(PostponedResolvedAtom::Lambda(revised)));
    arena.mark_analyzed(atom);
    log::debug!("Lambda {} revised into {} with expected type {}", atom, revised, function_type);
    ctx.add_subtype_constraint(function_type, lambda.expected_type, ConstraintPosition::PostponedArgument { atom });
    Ok(revised)
}

/// Rewrites a callable reference whose expected type is a variable into a
/// [`PostponedCallableReferenceAtom`] expecting `shape`.
///
/// Returns `Ok(None)` and leaves `atom` untouched without a shape.
pub fn prepare_callable_reference_for_analysis<C: CompletionContext + ?Sized>(
    ctx: &mut C,
    arena: &mut AtomArena,
    atom: AtomId,
    shape: Option<Ty>,
) -> CompletionResult<Option<AtomId>> {
    let reference = match arena.postponed(atom) {
        Some(PostponedResolvedAtom::CallableReferenceWithTypeVariableAsExpectedType(reference)) => reference.clone(),
        _ => {
            return Err(CompletionError::Internal(format!(
                "{} is not a callable reference waiting on a type variable",
                atom
            )))
        }
    };
    let Some((params, ret)) = shape.as_ref().and_then(Ty::as_function) else {
        return Ok(None);
    };

    let mut return_type_variable = None;
    let return_type = if ctx.can_be_proper(ret) {
        ret.clone()
    } else {
        let var = ctx.create_type_variable(TypeVariableOrigin::CallableReferenceReturn { atom });
        return_type_variable = Some(var);
        Ty::Var(var)
    };
    let expected = Ty::function(params.to_vec(), return_type);

    let revised = arena.alloc_child(
        atom,
        ResolvedAtom::Postponed(PostponedResolvedAtom::CallableReference(PostponedCallableReferenceAtom {
            reference: reference.reference,
            expected_type: Some(expected.clone()),
            return_type_variable,
        })),
    );
    arena.mark_analyzed(atom);
    log::debug!("Callable reference {} revised into {} with expected type {}", atom, revised, expected);
    ctx.add_subtype_constraint(expected, reference.expected_type, ConstraintPosition::PostponedArgument { atom });
    Ok(Some(revised))
}

impl<F: VariableFixationFinder, R: ResultTypeResolver> ConstraintSystemCompleter<F, R> {
    /// Gives the first lambda with untyped parameters a signature made of
    /// fresh variables, so its pieces can be inferred like any other
    /// variable.
    pub(super) fn synthesize_lambda_signature<C, A>(&self, s: &mut Session<'_, C, A>) -> CompletionResult<bool>
    where
        C: CompletionContext + ?Sized,
        A: ?Sized,
    {
        let candidate = s.not_analyzed_postponed_atoms().into_iter().find_map(|id| match s.arena.postponed(id) {
            Some(PostponedResolvedAtom::LambdaWithTypeVariableAsExpectedType(lambda))
                if lambda.synthetic.is_none() && lambda.has_unknown_parameters() =>
            {
                Some((id, lambda.parameters.clone(), lambda.expected_type.clone()))
            }
            _ => None,
        });
        let Some((atom, declared, expected)) = candidate else {
            return Ok(false);
        };
        self.cancellation.check()?;

        let mut parameters = Vec::with_capacity(declared.len());
        let mut fresh_parameters = Vec::new();
        for (index, declared) in declared.into_iter().enumerate() {
            match declared {
                Some(ty) => parameters.push(ty),
                None => {
                    let var = s
                        .ctx
                        .create_type_variable(TypeVariableOrigin::LambdaParameter { atom, index });
                    fresh_parameters.push(var);
                    parameters.push(Ty::Var(var));
                }
            }
        }
        let return_type = s.ctx.create_type_variable(TypeVariableOrigin::LambdaReturn { atom });
        let signature = SyntheticSignature {
            parameters,
            return_type,
            fresh_parameters,
        };
        let function_type = signature.function_type();
        log::debug!("Synthesized signature {} for lambda {}", function_type, atom);

        if let ResolvedAtom::Postponed(PostponedResolvedAtom::LambdaWithTypeVariableAsExpectedType(lambda)) =
            s.arena.atom_mut(atom)
        {
            lambda.synthetic = Some(signature);
        }
        s.ctx
            .add_subtype_constraint(function_type, expected, ConstraintPosition::PostponedArgument { atom });
        Ok(true)
    }

    /// Finds the first atom waiting on a type variable that waiting longer
    /// will not help, gives it a function-shaped expected type and analyzes
    /// it.
    pub(super) fn unstick_postponed_atom<C, A>(&self, s: &mut Session<'_, C, A>) -> CompletionResult<bool>
    where
        C: CompletionContext + ?Sized,
        A: PostponedArgumentAnalyzer<C> + ?Sized,
    {
        let postponed = s.not_analyzed_postponed_atoms();
        let variables = s.ordered_variables();
        for atom in postponed.iter().copied() {
            self.cancellation.check()?;
            let Some(var) = s.arena.postponed(atom).and_then(PostponedResolvedAtom::expected_type_variable) else {
                continue;
            };
            if !s.ctx.not_fixed_type_variables().contains_key(&var) {
                continue;
            }
            if !self.can_unstick(s, var, &variables, &postponed) {
                continue;
            }

            let shape = find_functional_shape(&*s.ctx, var);
            let is_lambda = s
                .arena
                .postponed(atom)
                .map_or(false, PostponedResolvedAtom::is_lambda_with_type_variable);
            let revised = if is_lambda {
                Some(prepare_lambda_for_analysis(s.ctx, s.arena, atom, shape)?)
            } else {
                prepare_callable_reference_for_analysis(s.ctx, s.arena, atom, shape)?
            };
            let Some(revised) = revised else {
                log::trace!("No functional shape for {} yet", atom);
                continue;
            };
            self.analyze_postponed(s, revised)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// `var` must be fixable at all, and either be the variable the finder
    /// would fix next with proper evidence, or have nothing but non-proper
    /// and trivial bounds.
    fn can_unstick<C, A>(&self, s: &Session<'_, C, A>, var: TyVid, variables: &[TyVid], postponed: &[AtomId]) -> bool
    where
        C: CompletionContext + ?Sized,
        A: ?Sized,
    {
        let ctx = &*s.ctx;
        let find = |candidates: &[TyVid]| {
            self.finder
                .find_first_variable_for_fixation(ctx, s.arena, candidates, postponed, s.mode, s.top_level_type)
        };
        if find(std::slice::from_ref(&var)).is_none() {
            return false;
        }
        if matches!(find(variables), Some(candidate) if candidate.variable == var && candidate.has_proper_constraint) {
            return true;
        }
        ctx.not_fixed_type_variables().get(&var).map_or(false, |variable| {
            variable
                .constraints()
                .iter()
                .all(|c| c.is_trivial() || !ctx.is_proper_constraint(c))
        })
    }
}
