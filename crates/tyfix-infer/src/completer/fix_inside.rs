//! Fixing the variables a postponed atom's parameter types are built from.
//!
//! A lambda body can only be checked against concrete parameter types, while
//! its return type may stay open. Before analysis the completer walks the
//! expected parameter types and fixes every nested variable that already
//! has proper evidence.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tyfix_types::{Ty, TyVid};

use super::{ConstraintSystemCompleter, Session};
use crate::context::CompletionContext;
use crate::error::CompletionResult;
use crate::fixation::VariableFixationFinder;
use crate::resolver::ResultTypeResolver;

impl<F: VariableFixationFinder, R: ResultTypeResolver> ConstraintSystemCompleter<F, R> {
    /// Returns `true` if at least one variable was fixed.
    pub(super) fn fix_variables_inside_types<C, A>(
        &self,
        s: &mut Session<'_, C, A>,
        types: &[Ty],
    ) -> CompletionResult<bool>
    where
        C: CompletionContext + ?Sized,
        A: ?Sized,
    {
        let mut visited = FxHashSet::default();
        let mut fixed_any = false;
        for ty in types {
            fixed_any |= self.fix_inside_type(s, ty, &mut visited)?;
        }
        Ok(fixed_any)
    }

    fn fix_inside_type<C, A>(
        &self,
        s: &mut Session<'_, C, A>,
        ty: &Ty,
        visited: &mut FxHashSet<TyVid>,
    ) -> CompletionResult<bool>
    where
        C: CompletionContext + ?Sized,
        A: ?Sized,
    {
        let ty = s.ctx.substitute(ty);
        if let Some(var) = ty.as_var() {
            return self.fix_variable_if_ready(s, var, visited);
        }
        let mut fixed_any = false;
        for argument in ty.arguments() {
            fixed_any |= self.fix_inside_type(s, argument, visited)?;
        }
        Ok(fixed_any)
    }

    fn fix_variable_if_ready<C, A>(
        &self,
        s: &mut Session<'_, C, A>,
        var: TyVid,
        visited: &mut FxHashSet<TyVid>,
    ) -> CompletionResult<bool>
    where
        C: CompletionContext + ?Sized,
        A: ?Sized,
    {
        if !s.ctx.not_fixed_type_variables().contains_key(&var) || !visited.insert(var) {
            return Ok(false);
        }
        self.cancellation.check()?;

        let postponed = s.not_analyzed_postponed_atoms();
        let candidate = self.finder.find_first_variable_for_fixation(
            &*s.ctx,
            s.arena,
            std::slice::from_ref(&var),
            &postponed,
            s.mode,
            s.top_level_type,
        );
        match candidate {
            Some(candidate) if candidate.has_proper_constraint => {
                log::trace!("Fixing {} ahead of postponed argument analysis", var);
                self.fix_with_resolver(s, var)?;
                Ok(true)
            }
            _ => self.fix_variables_inside_constraints(s, var, visited),
        }
    }

    /// Follows bounds of `var` that are themselves bare variables.
    fn fix_variables_inside_constraints<C, A>(
        &self,
        s: &mut Session<'_, C, A>,
        var: TyVid,
        visited: &mut FxHashSet<TyVid>,
    ) -> CompletionResult<bool>
    where
        C: CompletionContext + ?Sized,
        A: ?Sized,
    {
        let bound_variables: SmallVec<[TyVid; 4]> = match s.ctx.not_fixed_type_variables().get(&var) {
            Some(variable) => variable
                .constraints()
                .iter()
                .filter_map(|constraint| s.ctx.substitute(&constraint.ty).as_var())
                .collect(),
            None => SmallVec::new(),
        };

        let mut fixed_any = false;
        for other in bound_variables {
            fixed_any |= self.fix_variable_if_ready(s, other, visited)?;
        }
        Ok(fixed_any)
    }
}
