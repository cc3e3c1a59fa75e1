use tyfix_types::{Constraint, ConstraintKind, Ty, VariableWithConstraints};

use crate::context::ConstraintQuery;

/// Bias for picking a result when the bounds admit a range of types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolveDirection {
    ToSubtype,
    ToSupertype,
    Unknown,
}

/// Computes the type a variable gets fixed to.
pub trait ResultTypeResolver {
    fn find_result_type<C: ConstraintQuery + ?Sized>(
        &self,
        ctx: &C,
        variable: &VariableWithConstraints,
        direction: ResolveDirection,
    ) -> Ty;
}

/// Picks a proper equality bound if there is one, otherwise the common
/// supertype of the lower bounds or the common subtype of the upper bounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResultTypeResolver;

impl DefaultResultTypeResolver {
    fn fold_bounds<'c, C: ConstraintQuery + ?Sized>(
        ctx: &C,
        bounds: impl Iterator<Item = &'c Constraint>,
        combine: fn(&Ty, &Ty) -> Ty,
    ) -> Option<Ty> {
        bounds
            .filter(|c| !c.is_trivial() && !c.ty.is_error())
            .map(|c| ctx.substitute(&c.ty))
            .reduce(|acc, ty| combine(&acc, &ty))
    }
}

impl ResultTypeResolver for DefaultResultTypeResolver {
    fn find_result_type<C: ConstraintQuery + ?Sized>(
        &self,
        ctx: &C,
        variable: &VariableWithConstraints,
        direction: ResolveDirection,
    ) -> Ty {
        let proper: Vec<&Constraint> = variable
            .constraints()
            .iter()
            .filter(|c| ctx.is_proper_constraint(c))
            .collect();

        if let Some(equality) = proper
            .iter()
            .find(|c| c.kind == ConstraintKind::Equality && !c.ty.is_error())
        {
            return ctx.substitute(&equality.ty);
        }

        let lower = Self::fold_bounds(
            ctx,
            proper.iter().copied().filter(|c| c.kind == ConstraintKind::Lower),
            Ty::common_supertype,
        );
        let upper = Self::fold_bounds(
            ctx,
            proper.iter().copied().filter(|c| c.kind == ConstraintKind::Upper),
            Ty::common_subtype,
        );

        let result = match direction {
            ResolveDirection::ToSupertype => upper.or(lower),
            ResolveDirection::ToSubtype | ResolveDirection::Unknown => lower.or(upper),
        };
        match result {
            Some(ty) => ty,
            None if !proper.is_empty() && proper.iter().all(|c| c.ty.is_error()) => Ty::Error,
            None => match direction {
                ResolveDirection::ToSupertype => Ty::any(),
                ResolveDirection::ToSubtype | ResolveDirection::Unknown => Ty::nothing(),
            },
        }
    }
}
