//! Capabilities the completer needs from a constraint store.
//!
//! Reading, mutating and building are separate traits so helpers can ask
//! for exactly what they touch. [`CompletionContext`] is the union the
//! completer itself is bounded by.

use indexmap::IndexMap;
use tyfix_types::{AtomId, Constraint, ConstraintPosition, Ty, TyVid, TypeVariable, TypeVariableOrigin, VariableWithConstraints};

use crate::error::InferenceDiagnostic;

/// Read-only view of the constraint system
pub trait ConstraintQuery {
    /// Variables still waiting for fixation, in registration order.
    fn not_fixed_type_variables(&self) -> &IndexMap<TyVid, VariableWithConstraints>;

    /// Variables whose fixation is deferred to an enclosing inference.
    fn postponed_type_variables(&self) -> &[TyVid];

    fn type_variable(&self, var: TyVid) -> Option<&TypeVariable>;

    /// The result a variable was fixed to.
    fn fixed_type(&self, var: TyVid) -> Option<&Ty>;

    /// Replaces every fixed variable in `ty` with its result.
    fn substitute(&self, ty: &Ty) -> Ty;

    /// `true` if `ty` mentions no not-fixed variable.
    fn can_be_proper(&self, ty: &Ty) -> bool {
        let not_fixed = self.not_fixed_type_variables();
        !ty.contains_var_where(&mut |var| not_fixed.contains_key(&var))
    }

    /// `true` if every variable in `ty` is fixed or postponed.
    fn contains_only_fixed_or_postponed_variables(&self, ty: &Ty) -> bool {
        let not_fixed = self.not_fixed_type_variables();
        let postponed = self.postponed_type_variables();
        !ty.contains_var_where(&mut |var| not_fixed.contains_key(&var) && !postponed.contains(&var))
    }

    fn is_fixed(&self, var: TyVid) -> bool {
        self.fixed_type(var).is_some()
    }

    fn is_proper_constraint(&self, constraint: &Constraint) -> bool {
        self.can_be_proper(&constraint.ty)
    }
}

/// Commands that change which variables are fixed.
pub trait ConstraintMutation {
    fn add_error(&mut self, diagnostic: InferenceDiagnostic);

    /// Fixes `var` to `result`. `atom` is the atom that introduced the
    /// variable, kept for diagnostics.
    fn fix_variable(&mut self, var: TyVid, result: Ty, atom: Option<AtomId>);
}

/// Used while synthesizing function types for postponed atoms.
pub trait ConstraintBuilder {
    /// Allocates an identifier no registered variable uses.
    fn fresh_type_variable_id(&mut self) -> TyVid;

    fn register_variable(&mut self, variable: TypeVariable);

    fn add_subtype_constraint(&mut self, subtype: Ty, supertype: Ty, position: ConstraintPosition);

    fn add_equality_constraint(&mut self, a: Ty, b: Ty, position: ConstraintPosition);

    /// Every variable ever registered, fixed or not.
    fn registered_variables(&self) -> Vec<TyVid>;

    fn create_type_variable(&mut self, origin: TypeVariableOrigin) -> TyVid {
        let id = self.fresh_type_variable_id();
        self.register_variable(TypeVariable::new(id, origin));
        id
    }
}

/// Everything a completion needs.
pub trait CompletionContext: ConstraintQuery + ConstraintMutation + ConstraintBuilder {}

impl<T: ConstraintQuery + ConstraintMutation + ConstraintBuilder + ?Sized> CompletionContext for T {}
