use crate::ids::{AtomId, TyVid};
use crate::ty::{Substitution, Ty};
use crate::variable::TypeVariable;

/// How a constraint bounds its variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    /// `variable == ty`
    Equality,
    /// `variable <: ty`
    Upper,
    /// `ty <: variable`
    Lower,
}

impl ConstraintKind {
    pub fn is_lower_or_equality(self) -> bool {
        matches!(self, ConstraintKind::Lower | ConstraintKind::Equality)
    }

    pub fn is_upper_or_equality(self) -> bool {
        matches!(self, ConstraintKind::Upper | ConstraintKind::Equality)
    }
}

/// Why a constraint exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintPosition {
    /// The expected type of the whole call.
    ExpectedType,
    /// An argument of a call atom.
    Argument { atom: AtomId, index: usize },
    /// An explicit type argument, e.g. `id<(Int) -> Unit>`.
    ExplicitTypeArgument,
    /// Checking a fixation result against the variable's own bounds.
    FixVariable(TyVid),
    /// A synthesized function type for a postponed lambda or reference.
    PostponedArgument { atom: AtomId },
    /// A declared bound of a type parameter.
    DeclaredUpperBound,
    /// Derived from two other constraints.
    Incorporation,
}

/// A bound on a type variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constraint {
    pub ty: Ty,
    pub kind: ConstraintKind,
    pub position: ConstraintPosition,
}

impl Constraint {
    pub fn new(ty: Ty, kind: ConstraintKind, position: ConstraintPosition) -> Self {
        Self { ty, kind, position }
    }

    /// A proper bound that carries no information: `Nothing <: T` or `T <: Any`.
    pub fn is_trivial(&self) -> bool {
        self.ty.is_trivial_for(self.kind)
    }

    fn same_bound(&self, other: &Constraint) -> bool {
        self.kind == other.kind && self.ty == other.ty
    }
}

/// One inference variable and the constraints accumulated for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableWithConstraints {
    pub variable: TypeVariable,
    constraints: Vec<Constraint>,
}

impl VariableWithConstraints {
    pub fn new(variable: TypeVariable) -> Self {
        Self {
            variable,
            constraints: Vec::new(),
        }
    }

    pub fn id(&self) -> TyVid {
        self.variable.id
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Adds a bound unless one of the same kind and type is already present.
    /// Returns `true` if the constraint is new.
    pub fn add_constraint(&mut self, constraint: Constraint) -> bool {
        if self.constraints.iter().any(|c| c.same_bound(&constraint)) {
            return false;
        }
        self.constraints.push(constraint);
        true
    }

    /// Rewrites every bound with `subst`, dropping bounds that collapse onto
    /// the variable itself and duplicates created by the rewrite.
    pub fn substitute(&mut self, subst: &Substitution) {
        let own = Ty::Var(self.variable.id);
        let rewritten: Vec<Constraint> = self
            .constraints
            .drain(..)
            .map(|c| Constraint { ty: c.ty.substitute(subst), ..c })
            .collect();
        for constraint in rewritten {
            if constraint.ty == own {
                continue;
            }
            self.add_constraint(constraint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::TypeVariableOrigin;

    fn var(id: u32) -> VariableWithConstraints {
        VariableWithConstraints::new(TypeVariable::new(
            TyVid(id),
            TypeVariableOrigin::TypeParameter { callee: "id".into(), name: "K".into() },
        ))
    }

    #[test]
    fn duplicate_bounds_are_ignored_regardless_of_position() {
        let mut v = var(0);
        assert!(v.add_constraint(Constraint::new(Ty::int(), ConstraintKind::Lower, ConstraintPosition::ExpectedType)));
        assert!(!v.add_constraint(Constraint::new(Ty::int(), ConstraintKind::Lower, ConstraintPosition::Incorporation)));
        assert!(v.add_constraint(Constraint::new(Ty::int(), ConstraintKind::Upper, ConstraintPosition::Incorporation)));
        assert_eq!(v.constraints().len(), 2);
    }

    #[test]
    fn substitution_drops_self_references() {
        let mut v = var(0);
        v.add_constraint(Constraint::new(Ty::Var(TyVid(1)), ConstraintKind::Upper, ConstraintPosition::Incorporation));
        v.add_constraint(Constraint::new(Ty::string(), ConstraintKind::Upper, ConstraintPosition::ExpectedType));
        let mut subst = Substitution::default();
        subst.insert(TyVid(1), Ty::Var(TyVid(0)));
        v.substitute(&subst);
        assert_eq!(v.constraints().len(), 1);
        assert_eq!(v.constraints()[0].ty, Ty::string());
    }
}
