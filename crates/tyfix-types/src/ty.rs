use rustc_hash::FxHashMap;

use crate::constraint::ConstraintKind;
use crate::ids::TyVid;

/// Fixed type variables and the types they were fixed to.
pub type Substitution = FxHashMap<TyVid, Ty>;

/// A type in the inference engine
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    /// A type variable used during inference
    Var(TyVid),
    /// A concrete type like Int, String, etc.
    Concrete(ConcreteTy),
    /// A function type
    Function {
        params: Vec<Ty>,
        ret: Box<Ty>,
    },
    /// A tuple type
    Tuple(Vec<Ty>),
    /// Placeholder for a variable that could not be inferred
    Error,
}

/// A concrete (fully known) type constructor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConcreteTy {
    Int,
    Bool,
    String,
    Unit,
    /// Top type: every type is a subtype of it.
    Any,
    /// Bottom type: a subtype of every type.
    Nothing,
    Named {
        name: String,
        args: Vec<Ty>,
    },
}

impl Ty {
    pub fn int() -> Ty {
        Ty::Concrete(ConcreteTy::Int)
    }

    pub fn bool() -> Ty {
        Ty::Concrete(ConcreteTy::Bool)
    }

    pub fn string() -> Ty {
        Ty::Concrete(ConcreteTy::String)
    }

    pub fn unit() -> Ty {
        Ty::Concrete(ConcreteTy::Unit)
    }

    pub fn any() -> Ty {
        Ty::Concrete(ConcreteTy::Any)
    }

    pub fn nothing() -> Ty {
        Ty::Concrete(ConcreteTy::Nothing)
    }

    pub fn named(name: impl Into<String>, args: Vec<Ty>) -> Ty {
        Ty::Concrete(ConcreteTy::Named {
            name: name.into(),
            args,
        })
    }

    pub fn function(params: Vec<Ty>, ret: Ty) -> Ty {
        Ty::Function {
            params,
            ret: Box::new(ret),
        }
    }

    /// The variable this type *is*, if it is a bare type variable.
    pub fn as_var(&self) -> Option<TyVid> {
        match self {
            Ty::Var(vid) => Some(*vid),
            _ => None,
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Ty::Concrete(ConcreteTy::Any))
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Ty::Concrete(ConcreteTy::Nothing))
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Ty::Concrete(ConcreteTy::Unit))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Ty::Error)
    }

    /// A bound of this kind and type carries no information:
    /// `Nothing` as a lower bound or `Any` as an upper bound.
    pub fn is_trivial_for(&self, kind: ConstraintKind) -> bool {
        match kind {
            ConstraintKind::Lower => self.is_nothing(),
            ConstraintKind::Upper => self.is_any(),
            ConstraintKind::Equality => false,
        }
    }

    /// Splits a function type into its parameter list and return type.
    pub fn as_function(&self) -> Option<(&[Ty], &Ty)> {
        match self {
            Ty::Function { params, ret } => Some((params.as_slice(), ret.as_ref())),
            _ => None,
        }
    }

    /// Type arguments of this type, in order. For a function type the
    /// parameters come first and the return type is last.
    pub fn arguments(&self) -> Vec<&Ty> {
        match self {
            Ty::Function { params, ret } => params.iter().chain(std::iter::once(ret.as_ref())).collect(),
            Ty::Tuple(elems) => elems.iter().collect(),
            Ty::Concrete(ConcreteTy::Named { args, .. }) => args.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Returns `true` if any variable inside this type satisfies `pred`.
    pub fn contains_var_where(&self, pred: &mut impl FnMut(TyVid) -> bool) -> bool {
        match self {
            Ty::Var(vid) => pred(*vid),
            Ty::Function { params, ret } => {
                params.iter().any(|p| p.contains_var_where(pred)) || ret.contains_var_where(pred)
            }
            Ty::Tuple(elems) => elems.iter().any(|e| e.contains_var_where(pred)),
            Ty::Concrete(ConcreteTy::Named { args, .. }) => args.iter().any(|a| a.contains_var_where(pred)),
            Ty::Concrete(_) | Ty::Error => false,
        }
    }

    pub fn contains_var(&self, vid: TyVid) -> bool {
        self.contains_var_where(&mut |v| v == vid)
    }

    pub fn has_type_variables(&self) -> bool {
        self.contains_var_where(&mut |_| true)
    }

    /// All type variables mentioned in this type, in first-occurrence order.
    pub fn type_variables(&self) -> Vec<TyVid> {
        let mut out = Vec::new();
        self.collect_type_variables(&mut out);
        out
    }

    pub fn collect_type_variables(&self, out: &mut Vec<TyVid>) {
        match self {
            Ty::Var(vid) => {
                if !out.contains(vid) {
                    out.push(*vid);
                }
            }
            Ty::Function { params, ret } => {
                for param in params {
                    param.collect_type_variables(out);
                }
                ret.collect_type_variables(out);
            }
            Ty::Tuple(elems) => {
                for elem in elems {
                    elem.collect_type_variables(out);
                }
            }
            Ty::Concrete(ConcreteTy::Named { args, .. }) => {
                for arg in args {
                    arg.collect_type_variables(out);
                }
            }
            Ty::Concrete(_) | Ty::Error => {}
        }
    }

    /// Replace fixed variables with their results.
    ///
    /// Chains (`?0 -> ?1 -> Int`) are followed; a chain that loops back on
    /// itself stops at the first repeated variable.
    pub fn substitute(&self, subst: &Substitution) -> Ty {
        self.substitute_guarded(subst, &mut Vec::new())
    }

    fn substitute_guarded(&self, subst: &Substitution, active: &mut Vec<TyVid>) -> Ty {
        match self {
            Ty::Var(vid) => match subst.get(vid) {
                Some(replacement) if !active.contains(vid) => {
                    active.push(*vid);
                    let result = replacement.substitute_guarded(subst, active);
                    active.pop();
                    result
                }
                _ => self.clone(),
            },
            Ty::Function { params, ret } => Ty::Function {
                params: params.iter().map(|p| p.substitute_guarded(subst, active)).collect(),
                ret: Box::new(ret.substitute_guarded(subst, active)),
            },
            Ty::Tuple(elems) => Ty::Tuple(elems.iter().map(|e| e.substitute_guarded(subst, active)).collect()),
            Ty::Concrete(ConcreteTy::Named { name, args }) => Ty::Concrete(ConcreteTy::Named {
                name: name.clone(),
                args: args.iter().map(|a| a.substitute_guarded(subst, active)).collect(),
            }),
            Ty::Concrete(_) | Ty::Error => self.clone(),
        }
    }

    /// Structural subtyping.
    ///
    /// Type variables are only related to themselves here; the constraint
    /// store handles them before ever calling this.
    pub fn is_subtype_of(&self, other: &Ty) -> bool {
        if self == other {
            return true;
        }
        match (self, other) {
            (Ty::Error, _) | (_, Ty::Error) => true,
            (Ty::Concrete(ConcreteTy::Nothing), _) => true,
            (_, Ty::Concrete(ConcreteTy::Any)) => true,
            (Ty::Function { params: p1, ret: r1 }, Ty::Function { params: p2, ret: r2 }) => {
                // Parameters are contravariant, the return type covariant.
                p1.len() == p2.len()
                    && p2.iter().zip(p1.iter()).all(|(a, b)| a.is_subtype_of(b))
                    && r1.is_subtype_of(r2)
            }
            (Ty::Tuple(e1), Ty::Tuple(e2)) => {
                e1.len() == e2.len() && e1.iter().zip(e2.iter()).all(|(a, b)| a.is_subtype_of(b))
            }
            (
                Ty::Concrete(ConcreteTy::Named { name: n1, args: a1 }),
                Ty::Concrete(ConcreteTy::Named { name: n2, args: a2 }),
            ) => n1 == n2 && a1 == a2,
            _ => false,
        }
    }

    /// Least upper bound of two types, falling back to `Any`.
    pub fn common_supertype(&self, other: &Ty) -> Ty {
        if other.is_subtype_of(self) {
            return self.clone();
        }
        if self.is_subtype_of(other) {
            return other.clone();
        }
        match (self, other) {
            (Ty::Function { params: p1, ret: r1 }, Ty::Function { params: p2, ret: r2 }) if p1.len() == p2.len() => {
                Ty::Function {
                    params: p1.iter().zip(p2.iter()).map(|(a, b)| a.common_subtype(b)).collect(),
                    ret: Box::new(r1.common_supertype(r2)),
                }
            }
            (Ty::Tuple(e1), Ty::Tuple(e2)) if e1.len() == e2.len() => {
                Ty::Tuple(e1.iter().zip(e2.iter()).map(|(a, b)| a.common_supertype(b)).collect())
            }
            _ => Ty::any(),
        }
    }

    /// Greatest lower bound of two types, falling back to `Nothing`.
    pub fn common_subtype(&self, other: &Ty) -> Ty {
        if self.is_subtype_of(other) {
            return self.clone();
        }
        if other.is_subtype_of(self) {
            return other.clone();
        }
        match (self, other) {
            (Ty::Function { params: p1, ret: r1 }, Ty::Function { params: p2, ret: r2 }) if p1.len() == p2.len() => {
                Ty::Function {
                    params: p1.iter().zip(p2.iter()).map(|(a, b)| a.common_supertype(b)).collect(),
                    ret: Box::new(r1.common_subtype(r2)),
                }
            }
            (Ty::Tuple(e1), Ty::Tuple(e2)) if e1.len() == e2.len() => {
                Ty::Tuple(e1.iter().zip(e2.iter()).map(|(a, b)| a.common_subtype(b)).collect())
            }
            _ => Ty::nothing(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_parameters_are_contravariant() {
        let takes_any = Ty::function(vec![Ty::any()], Ty::unit());
        let takes_int = Ty::function(vec![Ty::int()], Ty::unit());
        assert!(takes_any.is_subtype_of(&takes_int));
        assert!(!takes_int.is_subtype_of(&takes_any));
    }

    #[test]
    fn substitution_follows_chains_without_looping() {
        let mut subst = Substitution::default();
        subst.insert(TyVid(0), Ty::Var(TyVid(1)));
        subst.insert(TyVid(1), Ty::int());
        let ty = Ty::function(vec![Ty::Var(TyVid(0))], Ty::Var(TyVid(2)));
        assert_eq!(ty.substitute(&subst), Ty::function(vec![Ty::int()], Ty::Var(TyVid(2))));

        let mut cyclic = Substitution::default();
        cyclic.insert(TyVid(0), Ty::Var(TyVid(1)));
        cyclic.insert(TyVid(1), Ty::Var(TyVid(0)));
        assert_eq!(Ty::Var(TyVid(0)).substitute(&cyclic), Ty::Var(TyVid(0)));
    }

    #[test]
    fn type_variables_are_ordered_and_unique() {
        let ty = Ty::function(
            vec![Ty::Var(TyVid(3)), Ty::named("List", vec![Ty::Var(TyVid(1))])],
            Ty::Var(TyVid(3)),
        );
        assert_eq!(ty.type_variables(), vec![TyVid(3), TyVid(1)]);
    }

    #[test]
    fn common_supertype_of_unrelated_types_is_any() {
        assert_eq!(Ty::int().common_supertype(&Ty::string()), Ty::any());
        assert_eq!(Ty::nothing().common_supertype(&Ty::string()), Ty::string());
        assert_eq!(Ty::int().common_subtype(&Ty::string()), Ty::nothing());
    }
}
