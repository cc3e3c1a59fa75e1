use std::fmt;

use itertools::Itertools;
use smallvec::SmallVec;

use crate::constraint::{Constraint, ConstraintKind, ConstraintPosition};
use crate::ty::{ConcreteTy, Ty};

/// Formats types for diagnostics and logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TypePrinter;

impl TypePrinter {
    pub fn new() -> Self {
        Self
    }

    pub fn pretty_print(&self, ty: &Ty) -> String {
        match ty {
            Ty::Var(vid) => vid.to_string(),
            Ty::Concrete(c) => self.print_concrete(c),
            Ty::Function { params, ret } => {
                let params: SmallVec<[String; 4]> = params.iter().map(|t| self.pretty_print(t)).collect();
                format!("({}) -> {}", params.iter().join(", "), self.pretty_print(ret))
            }
            Ty::Tuple(tys) => format!("({})", tys.iter().map(|t| self.pretty_print(t)).join(", ")),
            Ty::Error => "<error>".to_string(),
        }
    }

    fn print_concrete(&self, ty: &ConcreteTy) -> String {
        match ty {
            ConcreteTy::Int => "Int".to_string(),
            ConcreteTy::Bool => "Bool".to_string(),
            ConcreteTy::String => "String".to_string(),
            ConcreteTy::Unit => "Unit".to_string(),
            ConcreteTy::Any => "Any".to_string(),
            ConcreteTy::Nothing => "Nothing".to_string(),
            ConcreteTy::Named { name, args } if args.is_empty() => name.clone(),
            ConcreteTy::Named { name, args } => {
                format!("{}<{}>", name, args.iter().map(|t| self.pretty_print(t)).join(", "))
            }
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", TypePrinter::new().pretty_print(self))
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            ConstraintKind::Equality => "==",
            ConstraintKind::Upper => "<:",
            ConstraintKind::Lower => ":>",
        };
        write!(f, "{}", op)
    }
}

impl fmt::Display for ConstraintPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintPosition::ExpectedType => write!(f, "expected type"),
            ConstraintPosition::Argument { atom, index } => write!(f, "argument {} of {}", index, atom),
            ConstraintPosition::ExplicitTypeArgument => write!(f, "explicit type argument"),
            ConstraintPosition::FixVariable(vid) => write!(f, "fixation of {}", vid),
            ConstraintPosition::PostponedArgument { atom } => write!(f, "postponed argument {}", atom),
            ConstraintPosition::DeclaredUpperBound => write!(f, "declared upper bound"),
            ConstraintPosition::Incorporation => write!(f, "incorporation"),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} (from {})", self.kind, self.ty, self.position)
    }
}
