use std::fmt;

use crate::ids::{AtomId, TyVid};
use crate::ty::Ty;

/// Where an inference variable came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeVariableOrigin {
    /// Instantiation of a declared type parameter of `callee`.
    TypeParameter { callee: String, name: String },
    /// An unknown parameter type of a lambda.
    LambdaParameter { atom: AtomId, index: usize },
    /// The return type of a lambda.
    LambdaReturn { atom: AtomId },
    /// The return type of a callable reference's synthesized expected type.
    CallableReferenceReturn { atom: AtomId },
    /// Placeholder variable owned by a stub atom.
    Stub { atom: AtomId },
}

/// An inference placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeVariable {
    pub id: TyVid,
    pub origin: TypeVariableOrigin,
}

impl TypeVariable {
    pub fn new(id: TyVid, origin: TypeVariableOrigin) -> Self {
        Self { id, origin }
    }

    /// The type standing for this variable until it is fixed.
    pub fn default_type(&self) -> Ty {
        Ty::Var(self.id)
    }

    /// Short human-readable name, e.g. `T` for a type parameter.
    pub fn name(&self) -> String {
        match &self.origin {
            TypeVariableOrigin::TypeParameter { name, .. } => name.clone(),
            TypeVariableOrigin::LambdaParameter { index, .. } => format!("P{}", index),
            TypeVariableOrigin::LambdaReturn { .. } => "R".to_string(),
            TypeVariableOrigin::CallableReferenceReturn { .. } => "R".to_string(),
            TypeVariableOrigin::Stub { .. } => "_".to_string(),
        }
    }
}

impl fmt::Display for TypeVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            TypeVariableOrigin::TypeParameter { callee, name } => write!(f, "{} of {} ({})", name, callee, self.id),
            TypeVariableOrigin::LambdaParameter { atom, index } => {
                write!(f, "parameter {} of lambda {} ({})", index, atom, self.id)
            }
            TypeVariableOrigin::LambdaReturn { atom } => write!(f, "return type of lambda {} ({})", atom, self.id),
            TypeVariableOrigin::CallableReferenceReturn { atom } => {
                write!(f, "return type of reference {} ({})", atom, self.id)
            }
            TypeVariableOrigin::Stub { atom } => write!(f, "stub variable of {} ({})", atom, self.id),
        }
    }
}
