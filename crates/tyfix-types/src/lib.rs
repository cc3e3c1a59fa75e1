// tyfix type model
//
// Types, type variables and constraints shared by the constraint store,
// the fixation policies and the completer.

//! # tyfix types
//!
//! The vocabulary of the completion engine:
//!
//! 1. [`Ty`] and [`ConcreteTy`], the types being inferred
//! 2. [`TypeVariable`], the inference placeholders, keyed by [`TyVid`]
//! 3. [`Constraint`] and [`VariableWithConstraints`], the evidence
//!    accumulated for each variable
//!
//! Nothing in this crate mutates shared state; the store in `tyfix-infer`
//! owns all of it.

pub mod constraint;
pub mod ids;
pub mod printer;
pub mod ty;
pub mod variable;

pub use constraint::{Constraint, ConstraintKind, ConstraintPosition, VariableWithConstraints};
pub use ids::{AtomId, TyVid};
pub use printer::TypePrinter;
pub use ty::{ConcreteTy, Substitution, Ty};
pub use variable::{TypeVariable, TypeVariableOrigin};
