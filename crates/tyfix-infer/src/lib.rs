// tyfix constraint completion
//
// Completes the constraint system of one call: fixes its type variables in
// dependency order and drives the analysis of postponed lambdas and
// callable references in between.

//! # tyfix inference
//!
//! The completer works on three things it does not own:
//!
//! 1. a constraint store, seen through the capability traits in [`context`]
//! 2. the resolved-atom forest of the call, kept in an [`AtomArena`]
//! 3. an analyzer for postponed arguments, see [`PostponedArgumentAnalyzer`]
//!
//! The main entry points are [`ConstraintSystemCompleter::run_completion`]
//! and [`ConstraintSystemCompleter::complete_constraint_system`].
//! [`ConstraintStore`] is a ready-made store implementing every capability.

pub mod analyzer;
pub mod atoms;
pub mod cancel;
pub mod completer;
pub mod config;
pub mod context;
pub mod error;
pub mod fixation;
pub mod resolver;
pub mod store;

#[cfg(test)]
mod tests;

// Re-exports
pub use analyzer::{DiagnosticSink, PostponedArgumentAnalyzer};
pub use atoms::{AtomArena, PostponedResolvedAtom, ResolvedAtom};
pub use cancel::CancellationToken;
pub use completer::{CompletionMode, ConstraintSystemCompleter};
pub use config::CompletionConfig;
pub use context::{CompletionContext, ConstraintBuilder, ConstraintMutation, ConstraintQuery};
pub use error::{CompletionError, CompletionResult, ConfigError, InferenceDiagnostic};
pub use fixation::{DefaultFixationFinder, TypeVariableFixationReadiness, VariableFixationFinder};
pub use resolver::{DefaultResultTypeResolver, ResolveDirection, ResultTypeResolver};
pub use store::ConstraintStore;
