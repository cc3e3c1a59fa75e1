use miette::Diagnostic;
use thiserror::Error;
use tyfix_types::{AtomId, ConstraintPosition, Ty, TyVid};

/// Result type for completion operations
pub type CompletionResult<T> = Result<T, CompletionError>;

/// Ordinary inference failures.
///
/// These are recorded into the constraint store and never abort a
/// completion; the affected variables still end up fixed.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum InferenceDiagnostic {
    #[error("not enough information to infer type variable {name}")]
    #[diagnostic(code("INFER-001"), help("Specify the type arguments explicitly"))]
    NotEnoughInformation {
        variable: TyVid,
        name: String,
        atom: Option<AtomId>,
    },

    #[error("type mismatch: {lower} is not a subtype of {upper}")]
    #[diagnostic(code("INFER-002"))]
    TypeMismatch {
        lower: Ty,
        upper: Ty,
        position: ConstraintPosition,
    },

    #[error("function type arity mismatch: expected {expected} parameters, found {found}")]
    #[diagnostic(code("INFER-003"))]
    ArityMismatch {
        expected: usize,
        found: usize,
        position: ConstraintPosition,
    },

    #[error("type variable {variable} is already fixed")]
    #[diagnostic(code("INFER-004"))]
    AlreadyFixed { variable: TyVid },

    #[error("no candidate of '{reference}' matches the expected type {expected}")]
    #[diagnostic(code("INFER-005"), help("Check the parameter types of the referenced declarations"))]
    NoApplicableCandidate {
        reference: String,
        expected: Ty,
        atom: AtomId,
    },

    #[error("reference '{reference}' is ambiguous: {count} candidates apply")]
    #[diagnostic(code("INFER-006"), help("Add an explicit expected type to pick an overload"))]
    AmbiguousReference {
        reference: String,
        count: usize,
        atom: AtomId,
    },

    #[error("cannot check lambda {atom}: {message}")]
    #[diagnostic(code("INFER-007"))]
    LambdaBody { atom: AtomId, message: String },
}

/// Failures that escape a completion run.
///
/// Anything else is absorbed into [`InferenceDiagnostic`]s.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum CompletionError {
    #[error("completion was cancelled")]
    #[diagnostic(code("COMPLETE-001"))]
    Cancelled,

    #[error("postponed argument {atom} was analyzed while completing an already built constraint system")]
    #[diagnostic(
        code("COMPLETE-002"),
        help("complete_constraint_system expects every postponed argument to be analyzed beforehand")
    )]
    UnexpectedAnalysis { atom: AtomId },

    #[error("analyzer returned without marking postponed argument {atom} as analyzed")]
    #[diagnostic(code("COMPLETE-003"))]
    AnalyzerContract { atom: AtomId },

    #[error("internal error: {0}")]
    #[diagnostic(code("COMPLETE-004"))]
    Internal(String),
}

/// Errors raised while loading a [`crate::config::CompletionConfig`].
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid completion configuration: {0}")]
    #[diagnostic(code("CONFIG-001"), help("Check the TOML syntax of the [completion] table"))]
    Parse(String),

    #[error("Invalid value for `{field}`: {message}")]
    #[diagnostic(code("CONFIG-002"))]
    InvalidValue { field: &'static str, message: String },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
