//! The boundary between the completer and whatever type-checks the bodies
//! of lambdas and callable references.

use tyfix_types::AtomId;

use crate::atoms::AtomArena;
use crate::error::{CompletionResult, InferenceDiagnostic};

/// Receives diagnostics produced while analyzing postponed arguments.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: InferenceDiagnostic);
}

impl DiagnosticSink for Vec<InferenceDiagnostic> {
    fn report(&mut self, diagnostic: InferenceDiagnostic) {
        self.push(diagnostic);
    }
}

/// Analyzes one postponed atom.
///
/// When `analyze` returns `Ok`, the atom must be marked analyzed in the
/// arena. The analyzer may add constraints and variables to `ctx`, reveal
/// sub-atoms, and run a nested completion on the same store.
pub trait PostponedArgumentAnalyzer<C: ?Sized> {
    fn analyze(
        &mut self,
        ctx: &mut C,
        arena: &mut AtomArena,
        atom: AtomId,
        sink: &mut dyn DiagnosticSink,
    ) -> CompletionResult<()>;
}

impl<C: ?Sized, F> PostponedArgumentAnalyzer<C> for F
where
    F: FnMut(&mut C, &mut AtomArena, AtomId, &mut dyn DiagnosticSink) -> CompletionResult<()>,
{
    fn analyze(
        &mut self,
        ctx: &mut C,
        arena: &mut AtomArena,
        atom: AtomId,
        sink: &mut dyn DiagnosticSink,
    ) -> CompletionResult<()> {
        self(ctx, arena, atom, sink)
    }
}
