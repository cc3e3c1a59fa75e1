//! Completion of one call's constraint system.
//!
//! A completion alternates between fixing variables that have enough
//! evidence and analyzing postponed arguments (lambdas and callable
//! references) that have become analyzable. Analysis may add constraints,
//! variables and atoms, so every step recomputes the atoms and variables it
//! works on instead of reusing an earlier snapshot.

mod fix_inside;
mod postponed;

pub use postponed::{find_functional_shape, prepare_callable_reference_for_analysis, prepare_lambda_for_analysis};

use itertools::Itertools;
use rustc_hash::FxHashSet;
use tyfix_types::{AtomId, Ty, TyVid};

use crate::analyzer::{DiagnosticSink, PostponedArgumentAnalyzer};
use crate::atoms::{
    find_atom_introducing, ordered_not_analyzed_postponed_atoms, ordered_type_variables, AtomArena, PostponedResolvedAtom,
};
use crate::cancel::CancellationToken;
use crate::config::CompletionConfig;
use crate::context::CompletionContext;
use crate::error::{CompletionError, CompletionResult, InferenceDiagnostic};
use crate::fixation::{DefaultFixationFinder, VariableFixationFinder};
use crate::resolver::{DefaultResultTypeResolver, ResolveDirection, ResultTypeResolver};

/// How much a completion is allowed to decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionMode {
    /// Outermost call: every variable ends up fixed, with a diagnostic for
    /// those nothing could be inferred for.
    Full,
    /// A sub-expression whose result still feeds an enclosing call: only
    /// variables with proper evidence are fixed.
    Partial,
}

/// Drives completion, parameterized over the fixation policy `F` and the
/// result-type policy `R`.
#[derive(Debug, Clone)]
pub struct ConstraintSystemCompleter<F = DefaultFixationFinder, R = DefaultResultTypeResolver> {
    finder: F,
    resolver: R,
    config: CompletionConfig,
    cancellation: CancellationToken,
}

impl ConstraintSystemCompleter {
    pub fn new(config: CompletionConfig) -> Self {
        Self::with_policies(DefaultFixationFinder, DefaultResultTypeResolver, config)
    }
}

impl Default for ConstraintSystemCompleter {
    fn default() -> Self {
        Self::new(CompletionConfig::default())
    }
}

/// State of one invocation. Nothing here outlives the call that created it.
struct Session<'s, C: ?Sized, A: ?Sized> {
    ctx: &'s mut C,
    arena: &'s mut AtomArena,
    analyzer: &'s mut A,
    sink: &'s mut dyn DiagnosticSink,
    mode: CompletionMode,
    top_level_atoms: &'s [AtomId],
    top_level_type: &'s Ty,
    collect_variables_from_context: bool,
}

/// Snapshot used to detect that a pass changed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Progress {
    not_fixed: usize,
    registered: usize,
    atoms: usize,
    analyzed: usize,
}

impl<'s, C: CompletionContext + ?Sized, A: ?Sized> Session<'s, C, A> {
    /// Variables in fixation-priority order: the atom traversal order, or
    /// registration order when seeded from the context.
    fn ordered_variables(&self) -> Vec<TyVid> {
        let not_fixed = self.ctx.not_fixed_type_variables();
        if self.collect_variables_from_context {
            return not_fixed.keys().copied().collect();
        }
        let mut seen = FxHashSet::default();
        let mut variables: Vec<TyVid> = ordered_type_variables(self.arena, self.top_level_atoms)
            .into_iter()
            .filter(|var| not_fixed.contains_key(var) && seen.insert(*var))
            .collect();
        if self.mode == CompletionMode::Full {
            // Variables no atom claims still have to be fixed.
            variables.extend(not_fixed.keys().copied().filter(|var| seen.insert(*var)));
        }
        variables
    }

    fn not_analyzed_postponed_atoms(&self) -> Vec<AtomId> {
        ordered_not_analyzed_postponed_atoms(self.arena, self.top_level_atoms)
    }

    fn progress(&self) -> Progress {
        Progress {
            not_fixed: self.ctx.not_fixed_type_variables().len(),
            registered: self.ctx.registered_variables().len(),
            atoms: self.arena.len(),
            analyzed: self.arena.analyzed_count(),
        }
    }
}

/// Stands in for the analyzer when the system is expected to be complete.
struct NoPostponedAnalysis;

impl<C: ?Sized> PostponedArgumentAnalyzer<C> for NoPostponedAnalysis {
    fn analyze(
        &mut self,
        _ctx: &mut C,
        _arena: &mut AtomArena,
        atom: AtomId,
        _sink: &mut dyn DiagnosticSink,
    ) -> CompletionResult<()> {
        log::error!("Postponed argument {} reached analysis in an already built constraint system", atom);
        Err(CompletionError::UnexpectedAnalysis { atom })
    }
}

impl<F: VariableFixationFinder, R: ResultTypeResolver> ConstraintSystemCompleter<F, R> {
    pub fn with_policies(finder: F, resolver: R, config: CompletionConfig) -> Self {
        Self {
            finder,
            resolver,
            config,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Completes the call rooted at `top_level_atoms`.
    ///
    /// Variables are collected by walking the atoms. `top_level_type` is
    /// the type of the whole call; in `Partial` mode variables related to it
    /// are left for the enclosing completion.
    ///
    /// Only cancellation and broken analyzer contracts are returned as
    /// errors. Everything else ends up as a diagnostic in `ctx`.
    #[allow(clippy::too_many_arguments)]
    pub fn run_completion<C, A>(
        &self,
        ctx: &mut C,
        arena: &mut AtomArena,
        mode: CompletionMode,
        top_level_atoms: &[AtomId],
        top_level_type: &Ty,
        sink: &mut dyn DiagnosticSink,
        analyzer: &mut A,
    ) -> CompletionResult<()>
    where
        C: CompletionContext + ?Sized,
        A: PostponedArgumentAnalyzer<C> + ?Sized,
    {
        let mut session = Session {
            ctx,
            arena,
            analyzer,
            sink,
            mode,
            top_level_atoms,
            top_level_type,
            collect_variables_from_context: false,
        };
        self.complete(&mut session)
    }

    /// Completes a system whose postponed arguments have all been analyzed
    /// already, in `Full` mode, fixing every not-fixed variable of `ctx`.
    ///
    /// Reaching a postponed argument that still needs analysis fails with
    /// [`CompletionError::UnexpectedAnalysis`].
    pub fn complete_constraint_system<C>(
        &self,
        ctx: &mut C,
        arena: &mut AtomArena,
        top_level_type: &Ty,
        top_level_atoms: &[AtomId],
        sink: &mut dyn DiagnosticSink,
    ) -> CompletionResult<()>
    where
        C: CompletionContext + ?Sized,
    {
        let mut analyzer = NoPostponedAnalysis;
        let mut session = Session {
            ctx,
            arena,
            analyzer: &mut analyzer,
            sink,
            mode: CompletionMode::Full,
            top_level_atoms,
            top_level_type,
            collect_variables_from_context: true,
        };
        self.complete(&mut session)
    }

    fn complete<C, A>(&self, s: &mut Session<'_, C, A>) -> CompletionResult<()>
    where
        C: CompletionContext + ?Sized,
        A: PostponedArgumentAnalyzer<C> + ?Sized,
    {
        log::debug!(
            "{:?} completion of {} top-level atoms, result type {}",
            s.mode,
            s.top_level_atoms.len(),
            s.top_level_type
        );
        let mut pass = 0;
        loop {
            pass += 1;
            let before = s.progress();
            self.run_pass(s)?;

            if s.mode == CompletionMode::Partial {
                break;
            }
            if s.ctx.not_fixed_type_variables().is_empty() || !s.ctx.postponed_type_variables().is_empty() {
                break;
            }
            if s.progress() == before {
                log::debug!("Completion pass {} made no progress", pass);
                break;
            }
            if pass >= self.config.max_passes {
                log::warn!(
                    "Stopping completion after {} passes with {} variables still not fixed",
                    pass,
                    s.ctx.not_fixed_type_variables().len()
                );
                break;
            }
            log::debug!("Starting completion pass {}", pass + 1);
        }
        Ok(())
    }

    fn run_pass<C, A>(&self, s: &mut Session<'_, C, A>) -> CompletionResult<()>
    where
        C: CompletionContext + ?Sized,
        A: PostponedArgumentAnalyzer<C> + ?Sized,
    {
        loop {
            if s.mode == CompletionMode::Partial && self.synthesize_lambda_signature(s)? {
                continue;
            }
            if self.unstick_postponed_atom(s)? {
                continue;
            }
            if self.analyze_ready_postponed_atom(s)? {
                continue;
            }
            if self.fix_next_variable(s)? {
                continue;
            }
            break;
        }
        if s.mode == CompletionMode::Full {
            self.analyze_remaining_postponed_atoms(s)?;
        }
        Ok(())
    }

    /// Analyzes the first postponed atom whose input types are settled.
    fn analyze_ready_postponed_atom<C, A>(&self, s: &mut Session<'_, C, A>) -> CompletionResult<bool>
    where
        C: CompletionContext + ?Sized,
        A: PostponedArgumentAnalyzer<C> + ?Sized,
    {
        for atom in s.not_analyzed_postponed_atoms() {
            self.cancellation.check()?;
            let Some(postponed) = s.arena.postponed(atom) else {
                continue;
            };
            let inputs = postponed.input_types();
            let expected_parameters: Vec<Ty> = postponed
                .expected_type()
                .map(|expected| s.ctx.substitute(&expected))
                .and_then(|expected| expected.as_function().map(|(params, _)| params.to_vec()))
                .unwrap_or_default();

            if self.fix_variables_inside_types(s, &expected_parameters)? {
                return Ok(true);
            }
            if inputs
                .iter()
                .all(|ty| s.ctx.contains_only_fixed_or_postponed_variables(ty))
            {
                self.analyze_postponed(s, atom)?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Fixes the finder's next recommendation, if the mode allows it.
    fn fix_next_variable<C, A>(&self, s: &mut Session<'_, C, A>) -> CompletionResult<bool>
    where
        C: CompletionContext + ?Sized,
        A: PostponedArgumentAnalyzer<C> + ?Sized,
    {
        let variables = s.ordered_variables();
        let postponed = s.not_analyzed_postponed_atoms();
        log::trace!("Fixation order: [{}]", variables.iter().join(", "));
        let Some(candidate) = self.finder.find_first_variable_for_fixation(
            &*s.ctx,
            s.arena,
            &variables,
            &postponed,
            s.mode,
            s.top_level_type,
        ) else {
            return Ok(false);
        };

        if candidate.has_proper_constraint {
            self.fix_with_resolver(s, candidate.variable)?;
            return Ok(true);
        }
        match s.mode {
            CompletionMode::Partial => Ok(false),
            CompletionMode::Full => {
                if self.force_resolution(s, &postponed)? {
                    return Ok(true);
                }
                self.fix_without_information(s, candidate.variable);
                Ok(true)
            }
        }
    }

    /// Analyzes a callable reference, or failing that a lambda waiting on a
    /// type variable, before giving up on a variable without evidence.
    fn force_resolution<C, A>(&self, s: &mut Session<'_, C, A>, postponed: &[AtomId]) -> CompletionResult<bool>
    where
        C: CompletionContext + ?Sized,
        A: PostponedArgumentAnalyzer<C> + ?Sized,
    {
        let first_matching = |pred: fn(&PostponedResolvedAtom) -> bool| {
            postponed
                .iter()
                .copied()
                .find(|atom| s.arena.postponed(*atom).map_or(false, pred))
        };
        let reference = first_matching(PostponedResolvedAtom::is_callable_reference);
        let lambda = first_matching(PostponedResolvedAtom::is_lambda_with_type_variable);

        if let Some(reference) = reference {
            self.cancellation.check()?;
            log::debug!("Forcing analysis of callable reference {}", reference);
            self.analyze_postponed(s, reference)?;
            return Ok(true);
        }
        if let Some(lambda) = lambda {
            self.cancellation.check()?;
            log::debug!("Forcing analysis of lambda {}", lambda);
            let shape = s
                .arena
                .postponed(lambda)
                .and_then(|p| p.expected_type_variable())
                .and_then(|var| find_functional_shape(&*s.ctx, var));
            let revised = prepare_lambda_for_analysis(s.ctx, s.arena, lambda, shape)?;
            self.analyze_postponed(s, revised)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Force-analyzes every atom still waiting, in traversal order.
    fn analyze_remaining_postponed_atoms<C, A>(&self, s: &mut Session<'_, C, A>) -> CompletionResult<()>
    where
        C: CompletionContext + ?Sized,
        A: PostponedArgumentAnalyzer<C> + ?Sized,
    {
        while let Some(atom) = s.not_analyzed_postponed_atoms().first().copied() {
            self.cancellation.check()?;
            log::debug!("Analyzing remaining postponed argument {}", atom);
            self.analyze_postponed(s, atom)?;
        }
        Ok(())
    }

    fn analyze_postponed<C, A>(&self, s: &mut Session<'_, C, A>, atom: AtomId) -> CompletionResult<()>
    where
        C: CompletionContext + ?Sized,
        A: PostponedArgumentAnalyzer<C> + ?Sized,
    {
        log::debug!("Analyzing postponed argument {}", atom);
        s.analyzer.analyze(s.ctx, s.arena, atom, s.sink)?;
        if !s.arena.is_analyzed(atom) {
            log::error!("Analyzer returned without marking {} as analyzed", atom);
            return Err(CompletionError::AnalyzerContract { atom });
        }
        Ok(())
    }

    fn fix_with_resolver<C, A>(&self, s: &mut Session<'_, C, A>, var: TyVid) -> CompletionResult<()>
    where
        C: CompletionContext + ?Sized,
        A: ?Sized,
    {
        let Some(variable) = s.ctx.not_fixed_type_variables().get(&var).cloned() else {
            return Err(CompletionError::Internal(format!(
                "variable {} was chosen for fixation but is not open",
                var
            )));
        };
        let result = self
            .resolver
            .find_result_type(&*s.ctx, &variable, ResolveDirection::Unknown);
        let atom = find_atom_introducing(s.arena, s.top_level_atoms, var);
        s.ctx.fix_variable(var, result, atom);
        Ok(())
    }

    /// Fixes a variable nothing constrains to the error type.
    fn fix_without_information<C, A>(&self, s: &mut Session<'_, C, A>, var: TyVid)
    where
        C: CompletionContext + ?Sized,
        A: ?Sized,
    {
        let atom =
            find_atom_introducing(s.arena, s.top_level_atoms, var).or_else(|| s.top_level_atoms.first().copied());
        if self.config.report_not_enough_information {
            let name = s
                .ctx
                .type_variable(var)
                .map(|variable| variable.name())
                .unwrap_or_else(|| var.to_string());
            s.ctx.add_error(InferenceDiagnostic::NotEnoughInformation {
                variable: var,
                name,
                atom,
            });
        }
        s.ctx.fix_variable(var, Ty::Error, atom);
    }
}
