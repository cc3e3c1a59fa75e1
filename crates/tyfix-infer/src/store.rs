//! Reference implementation of the constraint-store capabilities.

use std::collections::VecDeque;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use tyfix_types::{
    AtomId, ConcreteTy, Constraint, ConstraintKind, ConstraintPosition, Substitution, Ty, TyVid, TypeVariable,
    VariableWithConstraints,
};

use crate::context::{ConstraintBuilder, ConstraintMutation, ConstraintQuery};
use crate::error::InferenceDiagnostic;

/// Safety net against constraint sets that keep growing under incorporation.
const MAX_CHECK_STEPS: usize = 100_000;

/// What a variable was fixed to, and by whom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixation {
    pub ty: Ty,
    pub atom: Option<AtomId>,
}

#[derive(Debug, Clone)]
struct SubtypeCheck {
    sub: Ty,
    sup: Ty,
    position: ConstraintPosition,
}

impl SubtypeCheck {
    fn new(sub: Ty, sup: Ty, position: ConstraintPosition) -> Self {
        Self { sub, sup, position }
    }
}

/// Owns every type variable of one inference, its bounds and its fixation.
///
/// Failed subtype checks never return errors; they are recorded as
/// [`InferenceDiagnostic`]s and inference carries on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintStore {
    variables: FxHashMap<TyVid, TypeVariable>,
    registration_order: Vec<TyVid>,
    not_fixed: IndexMap<TyVid, VariableWithConstraints>,
    postponed: Vec<TyVid>,
    fixed: FxHashMap<TyVid, Fixation>,
    substitution: Substitution,
    diagnostics: Vec<InferenceDiagnostic>,
    next_var: u32,
}

impl ConstraintStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[InferenceDiagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<InferenceDiagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn fixation_of(&self, var: TyVid) -> Option<&Fixation> {
        self.fixed.get(&var)
    }

    /// Bounds currently recorded for a not-fixed variable.
    pub fn constraints_of(&self, var: TyVid) -> Option<&[Constraint]> {
        self.not_fixed.get(&var).map(VariableWithConstraints::constraints)
    }

    /// Defers `var` to an enclosing inference. Postponed variables count as
    /// resolved when deciding whether an atom can be analyzed.
    pub fn postpone_variable(&mut self, var: TyVid) {
        if self.not_fixed.contains_key(&var) && !self.postponed.contains(&var) {
            log::debug!("Postponing {}", var);
            self.postponed.push(var);
        }
    }

    fn is_open(&self, var: TyVid) -> bool {
        self.not_fixed.contains_key(&var)
    }

    fn report(&mut self, diagnostic: InferenceDiagnostic) {
        log::debug!("Inference diagnostic: {}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    fn run_checks(&mut self, mut queue: VecDeque<SubtypeCheck>) {
        let mut steps = 0;
        while let Some(check) = queue.pop_front() {
            steps += 1;
            if steps > MAX_CHECK_STEPS {
                log::warn!("Giving up on constraint incorporation after {} steps", MAX_CHECK_STEPS);
                break;
            }
            self.check_subtype(check, &mut queue);
        }
    }

    fn check_subtype(&mut self, check: SubtypeCheck, queue: &mut VecDeque<SubtypeCheck>) {
        let sub = check.sub.substitute(&self.substitution);
        let sup = check.sup.substitute(&self.substitution);
        let position = check.position;
        if sub == sup {
            return;
        }
        match (&sub, &sup) {
            (Ty::Error, _) | (_, Ty::Error) => {}
            (Ty::Var(a), Ty::Var(b)) if self.is_open(*a) && self.is_open(*b) => {
                self.add_bound(*a, Constraint::new(sup.clone(), ConstraintKind::Upper, position), queue);
                self.add_bound(*b, Constraint::new(sub.clone(), ConstraintKind::Lower, position), queue);
            }
            (Ty::Var(a), _) if self.is_open(*a) => {
                self.add_bound(*a, Constraint::new(sup.clone(), ConstraintKind::Upper, position), queue);
            }
            (_, Ty::Var(b)) if self.is_open(*b) => {
                self.add_bound(*b, Constraint::new(sub.clone(), ConstraintKind::Lower, position), queue);
            }
            _ if sub.is_nothing() || sup.is_any() => {}
            (Ty::Function { params: p1, ret: r1 }, Ty::Function { params: p2, ret: r2 }) => {
                if p1.len() != p2.len() {
                    self.report(InferenceDiagnostic::ArityMismatch {
                        expected: p2.len(),
                        found: p1.len(),
                        position,
                    });
                    return;
                }
                for (expected, found) in p2.iter().zip(p1.iter()) {
                    queue.push_back(SubtypeCheck::new(expected.clone(), found.clone(), position));
                }
                queue.push_back(SubtypeCheck::new((**r1).clone(), (**r2).clone(), position));
            }
            (Ty::Tuple(e1), Ty::Tuple(e2)) if e1.len() == e2.len() => {
                for (a, b) in e1.iter().zip(e2.iter()) {
                    queue.push_back(SubtypeCheck::new(a.clone(), b.clone(), position));
                }
            }
            (
                Ty::Concrete(ConcreteTy::Named { name: n1, args: a1 }),
                Ty::Concrete(ConcreteTy::Named { name: n2, args: a2 }),
            ) if n1 == n2 && a1.len() == a2.len() => {
                // Invariant arguments
                for (a, b) in a1.iter().zip(a2.iter()) {
                    queue.push_back(SubtypeCheck::new(a.clone(), b.clone(), position));
                    queue.push_back(SubtypeCheck::new(b.clone(), a.clone(), position));
                }
            }
            _ if !sub.has_type_variables() && !sup.has_type_variables() && sub.is_subtype_of(&sup) => {}
            _ => self.report(InferenceDiagnostic::TypeMismatch {
                lower: sub.clone(),
                upper: sup.clone(),
                position,
            }),
        }
    }

    /// Records a bound and queues the checks it implies against the bounds
    /// already present.
    fn add_bound(&mut self, var: TyVid, constraint: Constraint, queue: &mut VecDeque<SubtypeCheck>) {
        if constraint.ty == Ty::Var(var) {
            return;
        }
        let Some(entry) = self.not_fixed.get_mut(&var) else {
            return;
        };
        let existing = entry.constraints().to_vec();
        if !entry.add_constraint(constraint.clone()) {
            return;
        }
        log::trace!("{} {}", var, constraint);
        for other in &existing {
            incorporate(&constraint, other, queue);
        }
    }
}

fn incorporate(new: &Constraint, other: &Constraint, queue: &mut VecDeque<SubtypeCheck>) {
    use ConstraintKind::*;
    let position = ConstraintPosition::Incorporation;
    let mut push = |sub: &Ty, sup: &Ty| queue.push_back(SubtypeCheck::new(sub.clone(), sup.clone(), position));
    match (new.kind, other.kind) {
        (Lower, Upper) | (Lower, Equality) | (Equality, Upper) => push(&new.ty, &other.ty),
        (Upper, Lower) | (Equality, Lower) | (Upper, Equality) => push(&other.ty, &new.ty),
        (Equality, Equality) => {
            push(&new.ty, &other.ty);
            push(&other.ty, &new.ty);
        }
        (Lower, Lower) | (Upper, Upper) => {}
    }
}

impl ConstraintQuery for ConstraintStore {
    fn not_fixed_type_variables(&self) -> &IndexMap<TyVid, VariableWithConstraints> {
        &self.not_fixed
    }

    fn postponed_type_variables(&self) -> &[TyVid] {
        &self.postponed
    }

    fn type_variable(&self, var: TyVid) -> Option<&TypeVariable> {
        self.variables.get(&var)
    }

    fn fixed_type(&self, var: TyVid) -> Option<&Ty> {
        self.fixed.get(&var).map(|fixation| &fixation.ty)
    }

    fn substitute(&self, ty: &Ty) -> Ty {
        ty.substitute(&self.substitution)
    }
}

impl ConstraintMutation for ConstraintStore {
    fn add_error(&mut self, diagnostic: InferenceDiagnostic) {
        self.report(diagnostic);
    }

    fn fix_variable(&mut self, var: TyVid, result: Ty, atom: Option<AtomId>) {
        if self.fixed.contains_key(&var) {
            log::error!("Type variable {} is already fixed", var);
            self.report(InferenceDiagnostic::AlreadyFixed { variable: var });
            return;
        }
        let Some(entry) = self.not_fixed.shift_remove(&var) else {
            log::error!("Cannot fix unregistered type variable {}", var);
            return;
        };
        self.postponed.retain(|postponed| *postponed != var);

        let result = result.substitute(&self.substitution);
        log::debug!("Fixing {} := {}", entry.variable, result);
        self.substitution.insert(var, result.clone());
        self.fixed.insert(var, Fixation { ty: result.clone(), atom });

        let position = ConstraintPosition::FixVariable(var);
        let mut queue = VecDeque::new();
        for constraint in entry.constraints() {
            let bound = constraint.ty.clone();
            match constraint.kind {
                ConstraintKind::Lower => queue.push_back(SubtypeCheck::new(bound, result.clone(), position)),
                ConstraintKind::Upper => queue.push_back(SubtypeCheck::new(result.clone(), bound, position)),
                ConstraintKind::Equality => {
                    queue.push_back(SubtypeCheck::new(bound.clone(), result.clone(), position));
                    queue.push_back(SubtypeCheck::new(result.clone(), bound, position));
                }
            }
        }
        self.run_checks(queue);

        for other in self.not_fixed.values_mut() {
            other.substitute(&self.substitution);
        }
    }
}

impl ConstraintBuilder for ConstraintStore {
    fn fresh_type_variable_id(&mut self) -> TyVid {
        while self.variables.contains_key(&TyVid(self.next_var)) {
            self.next_var += 1;
        }
        let id = TyVid(self.next_var);
        self.next_var += 1;
        id
    }

    fn register_variable(&mut self, variable: TypeVariable) {
        let id = variable.id;
        if self.variables.contains_key(&id) {
            log::warn!("Type variable {} is already registered", id);
            return;
        }
        log::trace!("Registering {}", variable);
        self.next_var = self.next_var.max(id.0 + 1);
        self.registration_order.push(id);
        self.not_fixed.insert(id, VariableWithConstraints::new(variable.clone()));
        self.variables.insert(id, variable);
    }

    fn add_subtype_constraint(&mut self, subtype: Ty, supertype: Ty, position: ConstraintPosition) {
        let mut queue = VecDeque::new();
        queue.push_back(SubtypeCheck::new(subtype, supertype, position));
        self.run_checks(queue);
    }

    fn add_equality_constraint(&mut self, a: Ty, b: Ty, position: ConstraintPosition) {
        let a = a.substitute(&self.substitution);
        let b = b.substitute(&self.substitution);
        let mut queue = VecDeque::new();
        let a_var = a.as_var().filter(|var| self.is_open(*var));
        let b_var = b.as_var().filter(|var| self.is_open(*var));
        if let Some(var) = a_var {
            self.add_bound(var, Constraint::new(b.clone(), ConstraintKind::Equality, position), &mut queue);
        }
        if let Some(var) = b_var {
            self.add_bound(var, Constraint::new(a.clone(), ConstraintKind::Equality, position), &mut queue);
        }
        if a_var.is_none() && b_var.is_none() {
            queue.push_back(SubtypeCheck::new(a.clone(), b.clone(), position));
            queue.push_back(SubtypeCheck::new(b, a, position));
        }
        self.run_checks(queue);
    }

    fn registered_variables(&self) -> Vec<TyVid> {
        self.registration_order.clone()
    }
}
