//! Score calculator boundary.
//!
//! The director owns one calculator and forwards every notification of the
//! protocol to it. Non-incremental calculators ignore the hooks and evaluate
//! the whole solution in [`ScoreCalculator::calculate_score`].

use std::fmt;
use std::sync::Arc;

use scoreforge_core::domain::{Entity, EntityId, SolutionDescriptor, VariableRef, WorkingSolution};
use scoreforge_core::{ConstraintRef, ImpactType, Score};

use super::analysis::{ConstraintMatch, Justification};
use super::weight_overrides::{scale, ConstraintWeightOverrides};

/// Computes the raw score of a working solution.
///
/// Hooks arrive in the same before/after pairs the director receives. In a
/// `before_*` hook the solution still shows the old state; in an `after_*`
/// hook it shows the new one.
pub trait ScoreCalculator<Sc: Score>: Send {
    /// Drops all incremental state and rebuilds it from `solution`.
    fn reset_working_solution(
        &mut self,
        solution: &WorkingSolution,
        constraint_match_enabled: bool,
    );

    fn after_entity_added(&mut self, _solution: &WorkingSolution, _entity: EntityId) {}

    fn before_entity_removed(&mut self, _solution: &WorkingSolution, _entity: EntityId) {}

    fn after_entity_removed(
        &mut self,
        _solution: &WorkingSolution,
        _entity: EntityId,
        _removed: &Entity,
    ) {
    }

    fn before_variable_changed(
        &mut self,
        _solution: &WorkingSolution,
        _variable: VariableRef,
        _entity: EntityId,
    ) {
    }

    fn after_variable_changed(
        &mut self,
        _solution: &WorkingSolution,
        _variable: VariableRef,
        _entity: EntityId,
    ) {
    }

    fn before_list_variable_changed(
        &mut self,
        _solution: &WorkingSolution,
        _variable: VariableRef,
        _entity: EntityId,
        _from: usize,
        _to: usize,
    ) {
    }

    fn after_list_variable_changed(
        &mut self,
        _solution: &WorkingSolution,
        _variable: VariableRef,
        _entity: EntityId,
        _from: usize,
        _to: usize,
    ) {
    }

    fn calculate_score(&mut self, solution: &WorkingSolution) -> Sc;

    /// The matches behind the last score. Empty unless constraint matches
    /// were enabled on the last reset and the calculator supports them.
    fn constraint_matches(&mut self, _solution: &WorkingSolution) -> Vec<ConstraintMatch<Sc>> {
        Vec::new()
    }

    fn is_incremental(&self) -> bool {
        false
    }
}

/// Builds a calculator for a director. Each director gets its own.
pub type CalculatorSupplier<Sc> =
    Arc<dyn Fn(&Arc<SolutionDescriptor>) -> Box<dyn ScoreCalculator<Sc>> + Send + Sync>;

/// Evaluates the whole solution with a plain function on every calculation.
pub struct EasyScoreCalculator<Sc: Score> {
    calculate: fn(&WorkingSolution) -> Sc,
}

impl<Sc: Score> EasyScoreCalculator<Sc> {
    pub fn new(calculate: fn(&WorkingSolution) -> Sc) -> Self {
        Self { calculate }
    }

    pub fn supplier(calculate: fn(&WorkingSolution) -> Sc) -> CalculatorSupplier<Sc> {
        Arc::new(move |_| Box::new(EasyScoreCalculator::new(calculate)))
    }
}

impl<Sc: Score> fmt::Debug for EasyScoreCalculator<Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EasyScoreCalculator").finish()
    }
}

impl<Sc: Score> ScoreCalculator<Sc> for EasyScoreCalculator<Sc> {
    fn reset_working_solution(
        &mut self,
        _solution: &WorkingSolution,
        _constraint_match_enabled: bool,
    ) {
    }

    fn calculate_score(&mut self, solution: &WorkingSolution) -> Sc {
        (self.calculate)(solution)
    }
}

/// Finds the matches of one constraint.
pub type Matcher = fn(&SolutionDescriptor, &WorkingSolution) -> Vec<Justification>;

/// A named constraint: every justification its matcher finds is worth
/// `weight`, penalized or rewarded.
#[derive(Clone)]
pub struct ConstraintDefinition<Sc: Score> {
    pub constraint_ref: ConstraintRef,
    pub impact: ImpactType,
    pub weight: Sc,
    pub matcher: Matcher,
}

impl<Sc: Score> ConstraintDefinition<Sc> {
    pub fn penalize(constraint_ref: ConstraintRef, weight: Sc, matcher: Matcher) -> Self {
        Self {
            constraint_ref,
            impact: ImpactType::Penalty,
            weight,
            matcher,
        }
    }

    pub fn reward(constraint_ref: ConstraintRef, weight: Sc, matcher: Matcher) -> Self {
        Self {
            constraint_ref,
            impact: ImpactType::Reward,
            weight,
            matcher,
        }
    }
}

impl<Sc: Score> fmt::Debug for ConstraintDefinition<Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintDefinition")
            .field("constraint_ref", &self.constraint_ref)
            .field("impact", &self.impact)
            .field("weight", &self.weight)
            .finish()
    }
}

/// Scores a solution as the sum of a set of named constraints.
///
/// Weights are resolved on every reset from the constraint configuration
/// fact, so a changed configuration property takes effect once the director
/// resets.
#[derive(Debug)]
pub struct ConstraintSetCalculator<Sc: Score> {
    descriptor: Arc<SolutionDescriptor>,
    constraints: Arc<[ConstraintDefinition<Sc>]>,
    // Signed score of one match, per constraint.
    match_scores: Vec<Sc>,
}

impl<Sc: Score> ConstraintSetCalculator<Sc> {
    pub fn new(
        descriptor: Arc<SolutionDescriptor>,
        constraints: Arc<[ConstraintDefinition<Sc>]>,
    ) -> Self {
        let match_scores = constraints.iter().map(signed_weight).collect();
        Self {
            descriptor,
            constraints,
            match_scores,
        }
    }

    pub fn supplier(constraints: Vec<ConstraintDefinition<Sc>>) -> CalculatorSupplier<Sc> {
        let constraints: Arc<[ConstraintDefinition<Sc>]> = constraints.into();
        Arc::new(move |descriptor| {
            Box::new(ConstraintSetCalculator::new(descriptor.clone(), constraints.clone()))
        })
    }

    /// Score of one match of constraint `index` under the current weights.
    pub fn match_score(&self, index: usize) -> Option<Sc> {
        self.match_scores.get(index).copied()
    }
}

fn signed_weight<Sc: Score>(constraint: &ConstraintDefinition<Sc>) -> Sc {
    match constraint.impact {
        ImpactType::Penalty => -constraint.weight,
        ImpactType::Reward => constraint.weight,
    }
}

impl<Sc: Score> ScoreCalculator<Sc> for ConstraintSetCalculator<Sc> {
    fn reset_working_solution(
        &mut self,
        solution: &WorkingSolution,
        _constraint_match_enabled: bool,
    ) {
        let overrides = ConstraintWeightOverrides::from_configuration(
            &self.descriptor,
            solution,
            self.constraints.iter().map(|c| (&c.constraint_ref, c.weight)),
        );
        self.match_scores = self
            .constraints
            .iter()
            .map(|c| {
                let weight = overrides.get_or_default(&c.constraint_ref.full_name(), c.weight);
                match c.impact {
                    ImpactType::Penalty => -weight,
                    ImpactType::Reward => weight,
                }
            })
            .collect();
    }

    fn calculate_score(&mut self, solution: &WorkingSolution) -> Sc {
        self.constraints
            .iter()
            .zip(&self.match_scores)
            .fold(Sc::zero(), |total, (constraint, match_score)| {
                let count = (constraint.matcher)(&self.descriptor, solution).len() as i64;
                total + scale(*match_score, count)
            })
    }

    fn constraint_matches(&mut self, solution: &WorkingSolution) -> Vec<ConstraintMatch<Sc>> {
        let mut matches = Vec::new();
        for (constraint, match_score) in self.constraints.iter().zip(&self.match_scores) {
            for justification in (constraint.matcher)(&self.descriptor, solution) {
                matches.push(ConstraintMatch::new(
                    constraint.constraint_ref.clone(),
                    justification,
                    *match_score,
                ));
            }
        }
        matches
    }
}
