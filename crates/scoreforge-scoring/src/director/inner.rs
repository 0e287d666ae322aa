//! The incremental score director.

use std::fmt;
use std::sync::Arc;

use scoreforge_core::domain::{
    Entity, EntityDescriptor, EntityId, Handle, InitializationStatistics, ProblemSizeStatistics,
    SolutionDescriptor, Value, ValueRange, VariableRef, WorkingSolution,
};
use scoreforge_core::{InnerScore, Result, Score, ScoreForgeError};
use tracing::{debug, trace};

use super::factory::{ChildThreadType, ScoreDirectorFactory};
use crate::api::{
    group_constraint_matches, ConstraintMatchMap, ConstraintMatchPolicy, EntityChange,
    EntityChangeTracker, ScoreCalculator, ScoreExplanation,
};
use crate::lookup::{LookupKey, LookupRegistry};
use crate::shadow::{ShadowPropagation, ShadowUpdate};
use crate::tracker::SolutionTracker;
use crate::validator::EntityValidator;
use crate::value_range::ValueRangeCache;

/// Keeps the score of one working solution up to date while moves change it.
///
/// The director owns the working solution. Callers mutate it only through
/// the [`ScoreDirector`](super::ScoreDirector) hooks (or the facades built
/// on them), which keep the calculator, the shadow propagation engine, the
/// lookup registry and the initialization counters in step.
///
/// Two counters track how far the solution is from fully assigned:
/// one for basic variables that disallow unassignment, one for list
/// elements outside every list. Both are zero or negative at all times.
pub struct InnerScoreDirector<Sc: Score> {
    pub(super) factory: Arc<ScoreDirectorFactory<Sc>>,
    pub(super) descriptor: Arc<SolutionDescriptor>,
    pub(super) working_solution: Option<WorkingSolution>,
    pub(super) calculator: Box<dyn ScoreCalculator<Sc>>,
    pub(super) shadow: Box<dyn ShadowPropagation>,
    pub(super) change_tracker: Option<Box<dyn EntityChangeTracker>>,
    pub(super) value_ranges: ValueRangeCache,
    pub(super) lookup_enabled: bool,
    pub(super) lookup: LookupRegistry,
    pub(super) constraint_match_policy: ConstraintMatchPolicy,
    pub(super) expect_shadow_variables_in_correct_state: bool,
    pub(super) assert_cloned_solution: bool,
    pub(super) derived: bool,
    pub(super) tracker: Option<SolutionTracker>,
    pub(super) basic_init_score: i64,
    pub(super) list_init_score: i64,
    pub(super) working_genuine_entity_count: usize,
    pub(super) working_entity_list_revision: u64,
    pub(super) all_changes_will_be_undone_before_step_ends: bool,
    pub(super) calculation_count: u64,
    pub(super) undo_move_text: Option<String>,
}

impl<Sc: Score> InnerScoreDirector<Sc> {
    pub(super) fn new(
        factory: Arc<ScoreDirectorFactory<Sc>>,
        lookup_enabled: bool,
        constraint_match_policy: ConstraintMatchPolicy,
        derived: bool,
    ) -> Self {
        let descriptor = factory.solution_descriptor().clone();
        let config = factory.config();
        let calculator = factory.new_calculator();
        let shadow = factory.new_shadow_propagation();
        let tracker = config.track_working_solution().then(SolutionTracker::new);
        Self {
            value_ranges: ValueRangeCache::new(descriptor.clone()),
            expect_shadow_variables_in_correct_state: config
                .expect_shadow_variables_in_correct_state,
            assert_cloned_solution: config.assert_cloned_solution(),
            descriptor,
            working_solution: None,
            calculator,
            shadow,
            change_tracker: None,
            lookup_enabled,
            lookup: LookupRegistry::new(),
            constraint_match_policy,
            derived,
            tracker,
            basic_init_score: 0,
            list_init_score: 0,
            working_genuine_entity_count: 0,
            working_entity_list_revision: 0,
            all_changes_will_be_undone_before_step_ends: false,
            calculation_count: 0,
            undo_move_text: None,
            factory,
        }
    }

    pub fn factory(&self) -> &Arc<ScoreDirectorFactory<Sc>> {
        &self.factory
    }

    pub fn descriptor(&self) -> &Arc<SolutionDescriptor> {
        &self.descriptor
    }

    pub fn constraint_match_policy(&self) -> ConstraintMatchPolicy {
        self.constraint_match_policy
    }

    pub fn is_lookup_enabled(&self) -> bool {
        self.lookup_enabled
    }

    /// Whether this director was derived from another one, for assertions
    /// or child threads.
    pub fn is_derived(&self) -> bool {
        self.derived
    }

    pub fn is_incremental(&self) -> bool {
        self.calculator.is_incremental()
    }

    pub fn calculation_count(&self) -> u64 {
        self.calculation_count
    }

    pub fn reset_calculation_count(&mut self) {
        self.calculation_count = 0;
    }

    pub fn increment_calculation_count(&mut self) {
        self.calculation_count += 1;
    }

    /// Sum of both initialization counters.
    pub fn working_init_score(&self) -> i64 {
        self.basic_init_score + self.list_init_score
    }

    pub fn working_genuine_entity_count(&self) -> usize {
        self.working_genuine_entity_count
    }

    pub fn working_entity_list_revision(&self) -> u64 {
        self.working_entity_list_revision
    }

    /// Whether entities were added or removed since `expected_revision`.
    pub fn is_working_entity_list_dirty(&self, expected_revision: u64) -> bool {
        self.working_entity_list_revision != expected_revision
    }

    pub fn all_changes_will_be_undone_before_step_ends(&self) -> bool {
        self.all_changes_will_be_undone_before_step_ends
    }

    pub(super) fn set_all_changes_will_be_undone_before_step_ends(&mut self, undone: bool) {
        self.all_changes_will_be_undone_before_step_ends = undone;
    }

    pub fn set_change_tracker(&mut self, tracker: Option<Box<dyn EntityChangeTracker>>) {
        self.change_tracker = tracker;
    }

    pub fn solution_tracker(&self) -> Option<&SolutionTracker> {
        self.tracker.as_ref()
    }

    pub fn has_working_solution(&self) -> bool {
        self.working_solution.is_some()
    }

    /// Installs `solution` as the working solution, validating its entities
    /// against the configured shadow expectation.
    pub fn set_working_solution(&mut self, solution: WorkingSolution) -> Result<()> {
        let expect = self.expect_shadow_variables_in_correct_state;
        self.set_working_solution_with_verification(solution, expect)
    }

    /// Installs `solution` as the working solution.
    ///
    /// Every cache is rebuilt, the entities are validated, and the
    /// initialization counters are recomputed from scratch before the
    /// calculator and the shadow propagation engine see the new solution.
    ///
    /// # Errors
    ///
    /// - [`ScoreForgeError::DomainModel`] for duplicate planning ids when lookup is enabled
    /// - any validation error of [`EntityValidator::validate`]
    pub fn set_working_solution_with_verification(
        &mut self,
        solution: WorkingSolution,
        expect_shadows_correct: bool,
    ) -> Result<()> {
        self.value_ranges.reset(Some(&solution));
        if self.lookup_enabled {
            self.lookup.reset(&self.descriptor, &solution)?;
        }
        EntityValidator::new(&self.descriptor, &solution, expect_shadows_correct).validate_all()?;
        let statistics = self.value_ranges.initialization_statistics(&solution)?;
        self.working_entity_list_revision += 1;
        self.basic_init_score = -(statistics.uninitialized_variable_count as i64);
        self.list_init_score = -(statistics.unassigned_value_count as i64);
        self.working_genuine_entity_count = statistics.genuine_entity_count;
        self.shadow.reset_working_solution(&solution);
        self.calculator
            .reset_working_solution(&solution, self.constraint_match_policy.is_enabled());
        if let Some(change_tracker) = self.change_tracker.as_mut() {
            change_tracker.reset();
        }
        debug!(
            event = "working_solution_set",
            entity_count = solution.entity_count(),
            fact_count = solution.fact_count(),
            genuine_entity_count = statistics.genuine_entity_count,
            init_score = self.working_init_score(),
            derived = self.derived,
        );
        self.working_solution = Some(solution);
        Ok(())
    }

    /// Takes the working solution out of the director.
    pub fn take_working_solution(&mut self) -> Option<WorkingSolution> {
        self.working_solution.take()
    }

    /// Runs the queued shadow updates, then asks the calculator for the score.
    ///
    /// The result carries the unassigned count of both counters and is
    /// written back onto the working solution.
    pub fn calculate_score(&mut self) -> Result<InnerScore<Sc>> {
        self.trigger_queued_shadow_updates()?;
        let unassigned_count = -self.working_init_score();
        let solution = self.working_solution.as_mut().ok_or_else(no_working_solution)?;
        let raw = self.calculator.calculate_score(solution);
        let score = InnerScore::with_unassigned(raw, unassigned_count)?;
        solution.set_score(Some(score.snapshot()));
        self.calculation_count += 1;
        Ok(score)
    }

    /// Constraint matches of the current solution, grouped per constraint.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreForgeError::IllegalState`] when constraint matches are disabled.
    pub fn constraint_match_map(&mut self) -> Result<ConstraintMatchMap<Sc>> {
        if !self.constraint_match_policy.is_enabled() {
            return Err(ScoreForgeError::IllegalState(format!(
                "When constraint matches are disabled ({}), this method should not be called.\nMaybe enable constraint matches on the score director.",
                self.constraint_match_policy
            )));
        }
        self.trigger_queued_shadow_updates()?;
        let solution = require(&self.working_solution)?;
        Ok(group_constraint_matches(self.calculator.constraint_matches(solution)))
    }

    /// Score and constraint breakdown of the current solution.
    pub fn explain_score(&mut self) -> Result<ScoreExplanation<Sc>> {
        let score = self.calculate_score()?;
        let matches = self.constraint_match_map()?;
        Ok(ScoreExplanation::new(score.raw(), matches))
    }

    pub(super) fn trigger_queued_shadow_updates(&mut self) -> Result<()> {
        let updates = self.shadow.trigger_queued(require(&self.working_solution)?)?;
        self.apply_shadow_updates(updates)
    }

    /// Recomputes every shadow variable, changed or not.
    pub fn force_trigger_variable_listeners(&mut self) -> Result<()> {
        let updates = self.shadow.force_trigger_all(require(&self.working_solution)?)?;
        self.apply_shadow_updates(updates)
    }

    // Shadow writes reach the calculator like any other variable change,
    // but never touch the counters.
    fn apply_shadow_updates(&mut self, updates: Vec<ShadowUpdate>) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }
        let solution = self.working_solution.as_mut().ok_or_else(no_working_solution)?;
        for update in updates {
            self.calculator
                .before_variable_changed(solution, update.variable, update.entity);
            solution.set_value(update.entity, update.variable.ordinal, update.value)?;
            self.calculator
                .after_variable_changed(solution, update.variable, update.entity);
            if let Some(change_tracker) = self.change_tracker.as_mut() {
                change_tracker
                    .entity_changed(update.entity, EntityChange::VariableChanged(update.variable));
            }
        }
        Ok(())
    }

    /// A planning clone of `original` through the configured cloner.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreForgeError::CloningCorruption`] when clone assertions
    /// are on and the clone lost the score or shares an entity with
    /// `original`.
    pub fn clone_solution(&self, original: &WorkingSolution) -> Result<WorkingSolution> {
        let clone = self.factory.cloner().clone_solution(original);
        if self.assert_cloned_solution {
            if original.score() != clone.score() {
                return Err(ScoreForgeError::CloningCorruption(format!(
                    "Cloning corruption: the original's score ({}) is different from the clone's score ({}).\nCheck the solution cloner.",
                    render_score(original),
                    render_score(&clone)
                )));
            }
            let shared = clone
                .shared_instances(original)
                .into_iter()
                .find_map(|handle| match handle {
                    Handle::Entity(id) => original.entity(id),
                    Handle::Fact(_) => None,
                });
            if let Some(entity) = shared {
                return Err(ScoreForgeError::CloningCorruption(format!(
                    "Cloning corruption: the same entity ({}) is present in both the original and the clone.\nSo when a planning variable in the original solution changes, the cloned solution will change too.\nCheck the solution cloner.",
                    original.describe_entity(&self.descriptor, entity)
                )));
            }
        }
        trace!(event = "solution_cloned", asserted = self.assert_cloned_solution);
        Ok(clone)
    }

    pub fn clone_working_solution(&self) -> Result<WorkingSolution> {
        self.clone_solution(require(&self.working_solution)?)
    }

    /// A director for another thread, built by the same factory.
    ///
    /// Partition children start empty and inherit the calculation count.
    /// Move thread children get a clone of the working solution and always
    /// have lookup enabled, since moves are rebased onto them.
    pub fn create_child_thread_score_director(
        &self,
        child_thread_type: ChildThreadType,
    ) -> Result<InnerScoreDirector<Sc>> {
        match child_thread_type {
            ChildThreadType::Partition => {
                let mut child = self
                    .factory
                    .build_derived(self.lookup_enabled, self.constraint_match_policy);
                child.calculation_count = self.calculation_count;
                Ok(child)
            }
            ChildThreadType::MoveThread => {
                let mut child = self.factory.build_derived(true, self.constraint_match_policy);
                child.set_working_solution(self.clone_working_solution()?)?;
                Ok(child)
            }
        }
    }

    pub fn value_range_from_solution(&mut self, range: usize) -> Result<Arc<ValueRange>> {
        let solution = require(&self.working_solution)?;
        self.value_ranges.get_from_solution(range, solution)
    }

    pub fn value_range_from_entity(
        &mut self,
        range: usize,
        entity: EntityId,
    ) -> Result<Arc<ValueRange>> {
        let solution = require(&self.working_solution)?;
        self.value_ranges.get_from_entity(range, solution, entity)
    }

    pub fn is_value_in_range(
        &mut self,
        variable: VariableRef,
        entity: EntityId,
        value: &Value,
    ) -> Result<bool> {
        let solution = require(&self.working_solution)?;
        self.value_ranges.is_value_in_range(variable, solution, entity, value)
    }

    pub fn initialization_statistics(&mut self) -> Result<InitializationStatistics> {
        let solution = require(&self.working_solution)?;
        self.value_ranges.initialization_statistics(solution)
    }

    pub fn problem_size_statistics(&mut self) -> Result<ProblemSizeStatistics> {
        let solution = require(&self.working_solution)?;
        self.value_ranges.problem_size_statistics(solution)
    }

    fn check_lookup_enabled(&self) -> Result<()> {
        if !self.lookup_enabled {
            return Err(ScoreForgeError::IllegalState(
                "When lookUpEnabled (false) is disabled in the constructor, this method should not be called."
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// The working counterpart of an external object.
    ///
    /// # Errors
    ///
    /// - [`ScoreForgeError::IllegalState`] when lookup is disabled
    /// - [`ScoreForgeError::IllegalState`] when nothing is registered under `key`
    pub fn look_up_working_object(&self, key: &LookupKey) -> Result<Handle> {
        self.check_lookup_enabled()?;
        self.lookup.look_up_working_object(key)
    }

    /// Like [`look_up_working_object`](Self::look_up_working_object), but a
    /// missing object is `None`.
    pub fn look_up_working_object_or_none(&self, key: &LookupKey) -> Result<Option<Handle>> {
        self.check_lookup_enabled()?;
        Ok(self.lookup.look_up_working_object_or_none(key))
    }

    /// Releases the working solution and every cache. Idempotent.
    pub fn close(&mut self) {
        self.working_solution = None;
        self.basic_init_score = 0;
        self.list_init_score = 0;
        self.working_genuine_entity_count = 0;
        self.undo_move_text = None;
        self.lookup.clear();
        self.value_ranges.clear();
        self.shadow.close();
        debug!(
            event = "score_director_closed",
            derived = self.derived,
            calculation_count = self.calculation_count,
        );
    }

    pub(super) fn bump_revision(&mut self) {
        if !self.all_changes_will_be_undone_before_step_ends {
            self.working_entity_list_revision += 1;
        }
    }

    pub(super) fn check_init_score(&self) -> Result<()> {
        let init_score = self.working_init_score();
        if init_score > 0 {
            return Err(ScoreForgeError::InvariantViolation(format!(
                "workingInitScore > 0 ({}).\nMaybe a custom move is removing more entities than were ever added?",
                init_score
            )));
        }
        Ok(())
    }
}

impl<Sc: Score> fmt::Debug for InnerScoreDirector<Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InnerScoreDirector")
            .field("solution", &self.descriptor.name)
            .field("derived", &self.derived)
            .field("lookup_enabled", &self.lookup_enabled)
            .field("constraint_match_policy", &self.constraint_match_policy)
            .field("working_init_score", &self.working_init_score())
            .field("calculation_count", &self.calculation_count)
            .finish()
    }
}

impl<Sc: Score> fmt::Display for InnerScoreDirector<Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InnerScoreDirector({}{})",
            self.descriptor.name,
            if self.derived { ", derived" } else { "" }
        )
    }
}

pub(super) fn require(solution: &Option<WorkingSolution>) -> Result<&WorkingSolution> {
    solution.as_ref().ok_or_else(no_working_solution)
}

pub(super) fn no_working_solution() -> ScoreForgeError {
    ScoreForgeError::IllegalState(
        "The working solution must be set before the score director is used.".to_string(),
    )
}

pub(super) fn entity_descriptor_of<'d>(
    descriptor: &'d SolutionDescriptor,
    entity: &Entity,
) -> Result<&'d EntityDescriptor> {
    descriptor.entity_descriptor(entity.descriptor_index()).ok_or_else(|| {
        ScoreForgeError::DomainModel(format!(
            "The entity ({}) has an unknown entity descriptor ({}).",
            entity.id(),
            entity.descriptor_index()
        ))
    })
}

fn render_score(solution: &WorkingSolution) -> String {
    solution
        .score()
        .map_or_else(|| "null".to_string(), ToString::to_string)
}
