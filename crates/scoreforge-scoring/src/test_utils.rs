//! Test utilities for scoreforge-scoring
//!
//! Provides calculators, moves, propagation engines and cloners that
//! misbehave on purpose, plus factory helpers over the shared fixtures.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use scoreforge_config::ScoreDirectorConfig;
use scoreforge_core::domain::{
    Entity, EntityId, SolutionCloner, SolutionDescriptor, Value, VariableRef, WorkingSolution,
};
use scoreforge_core::{ConstraintRef, Handle, HardSoftScore, Result, Score, SimpleScore};
use scoreforge_test::depot::CUSTOMER;
use scoreforge_test::lesson::TIMESLOT_CONFLICT;
use scoreforge_test::{init_test_logging, DepotModel, LessonModel, VehicleModel};

use crate::api::{
    CalculatorSupplier, ConstraintDefinition, ConstraintMatch, ConstraintSetCalculator,
    EasyScoreCalculator, EntityChange, EntityChangeTracker, Justification, ScoreCalculator,
};
use crate::director::{InnerScoreDirector, ScoreDirector, ScoreDirectorFactory};
use crate::moves::Move;
use crate::shadow::{InverseRelationPropagation, ShadowPropagation, ShadowSupplier, ShadowUpdate};

// ============================================================================
// Score calculators
// ============================================================================

/// Customers sharing a depot, counted per pair. Unassigned customers do not count.
pub fn shared_depot_pairs(solution: &WorkingSolution) -> i64 {
    let mut loads: HashMap<EntityId, i64> = HashMap::new();
    for (_, customer) in solution.entities_of(CUSTOMER) {
        if let Some(Value::Entity(depot)) = customer.value(0) {
            *loads.entry(*depot).or_default() += 1;
        }
    }
    loads.values().map(|n| n * (n - 1) / 2).sum()
}

pub fn shared_depot_score(solution: &WorkingSolution) -> SimpleScore {
    SimpleScore::of(-shared_depot_pairs(solution))
}

pub fn easy_supplier() -> CalculatorSupplier<SimpleScore> {
    EasyScoreCalculator::supplier(shared_depot_score)
}

pub fn shared_depot_ref() -> ConstraintRef {
    ConstraintRef::new("depot", "Shared depot")
}

/// Incremental version of [`shared_depot_score`].
///
/// With `forget_retract`, the before hook of a depot change is ignored,
/// so every reassignment leaves a stale pair behind.
#[derive(Debug)]
pub struct SharedDepotCalculator {
    depot: VariableRef,
    forget_retract: bool,
    loads: HashMap<EntityId, i64>,
    pairs: i64,
}

impl SharedDepotCalculator {
    pub fn new(depot: VariableRef, forget_retract: bool) -> Self {
        Self {
            depot,
            forget_retract,
            loads: HashMap::new(),
            pairs: 0,
        }
    }

    pub fn supplier(depot: VariableRef, forget_retract: bool) -> CalculatorSupplier<SimpleScore> {
        Arc::new(move |_| Box::new(SharedDepotCalculator::new(depot, forget_retract)))
    }

    fn retract(&mut self, solution: &WorkingSolution, customer: EntityId) {
        if let Some(Value::Entity(depot)) = solution.value(customer, self.depot.ordinal) {
            let load = self.loads.entry(*depot).or_default();
            *load -= 1;
            self.pairs -= *load;
        }
    }

    fn insert(&mut self, solution: &WorkingSolution, customer: EntityId) {
        if let Some(Value::Entity(depot)) = solution.value(customer, self.depot.ordinal) {
            let load = self.loads.entry(*depot).or_default();
            self.pairs += *load;
            *load += 1;
        }
    }

    fn is_customer(&self, solution: &WorkingSolution, entity: EntityId) -> bool {
        solution
            .entity(entity)
            .is_some_and(|e| e.descriptor_index() == self.depot.entity_descriptor)
    }
}

impl ScoreCalculator<SimpleScore> for SharedDepotCalculator {
    fn reset_working_solution(
        &mut self,
        solution: &WorkingSolution,
        _constraint_match_enabled: bool,
    ) {
        self.loads.clear();
        self.pairs = 0;
        let customers: Vec<EntityId> = solution.entities_of(CUSTOMER).map(|(id, _)| id).collect();
        for customer in customers {
            self.insert(solution, customer);
        }
    }

    fn after_entity_added(&mut self, solution: &WorkingSolution, entity: EntityId) {
        if self.is_customer(solution, entity) {
            self.insert(solution, entity);
        }
    }

    fn before_entity_removed(&mut self, solution: &WorkingSolution, entity: EntityId) {
        if self.is_customer(solution, entity) {
            self.retract(solution, entity);
        }
    }

    fn before_variable_changed(
        &mut self,
        solution: &WorkingSolution,
        variable: VariableRef,
        entity: EntityId,
    ) {
        if variable == self.depot && !self.forget_retract {
            self.retract(solution, entity);
        }
    }

    fn after_variable_changed(
        &mut self,
        solution: &WorkingSolution,
        variable: VariableRef,
        entity: EntityId,
    ) {
        if variable == self.depot {
            self.insert(solution, entity);
        }
    }

    fn calculate_score(&mut self, _solution: &WorkingSolution) -> SimpleScore {
        SimpleScore::of(-self.pairs)
    }

    fn constraint_matches(
        &mut self,
        solution: &WorkingSolution,
    ) -> Vec<ConstraintMatch<SimpleScore>> {
        let customers: Vec<(EntityId, &Entity)> = solution.entities_of(CUSTOMER).collect();
        let mut matches = Vec::new();
        for (i, (left, left_entity)) in customers.iter().enumerate() {
            for (right, right_entity) in &customers[i + 1..] {
                let depot = left_entity.value(0).filter(|v| v.is_some());
                if depot.is_some() && depot == right_entity.value(0) {
                    matches.push(ConstraintMatch::new(
                        shared_depot_ref(),
                        Justification::new(
                            [Handle::Entity(*left), Handle::Entity(*right)],
                            format!("{} & {}", left_entity.id(), right_entity.id()),
                        ),
                        SimpleScore::of(-1),
                    ));
                }
            }
        }
        matches
    }

    fn is_incremental(&self) -> bool {
        true
    }
}

// ============================================================================
// Moves
// ============================================================================

/// A change move whose undo does nothing.
#[derive(Debug, Clone)]
pub struct ForgetfulChangeMove {
    pub variable: VariableRef,
    pub entity: EntityId,
    pub to_value: Value,
}

impl fmt::Display for ForgetfulChangeMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Forgetful({:?} -> {})", self.entity, self.to_value)
    }
}

impl<Sc: Score> Move<Sc> for ForgetfulChangeMove {
    fn is_doable(&self, _score_director: &dyn ScoreDirector<Sc>) -> bool {
        true
    }

    fn do_move(&self, score_director: &mut dyn ScoreDirector<Sc>) -> Result<()> {
        score_director.change_variable(self.variable, self.entity, self.to_value.clone())?;
        score_director.register_undo(Box::new(|_: &mut dyn ScoreDirector<Sc>| -> Result<()> {
            Ok(())
        }));
        Ok(())
    }
}

// ============================================================================
// Shadow propagation engines
// ============================================================================

/// Inverse propagation that drops every queued update. A forced full
/// recomputation still works, which is what exposes the stale shadows.
#[derive(Debug)]
pub struct LazyInversePropagation {
    inner: InverseRelationPropagation,
}

impl LazyInversePropagation {
    pub fn supplier() -> ShadowSupplier {
        Arc::new(|descriptor| {
            Box::new(LazyInversePropagation {
                inner: InverseRelationPropagation::new(descriptor),
            })
        })
    }
}

impl ShadowPropagation for LazyInversePropagation {
    fn reset_working_solution(&mut self, solution: &WorkingSolution) {
        self.inner.reset_working_solution(solution);
    }

    fn trigger_queued(&mut self, _solution: &WorkingSolution) -> Result<Vec<ShadowUpdate>> {
        Ok(Vec::new())
    }

    fn force_trigger_all(&mut self, solution: &WorkingSolution) -> Result<Vec<ShadowUpdate>> {
        self.inner.force_trigger_all(solution)
    }
}

/// Engine without shadows that counts how often it was closed.
#[derive(Debug, Default, Clone)]
pub struct CloseCounter {
    pub closes: Arc<AtomicUsize>,
}

impl CloseCounter {
    pub fn count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn supplier(&self) -> ShadowSupplier {
        let closes = self.closes.clone();
        Arc::new(move |_| {
            Box::new(CloseCounter {
                closes: closes.clone(),
            })
        })
    }
}

impl ShadowPropagation for CloseCounter {
    fn reset_working_solution(&mut self, _solution: &WorkingSolution) {}

    fn trigger_queued(&mut self, _solution: &WorkingSolution) -> Result<Vec<ShadowUpdate>> {
        Ok(Vec::new())
    }

    fn force_trigger_all(&mut self, _solution: &WorkingSolution) -> Result<Vec<ShadowUpdate>> {
        Ok(Vec::new())
    }

    fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Cloners and change trackers
// ============================================================================

/// Hands out the original's instances instead of copies.
#[derive(Debug, Default)]
pub struct ShallowCloner;

impl SolutionCloner for ShallowCloner {
    fn clone_solution(&self, original: &WorkingSolution) -> WorkingSolution {
        original.shallow_copy()
    }
}

/// Deep clone without the score.
#[derive(Debug, Default)]
pub struct ScorelessCloner;

impl SolutionCloner for ScorelessCloner {
    fn clone_solution(&self, original: &WorkingSolution) -> WorkingSolution {
        let mut clone = original.clone();
        clone.set_score(None);
        clone
    }
}

/// Records every forwarded entity change.
#[derive(Debug, Default, Clone)]
pub struct RecordingChangeTracker {
    pub changes: Arc<Mutex<Vec<(EntityId, EntityChange)>>>,
    pub resets: Arc<AtomicUsize>,
}

impl RecordingChangeTracker {
    pub fn changes(&self) -> Vec<(EntityId, EntityChange)> {
        self.changes.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl EntityChangeTracker for RecordingChangeTracker {
    fn entity_changed(&mut self, entity: EntityId, change: EntityChange) {
        if let Ok(mut changes) = self.changes.lock() {
            changes.push((entity, change));
        }
    }

    fn reset(&mut self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Factories
// ============================================================================

pub fn depot_factory(
    model: &DepotModel,
    calculator: CalculatorSupplier<SimpleScore>,
    config: ScoreDirectorConfig,
) -> Arc<ScoreDirectorFactory<SimpleScore>> {
    init_test_logging();
    Arc::new(ScoreDirectorFactory::new(model.descriptor.clone(), calculator).with_config(config))
}

/// Incremental director over the depot model with `solution` installed.
pub fn depot_director(
    model: &DepotModel,
    solution: WorkingSolution,
) -> InnerScoreDirector<SimpleScore> {
    let factory = depot_factory(
        model,
        SharedDepotCalculator::supplier(model.depot, false),
        ScoreDirectorConfig::default(),
    );
    let mut director = factory.build_default();
    director
        .set_working_solution(solution)
        .expect("depot solution is consistent");
    director
}

/// Depots d1, d2 and customers c1 (d1), c2 (d1), c3 (d2), c4 (unassigned).
pub fn depot_solution(model: &DepotModel) -> WorkingSolution {
    model.solution(
        &["d1", "d2"],
        &[("c1", Some("d1")), ("c2", Some("d1")), ("c3", Some("d2")), ("c4", None)],
    )
}

pub fn timeslot_conflicts(
    _descriptor: &SolutionDescriptor,
    solution: &WorkingSolution,
) -> Vec<Justification> {
    LessonModel::conflicts(solution)
        .into_iter()
        .map(|(left, right)| {
            let name = |id| solution.entity(id).map_or_else(String::new, |e| e.id().to_string());
            Justification::new(
                [Handle::Entity(left), Handle::Entity(right)],
                format!("{} & {}", name(left), name(right)),
            )
        })
        .collect()
}

/// Timetabling director with a hard timeslot conflict constraint of weight one.
pub fn lesson_director(
    model: &LessonModel,
    solution: WorkingSolution,
    config: ScoreDirectorConfig,
) -> InnerScoreDirector<HardSoftScore> {
    let supplier = ConstraintSetCalculator::supplier(vec![ConstraintDefinition::penalize(
        ConstraintRef::parse(TIMESLOT_CONFLICT),
        HardSoftScore::of_hard(1),
        timeslot_conflicts,
    )]);
    let factory = Arc::new(
        ScoreDirectorFactory::new(model.descriptor.clone(), supplier).with_config(config),
    );
    let mut director = factory.build_default();
    director
        .set_working_solution(solution)
        .expect("timetable is consistent");
    director
}

/// Squared route lengths, so moving a visit between vehicles changes the score.
pub fn route_length_score(solution: &WorkingSolution) -> SimpleScore {
    let penalty = solution
        .entities_of(scoreforge_test::vehicle::VEHICLE)
        .map(|(_, v)| v.value(0).and_then(Value::as_list).map_or(0, |l| (l.len() * l.len()) as i64))
        .sum::<i64>();
    SimpleScore::of(-penalty)
}

pub fn vehicle_director(
    model: &VehicleModel,
    solution: WorkingSolution,
    config: ScoreDirectorConfig,
) -> InnerScoreDirector<SimpleScore> {
    let factory = Arc::new(
        ScoreDirectorFactory::new(
            model.descriptor.clone(),
            EasyScoreCalculator::supplier(route_length_score),
        )
            .with_config(config),
    );
    let mut director = factory.build_default();
    director
        .set_working_solution(solution)
        .expect("routes are consistent");
    director
}
