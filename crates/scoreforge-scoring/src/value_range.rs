//! Value-range cache.
//!
//! Ranges are extracted at most once per working solution and handed out as
//! shared `Arc`s, so two lookups between resets return the same instance.
//! Membership checks build a hash set of the range lazily, on first use.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use scoreforge_core::domain::{
    EntityId, InitializationStatistics, ProblemSizeStatistics, SolutionDescriptor, Value,
    ValueRange, ValueRangeDescriptor, VariableRef, WorkingSolution,
};
use scoreforge_core::{Result, ScoreForgeError};
use slotmap::SecondaryMap;

/// Memoizes value ranges and solution statistics for one working solution.
#[derive(Debug)]
pub struct ValueRangeCache {
    descriptor: Arc<SolutionDescriptor>,
    // Arena id of the solution the caches belong to.
    known_solution: Option<u64>,
    from_solution: Vec<Option<Arc<ValueRange>>>,
    from_entity: SecondaryMap<EntityId, Vec<Option<Arc<ValueRange>>>>,
    membership: HashMap<(usize, Option<EntityId>), HashSet<Value>>,
    initialization_statistics: Option<InitializationStatistics>,
    problem_size_statistics: Option<ProblemSizeStatistics>,
}

impl ValueRangeCache {
    pub fn new(descriptor: Arc<SolutionDescriptor>) -> Self {
        let range_count = descriptor.value_range_descriptors.len();
        Self {
            descriptor,
            known_solution: None,
            from_solution: vec![None; range_count],
            from_entity: SecondaryMap::new(),
            membership: HashMap::new(),
            initialization_statistics: None,
            problem_size_statistics: None,
        }
    }

    /// Clears every cached range.
    ///
    /// With a solution, the cache adopts it as the known working solution.
    /// Without one, it keeps the known solution but drops the ranges and
    /// statistics, which is what a problem change needs.
    pub fn reset(&mut self, solution: Option<&WorkingSolution>) {
        self.from_solution.iter_mut().for_each(|r| *r = None);
        self.from_entity.clear();
        self.membership.clear();
        self.initialization_statistics = None;
        self.problem_size_statistics = None;
        if let Some(solution) = solution {
            self.known_solution = Some(solution.arena_id());
        }
    }

    /// Forgets the known working solution as well.
    pub fn clear(&mut self) {
        self.reset(None);
        self.known_solution = None;
    }

    fn range_descriptor(&self, range: usize) -> Result<&ValueRangeDescriptor> {
        self.descriptor.value_range_descriptor(range).ok_or_else(|| {
            ScoreForgeError::DomainModel(format!(
                "The value range index ({}) does not exist in solution descriptor ({}).",
                range, self.descriptor
            ))
        })
    }

    fn check_known(&self, range: &ValueRangeDescriptor, solution: &WorkingSolution) -> Result<()> {
        match self.known_solution {
            Some(known) if known == solution.arena_id() => Ok(()),
            _ => Err(ScoreForgeError::IllegalState(format!(
                "Impossible state: value range ({}) requested before the working solution is known.",
                range
            ))),
        }
    }

    /// The range shared by every entity, extracted on first use.
    ///
    /// # Errors
    ///
    /// - [`ScoreForgeError::IllegalState`] before the cache was reset with `solution`
    /// - [`ScoreForgeError::UnsupportedOperation`] when the range is not countable
    /// - [`ScoreForgeError::StructuralInconsistency`] when the range is empty
    pub fn get_from_solution(
        &mut self,
        range: usize,
        solution: &WorkingSolution,
    ) -> Result<Arc<ValueRange>> {
        let value_range = self.fetch_from_solution(range, solution)?;
        self.require_non_empty(range, &value_range, solution, None)?;
        Ok(value_range)
    }

    /// The range of one entity. Entity-independent ranges are shared with
    /// [`get_from_solution`](Self::get_from_solution).
    pub fn get_from_entity(
        &mut self,
        range: usize,
        solution: &WorkingSolution,
        entity: EntityId,
    ) -> Result<Arc<ValueRange>> {
        let value_range = self.fetch_from_entity(range, solution, entity)?;
        self.require_non_empty(range, &value_range, solution, Some(entity))?;
        Ok(value_range)
    }

    fn fetch_from_solution(
        &mut self,
        range: usize,
        solution: &WorkingSolution,
    ) -> Result<Arc<ValueRange>> {
        let range_descriptor = *self.range_descriptor(range)?;
        self.check_known(&range_descriptor, solution)?;
        if let Some(cached) = &self.from_solution[range] {
            return Ok(cached.clone());
        }
        let value_range = Arc::new(countable(&range_descriptor, solution, None)?);
        self.from_solution[range] = Some(value_range.clone());
        Ok(value_range)
    }

    fn fetch_from_entity(
        &mut self,
        range: usize,
        solution: &WorkingSolution,
        entity: EntityId,
    ) -> Result<Arc<ValueRange>> {
        let range_descriptor = *self.range_descriptor(range)?;
        if range_descriptor.is_entity_independent() {
            return self.fetch_from_solution(range, solution);
        }
        if self.known_solution != Some(solution.arena_id()) {
            return Err(ScoreForgeError::IllegalState(format!(
                "Impossible state: value range ({}) on planning entity ({:?}) requested before the working solution is known.",
                range_descriptor, entity
            )));
        }
        let range_count = self.from_solution.len();
        if let Some(cached) = self
            .from_entity
            .get(entity)
            .and_then(|ranges| ranges[range].as_ref())
        {
            return Ok(cached.clone());
        }
        solution.require_entity(entity)?;
        let value_range = Arc::new(countable(&range_descriptor, solution, Some(entity))?);
        if !self.from_entity.contains_key(entity) {
            self.from_entity.insert(entity, vec![None; range_count]);
        }
        if let Some(ranges) = self.from_entity.get_mut(entity) {
            ranges[range] = Some(value_range.clone());
        }
        Ok(value_range)
    }

    fn require_non_empty(
        &self,
        range: usize,
        value_range: &ValueRange,
        solution: &WorkingSolution,
        entity: Option<EntityId>,
    ) -> Result<()> {
        if !value_range.is_empty() {
            return Ok(());
        }
        let owner = match entity.and_then(|e| solution.entity(e)) {
            Some(entity) => format!(
                "planning entity ({})",
                solution.describe_entity(&self.descriptor, entity)
            ),
            None => format!("planning solution ({})", solution),
        };
        Err(ScoreForgeError::StructuralInconsistency(format!(
            "The value range ({}) on {} is empty.\nMaybe allow unassigned values to model an over-constrained problem.",
            self.range_descriptor(range)?,
            owner
        )))
    }

    /// Whether `value` is legal for `variable` on `entity`.
    ///
    /// The unassigned sentinel is legal exactly when the variable allows
    /// unassigned values.
    pub fn is_value_in_range(
        &mut self,
        variable: VariableRef,
        solution: &WorkingSolution,
        entity: EntityId,
        value: &Value,
    ) -> Result<bool> {
        let variable_descriptor = self.descriptor.variable(variable)?;
        if value.is_none() {
            return Ok(variable_descriptor.allows_unassigned);
        }
        let Some(range) = variable_descriptor.value_range else {
            return Err(ScoreForgeError::DomainModel(format!(
                "The variable ({}) has no value range.",
                self.descriptor.variable_name(variable)
            )));
        };
        let entity_independent = self.range_descriptor(range)?.is_entity_independent();
        let value_range = self.get_from_entity(range, solution, entity)?;
        let key = (range, (!entity_independent).then_some(entity));
        let members = self
            .membership
            .entry(key)
            .or_insert_with(|| value_range.iter().collect());
        Ok(members.contains(value))
    }

    /// Number of values in a solution-wide range, including the unassigned
    /// sentinel when the range accepts it.
    pub fn count_on_solution(&mut self, range: usize, solution: &WorkingSolution) -> Result<usize> {
        let value_range = self.fetch_from_solution(range, solution)?;
        Ok(value_range.size().unwrap_or(0))
    }

    pub fn count_on_entity(
        &mut self,
        range: usize,
        solution: &WorkingSolution,
        entity: EntityId,
    ) -> Result<usize> {
        let value_range = self.fetch_from_entity(range, solution, entity)?;
        Ok(value_range.size().unwrap_or(0))
    }

    fn count_for(
        &mut self,
        range: usize,
        solution: &WorkingSolution,
        entity: EntityId,
    ) -> Result<usize> {
        if self.range_descriptor(range)?.is_entity_independent() {
            self.count_on_solution(range, solution)
        } else {
            self.count_on_entity(range, solution, entity)
        }
    }

    /// Counts how far `solution` is from being fully initialized.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreForgeError::IllegalState`] before the cache was reset
    /// with `solution`.
    pub fn initialization_statistics(
        &mut self,
        solution: &WorkingSolution,
    ) -> Result<InitializationStatistics> {
        if self.known_solution != Some(solution.arena_id()) {
            return Err(ScoreForgeError::IllegalState(
                "Impossible state: initialization statistics requested before the working solution is known."
                    .to_string(),
            ));
        }
        if let Some(statistics) = self.initialization_statistics {
            return Ok(statistics);
        }
        let descriptor = self.descriptor.clone();
        let mut statistics = InitializationStatistics::default();
        let list = descriptor.list_variable();
        let mut list_value_count = 0usize;
        if let Some(list) = list {
            list_value_count = self.list_value_count(list.value_range, solution)?;
        }
        let mut assigned_list_values = 0usize;
        for (_, entity) in solution.entities() {
            let Some(entity_descriptor) = descriptor.entity_descriptor(entity.descriptor_index())
            else {
                continue;
            };
            if entity_descriptor.is_genuine() {
                statistics.genuine_entity_count += 1;
                let uninitialized = entity_descriptor.count_uninitialized_variables(entity);
                if uninitialized > 0 {
                    statistics.uninitialized_entity_count += 1;
                    statistics.uninitialized_variable_count += uninitialized;
                }
            } else {
                statistics.shadow_entity_count += 1;
            }
            if let Some(list) = list.filter(|l| l.entity_descriptor == entity.descriptor_index()) {
                assigned_list_values += entity
                    .value(list.ordinal)
                    .and_then(Value::as_list)
                    .map_or(0, <[Value]>::len);
            }
        }
        if let Some(list) = list {
            statistics.not_in_any_list_value_count =
                list_value_count.saturating_sub(assigned_list_values);
            if !list.allows_unassigned {
                statistics.unassigned_value_count = statistics.not_in_any_list_value_count;
            }
        }
        self.initialization_statistics = Some(statistics);
        Ok(statistics)
    }

    // Distinct values a list variable may hold across all its entities.
    fn list_value_count(
        &mut self,
        range: Option<usize>,
        solution: &WorkingSolution,
    ) -> Result<usize> {
        let Some(range) = range else {
            return Ok(0);
        };
        let range_descriptor = *self.range_descriptor(range)?;
        if range_descriptor.is_entity_independent() {
            return self.count_on_solution(range, solution);
        }
        let owners: Vec<EntityId> = solution
            .entities_of(range_descriptor.variable.entity_descriptor)
            .map(|(id, _)| id)
            .collect();
        let mut values = HashSet::new();
        for owner in owners {
            values.extend(self.fetch_from_entity(range, solution, owner)?.iter());
        }
        Ok(values.len())
    }

    /// Approximates the size of the search space of `solution`.
    pub fn problem_size_statistics(
        &mut self,
        solution: &WorkingSolution,
    ) -> Result<ProblemSizeStatistics> {
        if self.known_solution != Some(solution.arena_id()) {
            return Err(ScoreForgeError::IllegalState(
                "Impossible state: problem size requested before the working solution is known.".to_string(),
            ));
        }
        if let Some(statistics) = self.problem_size_statistics {
            return Ok(statistics);
        }
        let descriptor = self.descriptor.clone();
        let mut statistics = ProblemSizeStatistics::default();
        let mut counted_solution_ranges = HashSet::new();
        let mut basic_scale_log = 0.0f64;
        let mut list_movable_entities = 0usize;
        let mut list_pinned_values = 0usize;
        let mut list_total_values = 0usize;

        let genuine: Vec<(EntityId, usize)> = solution
            .entities()
            .filter(|(_, e)| {
                descriptor
                    .entity_descriptor(e.descriptor_index())
                    .is_some_and(|d| d.is_genuine())
            })
            .map(|(id, e)| (id, e.descriptor_index()))
            .collect();
        for (id, descriptor_index) in genuine {
            let Some(entity_descriptor) = descriptor.entity_descriptor(descriptor_index) else {
                continue;
            };
            let Some(entity) = solution.entity(id) else {
                continue;
            };
            let movable = !entity.is_pinned();
            statistics.entity_count += 1;
            for variable in entity_descriptor.genuine_variables() {
                statistics.variable_count += 1;
                let Some(range) = variable.value_range else {
                    continue;
                };
                let independent = self.range_descriptor(range)?.is_entity_independent();
                let value_count = self.count_for(range, solution, id)?;
                if !independent || counted_solution_ranges.insert(range) {
                    statistics.approximate_value_count += value_count;
                }
                if variable.kind.is_basic() {
                    if movable && value_count > 0 {
                        basic_scale_log += (value_count as f64).log10();
                    }
                } else {
                    list_total_values = self.list_value_count(Some(range), solution)?;
                    let size = entity
                        .value(variable.ordinal)
                        .and_then(Value::as_list)
                        .map_or(0, <[Value]>::len);
                    if movable {
                        list_movable_entities += 1;
                        list_pinned_values += entity.pin_index().min(size);
                    } else {
                        list_pinned_values += size;
                    }
                }
            }
        }

        let mut scale_log = basic_scale_log;
        if let Some(list) = descriptor.list_variable() {
            let movable_values = list_total_values.saturating_sub(list_pinned_values);
            let targets = list_movable_entities + usize::from(list.allows_unassigned);
            if targets > 0 {
                // Ordered placements of n distinct values into k lists: k * (k + 1) * ... * (k + n - 1).
                scale_log += (0..movable_values)
                    .map(|i| ((targets + i) as f64).log10())
                    .sum::<f64>();
            }
        }
        statistics.approximate_problem_scale_log = if scale_log.is_finite() {
            scale_log
        } else {
            0.0
        };
        self.problem_size_statistics = Some(statistics);
        Ok(statistics)
    }
}

// Extracts a range, rejecting uncountable ones and adding the unassigned
// sentinel when the descriptor accepts it.
fn countable(
    range: &ValueRangeDescriptor,
    solution: &WorkingSolution,
    entity: Option<EntityId>,
) -> Result<ValueRange> {
    let extracted = range.extract(solution, entity);
    if !extracted.is_countable() {
        return Err(ScoreForgeError::UnsupportedOperation(format!(
            "Impossible state: value range ({}) on planning solution ({}) is not countable.\nMaybe replace a continuous range with an enumerated or integer range.",
            range, solution
        )));
    }
    Ok(if range.accepts_null {
        extracted.with_null()
    } else {
        extracted
    })
}
