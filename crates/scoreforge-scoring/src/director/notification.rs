// Notification protocol of the inner score director.

use std::sync::Arc;

use scoreforge_core::domain::{
    Entity, EntityId, FactId, Handle, ProblemFact, SolutionDescriptor, Value, VariableDescriptor,
    VariableRef, WorkingSolution,
};
use scoreforge_core::{Result, Score, ScoreForgeError};

use super::inner::{entity_descriptor_of, no_working_solution, require, InnerScoreDirector};
use super::traits::ScoreDirector;
use crate::api::EntityChange;
use crate::lookup::LookupRegistry;

impl<Sc: Score> InnerScoreDirector<Sc> {
    fn notify_change_tracker(&mut self, entity: EntityId, change: EntityChange) {
        if let Some(change_tracker) = self.change_tracker.as_mut() {
            change_tracker.entity_changed(entity, change);
        }
    }

    fn list_variable_descriptor(&self, variable: VariableRef) -> Result<&VariableDescriptor> {
        let descriptor = self.descriptor.variable(variable)?;
        if !descriptor.kind.is_list() {
            return Err(ScoreForgeError::InvalidArgument(format!(
                "The variable ({}) is not a list variable.",
                self.descriptor.variable_name(variable)
            )));
        }
        Ok(descriptor)
    }

    // Problem facts can change value ranges and constraint weights, so every
    // derived structure is rebuilt.
    fn reset_after_problem_change(&mut self) -> Result<()> {
        let solution = require(&self.working_solution)?;
        self.value_ranges.reset(None);
        self.shadow.reset_working_solution(solution);
        self.calculator
            .reset_working_solution(solution, self.constraint_match_policy.is_enabled());
        Ok(())
    }

    fn is_constraint_configuration(&self, handle: Handle) -> Result<bool> {
        let Handle::Fact(fact) = handle else {
            return Ok(false);
        };
        let solution = require(&self.working_solution)?;
        Ok(solution
            .constraint_configuration(&self.descriptor)
            .is_some_and(|(id, _)| id == fact))
    }

    pub fn before_problem_fact_added(&mut self, _fact: &ProblemFact) -> Result<()> {
        require(&self.working_solution).map(|_| ())
    }

    pub fn after_problem_fact_added(&mut self, fact: FactId) -> Result<()> {
        let solution = require(&self.working_solution)?;
        if self.lookup_enabled {
            self.lookup.add_fact(&self.descriptor, solution, fact)?;
        }
        self.reset_after_problem_change()
    }

    pub fn before_problem_property_changed(&mut self, _object: Handle) -> Result<()> {
        require(&self.working_solution).map(|_| ())
    }

    /// A property of a fact or entity outside the planning variables changed.
    ///
    /// A change to the constraint configuration reinstalls the whole working
    /// solution, since weights feed every constraint.
    pub fn after_problem_property_changed(&mut self, object: Handle) -> Result<()> {
        if self.is_constraint_configuration(object)? {
            let solution = self.working_solution.take().ok_or_else(no_working_solution)?;
            return self.set_working_solution(solution);
        }
        self.reset_after_problem_change()
    }

    /// # Errors
    ///
    /// Returns [`ScoreForgeError::InvariantViolation`] for the constraint
    /// configuration, which may change but never disappear.
    pub fn before_problem_fact_removed(&mut self, fact: FactId) -> Result<()> {
        if self.is_constraint_configuration(Handle::Fact(fact))? {
            let solution = require(&self.working_solution)?;
            let rendered = solution
                .fact(fact)
                .map_or_else(|| Handle::Fact(fact).to_string(), |f| f.id().to_string());
            return Err(ScoreForgeError::InvariantViolation(format!(
                "Attempted to remove constraint configuration ({}) from solution ({}).\nMaybe use before/afterProblemPropertyChanged(...) instead.",
                rendered, self.descriptor.name
            )));
        }
        Ok(())
    }

    pub fn after_problem_fact_removed(
        &mut self,
        _fact: FactId,
        removed: &ProblemFact,
    ) -> Result<()> {
        if self.lookup_enabled {
            let key = LookupRegistry::key_of_fact(&self.descriptor, removed);
            self.lookup.remove_working_object(&key)?;
        }
        self.reset_after_problem_change()
    }

    pub fn add_problem_fact(&mut self, fact: ProblemFact) -> Result<FactId> {
        self.before_problem_fact_added(&fact)?;
        let id = self.working_solution_mut()?.add_fact(fact);
        self.after_problem_fact_added(id)?;
        Ok(id)
    }

    pub fn remove_problem_fact(&mut self, fact: FactId) -> Result<Arc<ProblemFact>> {
        self.before_problem_fact_removed(fact)?;
        let removed = self.working_solution_mut()?.remove_fact(fact).ok_or_else(|| {
            ScoreForgeError::IllegalState(format!(
                "The problem fact ({}) does not exist in the working solution.",
                Handle::Fact(fact)
            ))
        })?;
        self.after_problem_fact_removed(fact, &removed)?;
        Ok(removed)
    }

    /// Sets a property of a problem fact, returning the previous value.
    pub fn change_problem_property(
        &mut self,
        fact: FactId,
        name: &str,
        value: Value,
    ) -> Result<Option<Value>> {
        self.before_problem_property_changed(Handle::Fact(fact))?;
        let working = self.working_solution_mut()?.fact_mut(fact).ok_or_else(|| {
            ScoreForgeError::IllegalState(format!(
                "The problem fact ({}) does not exist in the working solution.",
                Handle::Fact(fact)
            ))
        })?;
        let old = working.set_property(name, value);
        self.after_problem_property_changed(Handle::Fact(fact))?;
        Ok(old)
    }
}

impl<Sc: Score> ScoreDirector<Sc> for InnerScoreDirector<Sc> {
    fn solution_descriptor(&self) -> &SolutionDescriptor {
        &self.descriptor
    }

    fn working_solution(&self) -> Result<&WorkingSolution> {
        require(&self.working_solution)
    }

    fn working_solution_mut(&mut self) -> Result<&mut WorkingSolution> {
        self.working_solution.as_mut().ok_or_else(no_working_solution)
    }

    fn before_entity_added(&mut self, entity: &Entity) -> Result<()> {
        let solution = require(&self.working_solution)?;
        entity_descriptor_of(&self.descriptor, entity)?;
        self.shadow.before_entity_added(solution, entity);
        Ok(())
    }

    fn after_entity_added(&mut self, entity: EntityId) -> Result<()> {
        let solution = require(&self.working_solution)?;
        let added = solution.require_entity(entity)?;
        let entity_descriptor = entity_descriptor_of(&self.descriptor, added)?;
        self.basic_init_score -= entity_descriptor.count_uninitialized_variables(added) as i64;
        if entity_descriptor.is_genuine() {
            self.working_genuine_entity_count += 1;
        }
        if self.lookup_enabled {
            self.lookup.add_entity(&self.descriptor, solution, entity)?;
        }
        self.shadow.after_entity_added(solution, entity);
        self.calculator.after_entity_added(solution, entity);
        self.bump_revision();
        self.notify_change_tracker(entity, EntityChange::Added);
        Ok(())
    }

    fn before_entity_removed(&mut self, entity: EntityId) -> Result<()> {
        let solution = require(&self.working_solution)?;
        let removed = solution.require_entity(entity)?;
        let uninitialized =
            entity_descriptor_of(&self.descriptor, removed)?.count_uninitialized_variables(removed);
        self.basic_init_score += uninitialized as i64;
        self.check_init_score()?;
        let solution = require(&self.working_solution)?;
        self.shadow.before_entity_removed(solution, entity);
        self.calculator.before_entity_removed(solution, entity);
        Ok(())
    }

    fn after_entity_removed(&mut self, entity: EntityId, removed: &Entity) -> Result<()> {
        let entity_descriptor = entity_descriptor_of(&self.descriptor, removed)?;
        if entity_descriptor.is_genuine() {
            self.working_genuine_entity_count =
                self.working_genuine_entity_count.checked_sub(1).ok_or_else(|| {
                    ScoreForgeError::IllegalState(
                        "The working genuine entity count would drop below zero.\nMaybe a custom move removes an entity that was never added?"
                            .to_string(),
                    )
                })?;
        }
        if self.lookup_enabled {
            let key = LookupRegistry::key_of_entity(&self.descriptor, removed);
            self.lookup.remove_working_object(&key)?;
        }
        let solution = require(&self.working_solution)?;
        self.shadow.after_entity_removed(solution, entity, removed);
        self.calculator.after_entity_removed(solution, entity, removed);
        self.bump_revision();
        self.notify_change_tracker(entity, EntityChange::Removed);
        Ok(())
    }

    fn before_variable_changed(&mut self, variable: VariableRef, entity: EntityId) -> Result<()> {
        let counts = self.descriptor.variable(variable)?.counts_towards_initialization();
        let solution = require(&self.working_solution)?;
        solution.require_entity(entity)?;
        if counts && solution.value(entity, variable.ordinal).map_or(true, Value::is_none) {
            self.basic_init_score += 1;
            self.check_init_score()?;
        }
        let solution = require(&self.working_solution)?;
        self.shadow.before_variable_changed(solution, variable, entity);
        self.calculator.before_variable_changed(solution, variable, entity);
        Ok(())
    }

    fn after_variable_changed(&mut self, variable: VariableRef, entity: EntityId) -> Result<()> {
        let counts = self.descriptor.variable(variable)?.counts_towards_initialization();
        let solution = require(&self.working_solution)?;
        if counts && solution.value(entity, variable.ordinal).map_or(true, Value::is_none) {
            self.basic_init_score -= 1;
        }
        self.shadow.after_variable_changed(solution, variable, entity);
        self.calculator.after_variable_changed(solution, variable, entity);
        self.notify_change_tracker(entity, EntityChange::VariableChanged(variable));
        Ok(())
    }

    fn before_list_variable_element_assigned(
        &mut self,
        variable: VariableRef,
        _element: &Value,
    ) -> Result<()> {
        self.list_variable_descriptor(variable)?;
        require(&self.working_solution).map(|_| ())
    }

    fn after_list_variable_element_assigned(
        &mut self,
        variable: VariableRef,
        _element: &Value,
    ) -> Result<()> {
        if !self.list_variable_descriptor(variable)?.allows_unassigned {
            self.list_init_score += 1;
            self.check_init_score()?;
        }
        Ok(())
    }

    fn before_list_variable_element_unassigned(
        &mut self,
        variable: VariableRef,
        _element: &Value,
    ) -> Result<()> {
        self.list_variable_descriptor(variable)?;
        require(&self.working_solution).map(|_| ())
    }

    fn after_list_variable_element_unassigned(
        &mut self,
        variable: VariableRef,
        element: &Value,
    ) -> Result<()> {
        if !self.list_variable_descriptor(variable)?.allows_unassigned {
            self.list_init_score -= 1;
        }
        let solution = require(&self.working_solution)?;
        self.shadow.after_list_element_unassigned(solution, variable, element);
        Ok(())
    }

    fn before_list_variable_changed(
        &mut self,
        variable: VariableRef,
        entity: EntityId,
        from: usize,
        to: usize,
    ) -> Result<()> {
        self.list_variable_descriptor(variable)?;
        if from > to {
            return Err(ScoreForgeError::InvalidArgument(format!(
                "The changed range [{}, {}) of list variable ({}) is reversed.",
                from,
                to,
                self.descriptor.variable_name(variable)
            )));
        }
        let solution = require(&self.working_solution)?;
        let owner = solution.require_entity(entity)?;
        if owner.is_pinned() || from < owner.pin_index() {
            return Err(ScoreForgeError::InvariantViolation(format!(
                "Attempting to change list variable ({}) on an entity ({}) in range [{}, {}), which is partially or entirely pinned.\nThis is most likely a bug in a move.\nMaybe you are using an improperly implemented custom move?",
                self.descriptor.variable_name(variable),
                solution.describe_entity(&self.descriptor, owner),
                from,
                to
            )));
        }
        self.shadow.before_list_variable_changed(solution, variable, entity, from, to);
        self.calculator.before_list_variable_changed(solution, variable, entity, from, to);
        Ok(())
    }

    fn after_list_variable_changed(
        &mut self,
        variable: VariableRef,
        entity: EntityId,
        from: usize,
        to: usize,
    ) -> Result<()> {
        self.list_variable_descriptor(variable)?;
        let solution = require(&self.working_solution)?;
        self.shadow.after_list_variable_changed(solution, variable, entity, from, to);
        self.calculator.after_list_variable_changed(solution, variable, entity, from, to);
        self.notify_change_tracker(entity, EntityChange::ListChanged { variable, from, to });
        Ok(())
    }

    fn trigger_variable_listeners(&mut self) -> Result<()> {
        self.trigger_queued_shadow_updates()
    }
}
