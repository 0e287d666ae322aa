// Score director trait definition.

use scoreforge_core::domain::{
    Entity, EntityId, SolutionDescriptor, Value, VariableRef, WorkingSolution,
};
use scoreforge_core::{Result, Score, ScoreForgeError};

// Replays the inverse of a change through the notification protocol.
pub type UndoAction<Sc> = Box<dyn FnOnce(&mut dyn ScoreDirector<Sc>) -> Result<()> + Send>;

// The view of a score director that moves work against.
//
// Every mutation of the working solution must be bracketed by the matching
// before/after hooks, in that order, with the mutation in between. The
// provided facade methods do exactly that and are what moves should use.
pub trait ScoreDirector<Sc: Score>: Send {
    fn solution_descriptor(&self) -> &SolutionDescriptor;

    fn working_solution(&self) -> Result<&WorkingSolution>;

    // Raw mutable access, for use between a before hook and its after hook.
    fn working_solution_mut(&mut self) -> Result<&mut WorkingSolution>;

    fn before_entity_added(&mut self, entity: &Entity) -> Result<()>;

    fn after_entity_added(&mut self, entity: EntityId) -> Result<()>;

    fn before_entity_removed(&mut self, entity: EntityId) -> Result<()>;

    // `removed` is the entity as it was taken out of the working solution.
    fn after_entity_removed(&mut self, entity: EntityId, removed: &Entity) -> Result<()>;

    fn before_variable_changed(&mut self, variable: VariableRef, entity: EntityId) -> Result<()>;

    fn after_variable_changed(&mut self, variable: VariableRef, entity: EntityId) -> Result<()>;

    fn before_list_variable_element_assigned(
        &mut self,
        variable: VariableRef,
        element: &Value,
    ) -> Result<()>;

    fn after_list_variable_element_assigned(
        &mut self,
        variable: VariableRef,
        element: &Value,
    ) -> Result<()>;

    fn before_list_variable_element_unassigned(
        &mut self,
        variable: VariableRef,
        element: &Value,
    ) -> Result<()>;

    fn after_list_variable_element_unassigned(
        &mut self,
        variable: VariableRef,
        element: &Value,
    ) -> Result<()>;

    // The range `[from, to)` of the list of `entity` is about to change.
    fn before_list_variable_changed(
        &mut self,
        variable: VariableRef,
        entity: EntityId,
        from: usize,
        to: usize,
    ) -> Result<()>;

    fn after_list_variable_changed(
        &mut self,
        variable: VariableRef,
        entity: EntityId,
        from: usize,
        to: usize,
    ) -> Result<()>;

    // Runs the shadow updates queued by the hooks so far.
    fn trigger_variable_listeners(&mut self) -> Result<()>;

    // Registers the inverse of a change just made. Only directors that
    // guarantee an undo keep these; the default drops them.
    fn register_undo(&mut self, _undo: UndoAction<Sc>) {}

    // Assigns a basic variable, returning the previous value.
    fn change_variable(
        &mut self,
        variable: VariableRef,
        entity: EntityId,
        value: Value,
    ) -> Result<Value> {
        self.before_variable_changed(variable, entity)?;
        let old = self.working_solution_mut()?.set_value(entity, variable.ordinal, value)?;
        self.after_variable_changed(variable, entity)?;
        Ok(old)
    }

    fn add_entity(&mut self, entity: Entity) -> Result<EntityId> {
        self.before_entity_added(&entity)?;
        let id = self.working_solution_mut()?.add_entity(entity);
        self.after_entity_added(id)?;
        Ok(id)
    }

    fn remove_entity(&mut self, entity: EntityId) -> Result<std::sync::Arc<Entity>> {
        self.before_entity_removed(entity)?;
        let removed = self.working_solution_mut()?.remove_entity(entity).ok_or_else(|| {
            ScoreForgeError::IllegalState(format!(
                "The entity ({:?}) does not exist in the working solution.",
                entity
            ))
        })?;
        self.after_entity_removed(entity, &removed)?;
        Ok(removed)
    }

    // Inserts a currently unassigned element into the list of `entity`.
    fn assign_list_element(
        &mut self,
        variable: VariableRef,
        entity: EntityId,
        index: usize,
        element: Value,
    ) -> Result<()> {
        let len = list_len(self.working_solution()?, variable, entity)?;
        if index > len {
            return Err(ScoreForgeError::InvalidArgument(format!(
                "The index ({}) is out of bounds for list variable ({}) of length ({}).",
                index, variable, len
            )));
        }
        self.before_list_variable_element_assigned(variable, &element)?;
        self.before_list_variable_changed(variable, entity, index, index)?;
        self.working_solution_mut()?
            .list_mut(entity, variable.ordinal)?
            .insert(index, element.clone());
        self.after_list_variable_changed(variable, entity, index, index + 1)?;
        self.after_list_variable_element_assigned(variable, &element)
    }

    // Takes the element at `index` out of every list.
    fn unassign_list_element(
        &mut self,
        variable: VariableRef,
        entity: EntityId,
        index: usize,
    ) -> Result<Value> {
        let element = list_element(self.working_solution()?, variable, entity, index)?;
        self.before_list_variable_element_unassigned(variable, &element)?;
        self.before_list_variable_changed(variable, entity, index, index + 1)?;
        self.working_solution_mut()?
            .list_mut(entity, variable.ordinal)?
            .remove(index);
        self.after_list_variable_changed(variable, entity, index, index)?;
        self.after_list_variable_element_unassigned(variable, &element)?;
        Ok(element)
    }

    // Moves an element between two positions, possibly in different lists.
    // `destination_index` is an index in the destination list after removal.
    fn move_list_element(
        &mut self,
        variable: VariableRef,
        source: EntityId,
        source_index: usize,
        destination: EntityId,
        destination_index: usize,
    ) -> Result<()> {
        let element = list_element(self.working_solution()?, variable, source, source_index)?;
        if source == destination {
            let len = list_len(self.working_solution()?, variable, source)?;
            if destination_index >= len {
                return Err(ScoreForgeError::InvalidArgument(format!(
                    "The destination index ({}) is out of bounds for list variable ({}) of length ({}).",
                    destination_index, variable, len
                )));
            }
            let from = source_index.min(destination_index);
            let to = source_index.max(destination_index) + 1;
            self.before_list_variable_changed(variable, source, from, to)?;
            let list = self.working_solution_mut()?.list_mut(source, variable.ordinal)?;
            let moved = list.remove(source_index);
            list.insert(destination_index, moved);
            return self.after_list_variable_changed(variable, source, from, to);
        }
        let destination_len = list_len(self.working_solution()?, variable, destination)?;
        if destination_index > destination_len {
            return Err(ScoreForgeError::InvalidArgument(format!(
                "The destination index ({}) is out of bounds for list variable ({}) of length ({}).",
                destination_index, variable, destination_len
            )));
        }
        self.before_list_variable_changed(variable, source, source_index, source_index + 1)?;
        self.before_list_variable_changed(
            variable,
            destination,
            destination_index,
            destination_index,
        )?;
        let solution = self.working_solution_mut()?;
        solution.list_mut(source, variable.ordinal)?.remove(source_index);
        solution
            .list_mut(destination, variable.ordinal)?
            .insert(destination_index, element);
        self.after_list_variable_changed(variable, source, source_index, source_index)?;
        self.after_list_variable_changed(
            variable,
            destination,
            destination_index,
            destination_index + 1,
        )
    }
}

fn list_len(solution: &WorkingSolution, variable: VariableRef, entity: EntityId) -> Result<usize> {
    solution
        .list(entity, variable.ordinal)
        .map(<[Value]>::len)
        .ok_or_else(|| {
            ScoreForgeError::IllegalState(format!(
                "The entity ({:?}) has no list variable ({}).",
                entity, variable
            ))
        })
}

fn list_element(
    solution: &WorkingSolution,
    variable: VariableRef,
    entity: EntityId,
    index: usize,
) -> Result<Value> {
    let list = solution.list(entity, variable.ordinal).ok_or_else(|| {
        ScoreForgeError::IllegalState(format!(
            "The entity ({:?}) has no list variable ({}).",
            entity, variable
        ))
    })?;
    list.get(index).cloned().ok_or_else(|| {
        ScoreForgeError::InvalidArgument(format!(
            "The index ({}) is out of bounds for list variable ({}) of length ({}).",
            index,
            variable,
            list.len()
        ))
    })
}
