//! Undo-recording scope over an inner score director.

use std::fmt;

use scoreforge_core::domain::{
    Entity, EntityId, SolutionDescriptor, Value, VariableRef, WorkingSolution,
};
use scoreforge_core::{Result, Score};
use tracing::trace;

use super::inner::InnerScoreDirector;
use super::traits::{ScoreDirector, UndoAction};

/// A score director for moves that are evaluated and then undone.
///
/// While the scope lives, the inner director knows every change will be
/// undone before the step ends, so the entity list revision stays put.
/// Moves register the inverse of each change through
/// [`register_undo`](ScoreDirector::register_undo); [`undo_changes`](Self::undo_changes)
/// replays them newest first.
///
/// # Example
///
/// ```ignore
/// let mut ephemeral = EphemeralScoreDirector::new(&mut director);
/// mv.do_move(&mut ephemeral)?;
/// let score = ephemeral.director().calculate_score()?;
/// ephemeral.undo_changes()?;
/// ```
pub struct EphemeralScoreDirector<'a, Sc: Score> {
    inner: &'a mut InnerScoreDirector<Sc>,
    undo_stack: Vec<UndoAction<Sc>>,
}

impl<'a, Sc: Score> EphemeralScoreDirector<'a, Sc> {
    pub fn new(inner: &'a mut InnerScoreDirector<Sc>) -> Self {
        inner.set_all_changes_will_be_undone_before_step_ends(true);
        Self {
            inner,
            undo_stack: Vec::new(),
        }
    }

    /// The wrapped director, for score calculation and assertions.
    pub fn director(&mut self) -> &mut InnerScoreDirector<Sc> {
        self.inner
    }

    /// Number of registered undo actions.
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Replays every registered undo action against the inner director,
    /// newest first.
    pub fn undo_changes(&mut self) -> Result<()> {
        trace!(event = "undo_changes", count = self.undo_stack.len());
        while let Some(undo) = self.undo_stack.pop() {
            let director: &mut dyn ScoreDirector<Sc> = &mut *self.inner;
            undo(director)?;
        }
        Ok(())
    }
}

impl<Sc: Score> Drop for EphemeralScoreDirector<'_, Sc> {
    fn drop(&mut self) {
        self.inner.set_all_changes_will_be_undone_before_step_ends(false);
    }
}

impl<Sc: Score> fmt::Debug for EphemeralScoreDirector<'_, Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemeralScoreDirector")
            .field("inner", &self.inner)
            .field("undo_count", &self.undo_stack.len())
            .finish()
    }
}

impl<Sc: Score> ScoreDirector<Sc> for EphemeralScoreDirector<'_, Sc> {
    fn solution_descriptor(&self) -> &SolutionDescriptor {
        self.inner.solution_descriptor()
    }

    fn working_solution(&self) -> Result<&WorkingSolution> {
        self.inner.working_solution()
    }

    fn working_solution_mut(&mut self) -> Result<&mut WorkingSolution> {
        self.inner.working_solution_mut()
    }

    fn before_entity_added(&mut self, entity: &Entity) -> Result<()> {
        self.inner.before_entity_added(entity)
    }

    fn after_entity_added(&mut self, entity: EntityId) -> Result<()> {
        self.inner.after_entity_added(entity)
    }

    fn before_entity_removed(&mut self, entity: EntityId) -> Result<()> {
        self.inner.before_entity_removed(entity)
    }

    fn after_entity_removed(&mut self, entity: EntityId, removed: &Entity) -> Result<()> {
        self.inner.after_entity_removed(entity, removed)
    }

    fn before_variable_changed(&mut self, variable: VariableRef, entity: EntityId) -> Result<()> {
        self.inner.before_variable_changed(variable, entity)
    }

    fn after_variable_changed(&mut self, variable: VariableRef, entity: EntityId) -> Result<()> {
        self.inner.after_variable_changed(variable, entity)
    }

    fn before_list_variable_element_assigned(
        &mut self,
        variable: VariableRef,
        element: &Value,
    ) -> Result<()> {
        self.inner.before_list_variable_element_assigned(variable, element)
    }

    fn after_list_variable_element_assigned(
        &mut self,
        variable: VariableRef,
        element: &Value,
    ) -> Result<()> {
        self.inner.after_list_variable_element_assigned(variable, element)
    }

    fn before_list_variable_element_unassigned(
        &mut self,
        variable: VariableRef,
        element: &Value,
    ) -> Result<()> {
        self.inner.before_list_variable_element_unassigned(variable, element)
    }

    fn after_list_variable_element_unassigned(
        &mut self,
        variable: VariableRef,
        element: &Value,
    ) -> Result<()> {
        self.inner.after_list_variable_element_unassigned(variable, element)
    }

    fn before_list_variable_changed(
        &mut self,
        variable: VariableRef,
        entity: EntityId,
        from: usize,
        to: usize,
    ) -> Result<()> {
        self.inner.before_list_variable_changed(variable, entity, from, to)
    }

    fn after_list_variable_changed(
        &mut self,
        variable: VariableRef,
        entity: EntityId,
        from: usize,
        to: usize,
    ) -> Result<()> {
        self.inner.after_list_variable_changed(variable, entity, from, to)
    }

    fn trigger_variable_listeners(&mut self) -> Result<()> {
        self.inner.trigger_variable_listeners()
    }

    fn register_undo(&mut self, undo: UndoAction<Sc>) {
        self.undo_stack.push(undo);
    }
}
