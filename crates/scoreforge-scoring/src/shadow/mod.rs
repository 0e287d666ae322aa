//! Shadow propagation boundary.
//!
//! The director forwards every structural notification to one
//! [`ShadowPropagation`] engine. Engines only queue work while notified; the
//! director asks them for the resulting [`ShadowUpdate`]s when it triggers
//! listeners and applies those itself, so the score calculator hears about
//! shadow changes through the same before/after hooks as genuine ones.

mod inverse;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use scoreforge_core::domain::{
    Entity, EntityId, SolutionDescriptor, Value, VariableRef, WorkingSolution,
};
use scoreforge_core::Result;

pub use inverse::InverseRelationPropagation;

/// New value of one shadow slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowUpdate {
    pub entity: EntityId,
    pub variable: VariableRef,
    pub value: Value,
}

impl ShadowUpdate {
    pub fn new(entity: EntityId, variable: VariableRef, value: Value) -> Self {
        Self {
            entity,
            variable,
            value,
        }
    }
}

/// A shadow variable propagation engine.
///
/// Every notification carries the working solution in the state the hook
/// name implies: before hooks see the old state, after hooks the new one.
pub trait ShadowPropagation: Send {
    /// Forgets all queued work and adopts `solution` as the new baseline.
    fn reset_working_solution(&mut self, solution: &WorkingSolution);

    fn before_entity_added(&mut self, _solution: &WorkingSolution, _entity: &Entity) {}

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

    fn after_list_element_unassigned(
        &mut self,
        _solution: &WorkingSolution,
        _variable: VariableRef,
        _element: &Value,
    ) {
    }

    /// Drains the queue into the updates it implies.
    fn trigger_queued(&mut self, solution: &WorkingSolution) -> Result<Vec<ShadowUpdate>>;

    /// Recomputes every shadow slot as if every genuine variable had
    /// changed, returning the slots whose value differs.
    fn force_trigger_all(&mut self, solution: &WorkingSolution) -> Result<Vec<ShadowUpdate>>;

    fn close(&mut self) {}
}

/// Builds a propagation engine for a director. Each director gets its own.
pub type ShadowSupplier =
    Arc<dyn Fn(&Arc<SolutionDescriptor>) -> Box<dyn ShadowPropagation> + Send + Sync>;

/// Engine for models without shadow variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoShadowPropagation;

impl NoShadowPropagation {
    pub fn supplier() -> ShadowSupplier {
        Arc::new(|_| Box::new(NoShadowPropagation))
    }
}

impl ShadowPropagation for NoShadowPropagation {
    fn reset_working_solution(&mut self, _solution: &WorkingSolution) {}

    fn trigger_queued(&mut self, _solution: &WorkingSolution) -> Result<Vec<ShadowUpdate>> {
        Ok(Vec::new())
    }

    fn force_trigger_all(&mut self, _solution: &WorkingSolution) -> Result<Vec<ShadowUpdate>> {
        Ok(Vec::new())
    }
}
