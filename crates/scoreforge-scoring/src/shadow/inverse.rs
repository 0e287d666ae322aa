//! Reference propagation engine for inverse relations.
//!
//! Maintains three kinds of shadow variables:
//! - singleton and collection inverses of basic variables, which record the
//!   entities whose source variable points at the shadow's owner;
//! - list inverses, which record the entity whose list holds an element;
//! - list indexes, which record an element's position in that list.
//!
//! Inconsistency markers are cleared on a forced full recomputation.

use std::collections::BTreeSet;
use std::sync::Arc;

use scoreforge_core::domain::{
    Entity, EntityId, InverseCardinality, ShadowKind, SolutionDescriptor, Value, VariableKind,
    VariableRef, WorkingSolution,
};
use scoreforge_core::Result;
use tracing::trace;

use super::{ShadowPropagation, ShadowSupplier, ShadowUpdate};

#[derive(Debug, Clone, Copy)]
struct BasicInverse {
    shadow: VariableRef,
    source: VariableRef,
    cardinality: InverseCardinality,
}

#[derive(Debug, Clone, Copy)]
struct ListShadows {
    list: VariableRef,
    element_class: Option<usize>,
    inverse: Option<VariableRef>,
    index: Option<VariableRef>,
}

/// Propagation engine for inverse, list-inverse and index shadows.
#[derive(Debug)]
pub struct InverseRelationPropagation {
    basic_inverses: Vec<BasicInverse>,
    list_shadows: Option<ListShadows>,
    markers: Vec<VariableRef>,
    dirty_targets: BTreeSet<EntityId>,
    dirty_lists: BTreeSet<EntityId>,
    unassigned_elements: Vec<Value>,
}

impl InverseRelationPropagation {
    pub fn new(descriptor: &SolutionDescriptor) -> Self {
        let mut basic_inverses = Vec::new();
        let mut markers = Vec::new();
        let mut list_shadows = descriptor.list_variable().map(|list| ListShadows {
            list: list.variable_ref(),
            element_class: None,
            inverse: None,
            index: None,
        });
        for variable in descriptor.all_variables() {
            match variable.kind {
                VariableKind::Shadow(ShadowKind::Inverse {
                    source,
                    cardinality,
                }) => basic_inverses.push(BasicInverse {
                    shadow: variable.variable_ref(),
                    source,
                    cardinality,
                }),
                VariableKind::Shadow(ShadowKind::ListInverse { .. }) => {
                    if let Some(list) = list_shadows.as_mut() {
                        list.element_class = Some(variable.entity_descriptor);
                        list.inverse = Some(variable.variable_ref());
                    }
                }
                VariableKind::Shadow(ShadowKind::Index { .. }) => {
                    if let Some(list) = list_shadows.as_mut() {
                        list.element_class = Some(variable.entity_descriptor);
                        list.index = Some(variable.variable_ref());
                    }
                }
                VariableKind::Shadow(ShadowKind::InconsistentMarker) => {
                    markers.push(variable.variable_ref())
                }
                _ => {}
            }
        }
        Self {
            basic_inverses,
            list_shadows,
            markers,
            dirty_targets: BTreeSet::new(),
            dirty_lists: BTreeSet::new(),
            unassigned_elements: Vec::new(),
        }
    }

    pub fn supplier() -> ShadowSupplier {
        Arc::new(|descriptor| Box::new(InverseRelationPropagation::new(descriptor)))
    }

    fn mark_source_target(
        &mut self,
        solution: &WorkingSolution,
        variable: VariableRef,
        entity: EntityId,
    ) {
        if !self.basic_inverses.iter().any(|i| i.source == variable) {
            return;
        }
        if let Some(Value::Entity(target)) = solution.value(entity, variable.ordinal) {
            self.dirty_targets.insert(*target);
        }
    }

    fn mark_all_source_targets(&mut self, solution: &WorkingSolution, entity: EntityId) {
        let Some(descriptor_index) = solution.entity(entity).map(Entity::descriptor_index) else {
            return;
        };
        let sources: Vec<VariableRef> = self
            .basic_inverses
            .iter()
            .map(|i| i.source)
            .filter(|s| s.entity_descriptor == descriptor_index)
            .collect();
        for source in sources {
            self.mark_source_target(solution, source, entity);
        }
    }

    fn is_list_owner(&self, solution: &WorkingSolution, entity: EntityId) -> bool {
        self.list_shadows.is_some_and(|l| {
            solution
                .entity(entity)
                .is_some_and(|e| e.descriptor_index() == l.list.entity_descriptor)
        })
    }

    fn inverse_updates(
        &self,
        solution: &WorkingSolution,
        target: EntityId,
        updates: &mut Vec<ShadowUpdate>,
    ) {
        let Some(entity) = solution.entity(target) else {
            return;
        };
        for inverse in &self.basic_inverses {
            if inverse.shadow.entity_descriptor != entity.descriptor_index() {
                continue;
            }
            let referrers: Vec<Value> = solution
                .entities_of(inverse.source.entity_descriptor)
                .filter(|(_, e)| e.value(inverse.source.ordinal) == Some(&Value::Entity(target)))
                .map(|(id, _)| Value::Entity(id))
                .collect();
            match inverse.cardinality {
                InverseCardinality::Singleton => {
                    let expected = referrers.into_iter().next().unwrap_or_default();
                    push_if_changed(solution, target, inverse.shadow, expected, updates);
                }
                InverseCardinality::Collection => {
                    // Unordered: a recorded order with the same members is kept.
                    if !has_members(solution.value(target, inverse.shadow.ordinal), &referrers) {
                        updates.push(ShadowUpdate::new(
                            target,
                            inverse.shadow,
                            Value::List(referrers),
                        ));
                    }
                }
            }
        }
    }

    fn list_updates(
        &self,
        solution: &WorkingSolution,
        owner: EntityId,
        updates: &mut Vec<ShadowUpdate>,
    ) {
        let Some(list) = self.list_shadows else {
            return;
        };
        let Some(items) = solution.list(owner, list.list.ordinal) else {
            return;
        };
        for (index, item) in items.iter().enumerate() {
            let Value::Entity(element) = item else {
                continue;
            };
            if let Some(inverse) = list.inverse {
                push_if_changed(solution, *element, inverse, Value::Entity(owner), updates);
            }
            if let Some(index_variable) = list.index {
                push_if_changed(
                    solution,
                    *element,
                    index_variable,
                    Value::Int(index as i64),
                    updates,
                );
            }
        }
    }

    fn unassigned_updates(
        &self,
        solution: &WorkingSolution,
        element: &Value,
        updates: &mut Vec<ShadowUpdate>,
    ) {
        let (Some(list), Value::Entity(id)) = (self.list_shadows, element) else {
            return;
        };
        if !solution.contains_entity(*id)
            || solution
                .find_list_position(list.list.entity_descriptor, list.list.ordinal, element)
                .is_some()
        {
            return;
        }
        for variable in [list.inverse, list.index].into_iter().flatten() {
            push_if_changed(solution, *id, variable, Value::None, updates);
        }
    }
}

fn has_members(recorded: Option<&Value>, referrers: &[Value]) -> bool {
    match recorded {
        Some(Value::List(items)) => {
            items.len() == referrers.len()
                && items.iter().collect::<BTreeSet<_>>()
                    == referrers.iter().collect::<BTreeSet<_>>()
        }
        _ => false,
    }
}

fn push_if_changed(
    solution: &WorkingSolution,
    entity: EntityId,
    variable: VariableRef,
    expected: Value,
    updates: &mut Vec<ShadowUpdate>,
) {
    if solution.value(entity, variable.ordinal) != Some(&expected) {
        updates.push(ShadowUpdate::new(entity, variable, expected));
    }
}

impl ShadowPropagation for InverseRelationPropagation {
    fn reset_working_solution(&mut self, _solution: &WorkingSolution) {
        self.dirty_targets.clear();
        self.dirty_lists.clear();
        self.unassigned_elements.clear();
    }

    fn after_entity_added(&mut self, solution: &WorkingSolution, entity: EntityId) {
        self.mark_all_source_targets(solution, entity);
        self.dirty_targets.insert(entity);
        if self.is_list_owner(solution, entity) {
            self.dirty_lists.insert(entity);
        }
    }

    fn before_entity_removed(&mut self, solution: &WorkingSolution, entity: EntityId) {
        self.mark_all_source_targets(solution, entity);
        if let Some(list) = self.list_shadows {
            if let Some(items) = solution.list(entity, list.list.ordinal) {
                self.unassigned_elements.extend(items.iter().cloned());
            }
        }
    }

    fn after_entity_removed(
        &mut self,
        _solution: &WorkingSolution,
        entity: EntityId,
        _removed: &Entity,
    ) {
        self.dirty_targets.remove(&entity);
        self.dirty_lists.remove(&entity);
    }

    fn before_variable_changed(
        &mut self,
        solution: &WorkingSolution,
        variable: VariableRef,
        entity: EntityId,
    ) {
        self.mark_source_target(solution, variable, entity);
    }

    fn after_variable_changed(
        &mut self,
        solution: &WorkingSolution,
        variable: VariableRef,
        entity: EntityId,
    ) {
        self.mark_source_target(solution, variable, entity);
    }

    fn before_list_variable_changed(
        &mut self,
        _solution: &WorkingSolution,
        _variable: VariableRef,
        entity: EntityId,
        _from: usize,
        _to: usize,
    ) {
        self.dirty_lists.insert(entity);
    }

    fn after_list_variable_changed(
        &mut self,
        _solution: &WorkingSolution,
        _variable: VariableRef,
        entity: EntityId,
        _from: usize,
        _to: usize,
    ) {
        self.dirty_lists.insert(entity);
    }

    fn after_list_element_unassigned(
        &mut self,
        _solution: &WorkingSolution,
        _variable: VariableRef,
        element: &Value,
    ) {
        self.unassigned_elements.push(element.clone());
    }

    fn trigger_queued(&mut self, solution: &WorkingSolution) -> Result<Vec<ShadowUpdate>> {
        let mut updates = Vec::new();
        for element in std::mem::take(&mut self.unassigned_elements) {
            self.unassigned_updates(solution, &element, &mut updates);
        }
        for owner in std::mem::take(&mut self.dirty_lists) {
            self.list_updates(solution, owner, &mut updates);
        }
        for target in std::mem::take(&mut self.dirty_targets) {
            self.inverse_updates(solution, target, &mut updates);
        }
        if !updates.is_empty() {
            trace!(update_count = updates.len(), "Shadow updates triggered.");
        }
        Ok(updates)
    }

    fn force_trigger_all(&mut self, solution: &WorkingSolution) -> Result<Vec<ShadowUpdate>> {
        self.reset_working_solution(solution);
        let mut updates = Vec::new();
        if let Some(list) = self.list_shadows {
            if let Some(element_class) = list.element_class {
                for (id, _) in solution.entities_of(element_class) {
                    self.unassigned_updates(solution, &Value::Entity(id), &mut updates);
                }
            }
            for (owner, _) in solution.entities_of(list.list.entity_descriptor) {
                self.list_updates(solution, owner, &mut updates);
            }
        }
        for (target, _) in solution.entities() {
            self.inverse_updates(solution, target, &mut updates);
        }
        for marker in &self.markers {
            for (id, _) in solution.entities_of(marker.entity_descriptor) {
                push_if_changed(solution, id, *marker, Value::Bool(false), &mut updates);
            }
        }
        Ok(updates)
    }
}
