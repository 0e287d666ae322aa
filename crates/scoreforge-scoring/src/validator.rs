//! Entity consistency validation for a freshly set working solution.
//!
//! Inverse shadows of basic variables are checked against the actual
//! referrers, computed once per validator from the source variables. List
//! inverses are left to the propagation engine.

use std::collections::{BTreeSet, HashMap};

use scoreforge_core::domain::{
    Entity, EntityId, InverseCardinality, ShadowKind, SolutionDescriptor, Value, VariableDescriptor,
    VariableKind, VariableRef, WorkingSolution,
};
use scoreforge_core::{Result, ScoreForgeError};

/// Validates entities against the inverse relations implied by the genuine
/// variables of one working solution.
pub struct EntityValidator<'a> {
    descriptor: &'a SolutionDescriptor,
    solution: &'a WorkingSolution,
    expect_shadows_correct: bool,
    // (source variable, referenced entity) -> referrers
    referrers: HashMap<(VariableRef, EntityId), BTreeSet<EntityId>>,
}

impl<'a> EntityValidator<'a> {
    pub fn new(
        descriptor: &'a SolutionDescriptor,
        solution: &'a WorkingSolution,
        expect_shadows_correct: bool,
    ) -> Self {
        let mut referrers: HashMap<(VariableRef, EntityId), BTreeSet<EntityId>> = HashMap::new();
        if expect_shadows_correct {
            let sources: BTreeSet<VariableRef> = descriptor
                .basic_inverse_shadows()
                .filter_map(|v| v.kind.source())
                .filter(|source| descriptor.variable(*source).is_ok_and(|s| s.kind.is_basic()))
                .collect();
            for source in sources {
                for (id, entity) in solution.entities_of(source.entity_descriptor) {
                    if let Some(Value::Entity(target)) = entity.value(source.ordinal) {
                        referrers.entry((source, *target)).or_default().insert(id);
                    }
                }
            }
        }
        Self {
            descriptor,
            solution,
            expect_shadows_correct,
            referrers,
        }
    }

    /// Validates every entity of the solution.
    pub fn validate_all(&self) -> Result<()> {
        for (id, _) in self.solution.entities() {
            self.validate(id)?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// - [`ScoreForgeError::IllegalState`] for an unset inconsistency marker,
    ///   or a singleton inverse with several referrers
    /// - [`ScoreForgeError::StructuralInconsistency`] for an inverse that does
    ///   not match its referrers, or a pinned entity with a required variable
    ///   left unassigned
    pub fn validate(&self, id: EntityId) -> Result<()> {
        let entity = self.solution.require_entity(id)?;
        let Some(entity_descriptor) = self.descriptor.entity_descriptor(entity.descriptor_index())
        else {
            return Err(ScoreForgeError::DomainModel(format!(
                "The entity ({:?}) has an unknown entity descriptor ({}).",
                id,
                entity.descriptor_index()
            )));
        };
        if self.expect_shadows_correct {
            for variable in &entity_descriptor.variables {
                match variable.kind {
                    VariableKind::Shadow(ShadowKind::InconsistentMarker) => {
                        self.validate_marker(entity, variable)?
                    }
                    VariableKind::Shadow(ShadowKind::Inverse {
                        source,
                        cardinality,
                    }) if self.referrers_tracked(source) => match cardinality {
                        InverseCardinality::Singleton => {
                            self.validate_singleton(id, entity, variable, source)?
                        }
                        InverseCardinality::Collection => {
                            self.validate_collection(id, entity, variable, source)?
                        }
                    },
                    _ => {}
                }
            }
        }
        if self.descriptor.is_basic_only() && entity.is_pinned() {
            for variable in entity_descriptor.genuine_variables() {
                if !variable.allows_unassigned
                    && entity.value(variable.ordinal).map_or(true, Value::is_none)
                {
                    return Err(ScoreForgeError::StructuralInconsistency(format!(
                        "The entity ({}) has a variable ({}) pinned to null, even though unassigned values are not allowed.",
                        self.describe(entity),
                        variable.name
                    )));
                }
            }
        }
        Ok(())
    }

    fn referrers_tracked(&self, source: VariableRef) -> bool {
        self.descriptor
            .variable(source)
            .is_ok_and(|s| s.kind.is_basic())
    }

    fn describe(&self, entity: &Entity) -> String {
        self.solution.describe_entity(self.descriptor, entity)
    }

    fn describe_value(&self, value: &Value) -> String {
        self.solution.describe_value(self.descriptor, value)
    }

    fn validate_marker(&self, entity: &Entity, variable: &VariableDescriptor) -> Result<()> {
        if entity.value(variable.ordinal).map_or(true, Value::is_none) {
            return Err(ScoreForgeError::IllegalState(format!(
                "Shadow variables update is disabled, but the entity ({}) has an unset inconsistency marker ({}).\nMaybe enable shadow variable updates?",
                self.describe(entity),
                variable.name
            )));
        }
        Ok(())
    }

    fn actual_referrers(&self, source: VariableRef, id: EntityId) -> Vec<EntityId> {
        self.referrers
            .get(&(source, id))
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    fn validate_singleton(
        &self,
        id: EntityId,
        entity: &Entity,
        variable: &VariableDescriptor,
        source: VariableRef,
    ) -> Result<()> {
        let recorded = entity.value(variable.ordinal).cloned().unwrap_or_default();
        let actual = self.actual_referrers(source, id);
        match actual.as_slice() {
            [] if recorded.is_some() => Err(ScoreForgeError::StructuralInconsistency(format!(
                "The entity ({}) has an inverse shadow variable ({}) that points to a source entity ({}) but it has no source entities.\nVerify the consistency of your input solution.",
                self.describe(entity),
                variable.name,
                self.describe_value(&recorded)
            ))),
            [] => Ok(()),
            [only] if recorded != Value::Entity(*only) => {
                Err(ScoreForgeError::StructuralInconsistency(format!(
                    "The entity ({}) has a singleton inverse shadow variable ({}) that points to a source entity ({}) whereas its actual source entity is ({}).\nVerify the consistency of your input solution.",
                    self.describe(entity),
                    variable.name,
                    self.describe_value(&recorded),
                    self.describe_value(&Value::Entity(*only))
                )))
            }
            [_] => Ok(()),
            several => Err(ScoreForgeError::IllegalState(format!(
                "Impossible state: The entity ({}) has a singleton inverse shadow variable ({}) with multiple source entities ({}).\nVerify the consistency of your input solution.",
                self.describe(entity),
                variable.name,
                self.render_sorted(several)
            ))),
        }
    }

    fn validate_collection(
        &self,
        id: EntityId,
        entity: &Entity,
        variable: &VariableDescriptor,
        source: VariableRef,
    ) -> Result<()> {
        let items = match entity.value(variable.ordinal) {
            Some(Value::List(items)) => items,
            _ => {
                return Err(ScoreForgeError::StructuralInconsistency(format!(
                    "The entity ({}) has a collection inverse shadow variable ({}) that is null.\nVerify the consistency of your input solution.",
                    self.describe(entity),
                    variable.name
                )))
            }
        };
        if items.iter().any(Value::is_none) {
            return Err(ScoreForgeError::StructuralInconsistency(format!(
                "The entity ({}) has a collection inverse shadow variable ({}) with a null element.\nVerify the consistency of your input solution.",
                self.describe(entity),
                variable.name
            )));
        }
        let recorded: BTreeSet<&Value> = items.iter().collect();
        let actual = self.actual_referrers(source, id);
        let actual_values: Vec<Value> = actual.iter().map(|e| Value::Entity(*e)).collect();
        let expected: BTreeSet<&Value> = actual_values.iter().collect();
        if recorded != expected {
            return Err(ScoreForgeError::StructuralInconsistency(format!(
                "The entity ({}) has a collection inverse shadow variable ({}) ({}) that does not match the actual inverse set ({}).\nVerify the consistency of your input solution.",
                self.describe(entity),
                variable.name,
                self.describe_value(&Value::List(items.clone())),
                self.render_sorted(&actual)
            )));
        }
        Ok(())
    }

    fn render_sorted(&self, entities: &[EntityId]) -> String {
        let mut rendered: Vec<String> = entities
            .iter()
            .map(|e| self.describe_value(&Value::Entity(*e)))
            .collect();
        rendered.sort();
        format!("[{}]", rendered.join(", "))
    }
}
