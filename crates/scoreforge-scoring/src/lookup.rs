//! Identity lookup registry.
//!
//! Translates an external object (a class name plus a planning id) into the
//! handle of the matching working object, so problem changes built against
//! one solution copy can be applied to another.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use scoreforge_core::domain::{
    Entity, EntityId, FactId, Handle, ProblemFact, SolutionDescriptor, WorkingSolution,
};
use scoreforge_core::{Result, ScoreForgeError};

/// External identity of a working object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LookupKey {
    pub class: &'static str,
    pub id: Arc<str>,
}

impl LookupKey {
    pub fn new(class: &'static str, id: impl Into<Arc<str>>) -> Self {
        Self {
            class,
            id: id.into(),
        }
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.class, self.id)
    }
}

/// Planning-id index over the entities and facts of one working solution.
#[derive(Debug, Default)]
pub struct LookupRegistry {
    index: HashMap<LookupKey, Handle>,
}

impl LookupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the index from `solution`: facts first, then entities.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreForgeError::DomainModel`] if two working objects of the
    /// same class share a planning id.
    pub fn reset(
        &mut self,
        descriptor: &SolutionDescriptor,
        solution: &WorkingSolution,
    ) -> Result<()> {
        self.index.clear();
        for (id, _) in solution.facts() {
            self.add_fact(descriptor, solution, id)?;
        }
        for (id, _) in solution.entities() {
            self.add_entity(descriptor, solution, id)?;
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.index.clear();
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn entity_key(
        descriptor: &SolutionDescriptor,
        solution: &WorkingSolution,
        entity: EntityId,
    ) -> Result<LookupKey> {
        Ok(Self::key_of_entity(descriptor, solution.require_entity(entity)?))
    }

    pub fn key_of_entity(descriptor: &SolutionDescriptor, entity: &Entity) -> LookupKey {
        let class = descriptor
            .entity_descriptor(entity.descriptor_index())
            .map_or("?", |d| d.name);
        LookupKey::new(class, entity.id().clone())
    }

    pub fn key_of_fact(descriptor: &SolutionDescriptor, fact: &ProblemFact) -> LookupKey {
        let class = descriptor.fact_class(fact.class_index()).map_or("?", |c| c.name);
        LookupKey::new(class, fact.id().clone())
    }

    pub fn fact_key(
        descriptor: &SolutionDescriptor,
        solution: &WorkingSolution,
        fact: FactId,
    ) -> Result<LookupKey> {
        let working = solution.fact(fact).ok_or_else(|| {
            ScoreForgeError::IllegalState(format!(
                "The problem fact ({:?}) does not exist in the working solution.",
                fact
            ))
        })?;
        Ok(Self::key_of_fact(descriptor, working))
    }

    pub fn add_entity(
        &mut self,
        descriptor: &SolutionDescriptor,
        solution: &WorkingSolution,
        entity: EntityId,
    ) -> Result<()> {
        let key = Self::entity_key(descriptor, solution, entity)?;
        self.add_working_object(key, Handle::Entity(entity))
    }

    pub fn add_fact(
        &mut self,
        descriptor: &SolutionDescriptor,
        solution: &WorkingSolution,
        fact: FactId,
    ) -> Result<()> {
        let key = Self::fact_key(descriptor, solution, fact)?;
        self.add_working_object(key, Handle::Fact(fact))
    }

    pub fn add_working_object(&mut self, key: LookupKey, handle: Handle) -> Result<()> {
        if let Some(existing) = self.index.get(&key) {
            return Err(ScoreForgeError::DomainModel(format!(
                "The working objects ({} and {}) have the same planning id ({}).\nWorking objects must be unique.",
                existing, handle, key
            )));
        }
        self.index.insert(key, handle);
        Ok(())
    }

    /// Removes the working object registered under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreForgeError::IllegalState`] if nothing is registered
    /// under `key`.
    pub fn remove_working_object(&mut self, key: &LookupKey) -> Result<Handle> {
        self.index.remove(key).ok_or_else(|| {
            ScoreForgeError::IllegalState(format!(
                "The working object ({}) to remove is not registered.\nMaybe it was never added.",
                key
            ))
        })
    }

    pub fn look_up_working_object(&self, key: &LookupKey) -> Result<Handle> {
        self.index.get(key).copied().ok_or_else(|| {
            ScoreForgeError::IllegalState(format!(
                "The external object ({}) has no known working object.\nMaybe the working object was never added to the working solution.",
                key
            ))
        })
    }

    pub fn look_up_working_object_or_none(&self, key: &LookupKey) -> Option<Handle> {
        self.index.get(key).copied()
    }
}
