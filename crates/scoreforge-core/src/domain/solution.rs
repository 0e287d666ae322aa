//! The working solution arena.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use slotmap::SlotMap;

use super::descriptor::{EntityDescriptor, FactClassDescriptor, SolutionDescriptor};
use super::{EntityId, FactId, Handle, Value};
use crate::error::{Result, ScoreForgeError};
use crate::score::ScoreSnapshot;

static NEXT_ARENA_ID: AtomicU64 = AtomicU64::new(1);

fn next_arena_id() -> u64 {
    NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed)
}

/// A planning entity: one slot per variable of its descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    descriptor_index: usize,
    id: Arc<str>,
    values: Vec<Value>,
    pinned: bool,
    pin_index: usize,
}

impl Entity {
    /// Creates an entity with every variable unassigned and list variables empty.
    pub fn new(descriptor: &EntityDescriptor, id: impl Into<Arc<str>>) -> Self {
        let values = descriptor
            .variables
            .iter()
            .map(|v| {
                if v.kind.is_list() {
                    Value::List(Vec::new())
                } else {
                    Value::None
                }
            })
            .collect();
        Self {
            descriptor_index: descriptor.index,
            id: id.into(),
            values,
            pinned: false,
            pin_index: 0,
        }
    }

    #[inline]
    pub fn descriptor_index(&self) -> usize {
        self.descriptor_index
    }

    /// The planning id, unique within the entity's class.
    #[inline]
    pub fn id(&self) -> &Arc<str> {
        &self.id
    }

    #[inline]
    pub fn value(&self, ordinal: usize) -> Option<&Value> {
        self.values.get(ordinal)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Replaces the value at `ordinal`, returning the previous value.
    ///
    /// Out-of-range ordinals are ignored and return `None`.
    pub fn set_value(&mut self, ordinal: usize, value: Value) -> Option<Value> {
        self.values
            .get_mut(ordinal)
            .map(|slot| std::mem::replace(slot, value))
    }

    pub fn with_value(mut self, ordinal: usize, value: impl Into<Value>) -> Self {
        self.set_value(ordinal, value.into());
        self
    }

    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    pub fn with_pinned(mut self, pinned: bool) -> Self {
        self.pinned = pinned;
        self
    }

    /// Elements of the list variable before this index are pinned.
    #[inline]
    pub fn pin_index(&self) -> usize {
        self.pin_index
    }

    pub fn with_pin_index(mut self, pin_index: usize) -> Self {
        self.pin_index = pin_index;
        self
    }
}

/// An immutable-by-search input object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemFact {
    class_index: usize,
    id: Arc<str>,
    properties: BTreeMap<Arc<str>, Value>,
}

impl ProblemFact {
    pub fn new(class: &FactClassDescriptor, id: impl Into<Arc<str>>) -> Self {
        Self {
            class_index: class.index,
            id: id.into(),
            properties: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn class_index(&self) -> usize {
        self.class_index
    }

    #[inline]
    pub fn id(&self) -> &Arc<str> {
        &self.id
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn set_property(&mut self, name: impl Into<Arc<str>>, value: Value) -> Option<Value> {
        self.properties.insert(name.into(), value)
    }

    pub fn with_property(mut self, name: impl Into<Arc<str>>, value: impl Into<Value>) -> Self {
        self.set_property(name, value.into());
        self
    }
}

/// The mutable root a scoring session operates on.
///
/// Entities and facts live in slot-map arenas behind `Arc`s. Mutation goes
/// through `Arc::make_mut`, so a shallow copy taken for diagnostics never
/// observes later changes. [`Clone`] is a deep copy: the clone keeps every
/// handle but shares no entity or fact instance with the original.
#[derive(Debug, Default)]
pub struct WorkingSolution {
    arena_id: u64,
    entities: SlotMap<EntityId, Arc<Entity>>,
    facts: SlotMap<FactId, Arc<ProblemFact>>,
    score: Option<ScoreSnapshot>,
}

impl WorkingSolution {
    pub fn new() -> Self {
        Self {
            arena_id: next_arena_id(),
            ..Self::default()
        }
    }

    /// Unique per arena; a clone gets a fresh id.
    #[inline]
    pub fn arena_id(&self) -> u64 {
        self.arena_id
    }

    // ------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------

    pub fn add_entity(&mut self, entity: Entity) -> EntityId {
        self.entities.insert(Arc::new(entity))
    }

    pub fn remove_entity(&mut self, id: EntityId) -> Option<Arc<Entity>> {
        self.entities.remove(id)
    }

    #[inline]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id).map(Arc::as_ref)
    }

    /// Mutable access, copying the entity first if a snapshot still shares it.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id).map(Arc::make_mut)
    }

    /// Like [`entity`](Self::entity), but fails with a descriptive error.
    pub fn require_entity(&self, id: EntityId) -> Result<&Entity> {
        self.entity(id).ok_or_else(|| {
            ScoreForgeError::IllegalState(format!(
                "The entity ({:?}) does not exist in the working solution.",
                id
            ))
        })
    }

    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.entities.contains_key(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter().map(|(id, e)| (id, e.as_ref()))
    }

    pub fn entities_of(
        &self,
        descriptor_index: usize,
    ) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities()
            .filter(move |(_, e)| e.descriptor_index == descriptor_index)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn value(&self, entity: EntityId, ordinal: usize) -> Option<&Value> {
        self.entity(entity).and_then(|e| e.value(ordinal))
    }

    /// Assigns a variable slot, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreForgeError::IllegalState`] if the entity or the slot does not exist.
    pub fn set_value(&mut self, entity: EntityId, ordinal: usize, value: Value) -> Result<Value> {
        self.entity_mut(entity)
            .and_then(|e| e.set_value(ordinal, value))
            .ok_or_else(|| {
                ScoreForgeError::IllegalState(format!(
                    "The variable slot ({:?}, {}) does not exist in the working solution.",
                    entity, ordinal
                ))
            })
    }

    /// The elements of a list variable.
    pub fn list(&self, entity: EntityId, ordinal: usize) -> Option<&[Value]> {
        self.value(entity, ordinal).and_then(Value::as_list)
    }

    /// Mutable access to the elements of a list variable.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreForgeError::IllegalState`] if the slot does not hold a list.
    pub fn list_mut(&mut self, entity: EntityId, ordinal: usize) -> Result<&mut Vec<Value>> {
        match self.entity_mut(entity).and_then(|e| e.values.get_mut(ordinal)) {
            Some(Value::List(items)) => Ok(items),
            _ => Err(ScoreForgeError::IllegalState(format!(
                "The variable slot ({:?}, {}) is not a list variable.",
                entity, ordinal
            ))),
        }
    }

    /// Finds the entity whose list variable `ordinal` contains `element`, with its index.
    pub fn find_list_position(
        &self,
        descriptor_index: usize,
        ordinal: usize,
        element: &Value,
    ) -> Option<(EntityId, usize)> {
        self.entities_of(descriptor_index).find_map(|(id, e)| {
            e.value(ordinal)
                .and_then(Value::as_list)
                .and_then(|items| items.iter().position(|v| v == element))
                .map(|index| (id, index))
        })
    }

    /// Finds an entity by planning id within one entity class.
    pub fn find_entity(&self, descriptor_index: usize, id: &str) -> Option<EntityId> {
        self.entities_of(descriptor_index)
            .find(|(_, e)| e.id.as_ref() == id)
            .map(|(handle, _)| handle)
    }

    // ------------------------------------------------------------------
    // Problem facts
    // ------------------------------------------------------------------

    pub fn add_fact(&mut self, fact: ProblemFact) -> FactId {
        self.facts.insert(Arc::new(fact))
    }

    pub fn remove_fact(&mut self, id: FactId) -> Option<Arc<ProblemFact>> {
        self.facts.remove(id)
    }

    #[inline]
    pub fn fact(&self, id: FactId) -> Option<&ProblemFact> {
        self.facts.get(id).map(Arc::as_ref)
    }

    pub fn fact_mut(&mut self, id: FactId) -> Option<&mut ProblemFact> {
        self.facts.get_mut(id).map(Arc::make_mut)
    }

    pub fn facts(&self) -> impl Iterator<Item = (FactId, &ProblemFact)> {
        self.facts.iter().map(|(id, f)| (id, f.as_ref()))
    }

    pub fn facts_of(&self, class_index: usize) -> impl Iterator<Item = (FactId, &ProblemFact)> {
        self.facts().filter(move |(_, f)| f.class_index == class_index)
    }

    pub fn fact_count(&self) -> usize {
        self.facts.len()
    }

    /// The singleton constraint configuration fact, if the model declares one.
    pub fn constraint_configuration(
        &self,
        descriptor: &SolutionDescriptor,
    ) -> Option<(FactId, &ProblemFact)> {
        let class = descriptor.constraint_configuration_class()?;
        self.facts_of(class.index).next()
    }

    /// Renders a value with planning ids in place of handles.
    pub fn describe_value(&self, descriptor: &SolutionDescriptor, value: &Value) -> String {
        match value {
            Value::Entity(id) => self
                .entity(*id)
                .map(|e| self.describe_entity(descriptor, e))
                .unwrap_or_else(|| value.to_string()),
            Value::Fact(id) => self
                .fact(*id)
                .map(|f| {
                    let class = descriptor.fact_class(f.class_index).map_or("?", |c| c.name);
                    format!("{}({})", class, f.id)
                })
                .unwrap_or_else(|| value.to_string()),
            Value::List(items) => {
                let items: Vec<String> = items
                    .iter()
                    .map(|v| self.describe_value(descriptor, v))
                    .collect();
                format!("[{}]", items.join(", "))
            }
            other => other.to_string(),
        }
    }

    /// Renders an entity as `Class(id)`.
    pub fn describe_entity(&self, descriptor: &SolutionDescriptor, entity: &Entity) -> String {
        let class = descriptor
            .entity_descriptor(entity.descriptor_index)
            .map_or("?", |d| d.name);
        format!("{}({})", class, entity.id)
    }

    // ------------------------------------------------------------------
    // Score
    // ------------------------------------------------------------------

    /// The score last calculated on this solution.
    pub fn score(&self) -> Option<&ScoreSnapshot> {
        self.score.as_ref()
    }

    pub fn set_score(&mut self, score: Option<ScoreSnapshot>) {
        self.score = score;
    }

    // ------------------------------------------------------------------
    // Copies
    // ------------------------------------------------------------------

    /// A copy sharing every entity and fact with this solution.
    ///
    /// Later mutations of either side copy on write, so the snapshot stays
    /// intact. Never hand a shallow copy to another director.
    pub fn shallow_copy(&self) -> Self {
        Self {
            arena_id: self.arena_id,
            entities: self.entities.clone(),
            facts: self.facts.clone(),
            score: self.score.clone(),
        }
    }

    /// Handles whose instances are shared with `other`.
    pub fn shared_instances(&self, other: &WorkingSolution) -> Vec<Handle> {
        let entity_ptrs: HashSet<*const Entity> =
            other.entities.values().map(Arc::as_ptr).collect();
        let fact_ptrs: HashSet<*const ProblemFact> =
            other.facts.values().map(Arc::as_ptr).collect();
        let mut shared: Vec<Handle> = self
            .entities
            .iter()
            .filter(|(_, e)| entity_ptrs.contains(&Arc::as_ptr(e)))
            .map(|(id, _)| Handle::Entity(id))
            .collect();
        shared.extend(
            self.facts
                .iter()
                .filter(|(_, f)| fact_ptrs.contains(&Arc::as_ptr(f)))
                .map(|(id, _)| Handle::Fact(id)),
        );
        shared
    }

    /// Structural equality of the content, ignoring arena identity and score.
    pub fn content_eq(&self, other: &WorkingSolution) -> bool {
        self.entities.len() == other.entities.len()
            && self.facts.len() == other.facts.len()
            && self
                .entities
                .iter()
                .all(|(id, e)| other.entities.get(id).is_some_and(|o| **o == **e))
            && self
                .facts
                .iter()
                .all(|(id, f)| other.facts.get(id).is_some_and(|o| **o == **f))
    }
}

impl Clone for WorkingSolution {
    fn clone(&self) -> Self {
        let mut entities = self.entities.clone();
        for (_, entity) in entities.iter_mut() {
            *entity = Arc::new(Entity::clone(&**entity));
        }
        let mut facts = self.facts.clone();
        for (_, fact) in facts.iter_mut() {
            *fact = Arc::new(ProblemFact::clone(&**fact));
        }
        Self {
            arena_id: next_arena_id(),
            entities,
            facts,
            score: self.score.clone(),
        }
    }
}

impl fmt::Display for WorkingSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WorkingSolution#{} ({} entities, {} facts)",
            self.arena_id,
            self.entities.len(),
            self.facts.len()
        )
    }
}
