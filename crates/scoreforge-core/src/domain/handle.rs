use std::fmt;

use slotmap::new_key_type;

new_key_type! {
    /// Stable handle of an entity inside one [`WorkingSolution`](super::WorkingSolution) arena.
    pub struct EntityId;
    /// Stable handle of a problem fact inside one working solution arena.
    pub struct FactId;
}

/// Handle of either an entity or a problem fact.
///
/// Problem-change hooks accept both because a property change may target
/// an entity's non-planning state as well as a fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Handle {
    Entity(EntityId),
    Fact(FactId),
}

impl From<EntityId> for Handle {
    fn from(id: EntityId) -> Self {
        Handle::Entity(id)
    }
}

impl From<FactId> for Handle {
    fn from(id: FactId) -> Self {
        Handle::Fact(id)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handle::Entity(id) => write!(f, "entity{:?}", id),
            Handle::Fact(id) => write!(f, "fact{:?}", id),
        }
    }
}
