// Entity change notifications for a move repository.
//
// A move repository that caches selections per entity needs to hear about
// every entity the director touches. The director forwards each completed
// change here; nothing is forwarded when no tracker is installed.

use scoreforge_core::domain::{EntityId, VariableRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityChange {
    Added,
    Removed,
    VariableChanged(VariableRef),
    ListChanged {
        variable: VariableRef,
        from: usize,
        to: usize,
    },
}

pub trait EntityChangeTracker: Send {
    // Called after the change is applied to the working solution.
    fn entity_changed(&mut self, entity: EntityId, change: EntityChange);

    // Called when the director starts over with a new working solution.
    fn reset(&mut self) {}
}
