//! Chained visit fixtures.
//!
//! Every visit may point at a previous visit. The singleton inverse `next`
//! records the one visit pointing back, so a consistent chain has at most
//! one referrer per visit.

use std::sync::Arc;

use scoreforge_core::domain::{
    EntityDeclaration, EntityDescriptor, EntityId, SolutionDescriptor, Value, ValueRange,
    ValueRangeProvider, VariableDeclaration, VariableRef, WorkingSolution,
};

/// Entity descriptor index of `Visit`.
pub const VISIT: usize = 0;

fn visits(solution: &WorkingSolution) -> ValueRange {
    ValueRange::of(solution.entities_of(VISIT).map(|(id, _)| Value::Entity(id)))
}

#[derive(Debug, Clone)]
pub struct ChainModel {
    pub descriptor: Arc<SolutionDescriptor>,
    /// `Visit.previous`
    pub previous: VariableRef,
    /// `Visit.next`
    pub next: VariableRef,
}

impl ChainModel {
    pub fn new() -> Self {
        let descriptor = SolutionDescriptor::builder("ChainSolution")
            .with_entity(
                EntityDeclaration::new("Visit")
                    .with_variable(
                        VariableDeclaration::basic("previous")
                            .with_value_range("visits")
                            .with_allows_unassigned(true),
                    )
                    .with_variable(VariableDeclaration::singleton_inverse(
                        "next", "Visit", "previous",
                    )),
            )
            .with_value_range(ValueRangeProvider::from_solution("visits", visits))
            .build()
            .expect("chain model is valid");
        Self {
            previous: VariableRef::new(VISIT, 0),
            next: VariableRef::new(VISIT, 1),
            descriptor: Arc::new(descriptor),
        }
    }

    pub fn visit_class(&self) -> &EntityDescriptor {
        &self.descriptor.entity_descriptors[VISIT]
    }

    /// Builds visits in order, each with its `previous`, and sets every
    /// `next` to the last visit pointing back at it.
    pub fn solution(&self, visits: &[(&str, Option<&str>)]) -> WorkingSolution {
        let mut solution = WorkingSolution::new();
        for (id, _) in visits {
            solution.add_entity(self.visit_class().new_entity(*id));
        }
        for (id, previous) in visits {
            if let Some(previous) = previous {
                let this = self.visit(&solution, id);
                let previous = self.visit(&solution, previous);
                solution
                    .set_value(this, 0, Value::Entity(previous))
                    .expect("visit has a previous slot");
                solution
                    .set_value(previous, 1, Value::Entity(this))
                    .expect("visit has a next slot");
            }
        }
        solution
    }

    pub fn visit(&self, solution: &WorkingSolution, id: &str) -> EntityId {
        solution.find_entity(VISIT, id).expect("visit exists")
    }
}

impl Default for ChainModel {
    fn default() -> Self {
        Self::new()
    }
}
