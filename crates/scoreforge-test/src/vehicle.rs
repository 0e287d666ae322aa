//! Vehicle routing fixtures.
//!
//! Vehicles own a list variable, `visits`. Each visit records the vehicle
//! holding it and its position in that list as shadows.

use std::sync::Arc;

use scoreforge_core::domain::{
    EntityDeclaration, EntityDescriptor, EntityId, SolutionDescriptor, Value, ValueRange,
    ValueRangeProvider, VariableDeclaration, VariableRef, WorkingSolution,
};

/// Entity descriptor index of `Vehicle`.
pub const VEHICLE: usize = 0;
/// Entity descriptor index of `Visit`.
pub const VISIT: usize = 1;

fn all_visits(solution: &WorkingSolution) -> ValueRange {
    ValueRange::of(solution.entities_of(VISIT).map(|(id, _)| Value::Entity(id)))
}

#[derive(Debug, Clone)]
pub struct VehicleModel {
    pub descriptor: Arc<SolutionDescriptor>,
    /// `Vehicle.visits`
    pub visits: VariableRef,
    /// `Visit.vehicle`
    pub vehicle: VariableRef,
    /// `Visit.index`
    pub index: VariableRef,
}

impl VehicleModel {
    /// With `allows_unassigned`, visits may stay out of every list.
    pub fn new(allows_unassigned: bool) -> Self {
        let descriptor = SolutionDescriptor::builder("VehicleRoutingSolution")
            .with_entity(
                EntityDeclaration::new("Vehicle").with_variable(
                    VariableDeclaration::list("visits")
                        .with_value_range("visits")
                        .with_allows_unassigned(allows_unassigned),
                ),
            )
            .with_entity(
                EntityDeclaration::new("Visit")
                    .with_variable(VariableDeclaration::list_inverse(
                        "vehicle", "Vehicle", "visits",
                    ))
                    .with_variable(VariableDeclaration::index("index", "Vehicle", "visits")),
            )
            .with_value_range(ValueRangeProvider::from_solution("visits", all_visits))
            .build()
            .expect("vehicle model is valid");
        Self {
            visits: VariableRef::new(VEHICLE, 0),
            vehicle: VariableRef::new(VISIT, 0),
            index: VariableRef::new(VISIT, 1),
            descriptor: Arc::new(descriptor),
        }
    }

    pub fn vehicle_class(&self) -> &EntityDescriptor {
        &self.descriptor.entity_descriptors[VEHICLE]
    }

    pub fn visit_class(&self) -> &EntityDescriptor {
        &self.descriptor.entity_descriptors[VISIT]
    }

    /// Builds vehicles with the given routes, plus `unassigned` visits held
    /// by no vehicle. Shadows are consistent.
    pub fn solution(&self, routes: &[(&str, &[&str])], unassigned: &[&str]) -> WorkingSolution {
        let mut solution = WorkingSolution::new();
        for (_, visits) in routes {
            for visit in visits.iter() {
                solution.add_entity(self.visit_class().new_entity(*visit));
            }
        }
        for visit in unassigned {
            solution.add_entity(self.visit_class().new_entity(*visit));
        }
        for (vehicle, visits) in routes {
            let items: Vec<Value> = visits
                .iter()
                .map(|v| Value::Entity(self.visit(&solution, v)))
                .collect();
            let owner = solution.add_entity(
                self.vehicle_class()
                    .new_entity(*vehicle)
                    .with_value(0, Value::List(items)),
            );
            for (index, visit) in visits.iter().enumerate() {
                let visit = self.visit(&solution, visit);
                solution
                    .set_value(visit, 0, Value::Entity(owner))
                    .expect("visit has a vehicle slot");
                solution
                    .set_value(visit, 1, Value::Int(index as i64))
                    .expect("visit has an index slot");
            }
        }
        solution
    }

    pub fn vehicle(&self, solution: &WorkingSolution, id: &str) -> EntityId {
        solution.find_entity(VEHICLE, id).expect("vehicle exists")
    }

    pub fn visit(&self, solution: &WorkingSolution, id: &str) -> EntityId {
        solution.find_entity(VISIT, id).expect("visit exists")
    }

    /// The planning ids in `vehicle`'s list, in order.
    pub fn route(&self, solution: &WorkingSolution, vehicle: EntityId) -> Vec<String> {
        solution
            .list(vehicle, 0)
            .unwrap_or_default()
            .iter()
            .filter_map(Value::as_entity)
            .filter_map(|id| solution.entity(id))
            .map(|e| e.id().to_string())
            .collect()
    }

    /// `(vehicle id, index)` recorded on a visit, if any.
    pub fn recorded_position(
        &self,
        solution: &WorkingSolution,
        visit: EntityId,
    ) -> Option<(String, i64)> {
        let vehicle = solution.value(visit, 0)?.as_entity()?;
        let index = solution.value(visit, 1)?.as_int()?;
        Some((solution.entity(vehicle)?.id().to_string(), index))
    }
}
