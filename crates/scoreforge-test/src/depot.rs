//! Depot assignment fixtures.
//!
//! Customers carry one basic variable, `depot`, that must be assigned. Each
//! depot records the customers pointing at it in a collection inverse
//! shadow, `customers`.
//!
//! # Example
//!
//! ```
//! use scoreforge_test::depot::DepotModel;
//!
//! let model = DepotModel::new();
//! let solution = model.solution(&["d1"], &[("c1", Some("d1")), ("c2", None)]);
//! assert_eq!(solution.entity_count(), 3);
//! ```

use std::sync::Arc;

use scoreforge_core::domain::{
    EntityDeclaration, EntityDescriptor, EntityId, SolutionDescriptor, Value, ValueRange,
    ValueRangeProvider, VariableDeclaration, VariableRef, WorkingSolution,
};

/// Entity descriptor index of `Customer`.
pub const CUSTOMER: usize = 0;
/// Entity descriptor index of `Depot`.
pub const DEPOT: usize = 1;

fn depots(solution: &WorkingSolution) -> ValueRange {
    ValueRange::of(solution.entities_of(DEPOT).map(|(id, _)| Value::Entity(id)))
}

/// The depot model and handles into it.
#[derive(Debug, Clone)]
pub struct DepotModel {
    pub descriptor: Arc<SolutionDescriptor>,
    /// `Customer.depot`
    pub depot: VariableRef,
    /// `Depot.customers`
    pub customers: VariableRef,
}

impl DepotModel {
    pub fn new() -> Self {
        let descriptor = SolutionDescriptor::builder("DepotSolution")
            .with_entity(
                EntityDeclaration::new("Customer")
                    .with_variable(VariableDeclaration::basic("depot").with_value_range("depots")),
            )
            .with_entity(
                EntityDeclaration::new("Depot").with_variable(
                    VariableDeclaration::collection_inverse("customers", "Customer", "depot"),
                ),
            )
            .with_value_range(ValueRangeProvider::from_solution("depots", depots))
            .build()
            .expect("depot model is valid");
        Self {
            depot: VariableRef::new(CUSTOMER, 0),
            customers: VariableRef::new(DEPOT, 0),
            descriptor: Arc::new(descriptor),
        }
    }

    pub fn customer_class(&self) -> &EntityDescriptor {
        &self.descriptor.entity_descriptors[CUSTOMER]
    }

    pub fn depot_class(&self) -> &EntityDescriptor {
        &self.descriptor.entity_descriptors[DEPOT]
    }

    /// Builds a solution with consistent `customers` inverses.
    ///
    /// Depots are added first, in order, then customers.
    pub fn solution(
        &self,
        depot_ids: &[&str],
        customers: &[(&str, Option<&str>)],
    ) -> WorkingSolution {
        let mut solution = WorkingSolution::new();
        for id in depot_ids {
            solution.add_entity(self.depot_class().new_entity(*id));
        }
        for (id, depot) in customers {
            let mut customer = self.customer_class().new_entity(*id);
            if let Some(depot) = depot {
                let depot = solution.find_entity(DEPOT, depot).expect("depot exists");
                customer = customer.with_value(0, depot);
            }
            solution.add_entity(customer);
        }
        self.refresh_inverses(&mut solution);
        solution
    }

    /// Recomputes every `customers` inverse from the `depot` variables.
    pub fn refresh_inverses(&self, solution: &mut WorkingSolution) {
        let depots: Vec<EntityId> = solution.entities_of(DEPOT).map(|(id, _)| id).collect();
        for depot in depots {
            let referrers: Vec<Value> = solution
                .entities_of(CUSTOMER)
                .filter(|(_, c)| c.value(0) == Some(&Value::Entity(depot)))
                .map(|(id, _)| Value::Entity(id))
                .collect();
            solution
                .set_value(depot, 0, Value::List(referrers))
                .expect("depot has a customers slot");
        }
    }

    pub fn customer(&self, solution: &WorkingSolution, id: &str) -> EntityId {
        solution.find_entity(CUSTOMER, id).expect("customer exists")
    }

    pub fn depot_of(&self, solution: &WorkingSolution, id: &str) -> EntityId {
        solution.find_entity(DEPOT, id).expect("depot exists")
    }

    /// The planning ids of the customers recorded on `depot`, sorted.
    pub fn recorded_customers(&self, solution: &WorkingSolution, depot: EntityId) -> Vec<String> {
        let mut ids: Vec<String> = solution
            .value(depot, 0)
            .and_then(Value::as_list)
            .unwrap_or_default()
            .iter()
            .filter_map(Value::as_entity)
            .filter_map(|id| solution.entity(id))
            .map(|e| e.id().to_string())
            .collect();
        ids.sort();
        ids
    }
}

impl Default for DepotModel {
    fn default() -> Self {
        Self::new()
    }
}
