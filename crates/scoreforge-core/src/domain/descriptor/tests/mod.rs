//! Tests for descriptor types.


use crate::domain::descriptor::*;
use crate::domain::{ValueRange, Value, WorkingSolution};

// Shared model: chained visits with an inverse shadow.

pub(super) fn visits(_: &WorkingSolution) -> ValueRange {
    ValueRange::of(vec![Value::Int(1), Value::Int(2)])
}

pub(super) fn chained_builder() -> SolutionDescriptorBuilder {
    SolutionDescriptor::builder("Route")
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
}
