//! Domain model of a planning problem
//!
//! - [`SolutionDescriptor`]: the static model, built once and shared
//! - [`WorkingSolution`]: the mutable arena of entities and problem facts
//! - [`Value`] / [`ValueRange`]: what variables hold and may hold
//! - [`VariableKind`]: genuine or shadow, resolved at build time

mod cloner;
mod descriptor;
mod handle;
mod snapshot;
mod solution;
mod statistics;
mod value;
mod value_range;
mod variable;

#[cfg(test)]
mod tests;

pub use cloner::{DeepSolutionCloner, SolutionCloner};
pub use descriptor::{
    EntityDeclaration, EntityDescriptor, FactClassDescriptor, SolutionDescriptor,
    SolutionDescriptorBuilder, ValueRangeDescriptor, ValueRangeProvider, ValueRangeSource,
    VariableDeclaration, VariableDescriptor,
};
pub use handle::{EntityId, FactId, Handle};
pub use snapshot::{SnapshotFilter, VariableDifference, VariableSnapshot};
pub use solution::{Entity, ProblemFact, WorkingSolution};
pub use statistics::{InitializationStatistics, ProblemSizeStatistics};
pub use value::Value;
pub use value_range::ValueRange;
pub use variable::{GenuineKind, InverseCardinality, ShadowKind, VariableKind, VariableRef};
