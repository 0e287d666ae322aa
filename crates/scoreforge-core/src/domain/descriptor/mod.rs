//! Runtime descriptors of the planning model.
//!
//! Descriptors are built once by [`SolutionDescriptor::builder`] and never
//! change afterwards. Every name is resolved at build time, so the scoring
//! core only ever handles indices and [`VariableRef`](super::VariableRef)s.

mod entity;
mod problem_fact;
mod solution;
mod value_range;
mod var_descriptor;

#[cfg(test)]
mod tests;

pub use entity::{EntityDeclaration, EntityDescriptor};
pub use problem_fact::FactClassDescriptor;
pub use solution::{SolutionDescriptor, SolutionDescriptorBuilder};
pub use value_range::{ValueRangeDescriptor, ValueRangeProvider, ValueRangeSource};
pub use var_descriptor::{VariableDeclaration, VariableDescriptor};
