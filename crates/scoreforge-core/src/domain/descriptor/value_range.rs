//! Value range descriptors.

use std::fmt;

use crate::domain::solution::WorkingSolution;
use crate::domain::value_range::ValueRange;
use crate::domain::variable::VariableRef;
use crate::domain::EntityId;

/// Where a value range is extracted from.
#[derive(Clone, Copy)]
pub enum ValueRangeSource {
    /// One range shared by every entity of the solution.
    Solution(fn(&WorkingSolution) -> ValueRange),
    /// A range that may differ per entity.
    Entity(fn(&WorkingSolution, EntityId) -> ValueRange),
}

impl fmt::Debug for ValueRangeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueRangeSource::Solution(_) => write!(f, "Solution(..)"),
            ValueRangeSource::Entity(_) => write!(f, "Entity(..)"),
        }
    }
}

/// A named value range declared on the solution.
#[derive(Debug, Clone, Copy)]
pub struct ValueRangeProvider {
    pub name: &'static str,
    pub source: ValueRangeSource,
}

impl ValueRangeProvider {
    pub fn from_solution(name: &'static str, extract: fn(&WorkingSolution) -> ValueRange) -> Self {
        Self {
            name,
            source: ValueRangeSource::Solution(extract),
        }
    }

    pub fn from_entity(
        name: &'static str,
        extract: fn(&WorkingSolution, EntityId) -> ValueRange,
    ) -> Self {
        Self {
            name,
            source: ValueRangeSource::Entity(extract),
        }
    }
}

/// The value range of one genuine variable.
///
/// There is one descriptor per variable, even when several variables use the
/// same provider, because nullability is a property of the variable.
#[derive(Debug, Clone, Copy)]
pub struct ValueRangeDescriptor {
    pub index: usize,
    pub provider: &'static str,
    pub source: ValueRangeSource,
    pub variable: VariableRef,
    /// True for basic variables that allow unassigned values.
    pub accepts_null: bool,
}

impl ValueRangeDescriptor {
    pub fn is_entity_independent(&self) -> bool {
        matches!(self.source, ValueRangeSource::Solution(_))
    }

    /// Extracts the raw range, without null wrapping or caching.
    pub fn extract(&self, solution: &WorkingSolution, entity: Option<EntityId>) -> ValueRange {
        match (self.source, entity) {
            (ValueRangeSource::Solution(extract), _) => extract(solution),
            (ValueRangeSource::Entity(extract), Some(entity)) => extract(solution, entity),
            (ValueRangeSource::Entity(_), None) => ValueRange::Values(Vec::new()),
        }
    }
}

impl fmt::Display for ValueRangeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.provider, self.index)
    }
}
