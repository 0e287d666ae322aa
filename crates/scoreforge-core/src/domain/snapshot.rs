//! Point-in-time copies of variable values, for diffing.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::descriptor::SolutionDescriptor;
use super::{EntityId, Value, WorkingSolution};

/// Which variables a [`VariableSnapshot`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFilter {
    All,
    Genuine,
    Shadow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RecordedValue {
    entity_class: &'static str,
    entity_id: Arc<str>,
    variable: &'static str,
    value: Value,
    rendered: String,
}

/// Values of every (entity, variable) slot at one point in time.
///
/// Keys are handles, so a snapshot of a clone can be diffed against a
/// snapshot of its original.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableSnapshot {
    values: BTreeMap<(EntityId, usize), RecordedValue>,
}

impl VariableSnapshot {
    pub fn capture(
        descriptor: &SolutionDescriptor,
        solution: &WorkingSolution,
        filter: SnapshotFilter,
    ) -> Self {
        let mut values = BTreeMap::new();
        for (id, entity) in solution.entities() {
            let Some(entity_descriptor) = descriptor.entity_descriptor(entity.descriptor_index())
            else {
                continue;
            };
            for variable in &entity_descriptor.variables {
                let keep = match filter {
                    SnapshotFilter::All => true,
                    SnapshotFilter::Genuine => variable.kind.is_genuine(),
                    SnapshotFilter::Shadow => variable.kind.is_shadow(),
                };
                if !keep {
                    continue;
                }
                let value = entity.value(variable.ordinal).cloned().unwrap_or_default();
                values.insert(
                    (id, variable.ordinal),
                    RecordedValue {
                        entity_class: entity_descriptor.name,
                        entity_id: entity.id().clone(),
                        variable: variable.name,
                        rendered: solution.describe_value(descriptor, &value),
                        value,
                    },
                );
            }
        }
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, entity: EntityId, ordinal: usize) -> Option<&Value> {
        self.values.get(&(entity, ordinal)).map(|r| &r.value)
    }

    /// Slots whose value in `actual` differs from the value expected by `self`.
    ///
    /// Slots present on only one side are reported with a missing value.
    pub fn differences(&self, actual: &VariableSnapshot) -> Vec<VariableDifference> {
        let mut differences = Vec::new();
        for (key, expected) in &self.values {
            match actual.values.get(key) {
                Some(now) if now.value == expected.value => {}
                now => differences.push(VariableDifference::new(
                    expected,
                    Some(expected.rendered.clone()),
                    now.map(|n| n.rendered.clone()),
                )),
            }
        }
        for (key, now) in &actual.values {
            if !self.values.contains_key(key) {
                differences.push(VariableDifference::new(now, None, Some(now.rendered.clone())));
            }
        }
        differences
    }
}

/// One changed slot between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDifference {
    pub entity_class: &'static str,
    pub entity_id: Arc<str>,
    pub variable: &'static str,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

impl VariableDifference {
    fn new(slot: &RecordedValue, expected: Option<String>, actual: Option<String>) -> Self {
        Self {
            entity_class: slot.entity_class,
            entity_id: slot.entity_id.clone(),
            variable: slot.variable,
            expected,
            actual,
        }
    }
}

impl fmt::Display for VariableDifference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Actual value ({}) of variable {} on {} entity ({}) differs from expected ({})",
            self.actual.as_deref().unwrap_or("absent"),
            self.variable,
            self.entity_class,
            self.entity_id,
            self.expected.as_deref().unwrap_or("absent")
        )
    }
}
