//! Entity descriptor.

use std::fmt;
use std::sync::Arc;

use super::var_descriptor::{VariableDeclaration, VariableDescriptor};
use crate::domain::solution::Entity;

/// Describes an entity class at runtime.
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    pub name: &'static str,
    pub index: usize,
    pub variables: Vec<VariableDescriptor>,
}

impl EntityDescriptor {
    /// An entity class is genuine when it declares at least one genuine variable.
    pub fn is_genuine(&self) -> bool {
        self.variables.iter().any(|v| v.kind.is_genuine())
    }

    pub fn has_list_variable(&self) -> bool {
        self.variables.iter().any(|v| v.kind.is_list())
    }

    pub fn variable(&self, name: &str) -> Option<&VariableDescriptor> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn genuine_variables(&self) -> impl Iterator<Item = &VariableDescriptor> {
        self.variables.iter().filter(|v| v.kind.is_genuine())
    }

    pub fn shadow_variables(&self) -> impl Iterator<Item = &VariableDescriptor> {
        self.variables.iter().filter(|v| v.kind.is_shadow())
    }

    /// Number of basic variables on `entity` that are unassigned but must not be.
    pub fn count_uninitialized_variables(&self, entity: &Entity) -> usize {
        self.variables
            .iter()
            .filter(|v| v.counts_towards_initialization())
            .filter(|v| entity.value(v.ordinal).map_or(true, |value| value.is_none()))
            .count()
    }

    /// Creates an entity of this class with every variable unassigned.
    ///
    /// List variables start as empty lists.
    pub fn new_entity(&self, id: impl Into<Arc<str>>) -> Entity {
        Entity::new(self, id)
    }
}

impl fmt::Display for EntityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Builder-side description of an entity class.
#[derive(Debug, Clone)]
pub struct EntityDeclaration {
    pub(crate) name: &'static str,
    pub(crate) variables: Vec<VariableDeclaration>,
}

impl EntityDeclaration {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            variables: Vec::new(),
        }
    }

    pub fn with_variable(mut self, variable: VariableDeclaration) -> Self {
        self.variables.push(variable);
        self
    }
}
