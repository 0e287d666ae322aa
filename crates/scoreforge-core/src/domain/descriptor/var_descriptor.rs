//! Variable descriptor and its declaration builder.

use crate::domain::variable::{InverseCardinality, VariableKind, VariableRef};

/// Describes a variable at runtime.
///
/// Produced by [`SolutionDescriptorBuilder::build`](super::SolutionDescriptorBuilder::build)
/// from a [`VariableDeclaration`]; every source reference is already resolved.
#[derive(Debug, Clone)]
pub struct VariableDescriptor {
    pub name: &'static str,
    pub entity_descriptor: usize,
    pub ordinal: usize,
    pub kind: VariableKind,
    /// Whether the variable may stay unassigned (null, or an element outside every list).
    pub allows_unassigned: bool,
    /// Index into [`SolutionDescriptor::value_range_descriptors`](super::SolutionDescriptor).
    pub value_range: Option<usize>,
}

impl VariableDescriptor {
    pub fn variable_ref(&self) -> VariableRef {
        VariableRef::new(self.entity_descriptor, self.ordinal)
    }

    /// True for a genuine basic variable that must be assigned.
    ///
    /// These are the slots counted by the initialization tracker while empty.
    pub fn counts_towards_initialization(&self) -> bool {
        self.kind.is_basic() && !self.allows_unassigned
    }
}

/// What kind of variable is being declared. Sources are still names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeclaredKind {
    Basic,
    List,
    Inverse(InverseCardinality),
    ListInverse,
    Index,
    InconsistentMarker,
    Custom,
}

/// Builder-side description of a variable, before names are resolved.
///
/// # Example
///
/// ```
/// use scoreforge_core::domain::VariableDeclaration;
///
/// let row = VariableDeclaration::basic("row").with_value_range("rows");
/// let next = VariableDeclaration::singleton_inverse("next", "Visit", "previous");
/// assert_eq!(row.name(), "row");
/// assert_eq!(next.name(), "next");
/// ```
#[derive(Debug, Clone)]
pub struct VariableDeclaration {
    pub(crate) name: &'static str,
    pub(crate) kind: DeclaredKind,
    pub(crate) allows_unassigned: bool,
    pub(crate) value_range: Option<&'static str>,
    pub(crate) source: Option<(&'static str, &'static str)>,
}

impl VariableDeclaration {
    fn new(name: &'static str, kind: DeclaredKind) -> Self {
        Self {
            name,
            kind,
            allows_unassigned: false,
            value_range: None,
            source: None,
        }
    }

    /// A genuine variable holding a single value.
    pub fn basic(name: &'static str) -> Self {
        Self::new(name, DeclaredKind::Basic)
    }

    /// A genuine variable holding an ordered list of elements.
    pub fn list(name: &'static str) -> Self {
        Self::new(name, DeclaredKind::List)
    }

    /// Shadow holding the single entity whose `source_variable` points at this entity.
    pub fn singleton_inverse(
        name: &'static str,
        source_entity: &'static str,
        source_variable: &'static str,
    ) -> Self {
        Self::new(name, DeclaredKind::Inverse(InverseCardinality::Singleton))
            .with_source(source_entity, source_variable)
            .with_allows_unassigned(true)
    }

    /// Shadow holding every entity whose `source_variable` points at this entity.
    pub fn collection_inverse(
        name: &'static str,
        source_entity: &'static str,
        source_variable: &'static str,
    ) -> Self {
        Self::new(name, DeclaredKind::Inverse(InverseCardinality::Collection))
            .with_source(source_entity, source_variable)
            .with_allows_unassigned(true)
    }

    /// Shadow holding the entity whose list variable contains this element.
    pub fn list_inverse(
        name: &'static str,
        source_entity: &'static str,
        source_variable: &'static str,
    ) -> Self {
        Self::new(name, DeclaredKind::ListInverse)
            .with_source(source_entity, source_variable)
            .with_allows_unassigned(true)
    }

    /// Shadow holding this element's index in a list variable.
    pub fn index(
        name: &'static str,
        source_entity: &'static str,
        source_variable: &'static str,
    ) -> Self {
        Self::new(name, DeclaredKind::Index)
            .with_source(source_entity, source_variable)
            .with_allows_unassigned(true)
    }

    /// Marker set by the propagation engine once the entity's shadows are consistent.
    pub fn inconsistent_marker(name: &'static str) -> Self {
        Self::new(name, DeclaredKind::InconsistentMarker).with_allows_unassigned(true)
    }

    /// Shadow maintained by a custom propagation engine.
    pub fn custom_shadow(name: &'static str) -> Self {
        Self::new(name, DeclaredKind::Custom).with_allows_unassigned(true)
    }

    pub fn with_value_range(mut self, provider: &'static str) -> Self {
        self.value_range = Some(provider);
        self
    }

    pub fn with_allows_unassigned(mut self, allows: bool) -> Self {
        self.allows_unassigned = allows;
        self
    }

    pub fn with_source(mut self, entity: &'static str, variable: &'static str) -> Self {
        self.source = Some((entity, variable));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn is_genuine(&self) -> bool {
        matches!(self.kind, DeclaredKind::Basic | DeclaredKind::List)
    }
}
