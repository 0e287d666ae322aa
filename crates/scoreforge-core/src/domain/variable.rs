//! Variable kind definitions
//!
//! Each variable descriptor carries one [`VariableKind`], resolved once when
//! the [`SolutionDescriptor`](super::SolutionDescriptor) is built. The scoring
//! core dispatches on this closed enum instead of inspecting types per call.

use std::fmt;

/// Resolved address of a variable: entity descriptor index plus variable ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableRef {
    pub entity_descriptor: usize,
    pub ordinal: usize,
}

impl VariableRef {
    pub const fn new(entity_descriptor: usize, ordinal: usize) -> Self {
        Self {
            entity_descriptor,
            ordinal,
        }
    }
}

impl fmt::Display for VariableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entity_descriptor, self.ordinal)
    }
}

/// What a variable is, resolved at model-build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    /// Assigned directly by moves.
    Genuine(GenuineKind),
    /// Derived by the shadow propagation engine.
    Shadow(ShadowKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenuineKind {
    /// Holds a single value (or none).
    Basic,
    /// Holds an ordered list of elements.
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadowKind {
    /// Records which entities reference this entity through `source`.
    Inverse {
        source: VariableRef,
        cardinality: InverseCardinality,
    },
    /// Records which entity's list variable `source` contains this element.
    ListInverse { source: VariableRef },
    /// Records this element's position in the list variable `source`.
    Index { source: VariableRef },
    /// Set by the propagation engine once this entity's shadows are consistent.
    InconsistentMarker,
    /// Maintained by a user-supplied propagation engine.
    Custom,
}

/// Whether an inverse shadow holds one referrer or a collection of referrers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InverseCardinality {
    Singleton,
    Collection,
}

impl VariableKind {
    #[inline]
    pub fn is_genuine(&self) -> bool {
        matches!(self, VariableKind::Genuine(_))
    }

    #[inline]
    pub fn is_shadow(&self) -> bool {
        matches!(self, VariableKind::Shadow(_))
    }

    #[inline]
    pub fn is_basic(&self) -> bool {
        matches!(self, VariableKind::Genuine(GenuineKind::Basic))
    }

    #[inline]
    pub fn is_list(&self) -> bool {
        matches!(self, VariableKind::Genuine(GenuineKind::List))
    }

    /// The genuine variable this shadow is derived from, if it has a single source.
    pub fn source(&self) -> Option<VariableRef> {
        match self {
            VariableKind::Shadow(ShadowKind::Inverse { source, .. })
            | VariableKind::Shadow(ShadowKind::ListInverse { source })
            | VariableKind::Shadow(ShadowKind::Index { source }) => Some(*source),
            _ => None,
        }
    }
}
