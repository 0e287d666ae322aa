//! Constraint identity and impact direction.
//!
//! The scoring core never looks inside a constraint; it only needs to tell
//! constraints apart when diffing constraint matches.

use std::fmt;
use std::sync::Arc;

/// Identity of a constraint: package plus name.
///
/// Ordered by full name so match reports sort deterministically.
///
/// # Example
///
/// ```
/// use scoreforge_core::ConstraintRef;
///
/// let cr = ConstraintRef::new("scheduling", "NoOverlap");
/// assert_eq!(cr.full_name(), "scheduling/NoOverlap");
///
/// let bare = ConstraintRef::new("", "Simple");
/// assert_eq!(bare.full_name(), "Simple");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintRef {
    pub package: Arc<str>,
    pub name: Arc<str>,
}

impl ConstraintRef {
    pub fn new(package: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }

    /// Splits `package/name` at the last slash; no slash means no package.
    pub fn parse(full_name: &str) -> Self {
        match full_name.rsplit_once('/') {
            Some((package, name)) => Self::new(package, name),
            None => Self::new("", full_name),
        }
    }

    pub fn full_name(&self) -> String {
        if self.package.is_empty() {
            self.name.to_string()
        } else {
            format!("{}/{}", self.package, self.name)
        }
    }
}

impl fmt::Display for ConstraintRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

/// Whether a constraint subtracts from or adds to the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImpactType {
    Penalty,
    Reward,
}

impl ImpactType {
    /// Multiplier applied to a constraint weight.
    #[inline]
    pub fn sign(self) -> i64 {
        match self {
            ImpactType::Penalty => -1,
            ImpactType::Reward => 1,
        }
    }
}
