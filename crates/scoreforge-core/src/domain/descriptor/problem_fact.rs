//! Problem fact class descriptor.

use std::fmt;

/// Describes a class of problem facts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactClassDescriptor {
    pub name: &'static str,
    pub index: usize,
    /// The singleton fact holding constraint weights.
    ///
    /// Changing it forces a full working-solution reset; removing it is an error.
    pub constraint_configuration: bool,
}

impl fmt::Display for FactClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
