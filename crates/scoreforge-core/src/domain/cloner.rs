//! Planning clones of the working solution.

use std::fmt::Debug;

use super::WorkingSolution;

/// Produces a planning clone of a working solution.
///
/// A correct clone keeps every handle and every value, but shares no entity
/// or fact instance with the original. Directors assert this when the
/// environment mode asks for it.
pub trait SolutionCloner: Send + Sync + Debug {
    fn clone_solution(&self, original: &WorkingSolution) -> WorkingSolution;
}

/// Deep clone through [`WorkingSolution::clone`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DeepSolutionCloner;

impl SolutionCloner for DeepSolutionCloner {
    fn clone_solution(&self, original: &WorkingSolution) -> WorkingSolution {
        original.clone()
    }
}
