//! Statistics about a working solution, computed by the value-range cache.

use std::fmt;

/// How far a working solution is from being fully initialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitializationStatistics {
    /// Entities with at least one genuine variable.
    pub genuine_entity_count: usize,
    /// Entities with only shadow variables.
    pub shadow_entity_count: usize,
    pub uninitialized_entity_count: usize,
    /// Unassigned basic slots that disallow unassignment.
    pub uninitialized_variable_count: usize,
    /// List elements outside every list, when the list variable disallows that.
    pub unassigned_value_count: usize,
    /// List elements outside every list, regardless of configuration.
    pub not_in_any_list_value_count: usize,
}

impl InitializationStatistics {
    /// The initialization count in penalty form.
    pub fn init_score(&self) -> i64 {
        -((self.uninitialized_variable_count + self.unassigned_value_count) as i64)
    }
}

/// Approximate size of the search space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProblemSizeStatistics {
    pub entity_count: usize,
    pub variable_count: usize,
    pub approximate_value_count: usize,
    /// Base-10 logarithm of the number of possible assignments.
    pub approximate_problem_scale_log: f64,
}

impl fmt::Display for ProblemSizeStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "entity count ({}), variable count ({}), approximate value count ({}), approximate problem scale (10^{:.3})",
            self.entity_count,
            self.variable_count,
            self.approximate_value_count,
            self.approximate_problem_scale_log
        )
    }
}
