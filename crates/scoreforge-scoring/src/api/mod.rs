//! Scoring boundaries.
//!
//! This module provides:
//! - `ScoreCalculator` and its easy and constraint-set implementations
//! - Constraint match and analysis types for score explanation
//! - Constraint weights read from the constraint configuration fact
//! - `EntityChangeTracker`, the move repository's view of changes

pub mod analysis;
pub mod calculator;
pub mod change_tracker;
pub mod weight_overrides;

#[cfg(test)]
mod tests;

pub use analysis::{
    group_constraint_matches, ConstraintAnalysis, ConstraintMatch, ConstraintMatchMap,
    ConstraintMatchPolicy, Justification, ScoreExplanation,
};
pub use calculator::{
    CalculatorSupplier, ConstraintDefinition, ConstraintSetCalculator, EasyScoreCalculator,
    Matcher, ScoreCalculator,
};
pub use change_tracker::{EntityChange, EntityChangeTracker};
pub use weight_overrides::ConstraintWeightOverrides;
