//! Score director and consistency checks for ScoreForge.
//!
//! This crate keeps the score of a working solution in step with every
//! change a move makes:
//! - The incremental score director and its notification protocol (`InnerScoreDirector`)
//! - Move execution with undo (`EphemeralScoreDirector`, `Move`)
//! - Value-range caching and solution statistics (`ValueRangeCache`)
//! - Planning-id lookup of working objects (`LookupRegistry`)
//! - Consistency validation of freshly set solutions (`EntityValidator`)
//! - Score, shadow variable and undo corruption diagnosis
//!
//! # Architecture
//!
//! The director owns the working solution. Score calculators and shadow
//! propagation engines are trait objects supplied per director by the
//! factory, and hear about every change through before/after hooks.

pub mod api;
pub mod corruption;
pub mod director;
pub mod lookup;
pub mod moves;
pub mod shadow;
pub mod tracker;
pub mod validator;
pub mod value_range;

#[cfg(test)]
mod test_utils;

// ============================================================================
// Score Directors
// ============================================================================

pub use director::{
    ChildThreadType, EphemeralScoreDirector, InnerScoreDirector, ScopedScoreDirector,
    ScoreDirector, ScoreDirectorFactory, UndoAction,
};

// ============================================================================
// Score Calculation and Analysis
// ============================================================================

pub use api::{
    CalculatorSupplier, ConstraintAnalysis, ConstraintDefinition, ConstraintMatch,
    ConstraintMatchMap, ConstraintMatchPolicy, ConstraintSetCalculator,
    ConstraintWeightOverrides, EasyScoreCalculator, EntityChange, EntityChangeTracker,
    Justification, ScoreCalculator, ScoreExplanation,
};

// ============================================================================
// Moves
// ============================================================================

pub use moves::{
    ChangeMove, CompositeMove, ListAssignMove, ListChangeMove, ListUnassignMove, Move, SwapMove,
};

// ============================================================================
// Consistency
// ============================================================================

pub use lookup::{LookupKey, LookupRegistry};
pub use shadow::{
    InverseRelationPropagation, NoShadowPropagation, ShadowPropagation, ShadowSupplier,
    ShadowUpdate,
};
pub use tracker::SolutionTracker;
pub use validator::EntityValidator;
pub use value_range::ValueRangeCache;
