//! ScoreForge Core - shared types of the scoring core
//!
//! This crate provides the vocabulary every other ScoreForge crate speaks:
//! - Score types, including the augmented [`InnerScore`](score::InnerScore)
//! - The domain model: descriptors, handles, values and the working solution arena
//! - Constraint identity for match diffing
//! - The error type

pub mod constraint;
pub mod domain;
pub mod error;
pub mod score;

pub use constraint::{ConstraintRef, ImpactType};
pub use domain::{EntityId, FactId, Handle, SolutionDescriptor, Value, WorkingSolution};
pub use error::{Result, ScoreForgeError};
pub use score::{HardSoftScore, InnerScore, Score, SimpleScore};
