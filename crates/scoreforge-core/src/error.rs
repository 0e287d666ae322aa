//! Error types for ScoreForge

use thiserror::Error;

use crate::domain::WorkingSolution;

/// Main error type for ScoreForge operations.
///
/// Every variant signals a programming defect (in a move, a shadow variable
/// implementation, a cloner or the domain model) or a misused precondition.
/// The scoring core never retries; callers decide whether to abort.
#[derive(Debug, Error)]
pub enum ScoreForgeError {
    /// Error in configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error in domain model definition
    #[error("Domain model error: {0}")]
    DomainModel(String),

    /// An argument is outside its legal domain
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A precondition of the called operation does not hold
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// A bookkeeping invariant would be broken by the requested mutation
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// The working solution does not match its descriptors
    #[error("Structural inconsistency: {0}")]
    StructuralInconsistency(String),

    /// The operation is not supported for the given input
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Incremental score diverged from a from-scratch recalculation
    #[error("{0}")]
    ScoreCorruption(String),

    /// Undoing a move did not restore the score from before the move
    #[error("{message}")]
    UndoScoreCorruption {
        message: String,
        /// Present when the working solution was being tracked.
        solutions: Option<Box<UndoCorruptionSolutions>>,
    },

    /// Shadow variables were stale after a completed action
    #[error("{0}")]
    VariableCorruption(String),

    /// A solution clone shares state with its original
    #[error("{0}")]
    CloningCorruption(String),
}

/// Solutions captured around a move whose undo was corrupted.
#[derive(Debug, Clone)]
pub struct UndoCorruptionSolutions {
    pub before_move: WorkingSolution,
    pub after_move: WorkingSolution,
    pub after_undo: WorkingSolution,
}

impl ScoreForgeError {
    /// Returns true for the corruption family of errors.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            ScoreForgeError::ScoreCorruption(_)
                | ScoreForgeError::UndoScoreCorruption { .. }
                | ScoreForgeError::VariableCorruption(_)
                | ScoreForgeError::CloningCorruption(_)
        )
    }
}

/// Result type alias for ScoreForge operations
pub type Result<T> = std::result::Result<T, ScoreForgeError>;
