//! Score director implementations.
//!
//! The score director owns the working solution and keeps its score up to
//! date while moves change it.
//!
//! # Score Director Types
//!
//! - [`InnerScoreDirector`] - Incremental scoring, counters and corruption checks
//! - [`EphemeralScoreDirector`] - Undo-recording scope for evaluated moves
//! - [`ScopedScoreDirector`] - Closes a derived director when dropped
//!
//! Moves only ever see the [`ScoreDirector`] trait.

mod assertion;
mod ephemeral;
mod execution;
mod factory;
mod inner;
mod notification;
mod traits;

#[cfg(test)]
mod tests;

pub use ephemeral::EphemeralScoreDirector;
pub use factory::{ChildThreadType, ScopedScoreDirector, ScoreDirectorFactory};
pub use inner::InnerScoreDirector;
pub use traits::{ScoreDirector, UndoAction};
