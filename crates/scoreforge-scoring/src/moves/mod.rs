//! Moves over the working solution.
//!
//! A move changes planning variables only through the
//! [`ScoreDirector`] notification facades and registers the inverse of
//! each change, so an undo-recording director can roll it back.
//!
//! - [`ChangeMove`]: assigns one basic variable
//! - [`SwapMove`]: exchanges the basic variables of two entities
//! - [`ListAssignMove`] / [`ListUnassignMove`]: move an element in or out of every list
//! - [`ListChangeMove`]: relocates an element within or between lists
//! - [`CompositeMove`]: runs several moves as one

mod basic;
mod composite;
mod list;

#[cfg(test)]
mod tests;

use std::fmt::{Debug, Display};

use scoreforge_core::{Result, Score};

use crate::director::ScoreDirector;

pub use basic::{ChangeMove, SwapMove};
pub use composite::CompositeMove;
pub use list::{ListAssignMove, ListChangeMove, ListUnassignMove};

/// A change to one or more planning variables.
///
/// Moves are executed against a `dyn ScoreDirector`, so the same move runs
/// on the inner director (kept) or an ephemeral one (undone afterwards).
pub trait Move<Sc: Score>: Send + Sync + Debug + Display {
    /// Returns true if executing the move would change the solution.
    fn is_doable(&self, score_director: &dyn ScoreDirector<Sc>) -> bool;

    /// Applies the move through the notification facades, registering an
    /// undo action for every change.
    fn do_move(&self, score_director: &mut dyn ScoreDirector<Sc>) -> Result<()>;

    /// Type name used in corruption reports.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
