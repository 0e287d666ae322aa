//! A sequence of moves executed as one.

use std::fmt;

use scoreforge_core::{Result, Score};

use super::Move;
use crate::director::ScoreDirector;

/// Runs child moves in order. Each child registers its own undo actions,
/// so undoing the composite replays them newest first.
pub struct CompositeMove<Sc: Score> {
    moves: Vec<Box<dyn Move<Sc>>>,
}

impl<Sc: Score> CompositeMove<Sc> {
    pub fn new(moves: Vec<Box<dyn Move<Sc>>>) -> Self {
        Self { moves }
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

impl<Sc: Score> fmt::Debug for CompositeMove<Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.moves).finish()
    }
}

impl<Sc: Score> fmt::Display for CompositeMove<Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, child) in self.moves.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", child)?;
        }
        write!(f, "]")
    }
}

impl<Sc: Score> Move<Sc> for CompositeMove<Sc> {
    fn is_doable(&self, score_director: &dyn ScoreDirector<Sc>) -> bool {
        self.moves.iter().any(|child| child.is_doable(score_director))
    }

    fn do_move(&self, score_director: &mut dyn ScoreDirector<Sc>) -> Result<()> {
        for child in &self.moves {
            child.do_move(score_director)?;
        }
        Ok(())
    }
}
