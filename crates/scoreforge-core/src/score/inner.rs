//! Augmented score: a raw score paired with an unassigned-element count.

use std::cmp::Ordering;
use std::fmt;

use smallvec::SmallVec;

use super::traits::Score;
use crate::error::{Result, ScoreForgeError};

/// A raw score plus the number of genuine slots still unassigned.
///
/// Fewer unassigned elements always rank higher, regardless of the raw score.
/// Two augmented scores are equal only if both components are equal.
///
/// # Examples
///
/// ```
/// use scoreforge_core::score::{InnerScore, SimpleScore};
///
/// let complete = InnerScore::fully_assigned(SimpleScore::of(-100));
/// let partial = InnerScore::with_unassigned(SimpleScore::of(0), 1).unwrap();
///
/// assert!(complete > partial);
/// assert_eq!(partial.to_string(), "-1init/0");
/// assert_eq!(complete.to_string(), "-100");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct InnerScore<Sc: Score> {
    raw: Sc,
    unassigned_count: u64,
}

impl<Sc: Score> InnerScore<Sc> {
    /// Creates an augmented score with nothing left unassigned.
    pub fn fully_assigned(raw: Sc) -> Self {
        Self {
            raw,
            unassigned_count: 0,
        }
    }

    /// Creates an augmented score with `unassigned_count` elements unassigned.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreForgeError::InvalidArgument`] if the count is negative.
    pub fn with_unassigned(raw: Sc, unassigned_count: i64) -> Result<Self> {
        if unassigned_count < 0 {
            return Err(ScoreForgeError::InvalidArgument(format!(
                "The unassignedCount ({}) for score ({}) must be zero or positive.",
                unassigned_count, raw
            )));
        }
        Ok(Self {
            raw,
            unassigned_count: unassigned_count as u64,
        })
    }

    #[inline]
    pub fn raw(&self) -> Sc {
        self.raw
    }

    #[inline]
    pub fn unassigned_count(&self) -> u64 {
        self.unassigned_count
    }

    /// The unassigned count in penalty form (zero or negative).
    #[inline]
    pub fn init_score(&self) -> i64 {
        -(self.unassigned_count as i64)
    }

    #[inline]
    pub fn is_fully_assigned(&self) -> bool {
        self.unassigned_count == 0
    }

    /// Captures this score in a score-type independent form.
    pub fn snapshot(&self) -> ScoreSnapshot {
        ScoreSnapshot {
            unassigned_count: self.unassigned_count,
            levels: self.raw.to_level_numbers().into_iter().collect(),
        }
    }

    /// Restores a score captured by [`InnerScore::snapshot`].
    ///
    /// # Errors
    ///
    /// Returns [`ScoreForgeError::InvalidArgument`] when the snapshot has a
    /// different number of levels than `Sc`.
    pub fn from_snapshot(snapshot: &ScoreSnapshot) -> Result<Self> {
        if snapshot.levels.len() != Sc::levels_count() {
            return Err(ScoreForgeError::InvalidArgument(format!(
                "The score snapshot has {} levels, but the score type expects {}.",
                snapshot.levels.len(),
                Sc::levels_count()
            )));
        }
        Ok(Self {
            raw: Sc::from_level_numbers(&snapshot.levels),
            unassigned_count: snapshot.unassigned_count,
        })
    }
}

impl<Sc: Score> Ord for InnerScore<Sc> {
    fn cmp(&self, other: &Self) -> Ordering {
        match other.unassigned_count.cmp(&self.unassigned_count) {
            Ordering::Equal => self.raw.cmp(&other.raw),
            ordering => ordering,
        }
    }
}

impl<Sc: Score> PartialOrd for InnerScore<Sc> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<Sc: Score> fmt::Debug for InnerScore<Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InnerScore")
            .field("raw", &self.raw)
            .field("unassigned_count", &self.unassigned_count)
            .finish()
    }
}

impl<Sc: Score> fmt::Display for InnerScore<Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unassigned_count == 0 {
            write!(f, "{}", self.raw)
        } else {
            write!(f, "-{}init/{}", self.unassigned_count, self.raw)
        }
    }
}

/// Score-type independent copy of an [`InnerScore`].
///
/// Stored on the working solution after each calculation so that solution
/// clones can be compared without knowing the score type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ScoreSnapshot {
    pub unassigned_count: u64,
    pub levels: SmallVec<[i64; 4]>,
}

impl fmt::Display for ScoreSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let levels: Vec<String> = self.levels.iter().map(i64::to_string).collect();
        if self.unassigned_count == 0 {
            write!(f, "[{}]", levels.join("/"))
        } else {
            write!(f, "-{}init/[{}]", self.unassigned_count, levels.join("/"))
        }
    }
}
