//! Core Score trait definition

use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::ops::{Add, Neg, Sub};

use super::ScoreLevel;

/// Core trait for all score types in ScoreForge.
///
/// Scores are immutable, level-ordered and associative. Higher-priority levels
/// are compared first. The scoring core only ever adds, subtracts and compares
/// scores; it never interprets individual levels except for display.
pub trait Score:
    Copy
    + Debug
    + Display
    + Default
    + Send
    + Sync
    + PartialEq
    + Eq
    + PartialOrd
    + Ord
    + Hash
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    /// Returns true if all hard levels are non-negative.
    fn is_feasible(&self) -> bool;

    /// Returns the zero score (identity element for addition).
    fn zero() -> Self;

    /// Returns the number of score levels.
    fn levels_count() -> usize;

    /// Returns the score values, highest priority first.
    fn to_level_numbers(&self) -> Vec<i64>;

    /// Creates a score from level numbers.
    ///
    /// # Panics
    /// Panics if the number of levels doesn't match `levels_count()`.
    fn from_level_numbers(levels: &[i64]) -> Self;

    /// Returns the absolute value of this score.
    fn abs(&self) -> Self;

    /// Returns the semantic label for the score level at the given index.
    ///
    /// # Panics
    /// Panics if `index >= levels_count()`.
    fn level_label(index: usize) -> ScoreLevel;

    /// Returns the suffix used for the level at `index` in string forms.
    fn level_suffix(index: usize) -> &'static str {
        match Self::level_label(index) {
            ScoreLevel::Hard => "hard",
            ScoreLevel::Medium => "medium",
            ScoreLevel::Soft => "soft",
        }
    }

    /// Like `Display`, but omits zero levels.
    ///
    /// Used for score differences in corruption messages, where most
    /// levels are typically zero. Returns `"0"` when every level is zero.
    fn to_short_string(&self) -> String {
        let levels = self.to_level_numbers();
        let single = levels.len() == 1;
        let parts: Vec<String> = levels
            .iter()
            .enumerate()
            .filter(|(_, level)| **level != 0)
            .map(|(i, level)| {
                if single {
                    level.to_string()
                } else {
                    format!("{}{}", level, Self::level_suffix(i))
                }
            })
            .collect();
        if parts.is_empty() {
            "0".to_string()
        } else {
            parts.join("/")
        }
    }

    /// Returns true if this score is better than the other score.
    fn is_better_than(&self, other: &Self) -> bool {
        self > other
    }
}
