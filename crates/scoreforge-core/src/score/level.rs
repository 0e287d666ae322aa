/// Semantic meaning of a score level index.
///
/// Returned by [`Score::level_label`](super::Score::level_label) and used to
/// render level suffixes such as `hard` and `soft`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreLevel {
    /// Must be satisfied for feasibility.
    Hard,
    /// Secondary priority.
    Medium,
    /// Optimization objective.
    Soft,
}

impl ScoreLevel {
    pub fn is_hard(self) -> bool {
        matches!(self, ScoreLevel::Hard)
    }
}
