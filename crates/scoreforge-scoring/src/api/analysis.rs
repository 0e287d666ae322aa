//! Score analysis types for constraint match tracking.
//!
//! Constraint matches are what the corruption diagnosis diffs: a working
//! director and a from-scratch director each produce a match set, and the
//! symmetric difference names the constraints that went stale.

use std::collections::BTreeMap;
use std::fmt;

use scoreforge_core::domain::Handle;
use scoreforge_core::score::Score;
use scoreforge_core::ConstraintRef;
use smallvec::SmallVec;

/// Whether a director keeps constraint matches next to the score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConstraintMatchPolicy {
    #[default]
    Disabled,
    Enabled,
}

impl ConstraintMatchPolicy {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            ConstraintMatchPolicy::Enabled
        } else {
            ConstraintMatchPolicy::Disabled
        }
    }

    #[inline]
    pub fn is_enabled(self) -> bool {
        self == ConstraintMatchPolicy::Enabled
    }
}

impl fmt::Display for ConstraintMatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintMatchPolicy::Disabled => write!(f, "DISABLED"),
            ConstraintMatchPolicy::Enabled => write!(f, "ENABLED"),
        }
    }
}

/// Why a constraint matched: the handles involved plus a rendering of them.
///
/// The description is what users read in corruption reports, so it is built
/// from planning ids, never from handles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Justification {
    pub description: String,
    pub handles: SmallVec<[Handle; 2]>,
}

impl Justification {
    pub fn new(handles: impl IntoIterator<Item = Handle>, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            handles: handles.into_iter().collect(),
        }
    }
}

impl fmt::Display for Justification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.description)
    }
}

/// One match of one constraint, with its score impact.
///
/// Ordered by constraint, then justification, then score, so sorted match
/// lists render deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintMatch<Sc: Score> {
    pub constraint_ref: ConstraintRef,
    pub justification: Justification,
    pub score: Sc,
}

impl<Sc: Score> ConstraintMatch<Sc> {
    pub fn new(constraint_ref: ConstraintRef, justification: Justification, score: Sc) -> Self {
        Self {
            constraint_ref,
            justification,
            score,
        }
    }
}

impl<Sc: Score> fmt::Display for ConstraintMatch<Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}={}",
            self.constraint_ref, self.justification, self.score
        )
    }
}

/// Per-constraint breakdown of a score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintAnalysis<Sc: Score> {
    pub constraint_ref: ConstraintRef,
    /// Sum of the scores of all matches.
    pub score: Sc,
    pub matches: Vec<ConstraintMatch<Sc>>,
}

impl<Sc: Score> ConstraintAnalysis<Sc> {
    pub fn new(constraint_ref: ConstraintRef) -> Self {
        Self {
            constraint_ref,
            score: Sc::zero(),
            matches: Vec::new(),
        }
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    fn push(&mut self, constraint_match: ConstraintMatch<Sc>) {
        self.score = self.score + constraint_match.score;
        self.matches.push(constraint_match);
    }
}

/// Constraint matches grouped per constraint.
///
/// Constraints without matches are absent, which the corruption diagnosis
/// treats the same as an empty match list.
pub type ConstraintMatchMap<Sc> = BTreeMap<ConstraintRef, ConstraintAnalysis<Sc>>;

/// Groups a flat match list per constraint.
pub fn group_constraint_matches<Sc: Score>(
    matches: impl IntoIterator<Item = ConstraintMatch<Sc>>,
) -> ConstraintMatchMap<Sc> {
    let mut map: ConstraintMatchMap<Sc> = BTreeMap::new();
    for constraint_match in matches {
        map.entry(constraint_match.constraint_ref.clone())
            .or_insert_with(|| ConstraintAnalysis::new(constraint_match.constraint_ref.clone()))
            .push(constraint_match);
    }
    map
}

/// Score explanation: the total score plus the per-constraint breakdown.
#[derive(Debug, Clone)]
pub struct ScoreExplanation<Sc: Score> {
    pub score: Sc,
    pub constraint_analyses: Vec<ConstraintAnalysis<Sc>>,
}

impl<Sc: Score> ScoreExplanation<Sc> {
    pub fn new(score: Sc, map: ConstraintMatchMap<Sc>) -> Self {
        Self {
            score,
            constraint_analyses: map.into_values().collect(),
        }
    }

    /// Total number of matches across all constraints.
    pub fn total_match_count(&self) -> usize {
        self.constraint_analyses.iter().map(|a| a.match_count()).sum()
    }

    /// Constraints that matched at least once.
    pub fn non_zero_constraints(&self) -> Vec<&ConstraintAnalysis<Sc>> {
        self.constraint_analyses
            .iter()
            .filter(|a| a.score != Sc::zero())
            .collect()
    }
}
