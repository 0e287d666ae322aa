//! Corruption diagnosis texts.
//!
//! Everything here is pure formatting over data the director collected:
//! constraint match maps from a working and a from-scratch director, and
//! shadow values that changed when every listener was forced to run.

use std::collections::BTreeSet;
use std::fmt::Write;

use scoreforge_core::domain::VariableDifference;
use scoreforge_core::score::{InnerScore, Score};

use crate::api::{ConstraintMatch, ConstraintMatchMap, ConstraintMatchPolicy};

/// Matches listed per excess or missing section before the rest is summarized.
pub const CONSTRAINT_MATCH_DISPLAY_LIMIT: usize = 8;

/// Shadow violations listed before the rest is summarized.
pub const SHADOW_VARIABLE_VIOLATION_DISPLAY_LIMIT: usize = 3;

/// Short-string difference of two augmented scores, as used in every
/// corruption message.
pub fn score_difference<Sc: Score>(score: InnerScore<Sc>, other: InnerScore<Sc>) -> String {
    let raw = (score.raw() - other.raw()).to_short_string();
    let init = score.init_score() - other.init_score();
    if init == 0 {
        raw
    } else {
        format!("{}init/{}", init, raw)
    }
}

/// Explains a score mismatch by diffing constraint matches.
///
/// `working` is the map of the director whose score is suspect;
/// `uncorrupted` comes from a from-scratch director. Matches only the
/// working side has are "excess", matches only the uncorrupted side has are
/// "missing". When neither side kept matches, the analysis says so.
pub fn build_score_corruption_analysis<Sc: Score>(
    working: Option<&ConstraintMatchMap<Sc>>,
    working_policy: ConstraintMatchPolicy,
    uncorrupted: Option<&ConstraintMatchMap<Sc>>,
    uncorrupted_policy: ConstraintMatchPolicy,
    predicted: bool,
    director_description: &str,
) -> String {
    let working = working.filter(|_| working_policy.is_enabled());
    let uncorrupted = uncorrupted.filter(|_| uncorrupted_policy.is_enabled());
    let (Some(working), Some(uncorrupted)) = (working, uncorrupted) else {
        return format!(
            "Score corruption analysis could not be generated because either corrupted constraint match policy ({}) or uncorrupted constraint match policy ({}) is {}.\n  Check your score constraints manually.",
            working_policy,
            uncorrupted_policy,
            ConstraintMatchPolicy::Disabled
        );
    };

    let working_matches = flatten(working);
    let uncorrupted_matches = flatten(uncorrupted);
    let excess: BTreeSet<&ConstraintMatch<Sc>> = working_matches
        .difference(&uncorrupted_matches)
        .copied()
        .collect();
    let missing: BTreeSet<&ConstraintMatch<Sc>> = uncorrupted_matches
        .difference(&working_matches)
        .copied()
        .collect();

    let label = if predicted { "working" } else { "corrupted" };
    let mut analysis = String::from("Score corruption analysis:\n");
    append_analysis(&mut analysis, label, "should not be there", &excess);
    append_analysis(&mut analysis, label, "are missing", &missing);
    if !excess.is_empty() || !missing.is_empty() {
        analysis.push_str(
            "  Maybe there is a bug in the score constraints of those ConstraintMatch(s).\n  Maybe a score constraint doesn't select all the entities it depends on,\n    but discovers some transitively through a reference from the selected entity.\n    This corrupts incremental score calculation,\n    because the constraint is not re-evaluated if the transitively discovered entity changes.",
        );
    } else if predicted {
        analysis.push_str(
            "  If multi-threaded solving is active:\n    - the working scoreDirector is probably not the corrupted scoreDirector.\n    - maybe the rebase() method of the move is bugged.\n    - maybe a shadow variable propagation affected the moveThread's workingSolution after doing and undoing a move,\n      but this didn't happen here on the solverThread, so we can't detect it.",
        );
    } else {
        let _ = write!(
            analysis,
            "  Impossible state. Maybe this is a bug in the scoreDirector ({}).",
            director_description
        );
    }
    analysis
}

// Match sets compare by value: constraint, justification and score.
fn flatten<Sc: Score>(map: &ConstraintMatchMap<Sc>) -> BTreeSet<&ConstraintMatch<Sc>> {
    map.values().flat_map(|analysis| analysis.matches.iter()).collect()
}

fn append_analysis<Sc: Score>(
    analysis: &mut String,
    label: &str,
    suffix: &str,
    matches: &BTreeSet<&ConstraintMatch<Sc>>,
) {
    if matches.is_empty() {
        let _ = writeln!(
            analysis,
            "  The {} scoreDirector has no ConstraintMatch(es) which {}.",
            label, suffix
        );
        return;
    }
    let _ = writeln!(
        analysis,
        "  The {} scoreDirector has {} ConstraintMatch(es) which {}:",
        label,
        matches.len(),
        suffix
    );
    for constraint_match in matches.iter().take(CONSTRAINT_MATCH_DISPLAY_LIMIT) {
        let _ = writeln!(analysis, "    {}", constraint_match);
    }
    if matches.len() > CONSTRAINT_MATCH_DISPLAY_LIMIT {
        let _ = writeln!(
            analysis,
            "    ... {} more",
            matches.len() - CONSTRAINT_MATCH_DISPLAY_LIMIT
        );
    }
}

/// Describes shadow values that changed although no genuine variable did.
///
/// `differences` are expected = value before the forced trigger, actual =
/// value after it. Returns `None` when nothing changed.
pub fn describe_shadow_violations(differences: &[VariableDifference]) -> Option<String> {
    if differences.is_empty() {
        return None;
    }
    let mut message = String::new();
    for difference in differences.iter().take(SHADOW_VARIABLE_VIOLATION_DISPLAY_LIMIT) {
        let _ = writeln!(
            message,
            "    The entity ({}({}))'s shadow variable ({}) corrupted value ({}) changed to uncorrupted value ({}) after all shadow variable listeners were triggered without changes to the genuine variables.",
            difference.entity_class,
            difference.entity_id,
            difference.variable,
            difference.expected.as_deref().unwrap_or("absent"),
            difference.actual.as_deref().unwrap_or("absent")
        );
    }
    if differences.len() > SHADOW_VARIABLE_VIOLATION_DISPLAY_LIMIT {
        let _ = writeln!(
            message,
            "    ... {} more",
            differences.len() - SHADOW_VARIABLE_VIOLATION_DISPLAY_LIMIT
        );
    }
    Some(message)
}

/// Section of a score corruption message about stale shadow variables.
pub fn build_shadow_variable_analysis(violation: Option<&str>, predicted: bool) -> String {
    let label = if predicted { "working" } else { "corrupted" };
    match violation {
        None => format!("Shadow variable corruption in the {} scoreDirector:\n  None", label),
        Some(violation) => format!(
            "Shadow variable corruption in the {} scoreDirector:\n{}  Maybe there is a bug in the shadow variable listener of those shadow variable(s).",
            label, violation
        ),
    }
}
