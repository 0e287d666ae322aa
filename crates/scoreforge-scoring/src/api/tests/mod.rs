//! Tests for the api module: weights, calculators and match analysis.

use scoreforge_core::domain::Value;
use scoreforge_core::score::{HardSoftScore, SimpleScore};
use scoreforge_core::ConstraintRef;
use scoreforge_test::lesson::TIMESLOT_CONFLICT;
use scoreforge_test::LessonModel;

use crate::api::weight_overrides::scale;
use crate::api::{
    group_constraint_matches, ConstraintDefinition, ConstraintMatch, ConstraintMatchPolicy,
    ConstraintSetCalculator, ConstraintWeightOverrides, Justification, ScoreCalculator,
    ScoreExplanation,
};
use crate::test_utils::timeslot_conflicts;

fn conflict_ref() -> ConstraintRef {
    ConstraintRef::parse(TIMESLOT_CONFLICT)
}

fn lesson_calculator(model: &LessonModel) -> ConstraintSetCalculator<HardSoftScore> {
    ConstraintSetCalculator::new(
        model.descriptor.clone(),
        vec![ConstraintDefinition::penalize(
            conflict_ref(),
            HardSoftScore::of_hard(1),
            timeslot_conflicts,
        )]
        .into(),
    )
}

fn lessons() -> Vec<(&'static str, Option<&'static str>, bool)> {
    vec![
        ("l1", Some("t1"), false),
        ("l2", Some("t1"), false),
        ("l3", Some("t2"), false),
        ("l4", None, false),
    ]
}

// ============================================================================
// ConstraintWeightOverrides tests
// ============================================================================

#[test]
fn test_new_is_empty() {
    let overrides = ConstraintWeightOverrides::<SimpleScore>::new();
    assert!(overrides.is_empty());
    assert_eq!(overrides.len(), 0);
}

#[test]
fn test_put_and_get() {
    let mut overrides = ConstraintWeightOverrides::<SimpleScore>::new();
    overrides.put("test", SimpleScore::of(5));

    assert!(overrides.contains("test"));
    assert_eq!(overrides.get("test"), Some(&SimpleScore::of(5)));
    assert_eq!(overrides.get_or_default("other", SimpleScore::of(7)), SimpleScore::of(7));
}

#[test]
fn test_scale_multiplies_every_level() {
    assert_eq!(scale(HardSoftScore::of(2, -3), 4), HardSoftScore::of(8, -12));
    assert_eq!(scale(SimpleScore::of(5), 0), SimpleScore::ZERO);
}

#[test]
fn test_from_configuration_reads_integer_properties() {
    let model = LessonModel::new();
    let solution = model.solution(&["t1"], &[], Some(3));
    let constraint = conflict_ref();

    let overrides = ConstraintWeightOverrides::from_configuration(
        &model.descriptor,
        &solution,
        [(&constraint, HardSoftScore::of_hard(1))],
    );

    assert_eq!(overrides.get(TIMESLOT_CONFLICT), Some(&HardSoftScore::of_hard(3)));
}

#[test]
fn test_from_configuration_without_fact_is_empty() {
    let model = LessonModel::new();
    let solution = model.solution(&["t1"], &[], None);
    let constraint = conflict_ref();

    let overrides = ConstraintWeightOverrides::from_configuration(
        &model.descriptor,
        &solution,
        [(&constraint, HardSoftScore::of_hard(1))],
    );

    assert!(overrides.is_empty());
}

#[test]
fn test_from_configuration_ignores_non_integer_properties() {
    let model = LessonModel::new();
    let mut solution = model.solution(&["t1"], &[], Some(3));
    let configuration = model.configuration(&solution);
    solution
        .fact_mut(configuration)
        .expect("configuration exists")
        .set_property(TIMESLOT_CONFLICT, Value::text("heavy"));
    let constraint = conflict_ref();

    let overrides = ConstraintWeightOverrides::from_configuration(
        &model.descriptor,
        &solution,
        [(&constraint, HardSoftScore::of_hard(1))],
    );

    assert!(!overrides.contains(TIMESLOT_CONFLICT));
}

// ============================================================================
// ConstraintSetCalculator tests
// ============================================================================

#[test]
fn test_constraint_set_uses_declared_weight() {
    let model = LessonModel::new();
    let solution = model.solution(&["t1", "t2"], &lessons(), None);
    let mut calculator = lesson_calculator(&model);

    calculator.reset_working_solution(&solution, false);

    assert_eq!(calculator.calculate_score(&solution), HardSoftScore::of_hard(-1));
    assert_eq!(calculator.match_score(0), Some(HardSoftScore::of_hard(-1)));
    assert_eq!(calculator.match_score(1), None);
}

#[test]
fn test_constraint_set_uses_configured_weight_after_reset() {
    let model = LessonModel::new();
    let solution = model.solution(&["t1", "t2"], &lessons(), Some(3));
    let mut calculator = lesson_calculator(&model);

    calculator.reset_working_solution(&solution, true);

    assert_eq!(calculator.calculate_score(&solution), HardSoftScore::of_hard(-3));
}

#[test]
fn test_constraint_set_reward_is_positive() {
    let model = LessonModel::new();
    let solution = model.solution(
        &["t1"],
        &[("l1", Some("t1"), false), ("l2", Some("t1"), false)],
        None,
    );
    let mut calculator = ConstraintSetCalculator::new(
        model.descriptor.clone(),
        vec![ConstraintDefinition::reward(
            conflict_ref(),
            HardSoftScore::of_soft(2),
            timeslot_conflicts,
        )]
        .into(),
    );

    calculator.reset_working_solution(&solution, false);

    assert_eq!(calculator.calculate_score(&solution), HardSoftScore::of_soft(2));
}

#[test]
fn test_constraint_set_matches_carry_weighted_score() {
    let model = LessonModel::new();
    let solution = model.solution(&["t1", "t2"], &lessons(), Some(2));
    let mut calculator = lesson_calculator(&model);
    calculator.reset_working_solution(&solution, true);

    let matches = calculator.constraint_matches(&solution);

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].constraint_ref, conflict_ref());
    assert_eq!(matches[0].score, HardSoftScore::of_hard(-2));
    assert_eq!(matches[0].justification.description, "l1 & l2");
}

// ============================================================================
// Analysis tests
// ============================================================================

#[test]
fn test_group_constraint_matches_sums_per_constraint() {
    let a = ConstraintRef::new("pkg", "A");
    let b = ConstraintRef::new("pkg", "B");
    let matches = vec![
        ConstraintMatch::new(a.clone(), Justification::new([], "x"), SimpleScore::of(-1)),
        ConstraintMatch::new(b.clone(), Justification::new([], "y"), SimpleScore::of(2)),
        ConstraintMatch::new(a.clone(), Justification::new([], "z"), SimpleScore::of(-3)),
    ];

    let map = group_constraint_matches(matches);

    assert_eq!(map.len(), 2);
    assert_eq!(map[&a].score, SimpleScore::of(-4));
    assert_eq!(map[&a].match_count(), 2);
    assert_eq!(map[&b].score, SimpleScore::of(2));
}

#[test]
fn test_score_explanation_skips_zero_constraints() {
    let a = ConstraintRef::new("pkg", "A");
    let b = ConstraintRef::new("pkg", "B");
    let map = group_constraint_matches(vec![
        ConstraintMatch::new(a.clone(), Justification::new([], "x"), SimpleScore::of(-1)),
        ConstraintMatch::new(b.clone(), Justification::new([], "y"), SimpleScore::of(1)),
        ConstraintMatch::new(b, Justification::new([], "z"), SimpleScore::of(-1)),
    ]);

    let explanation = ScoreExplanation::new(SimpleScore::of(-1), map);

    assert_eq!(explanation.total_match_count(), 3);
    let non_zero = explanation.non_zero_constraints();
    assert_eq!(non_zero.len(), 1);
    assert_eq!(non_zero[0].constraint_ref, a);
}

#[test]
fn test_constraint_match_display() {
    let constraint_match = ConstraintMatch::new(
        ConstraintRef::new("pkg", "A"),
        Justification::new([], "l1 & l2"),
        SimpleScore::of(-1),
    );

    assert_eq!(constraint_match.to_string(), "pkg/A/[l1 & l2]=-1");
}

#[test]
fn test_constraint_match_policy() {
    assert_eq!(ConstraintMatchPolicy::from_enabled(true), ConstraintMatchPolicy::Enabled);
    assert!(!ConstraintMatchPolicy::default().is_enabled());
    assert_eq!(ConstraintMatchPolicy::Disabled.to_string(), "DISABLED");
}
