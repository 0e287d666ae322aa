use std::sync::atomic::Ordering;
use std::sync::Arc;

use scoreforge_config::ScoreDirectorConfig;
use scoreforge_core::domain::{ProblemFact, Value, WorkingSolution};
use scoreforge_core::{HardSoftScore, ScoreForgeError, SimpleScore};
use scoreforge_test::{ChainModel, DepotModel, LessonModel};

use crate::api::{ConstraintMatchPolicy, EasyScoreCalculator};
use crate::director::{
    ChildThreadType, InnerScoreDirector, ScopedScoreDirector, ScoreDirector, ScoreDirectorFactory,
};
use crate::test_utils::{
    depot_director, depot_factory, depot_solution, easy_supplier, lesson_director, shared_depot_ref,
    CloseCounter, RecordingChangeTracker, ScorelessCloner, ShallowCloner, SharedDepotCalculator,
};

// ============================================================================
// Working solution tests
// ============================================================================

#[test]
fn test_set_working_solution_computes_counters() {
    let model = DepotModel::new();
    let director = depot_director(&model, depot_solution(&model));

    assert!(director.has_working_solution());
    assert_eq!(director.working_init_score(), -1);
    assert_eq!(director.working_genuine_entity_count(), 4);
    assert_eq!(director.working_entity_list_revision(), 1);
    assert!(director.is_incremental());
    assert!(!director.is_derived());
}

#[test]
fn test_calculate_score_carries_unassigned_count() {
    let model = DepotModel::new();
    let mut director = depot_director(&model, depot_solution(&model));

    let score = director.calculate_score().expect("score");

    assert_eq!(score.raw(), SimpleScore::of(-1));
    assert_eq!(score.unassigned_count(), 1);
    assert_eq!(score.init_score(), -1);
    assert_eq!(director.calculation_count(), 1);
    let solution = director.working_solution().expect("installed");
    assert_eq!(solution.score(), Some(&score.snapshot()));
}

#[test]
fn test_calculate_score_without_solution_is_illegal() {
    let model = DepotModel::new();
    let factory = depot_factory(&model, easy_supplier(), ScoreDirectorConfig::default());
    let mut director = factory.build_default();

    let result = director.calculate_score();

    assert!(matches!(result, Err(ScoreForgeError::IllegalState(_))));
}

#[test]
fn test_easy_and_incremental_calculators_agree() {
    let model = DepotModel::new();
    let factory = depot_factory(&model, easy_supplier(), ScoreDirectorConfig::default());
    let mut easy = factory.build_default();
    easy.set_working_solution(depot_solution(&model)).expect("consistent");
    let mut incremental = depot_director(&model, depot_solution(&model));

    assert!(!easy.is_incremental());
    assert_eq!(
        easy.calculate_score().expect("score"),
        incremental.calculate_score().expect("score")
    );
}

#[test]
fn test_set_working_solution_rejects_inconsistent_inverse() {
    let model = DepotModel::new();
    let mut solution = depot_solution(&model);
    let d2 = model.depot_of(&solution, "d2");
    solution.set_value(d2, 0, Value::List(Vec::new())).expect("slot exists");
    let factory = depot_factory(&model, easy_supplier(), ScoreDirectorConfig::default());
    let mut director = factory.build_default();

    let result = director.set_working_solution(solution);

    match result {
        Err(ScoreForgeError::StructuralInconsistency(message)) => {
            assert!(message.contains("Depot(d2)"), "{}", message);
            assert!(message.contains("does not match the actual inverse set"), "{}", message);
        }
        other => panic!("expected a structural inconsistency, got {:?}", other),
    }
    assert!(!director.has_working_solution());
}

#[test]
fn test_inconsistent_inverse_accepted_without_verification() {
    let model = DepotModel::new();
    let mut solution = depot_solution(&model);
    let d2 = model.depot_of(&solution, "d2");
    solution.set_value(d2, 0, Value::List(Vec::new())).expect("slot exists");
    let config =
        ScoreDirectorConfig::default().with_expect_shadow_variables_in_correct_state(false);
    let factory = depot_factory(&model, easy_supplier(), config);
    let mut director = factory.build_default();

    director.set_working_solution(solution).expect("not verified");

    assert!(director.has_working_solution());
}

fn chain_director(model: &ChainModel) -> InnerScoreDirector<SimpleScore> {
    let factory = Arc::new(ScoreDirectorFactory::new(
        model.descriptor.clone(),
        EasyScoreCalculator::supplier(|_: &WorkingSolution| SimpleScore::ZERO),
    ));
    factory.build_default()
}

#[test]
fn test_singleton_inverse_pointing_at_its_referrer_is_accepted() {
    let model = ChainModel::new();
    let solution = model.solution(&[("a", Some("b")), ("b", None), ("c", None)]);
    let a = model.visit(&solution, "a");
    let b = model.visit(&solution, "b");
    assert_eq!(solution.value(b, 1), Some(&Value::Entity(a)));
    let mut director = chain_director(&model);

    director.set_working_solution(solution).expect("consistent");
}

#[test]
fn test_singleton_inverse_mismatch_is_structural() {
    let model = ChainModel::new();
    let mut solution = model.solution(&[("a", Some("b")), ("b", None), ("c", None)]);
    let b = model.visit(&solution, "b");
    let c = model.visit(&solution, "c");
    solution.set_value(b, 1, Value::Entity(c)).expect("slot exists");
    let mut director = chain_director(&model);

    let result = director.set_working_solution(solution);

    match result {
        Err(ScoreForgeError::StructuralInconsistency(message)) => {
            assert!(
                message.starts_with("The entity (Visit(b)) has a singleton inverse shadow variable (next) that points to a source entity (Visit(c)) whereas its actual source entity is (Visit(a))."),
                "{}",
                message
            );
        }
        other => panic!("expected a structural inconsistency, got {:?}", other),
    }
}

#[test]
fn test_pinned_lesson_without_timeslot_is_rejected() {
    let model = LessonModel::new();
    let solution = model.solution(&["t1"], &[("l1", None, true)], None);
    let factory = Arc::new(ScoreDirectorFactory::new(
        model.descriptor.clone(),
        EasyScoreCalculator::supplier(|_: &WorkingSolution| HardSoftScore::ZERO),
    ));
    let mut director = factory.build_default();

    match director.set_working_solution(solution) {
        Err(ScoreForgeError::StructuralInconsistency(message)) => {
            assert!(message.contains("pinned to null"), "{}", message);
        }
        other => panic!("expected a structural inconsistency, got {:?}", other),
    }
}

#[test]
fn test_duplicate_planning_ids_rejected_with_lookup() {
    let model = DepotModel::new();
    let solution = model.solution(&["d1"], &[("c1", Some("d1")), ("c1", None)]);
    let config = ScoreDirectorConfig::default().with_lookup_enabled(true);
    let factory = depot_factory(&model, easy_supplier(), config);
    let mut director = factory.build_default();

    let result = director.set_working_solution(solution);

    assert!(matches!(result, Err(ScoreForgeError::DomainModel(_))));
}

#[test]
fn test_set_working_solution_resets_change_tracker() {
    let model = DepotModel::new();
    let factory = depot_factory(
        &model,
        SharedDepotCalculator::supplier(model.depot, false),
        ScoreDirectorConfig::default(),
    );
    let mut director = factory.build_default();
    let tracker = RecordingChangeTracker::default();
    director.set_change_tracker(Some(Box::new(tracker.clone())));

    director.set_working_solution(depot_solution(&model)).expect("consistent");
    director.set_working_solution(depot_solution(&model)).expect("consistent");

    assert_eq!(tracker.resets.load(Ordering::SeqCst), 2);
    assert_eq!(director.working_entity_list_revision(), 2);
}

// ============================================================================
// Statistics and value range tests
// ============================================================================

#[test]
fn test_initialization_statistics() {
    let model = DepotModel::new();
    let mut director = depot_director(&model, depot_solution(&model));

    let statistics = director.initialization_statistics().expect("statistics");

    assert_eq!(statistics.genuine_entity_count, 4);
    assert_eq!(statistics.shadow_entity_count, 2);
    assert_eq!(statistics.uninitialized_entity_count, 1);
    assert_eq!(statistics.uninitialized_variable_count, 1);
    assert_eq!(statistics.unassigned_value_count, 0);
}

#[test]
fn test_problem_size_statistics() {
    let model = DepotModel::new();
    let mut director = depot_director(&model, depot_solution(&model));

    let statistics = director.problem_size_statistics().expect("statistics");

    assert_eq!(statistics.entity_count, 4);
    assert_eq!(statistics.variable_count, 4);
    assert_eq!(statistics.approximate_value_count, 2);
    let expected = 4.0 * 2f64.log10();
    assert!((statistics.approximate_problem_scale_log - expected).abs() < 1e-9);
}

#[test]
fn test_value_range_is_cached_until_problem_change() {
    let model = LessonModel::new();
    let solution = model.solution(&["t1", "t2"], &[("l1", Some("t1"), false)], None);
    let mut director = lesson_director(&model, solution, ScoreDirectorConfig::default());

    let first = director.value_range_from_solution(0).expect("range");
    let second = director.value_range_from_solution(0).expect("range");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.size(), Some(2));

    director
        .add_problem_fact(ProblemFact::new(model.timeslot_class(), "t3"))
        .expect("added");
    let third = director.value_range_from_solution(0).expect("range");

    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(third.size(), Some(3));
}

#[test]
fn test_is_value_in_range() {
    let model = DepotModel::new();
    let solution = depot_solution(&model);
    let c1 = model.customer(&solution, "c1");
    let d2 = model.depot_of(&solution, "d2");
    let mut director = depot_director(&model, solution);

    assert!(director.is_value_in_range(model.depot, c1, &Value::Entity(d2)).expect("checked"));
    assert!(!director.is_value_in_range(model.depot, c1, &Value::Entity(c1)).expect("checked"));
    assert!(!director.is_value_in_range(model.depot, c1, &Value::None).expect("checked"));
}

// ============================================================================
// Constraint match tests
// ============================================================================

#[test]
fn test_constraint_match_map_requires_enabled_policy() {
    let model = DepotModel::new();
    let mut director = depot_director(&model, depot_solution(&model));

    match director.constraint_match_map() {
        Err(ScoreForgeError::IllegalState(message)) => {
            assert!(message.contains("DISABLED"), "{}", message)
        }
        other => panic!("expected an illegal state, got {:?}", other),
    }
}

#[test]
fn test_explain_score_groups_matches() {
    let model = DepotModel::new();
    let factory = depot_factory(
        &model,
        SharedDepotCalculator::supplier(model.depot, false),
        ScoreDirectorConfig::default(),
    );
    let mut director = factory.build_score_director(false, ConstraintMatchPolicy::Enabled);
    director.set_working_solution(depot_solution(&model)).expect("consistent");

    let explanation = director.explain_score().expect("explanation");

    assert_eq!(explanation.score, SimpleScore::of(-1));
    assert_eq!(explanation.total_match_count(), 1);
    let analysis = &explanation.constraint_analyses[0];
    assert_eq!(analysis.constraint_ref, shared_depot_ref());
    assert_eq!(analysis.matches[0].justification.description, "c1 & c2");
}

// ============================================================================
// Cloning tests
// ============================================================================

#[test]
fn test_clone_working_solution_is_independent() {
    let model = DepotModel::new();
    let mut director = depot_director(&model, depot_solution(&model));
    director.calculate_score().expect("score");

    let clone = director.clone_working_solution().expect("cloned");

    let working = director.working_solution().expect("installed");
    assert!(clone.content_eq(working));
    assert!(clone.shared_instances(working).is_empty());
    assert_eq!(clone.score(), working.score());
}

#[test]
fn test_shallow_clone_is_cloning_corruption() {
    let model = DepotModel::new();
    let factory = Arc::new(
        ScoreDirectorFactory::new(model.descriptor.clone(), easy_supplier())
            .with_cloner(Arc::new(ShallowCloner))
            .with_config(ScoreDirectorConfig::default().with_assert_cloned_solution(true)),
    );
    let mut director = factory.build_default();
    director.set_working_solution(depot_solution(&model)).expect("consistent");

    match director.clone_working_solution() {
        Err(ScoreForgeError::CloningCorruption(message)) => {
            assert!(message.contains("the same entity"), "{}", message);
        }
        other => panic!("expected a cloning corruption, got {:?}", other),
    }
}

#[test]
fn test_shallow_clone_passes_without_assertion() {
    let model = DepotModel::new();
    let factory = Arc::new(
        ScoreDirectorFactory::new(model.descriptor.clone(), easy_supplier())
            .with_cloner(Arc::new(ShallowCloner)),
    );
    let mut director = factory.build_default();
    director.set_working_solution(depot_solution(&model)).expect("consistent");

    assert!(director.clone_working_solution().is_ok());
}

#[test]
fn test_clone_losing_score_is_cloning_corruption() {
    let model = DepotModel::new();
    let factory = Arc::new(
        ScoreDirectorFactory::new(model.descriptor.clone(), easy_supplier())
            .with_cloner(Arc::new(ScorelessCloner))
            .with_config(ScoreDirectorConfig::default().with_assert_cloned_solution(true)),
    );
    let mut director = factory.build_default();
    director.set_working_solution(depot_solution(&model)).expect("consistent");
    director.calculate_score().expect("score");

    match director.clone_working_solution() {
        Err(ScoreForgeError::CloningCorruption(message)) => {
            assert!(message.contains("null"), "{}", message);
        }
        other => panic!("expected a cloning corruption, got {:?}", other),
    }
}

// ============================================================================
// Child director and close tests
// ============================================================================

#[test]
fn test_partition_child_inherits_calculation_count() {
    let model = DepotModel::new();
    let mut director = depot_director(&model, depot_solution(&model));
    director.calculate_score().expect("score");
    director.calculate_score().expect("score");

    let child = director
        .create_child_thread_score_director(ChildThreadType::Partition)
        .expect("child");

    assert!(child.is_derived());
    assert!(!child.has_working_solution());
    assert_eq!(child.calculation_count(), 2);
}

#[test]
fn test_move_thread_child_works_on_a_clone() {
    let model = DepotModel::new();
    let director = depot_director(&model, depot_solution(&model));

    let mut child = director
        .create_child_thread_score_director(ChildThreadType::MoveThread)
        .expect("child");

    assert!(child.is_derived());
    assert!(child.is_lookup_enabled());
    let working = director.working_solution().expect("installed");
    let cloned = child.working_solution().expect("installed");
    assert!(cloned.content_eq(working));
    assert_ne!(cloned.arena_id(), working.arena_id());
    assert_eq!(child.calculate_score().expect("score").raw(), SimpleScore::of(-1));
}

#[test]
fn test_close_is_idempotent() {
    let model = DepotModel::new();
    let counter = CloseCounter::default();
    let factory = Arc::new(
        ScoreDirectorFactory::new(model.descriptor.clone(), easy_supplier())
            .with_shadow_propagation(counter.supplier()),
    );
    let mut director = factory.build_default();
    director.set_working_solution(depot_solution(&model)).expect("consistent");

    director.close();
    director.close();

    assert!(!director.has_working_solution());
    assert_eq!(director.working_init_score(), 0);
    assert_eq!(counter.count(), 2);
}

#[test]
fn test_scoped_director_closes_on_drop() {
    let model = DepotModel::new();
    let counter = CloseCounter::default();
    let factory = Arc::new(
        ScoreDirectorFactory::new(model.descriptor.clone(), easy_supplier())
            .with_shadow_propagation(counter.supplier()),
    );

    {
        let mut scoped =
            ScopedScoreDirector::new(factory.build_derived(false, ConstraintMatchPolicy::Disabled));
        scoped.set_working_solution(depot_solution(&model)).expect("consistent");
        assert_eq!(scoped.calculate_score().expect("score").raw(), SimpleScore::of(-1));
    }

    assert_eq!(counter.count(), 1);
}

#[test]
fn test_assertion_director_is_closed_after_use() {
    let model = DepotModel::new();
    let counter = CloseCounter::default();
    let factory = Arc::new(
        ScoreDirectorFactory::new(model.descriptor.clone(), easy_supplier())
            .with_shadow_propagation(counter.supplier()),
    );

    let result =
        factory.with_assertion_score_director(false, ConstraintMatchPolicy::Enabled, |director| {
            director.set_working_solution(depot_solution(&model))?;
            Err::<(), _>(ScoreForgeError::IllegalState("stop".to_string()))
        });

    assert!(result.is_err());
    assert_eq!(counter.count(), 1);
}
