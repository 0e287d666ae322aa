//! Tests for moves: doability and undo through the ephemeral director.

use scoreforge_config::ScoreDirectorConfig;
use scoreforge_core::domain::{Value, WorkingSolution};
use scoreforge_core::{Score, SimpleScore};
use scoreforge_test::{DepotModel, LessonModel, VehicleModel};

use super::*;
use crate::director::{EphemeralScoreDirector, InnerScoreDirector, ScoreDirector};
use crate::test_utils::{depot_director, depot_solution, lesson_director, vehicle_director};

fn doable<Sc: Score, M: Move<Sc>>(mv: &M, director: &InnerScoreDirector<Sc>) -> bool {
    mv.is_doable(director)
}

// Runs `mv` in an ephemeral scope and undoes it. Returns the number of
// registered undo actions and a copy of the solution while moved.
fn apply_and_undo<Sc: Score>(
    director: &mut InnerScoreDirector<Sc>,
    mv: &dyn Move<Sc>,
) -> (usize, WorkingSolution) {
    let (undo_count, moved) = {
        let mut ephemeral = EphemeralScoreDirector::new(director);
        mv.do_move(&mut ephemeral).expect("move applies");
        ephemeral.trigger_variable_listeners().expect("shadows update");
        let moved = ephemeral.working_solution().expect("installed").clone();
        let undo_count = ephemeral.undo_count();
        ephemeral.undo_changes().expect("undo applies");
        (undo_count, moved)
    };
    director.trigger_variable_listeners().expect("shadows update");
    (undo_count, moved)
}

fn routes() -> VehicleModel {
    VehicleModel::new(true)
}

fn route_director(model: &VehicleModel) -> InnerScoreDirector<SimpleScore> {
    let solution = model.solution(&[("v1", &["a", "b"]), ("v2", &["c"])], &["d"]);
    vehicle_director(model, solution, ScoreDirectorConfig::default())
}

// ============================================================================
// ChangeMove tests
// ============================================================================

#[test]
fn test_change_move_undo() {
    let model = DepotModel::new();
    let mut director = depot_director(&model, depot_solution(&model));
    let working = director.working_solution().expect("installed");
    let c4 = model.customer(working, "c4");
    let d2 = model.depot_of(working, "d2");
    let before = director.calculate_score().expect("score");
    let mv = ChangeMove::new(model.depot, c4, d2);

    let (undo_count, moved) = apply_and_undo(&mut director, &mv);

    assert_eq!(undo_count, 1);
    assert_eq!(moved.value(c4, 0), Some(&Value::Entity(d2)));
    assert_eq!(director.calculate_score().expect("score"), before);
    let working = director.working_solution().expect("installed");
    assert_eq!(working.value(c4, 0), Some(&Value::None));
    assert_eq!(model.recorded_customers(working, d2), vec!["c3"]);
}

#[test]
fn test_change_move_to_current_value_is_not_doable() {
    let model = DepotModel::new();
    let director = depot_director(&model, depot_solution(&model));
    let working = director.working_solution().expect("installed");
    let c1 = model.customer(working, "c1");
    let d1 = model.depot_of(working, "d1");
    let d2 = model.depot_of(working, "d2");

    assert!(!doable(&ChangeMove::new(model.depot, c1, d1), &director));
    assert!(doable(&ChangeMove::new(model.depot, c1, d2), &director));
}

#[test]
fn test_change_move_on_pinned_entity_is_not_doable() {
    let model = LessonModel::new();
    let solution = model.solution(
        &["t1", "t2"],
        &[("l1", Some("t1"), true), ("l2", Some("t1"), false)],
        None,
    );
    let l1 = model.lesson(&solution, "l1");
    let l2 = model.lesson(&solution, "l2");
    let t2 = model.timeslot(&solution, "t2");
    let director = lesson_director(&model, solution, ScoreDirectorConfig::default());

    assert!(!doable(&ChangeMove::new(model.timeslot, l1, t2), &director));
    assert!(doable(&ChangeMove::new(model.timeslot, l2, t2), &director));
}

// ============================================================================
// SwapMove tests
// ============================================================================

#[test]
fn test_swap_move_undo() {
    let model = DepotModel::new();
    let mut director = depot_director(&model, depot_solution(&model));
    let working = director.working_solution().expect("installed");
    let c1 = model.customer(working, "c1");
    let c3 = model.customer(working, "c3");
    let d1 = model.depot_of(working, "d1");
    let d2 = model.depot_of(working, "d2");
    let mv = SwapMove::new([model.depot], c1, c3);
    assert!(doable(&mv, &director));

    let (undo_count, moved) = apply_and_undo(&mut director, &mv);

    assert_eq!(undo_count, 1);
    assert_eq!(moved.value(c1, 0), Some(&Value::Entity(d2)));
    assert_eq!(moved.value(c3, 0), Some(&Value::Entity(d1)));
    assert_eq!(model.recorded_customers(&moved, d1), vec!["c2", "c3"]);
    let working = director.working_solution().expect("installed");
    assert_eq!(working.value(c1, 0), Some(&Value::Entity(d1)));
    assert_eq!(working.value(c3, 0), Some(&Value::Entity(d2)));
    assert_eq!(model.recorded_customers(working, d1), vec!["c1", "c2"]);
}

#[test]
fn test_swap_move_without_difference_is_not_doable() {
    let model = DepotModel::new();
    let director = depot_director(&model, depot_solution(&model));
    let working = director.working_solution().expect("installed");
    let c1 = model.customer(working, "c1");
    let c2 = model.customer(working, "c2");

    assert!(!doable(&SwapMove::new([model.depot], c1, c2), &director));
    assert!(!doable(&SwapMove::new([model.depot], c1, c1), &director));
}

// ============================================================================
// List move tests
// ============================================================================

#[test]
fn test_list_assign_move_doability() {
    let model = routes();
    let director = route_director(&model);
    let working = director.working_solution().expect("installed");
    let v2 = model.vehicle(working, "v2");
    let a = model.visit(working, "a");
    let d = model.visit(working, "d");

    assert!(doable(&ListAssignMove::new(model.visits, d, v2, 1), &director));
    assert!(doable(&ListAssignMove::new(model.visits, d, v2, 0), &director));
    assert!(!doable(&ListAssignMove::new(model.visits, d, v2, 2), &director));
    assert!(!doable(&ListAssignMove::new(model.visits, a, v2, 0), &director));
}

#[test]
fn test_list_assign_move_undo() {
    let model = routes();
    let mut director = route_director(&model);
    let working = director.working_solution().expect("installed");
    let v2 = model.vehicle(working, "v2");
    let d = model.visit(working, "d");

    let (undo_count, moved) =
        apply_and_undo(&mut director, &ListAssignMove::new(model.visits, d, v2, 1));

    assert_eq!(undo_count, 1);
    assert_eq!(model.route(&moved, v2), vec!["c", "d"]);
    assert_eq!(model.recorded_position(&moved, d), Some(("v2".to_string(), 1)));
    let working = director.working_solution().expect("installed");
    assert_eq!(model.route(working, v2), vec!["c"]);
    assert_eq!(model.recorded_position(working, d), None);
}

#[test]
fn test_list_unassign_move_undo() {
    let model = routes();
    let mut director = route_director(&model);
    let working = director.working_solution().expect("installed");
    let v1 = model.vehicle(working, "v1");
    let a = model.visit(working, "a");
    let b = model.visit(working, "b");
    let mv = ListUnassignMove::new(model.visits, v1, 0);
    assert!(doable(&mv, &director));
    assert!(!doable(&ListUnassignMove::new(model.visits, v1, 2), &director));

    let (_, moved) = apply_and_undo(&mut director, &mv);

    assert_eq!(model.route(&moved, v1), vec!["b"]);
    let working = director.working_solution().expect("installed");
    assert_eq!(model.route(working, v1), vec!["a", "b"]);
    assert_eq!(model.recorded_position(working, a), Some(("v1".to_string(), 0)));
    assert_eq!(model.recorded_position(working, b), Some(("v1".to_string(), 1)));
}

#[test]
fn test_list_change_move_within_one_list() {
    let model = routes();
    let mut director = route_director(&model);
    let working = director.working_solution().expect("installed");
    let v1 = model.vehicle(working, "v1");
    let mv = ListChangeMove::new(model.visits, v1, 0, v1, 1);
    assert!(doable(&mv, &director));
    assert!(!doable(&ListChangeMove::new(model.visits, v1, 0, v1, 0), &director));
    assert!(!doable(&ListChangeMove::new(model.visits, v1, 0, v1, 2), &director));

    let (_, moved) = apply_and_undo(&mut director, &mv);

    assert_eq!(model.route(&moved, v1), vec!["b", "a"]);
    let working = director.working_solution().expect("installed");
    assert_eq!(model.route(working, v1), vec!["a", "b"]);
}

#[test]
fn test_list_change_move_between_lists_undo() {
    let model = routes();
    let mut director = route_director(&model);
    let working = director.working_solution().expect("installed");
    let v1 = model.vehicle(working, "v1");
    let v2 = model.vehicle(working, "v2");
    let b = model.visit(working, "b");
    let before = director.calculate_score().expect("score");

    let (_, moved) =
        apply_and_undo(&mut director, &ListChangeMove::new(model.visits, v1, 1, v2, 0));

    assert_eq!(model.route(&moved, v2), vec!["b", "c"]);
    assert_eq!(model.recorded_position(&moved, b), Some(("v2".to_string(), 0)));
    assert_eq!(director.calculate_score().expect("score"), before);
    let working = director.working_solution().expect("installed");
    assert_eq!(model.recorded_position(working, b), Some(("v1".to_string(), 1)));
}

// ============================================================================
// CompositeMove tests
// ============================================================================

#[test]
fn test_composite_undo_is_newest_first() {
    let model = DepotModel::new();
    let mut director = depot_director(&model, depot_solution(&model));
    let working = director.working_solution().expect("installed");
    let c4 = model.customer(working, "c4");
    let d1 = model.depot_of(working, "d1");
    let d2 = model.depot_of(working, "d2");
    let composite: CompositeMove<SimpleScore> = CompositeMove::new(vec![
        Box::new(ChangeMove::new(model.depot, c4, d2)),
        Box::new(ChangeMove::new(model.depot, c4, d1)),
    ]);

    let (undo_count, moved) = apply_and_undo(&mut director, &composite);

    assert_eq!(undo_count, 2);
    assert_eq!(moved.value(c4, 0), Some(&Value::Entity(d1)));
    let working = director.working_solution().expect("installed");
    assert_eq!(working.value(c4, 0), Some(&Value::None));
}

#[test]
fn test_composite_is_doable_if_any_child_is() {
    let model = DepotModel::new();
    let director = depot_director(&model, depot_solution(&model));
    let working = director.working_solution().expect("installed");
    let c1 = model.customer(working, "c1");
    let c4 = model.customer(working, "c4");
    let d1 = model.depot_of(working, "d1");
    let d2 = model.depot_of(working, "d2");

    let idle: CompositeMove<SimpleScore> =
        CompositeMove::new(vec![Box::new(ChangeMove::new(model.depot, c1, d1))]);
    let mixed: CompositeMove<SimpleScore> = CompositeMove::new(vec![
        Box::new(ChangeMove::new(model.depot, c1, d1)),
        Box::new(ChangeMove::new(model.depot, c4, d2)),
    ]);

    assert!(!doable(&idle, &director));
    assert!(doable(&mixed, &director));
    assert_eq!(mixed.len(), 2);
}

#[test]
fn test_composite_display_lists_children() {
    let model = DepotModel::new();
    let solution = depot_solution(&model);
    let c4 = model.customer(&solution, "c4");
    let d1 = model.depot_of(&solution, "d1");
    let first = ChangeMove::new(model.depot, c4, d1);
    let second = ListUnassignMove::new(model.customers, d1, 0);
    let expected = format!("[{}, {}]", first, second);

    let composite: CompositeMove<SimpleScore> =
        CompositeMove::new(vec![Box::new(first), Box::new(second)]);

    assert_eq!(composite.to_string(), expected);
    assert!(CompositeMove::<SimpleScore>::new(Vec::new()).is_empty());
}
