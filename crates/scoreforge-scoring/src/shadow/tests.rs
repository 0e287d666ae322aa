//! Tests for the inverse relation propagation engine.

use scoreforge_core::domain::{Value, WorkingSolution};
use scoreforge_test::{ChainModel, DepotModel, VehicleModel};

use super::{InverseRelationPropagation, NoShadowPropagation, ShadowPropagation, ShadowUpdate};

fn apply(solution: &mut WorkingSolution, updates: Vec<ShadowUpdate>) {
    for update in updates {
        solution
            .set_value(update.entity, update.variable.ordinal, update.value)
            .expect("shadow slot exists");
    }
}

// ============================================================================
// Basic inverse tests
// ============================================================================

#[test]
fn test_consistent_solution_needs_no_updates() {
    let model = DepotModel::new();
    let solution = model.solution(&["d1", "d2"], &[("c1", Some("d1")), ("c2", Some("d2"))]);
    let mut engine = InverseRelationPropagation::new(&model.descriptor);
    engine.reset_working_solution(&solution);

    assert!(engine.force_trigger_all(&solution).expect("forced").is_empty());
    assert!(engine.trigger_queued(&solution).expect("triggered").is_empty());
}

#[test]
fn test_collection_inverse_follows_variable_change() {
    let model = DepotModel::new();
    let mut solution = model.solution(&["d1", "d2"], &[("c1", Some("d1")), ("c2", Some("d1"))]);
    let mut engine = InverseRelationPropagation::new(&model.descriptor);
    engine.reset_working_solution(&solution);
    let c1 = model.customer(&solution, "c1");
    let d1 = model.depot_of(&solution, "d1");
    let d2 = model.depot_of(&solution, "d2");

    engine.before_variable_changed(&solution, model.depot, c1);
    solution.set_value(c1, 0, Value::Entity(d2)).expect("slot exists");
    engine.after_variable_changed(&solution, model.depot, c1);
    let updates = engine.trigger_queued(&solution).expect("triggered");

    assert_eq!(updates.len(), 2);
    apply(&mut solution, updates);
    assert_eq!(model.recorded_customers(&solution, d1), vec!["c2"]);
    assert_eq!(model.recorded_customers(&solution, d2), vec!["c1"]);
    assert!(engine.trigger_queued(&solution).expect("drained").is_empty());
}

#[test]
fn test_reordered_collection_inverse_is_not_stale() {
    let model = DepotModel::new();
    let mut solution = model.solution(&["d1"], &[("c1", Some("d1")), ("c2", Some("d1"))]);
    let c1 = model.customer(&solution, "c1");
    let c2 = model.customer(&solution, "c2");
    let d1 = model.depot_of(&solution, "d1");
    solution
        .set_value(d1, 0, Value::List(vec![Value::Entity(c2), Value::Entity(c1)]))
        .expect("slot exists");
    let mut engine = InverseRelationPropagation::new(&model.descriptor);
    engine.reset_working_solution(&solution);

    assert!(engine.force_trigger_all(&solution).expect("forced").is_empty());

    engine.before_variable_changed(&solution, model.depot, c2);
    engine.after_variable_changed(&solution, model.depot, c2);
    assert!(engine.trigger_queued(&solution).expect("triggered").is_empty());
}

#[test]
fn test_singleton_inverse_forced_recomputation() {
    let model = ChainModel::new();
    let mut solution = model.solution(&[("a", None), ("b", Some("a")), ("c", None)]);
    let a = model.visit(&solution, "a");
    let c = model.visit(&solution, "c");
    solution.set_value(c, 1, Value::Entity(a)).expect("slot exists");
    let mut engine = InverseRelationPropagation::new(&model.descriptor);

    let updates = engine.force_trigger_all(&solution).expect("forced");

    assert_eq!(updates, vec![ShadowUpdate::new(c, model.next, Value::None)]);
}

#[test]
fn test_removed_entity_releases_its_target() {
    let model = DepotModel::new();
    let mut solution = model.solution(&["d1"], &[("c1", Some("d1")), ("c2", Some("d1"))]);
    let mut engine = InverseRelationPropagation::new(&model.descriptor);
    engine.reset_working_solution(&solution);
    let c1 = model.customer(&solution, "c1");
    let d1 = model.depot_of(&solution, "d1");

    engine.before_entity_removed(&solution, c1);
    let removed = solution.remove_entity(c1).expect("customer exists");
    engine.after_entity_removed(&solution, c1, &removed);
    let queued = engine.trigger_queued(&solution).expect("triggered");
    apply(&mut solution, queued);

    assert_eq!(model.recorded_customers(&solution, d1), vec!["c2"]);
}

// ============================================================================
// List shadow tests
// ============================================================================

#[test]
fn test_list_change_updates_inverse_and_index() {
    let model = VehicleModel::new(false);
    let mut solution = model.solution(&[("v1", &["a", "b"]), ("v2", &["c"])], &[]);
    let mut engine = InverseRelationPropagation::new(&model.descriptor);
    engine.reset_working_solution(&solution);
    let v1 = model.vehicle(&solution, "v1");
    let v2 = model.vehicle(&solution, "v2");
    let a = model.visit(&solution, "a");

    engine.before_list_variable_changed(&solution, model.visits, v1, 0, 1);
    engine.before_list_variable_changed(&solution, model.visits, v2, 1, 1);
    let element = solution.list_mut(v1, 0).expect("list exists").remove(0);
    solution.list_mut(v2, 0).expect("list exists").push(element);
    engine.after_list_variable_changed(&solution, model.visits, v1, 0, 0);
    engine.after_list_variable_changed(&solution, model.visits, v2, 1, 2);
    let queued = engine.trigger_queued(&solution).expect("triggered");
    apply(&mut solution, queued);

    assert_eq!(model.recorded_position(&solution, a), Some(("v2".to_string(), 1)));
    let b = model.visit(&solution, "b");
    assert_eq!(model.recorded_position(&solution, b), Some(("v1".to_string(), 0)));
}

#[test]
fn test_unassigned_element_loses_its_shadows() {
    let model = VehicleModel::new(true);
    let mut solution = model.solution(&[("v1", &["a", "b"])], &[]);
    let mut engine = InverseRelationPropagation::new(&model.descriptor);
    engine.reset_working_solution(&solution);
    let v1 = model.vehicle(&solution, "v1");
    let a = model.visit(&solution, "a");

    engine.before_list_variable_changed(&solution, model.visits, v1, 0, 1);
    let element = solution.list_mut(v1, 0).expect("list exists").remove(0);
    engine.after_list_variable_changed(&solution, model.visits, v1, 0, 0);
    engine.after_list_element_unassigned(&solution, model.visits, &element);
    let queued = engine.trigger_queued(&solution).expect("triggered");
    apply(&mut solution, queued);

    assert_eq!(solution.value(a, 0), Some(&Value::None));
    assert_eq!(solution.value(a, 1), Some(&Value::None));
    assert_eq!(model.route(&solution, v1), vec!["b"]);
}

#[test]
fn test_forced_recomputation_fixes_stale_index() {
    let model = VehicleModel::new(false);
    let mut solution = model.solution(&[("v1", &["a", "b"])], &[]);
    let b = model.visit(&solution, "b");
    solution.set_value(b, 1, Value::Int(7)).expect("slot exists");
    let mut engine = InverseRelationPropagation::new(&model.descriptor);

    let updates = engine.force_trigger_all(&solution).expect("forced");

    assert_eq!(updates, vec![ShadowUpdate::new(b, model.index, Value::Int(1))]);
}

#[test]
fn test_no_shadow_propagation_is_inert() {
    let model = DepotModel::new();
    let solution = model.solution(&["d1"], &[("c1", None)]);
    let mut engine = NoShadowPropagation;

    assert!(engine.force_trigger_all(&solution).expect("forced").is_empty());
}
