use std::sync::Arc;

use crate::domain::{
    DeepSolutionCloner, EntityDeclaration, Handle, ProblemFact, SolutionCloner,
    SolutionDescriptor, Value, ValueRange, ValueRangeProvider, VariableDeclaration,
    WorkingSolution,
};
use crate::error::ScoreForgeError;
use crate::score::ScoreSnapshot;

fn rows(_: &WorkingSolution) -> ValueRange {
    ValueRange::int_range(0, 4)
}

fn descriptor() -> SolutionDescriptor {
    SolutionDescriptor::builder("NQueens")
        .with_entity(
            EntityDeclaration::new("Queen")
                .with_variable(VariableDeclaration::basic("row").with_value_range("rows")),
        )
        .with_fact_class("Column")
        .with_value_range(ValueRangeProvider::from_solution("rows", rows))
        .build()
        .unwrap()
}

fn solution(descriptor: &SolutionDescriptor) -> WorkingSolution {
    let queen = descriptor.find_entity_descriptor("Queen").unwrap();
    let column = descriptor.find_fact_class("Column").unwrap();
    let mut solution = WorkingSolution::new();
    solution.add_entity(queen.new_entity("q0").with_value(0, 1));
    solution.add_entity(queen.new_entity("q1"));
    solution.add_fact(ProblemFact::new(column, "c0").with_property("index", 0));
    solution
}

#[test]
fn test_set_value_returns_previous() {
    let descriptor = descriptor();
    let mut solution = solution(&descriptor);
    let q0 = solution.find_entity(0, "q0").unwrap();

    let previous = solution.set_value(q0, 0, Value::Int(3)).unwrap();

    assert_eq!(previous, Value::Int(1));
    assert_eq!(solution.value(q0, 0), Some(&Value::Int(3)));
}

#[test]
fn test_set_value_on_missing_slot_fails() {
    let descriptor = descriptor();
    let mut solution = solution(&descriptor);
    let q0 = solution.find_entity(0, "q0").unwrap();

    let result = solution.set_value(q0, 7, Value::Int(3));

    assert!(matches!(result, Err(ScoreForgeError::IllegalState(_))));
}

#[test]
fn test_clone_keeps_handles_but_shares_nothing() {
    let descriptor = descriptor();
    let mut solution = solution(&descriptor);
    solution.set_score(Some(ScoreSnapshot::default()));

    let clone = DeepSolutionCloner.clone_solution(&solution);

    assert_ne!(clone.arena_id(), solution.arena_id());
    assert!(clone.content_eq(&solution));
    assert!(clone.shared_instances(&solution).is_empty());
    assert_eq!(clone.score(), solution.score());
}

#[test]
fn test_shallow_copy_shares_until_written() {
    let descriptor = descriptor();
    let mut solution = solution(&descriptor);
    let q1 = solution.find_entity(0, "q1").unwrap();

    let snapshot = solution.shallow_copy();
    assert_eq!(snapshot.shared_instances(&solution).len(), 3);

    solution.set_value(q1, 0, Value::Int(2)).unwrap();

    assert_eq!(snapshot.value(q1, 0), Some(&Value::None));
    assert!(!snapshot.shared_instances(&solution).contains(&Handle::Entity(q1)));
}

#[test]
fn test_describe_value_uses_planning_ids() {
    let descriptor = descriptor();
    let solution = solution(&descriptor);
    let q0 = solution.find_entity(0, "q0").unwrap();

    let text = solution.describe_value(
        &descriptor,
        &Value::List(vec![Value::Entity(q0), Value::None]),
    );

    assert_eq!(text, "[Queen(q0), null]");
    assert_eq!(solution.entity(q0).unwrap().id(), &Arc::<str>::from("q0"));
}

#[test]
fn test_list_mut_rejects_basic_slot() {
    let descriptor = descriptor();
    let mut solution = solution(&descriptor);
    let q0 = solution.find_entity(0, "q0").unwrap();

    assert!(solution.list_mut(q0, 0).is_err());
}
