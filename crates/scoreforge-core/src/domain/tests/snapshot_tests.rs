use crate::domain::{
    EntityDeclaration, SnapshotFilter, SolutionDescriptor, Value, ValueRange,
    ValueRangeProvider, VariableDeclaration, VariableSnapshot, WorkingSolution,
};

fn visits(_: &WorkingSolution) -> ValueRange {
    ValueRange::of(Vec::new())
}

fn descriptor() -> SolutionDescriptor {
    SolutionDescriptor::builder("Route")
        .with_entity(
            EntityDeclaration::new("Visit")
                .with_variable(
                    VariableDeclaration::basic("previous")
                        .with_value_range("visits")
                        .with_allows_unassigned(true),
                )
                .with_variable(VariableDeclaration::singleton_inverse(
                    "next", "Visit", "previous",
                )),
        )
        .with_value_range(ValueRangeProvider::from_solution("visits", visits))
        .build()
        .unwrap()
}

#[test]
fn test_filter_selects_variable_kinds() {
    let descriptor = descriptor();
    let visit = descriptor.find_entity_descriptor("Visit").unwrap();
    let mut solution = WorkingSolution::new();
    solution.add_entity(visit.new_entity("a"));
    solution.add_entity(visit.new_entity("b"));

    let all = VariableSnapshot::capture(&descriptor, &solution, SnapshotFilter::All);
    let shadow = VariableSnapshot::capture(&descriptor, &solution, SnapshotFilter::Shadow);

    assert_eq!(all.len(), 4);
    assert_eq!(shadow.len(), 2);
}

#[test]
fn test_differences_report_changed_slots() {
    let descriptor = descriptor();
    let visit = descriptor.find_entity_descriptor("Visit").unwrap();
    let mut solution = WorkingSolution::new();
    let a = solution.add_entity(visit.new_entity("a"));
    let b = solution.add_entity(visit.new_entity("b"));
    let before = VariableSnapshot::capture(&descriptor, &solution, SnapshotFilter::Shadow);

    solution.set_value(b, 1, Value::Entity(a)).unwrap();
    let after = VariableSnapshot::capture(&descriptor, &solution, SnapshotFilter::Shadow);

    let differences = before.differences(&after);
    assert_eq!(differences.len(), 1);
    assert_eq!(
        differences[0].to_string(),
        "Actual value (Visit(a)) of variable next on Visit entity (b) differs from expected (null)"
    );
    assert!(after.differences(&after).is_empty());
}
