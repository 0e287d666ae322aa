//! School timetabling fixtures.
//!
//! Lessons carry one basic variable, `timeslot`, whose values are
//! `Timeslot` problem facts. Lessons may be pinned. A singleton
//! `TimetableConfiguration` fact holds integer constraint weights keyed by
//! constraint full name.

use std::sync::Arc;

use scoreforge_core::domain::{
    EntityDeclaration, EntityDescriptor, EntityId, FactClassDescriptor, FactId, ProblemFact,
    SolutionDescriptor, Value, ValueRange, ValueRangeProvider, VariableDeclaration, VariableRef,
    WorkingSolution,
};

/// Entity descriptor index of `Lesson`.
pub const LESSON: usize = 0;
/// Fact class index of `Timeslot`.
pub const TIMESLOT: usize = 0;
/// Fact class index of `TimetableConfiguration`.
pub const CONFIGURATION: usize = 1;

/// Full name of the hard conflict constraint.
pub const TIMESLOT_CONFLICT: &str = "timetabling/Timeslot conflict";

fn timeslots(solution: &WorkingSolution) -> ValueRange {
    ValueRange::of(solution.facts_of(TIMESLOT).map(|(id, _)| Value::Fact(id)))
}

#[derive(Debug, Clone)]
pub struct LessonModel {
    pub descriptor: Arc<SolutionDescriptor>,
    /// `Lesson.timeslot`
    pub timeslot: VariableRef,
}

/// One lesson to build: id, timeslot id, pinned.
pub type LessonSpec<'a> = (&'a str, Option<&'a str>, bool);

impl LessonModel {
    pub fn new() -> Self {
        let descriptor = SolutionDescriptor::builder("Timetable")
            .with_entity(
                EntityDeclaration::new("Lesson")
                    .with_variable(
                        VariableDeclaration::basic("timeslot").with_value_range("timeslots"),
                    ),
            )
            .with_fact_class("Timeslot")
            .with_constraint_configuration("TimetableConfiguration")
            .with_value_range(ValueRangeProvider::from_solution("timeslots", timeslots))
            .build()
            .expect("lesson model is valid");
        Self {
            timeslot: VariableRef::new(LESSON, 0),
            descriptor: Arc::new(descriptor),
        }
    }

    pub fn lesson_class(&self) -> &EntityDescriptor {
        &self.descriptor.entity_descriptors[LESSON]
    }

    pub fn timeslot_class(&self) -> &FactClassDescriptor {
        &self.descriptor.fact_classes[TIMESLOT]
    }

    pub fn configuration_class(&self) -> &FactClassDescriptor {
        &self.descriptor.fact_classes[CONFIGURATION]
    }

    /// Builds a timetable with the given timeslots and lessons, plus a
    /// configuration fact when `conflict_weight` is given.
    pub fn solution(
        &self,
        timeslot_ids: &[&str],
        lessons: &[LessonSpec<'_>],
        conflict_weight: Option<i64>,
    ) -> WorkingSolution {
        let mut solution = WorkingSolution::new();
        for id in timeslot_ids {
            solution.add_fact(ProblemFact::new(self.timeslot_class(), *id));
        }
        if let Some(weight) = conflict_weight {
            solution.add_fact(
                ProblemFact::new(self.configuration_class(), "configuration")
                    .with_property(TIMESLOT_CONFLICT, weight),
            );
        }
        for (id, timeslot, pinned) in lessons {
            let mut lesson = self.lesson_class().new_entity(*id).with_pinned(*pinned);
            if let Some(timeslot) = timeslot {
                lesson = lesson.with_value(0, self.timeslot(&solution, timeslot));
            }
            solution.add_entity(lesson);
        }
        solution
    }

    pub fn lesson(&self, solution: &WorkingSolution, id: &str) -> EntityId {
        solution.find_entity(LESSON, id).expect("lesson exists")
    }

    pub fn timeslot(&self, solution: &WorkingSolution, id: &str) -> FactId {
        solution
            .facts_of(TIMESLOT)
            .find(|(_, f)| f.id().as_ref() == id)
            .map(|(fact, _)| fact)
            .expect("timeslot exists")
    }

    pub fn configuration(&self, solution: &WorkingSolution) -> FactId {
        solution
            .constraint_configuration(&self.descriptor)
            .map(|(fact, _)| fact)
            .expect("configuration exists")
    }

    /// Pairs of lessons sharing a timeslot, each pair ordered by planning id.
    pub fn conflicts(solution: &WorkingSolution) -> Vec<(EntityId, EntityId)> {
        let mut lessons: Vec<(EntityId, &Arc<str>, &Value)> = solution
            .entities_of(LESSON)
            .filter_map(|(id, e)| e.value(0).filter(|v| v.is_some()).map(|v| (id, e.id(), v)))
            .collect();
        lessons.sort_by(|a, b| a.1.cmp(b.1));
        let mut pairs = Vec::new();
        for (i, (left, _, left_slot)) in lessons.iter().enumerate() {
            for (right, _, right_slot) in &lessons[i + 1..] {
                if left_slot == right_slot {
                    pairs.push((*left, *right));
                }
            }
        }
        pairs
    }

    /// Lessons without a timeslot.
    pub fn unassigned(solution: &WorkingSolution) -> Vec<EntityId> {
        solution
            .entities_of(LESSON)
            .filter(|(_, e)| e.value(0).map_or(true, Value::is_none))
            .map(|(id, _)| id)
            .collect()
    }
}

impl Default for LessonModel {
    fn default() -> Self {
        Self::new()
    }
}
