//! Moves over the list variable.

use std::fmt;

use scoreforge_core::domain::{EntityId, Value, VariableRef, WorkingSolution};
use scoreforge_core::{Result, Score};

use super::Move;
use crate::director::ScoreDirector;

// Whether positions from `index` on may change in the list of `entity`.
fn is_movable(solution: &WorkingSolution, entity: EntityId, index: usize) -> bool {
    solution
        .entity(entity)
        .is_some_and(|e| !e.is_pinned() && index >= e.pin_index())
}

fn list_len(solution: &WorkingSolution, variable: VariableRef, entity: EntityId) -> Option<usize> {
    solution.list(entity, variable.ordinal).map(<[Value]>::len)
}

/// Inserts an element that is in no list into the list of `destination`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListAssignMove {
    variable: VariableRef,
    element: Value,
    destination: EntityId,
    destination_index: usize,
}

impl ListAssignMove {
    pub fn new(
        variable: VariableRef,
        element: impl Into<Value>,
        destination: EntityId,
        destination_index: usize,
    ) -> Self {
        Self {
            variable,
            element: element.into(),
            destination,
            destination_index,
        }
    }
}

impl fmt::Display for ListAssignMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Assign({} -> {:?}[{}])",
            self.element, self.destination, self.destination_index
        )
    }
}

impl<Sc: Score> Move<Sc> for ListAssignMove {
    fn is_doable(&self, score_director: &dyn ScoreDirector<Sc>) -> bool {
        let Ok(solution) = score_director.working_solution() else {
            return false;
        };
        is_movable(solution, self.destination, self.destination_index)
            && list_len(solution, self.variable, self.destination)
                .is_some_and(|len| self.destination_index <= len)
            && solution
                .find_list_position(
                    self.variable.entity_descriptor,
                    self.variable.ordinal,
                    &self.element,
                )
                .is_none()
    }

    fn do_move(&self, score_director: &mut dyn ScoreDirector<Sc>) -> Result<()> {
        score_director.assign_list_element(
            self.variable,
            self.destination,
            self.destination_index,
            self.element.clone(),
        )?;
        let (variable, destination, index) =
            (self.variable, self.destination, self.destination_index);
        score_director.register_undo(Box::new(move |director: &mut dyn ScoreDirector<Sc>| {
            director.unassign_list_element(variable, destination, index).map(drop)
        }));
        Ok(())
    }
}

/// Takes the element at `source_index` out of the list of `source`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListUnassignMove {
    variable: VariableRef,
    source: EntityId,
    source_index: usize,
}

impl ListUnassignMove {
    pub fn new(variable: VariableRef, source: EntityId, source_index: usize) -> Self {
        Self {
            variable,
            source,
            source_index,
        }
    }
}

impl fmt::Display for ListUnassignMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unassign({:?}[{}])", self.source, self.source_index)
    }
}

impl<Sc: Score> Move<Sc> for ListUnassignMove {
    fn is_doable(&self, score_director: &dyn ScoreDirector<Sc>) -> bool {
        let Ok(solution) = score_director.working_solution() else {
            return false;
        };
        is_movable(solution, self.source, self.source_index)
            && list_len(solution, self.variable, self.source)
                .is_some_and(|len| self.source_index < len)
    }

    fn do_move(&self, score_director: &mut dyn ScoreDirector<Sc>) -> Result<()> {
        let element =
            score_director.unassign_list_element(self.variable, self.source, self.source_index)?;
        let (variable, source, index) = (self.variable, self.source, self.source_index);
        score_director.register_undo(Box::new(move |director: &mut dyn ScoreDirector<Sc>| {
            director.assign_list_element(variable, source, index, element)
        }));
        Ok(())
    }
}

/// Relocates one element, within a list or between two lists.
///
/// `destination_index` is a position in the destination list once the
/// element has left its source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListChangeMove {
    variable: VariableRef,
    source: EntityId,
    source_index: usize,
    destination: EntityId,
    destination_index: usize,
}

impl ListChangeMove {
    pub fn new(
        variable: VariableRef,
        source: EntityId,
        source_index: usize,
        destination: EntityId,
        destination_index: usize,
    ) -> Self {
        Self {
            variable,
            source,
            source_index,
            destination,
            destination_index,
        }
    }

    fn apply<Sc: Score>(
        director: &mut dyn ScoreDirector<Sc>,
        variable: VariableRef,
        (source, source_index): (EntityId, usize),
        (destination, destination_index): (EntityId, usize),
    ) -> Result<()> {
        director.move_list_element(variable, source, source_index, destination, destination_index)
    }
}

impl fmt::Display for ListChangeMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}[{}] -> {:?}[{}]",
            self.source, self.source_index, self.destination, self.destination_index
        )
    }
}

impl<Sc: Score> Move<Sc> for ListChangeMove {
    fn is_doable(&self, score_director: &dyn ScoreDirector<Sc>) -> bool {
        if self.source == self.destination && self.source_index == self.destination_index {
            return false;
        }
        let Ok(solution) = score_director.working_solution() else {
            return false;
        };
        let Some(source_len) = list_len(solution, self.variable, self.source) else {
            return false;
        };
        let destination_limit = if self.source == self.destination {
            source_len.checked_sub(1)
        } else {
            list_len(solution, self.variable, self.destination)
        };
        self.source_index < source_len
            && destination_limit.is_some_and(|limit| self.destination_index <= limit)
            && is_movable(solution, self.source, self.source_index)
            && is_movable(solution, self.destination, self.destination_index)
    }

    fn do_move(&self, score_director: &mut dyn ScoreDirector<Sc>) -> Result<()> {
        let from = (self.source, self.source_index);
        let to = (self.destination, self.destination_index);
        Self::apply(score_director, self.variable, from, to)?;
        let variable = self.variable;
        score_director.register_undo(Box::new(move |director: &mut dyn ScoreDirector<Sc>| {
            Self::apply(director, variable, to, from)
        }));
        Ok(())
    }
}
