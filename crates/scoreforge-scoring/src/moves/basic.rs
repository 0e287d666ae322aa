//! Moves over basic planning variables.

use std::fmt;

use scoreforge_core::domain::{EntityId, Value, VariableRef};
use scoreforge_core::{Result, Score};
use smallvec::SmallVec;

use super::Move;
use crate::director::ScoreDirector;

/// Assigns a value to one basic variable of one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeMove {
    variable: VariableRef,
    entity: EntityId,
    to_value: Value,
}

impl ChangeMove {
    pub fn new(variable: VariableRef, entity: EntityId, to_value: impl Into<Value>) -> Self {
        Self {
            variable,
            entity,
            to_value: to_value.into(),
        }
    }

    pub fn variable(&self) -> VariableRef {
        self.variable
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn to_value(&self) -> &Value {
        &self.to_value
    }
}

impl fmt::Display for ChangeMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {{{}}} -> {}", self.entity, self.variable, self.to_value)
    }
}

impl<Sc: Score> Move<Sc> for ChangeMove {
    fn is_doable(&self, score_director: &dyn ScoreDirector<Sc>) -> bool {
        let Ok(solution) = score_director.working_solution() else {
            return false;
        };
        match solution.entity(self.entity) {
            Some(entity) => {
                !entity.is_pinned() && entity.value(self.variable.ordinal) != Some(&self.to_value)
            }
            None => false,
        }
    }

    fn do_move(&self, score_director: &mut dyn ScoreDirector<Sc>) -> Result<()> {
        let old =
            score_director.change_variable(self.variable, self.entity, self.to_value.clone())?;
        let (variable, entity) = (self.variable, self.entity);
        score_director.register_undo(Box::new(move |director: &mut dyn ScoreDirector<Sc>| {
            director.change_variable(variable, entity, old).map(drop)
        }));
        Ok(())
    }
}

/// Exchanges the values of one or more basic variables between two entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapMove {
    variables: SmallVec<[VariableRef; 2]>,
    left: EntityId,
    right: EntityId,
}

impl SwapMove {
    pub fn new(
        variables: impl IntoIterator<Item = VariableRef>,
        left: EntityId,
        right: EntityId,
    ) -> Self {
        Self {
            variables: variables.into_iter().collect(),
            left,
            right,
        }
    }

    pub fn left(&self) -> EntityId {
        self.left
    }

    pub fn right(&self) -> EntityId {
        self.right
    }
}

impl fmt::Display for SwapMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} <-> {:?}", self.left, self.right)
    }
}

impl<Sc: Score> Move<Sc> for SwapMove {
    fn is_doable(&self, score_director: &dyn ScoreDirector<Sc>) -> bool {
        if self.left == self.right {
            return false;
        }
        let Ok(solution) = score_director.working_solution() else {
            return false;
        };
        let (Some(left), Some(right)) = (solution.entity(self.left), solution.entity(self.right))
        else {
            return false;
        };
        !left.is_pinned()
            && !right.is_pinned()
            && self
                .variables
                .iter()
                .any(|v| left.value(v.ordinal) != right.value(v.ordinal))
    }

    fn do_move(&self, score_director: &mut dyn ScoreDirector<Sc>) -> Result<()> {
        for &variable in &self.variables {
            let solution = score_director.working_solution()?;
            let left_value = solution
                .value(self.left, variable.ordinal)
                .cloned()
                .unwrap_or_default();
            let right_value = solution
                .value(self.right, variable.ordinal)
                .cloned()
                .unwrap_or_default();
            if left_value == right_value {
                continue;
            }
            score_director.change_variable(variable, self.left, right_value.clone())?;
            score_director.change_variable(variable, self.right, left_value.clone())?;
            let (left, right) = (self.left, self.right);
            score_director.register_undo(Box::new(move |director: &mut dyn ScoreDirector<Sc>| {
                director.change_variable(variable, left, left_value)?;
                director.change_variable(variable, right, right_value).map(drop)
            }));
        }
        Ok(())
    }
}
