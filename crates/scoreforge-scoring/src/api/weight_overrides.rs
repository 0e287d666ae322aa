// Constraint weights read from the constraint configuration fact.
//
// A model may flag one fact class as its constraint configuration. Each
// integer property of that fact, keyed by a constraint's full name, scales
// the constraint's declared weight. Changing such a property goes through
// the problem-property hooks, which reset the whole director.

use std::collections::HashMap;
use std::fmt::Debug;

use scoreforge_core::domain::{SolutionDescriptor, Value, WorkingSolution};
use scoreforge_core::{ConstraintRef, Score};

// Holds the effective weight overrides for one working solution.
#[derive(Clone)]
pub struct ConstraintWeightOverrides<Sc: Score> {
    weights: HashMap<String, Sc>,
}

impl<Sc: Score> Debug for ConstraintWeightOverrides<Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstraintWeightOverrides")
            .field("count", &self.weights.len())
            .finish()
    }
}

impl<Sc: Score> Default for ConstraintWeightOverrides<Sc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Sc: Score> ConstraintWeightOverrides<Sc> {
    pub fn new() -> Self {
        Self {
            weights: HashMap::new(),
        }
    }

    // Reads the multipliers of the configuration fact for the given
    // constraints. Non-integer properties are ignored.
    pub fn from_configuration<'a>(
        descriptor: &SolutionDescriptor,
        solution: &WorkingSolution,
        constraints: impl IntoIterator<Item = (&'a ConstraintRef, Sc)>,
    ) -> Self {
        let mut overrides = Self::new();
        let Some((_, configuration)) = solution.constraint_configuration(descriptor) else {
            return overrides;
        };
        for (constraint_ref, weight) in constraints {
            let full_name = constraint_ref.full_name();
            if let Some(Value::Int(factor)) = configuration.property(&full_name) {
                overrides.put(full_name, scale(weight, *factor));
            }
        }
        overrides
    }

    pub fn put<N: Into<String>>(&mut self, name: N, weight: Sc) {
        self.weights.insert(name.into(), weight);
    }

    pub fn get_or_default(&self, name: &str, default: Sc) -> Sc {
        self.weights.get(name).copied().unwrap_or(default)
    }

    pub fn get(&self, name: &str) -> Option<&Sc> {
        self.weights.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.weights.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

// Multiplies every level of a score.
pub fn scale<Sc: Score>(score: Sc, factor: i64) -> Sc {
    let levels: Vec<i64> = score
        .to_level_numbers()
        .into_iter()
        .map(|level| level * factor)
        .collect();
    Sc::from_level_numbers(&levels)
}
