//! Value ranges for planning variables.
//!
//! A value range is the set of values a genuine variable may take. Ranges are
//! extracted from the working solution (or from a single entity) by the
//! function stored in a [`ValueRangeDescriptor`](super::ValueRangeDescriptor)
//! and memoized by the scoring core's value-range cache.

use std::fmt;

use super::Value;

/// The possible values of a planning variable.
///
/// # Example
///
/// ```
/// use scoreforge_core::domain::{Value, ValueRange};
///
/// let rows = ValueRange::int_range(0, 8);
/// assert!(rows.is_countable());
/// assert_eq!(rows.size(), Some(8));
/// assert!(rows.contains(&Value::Int(7)));
/// assert!(!rows.contains(&Value::None));
///
/// let nullable = rows.with_null();
/// assert_eq!(nullable.size(), Some(9));
/// assert!(nullable.contains(&Value::None));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ValueRange {
    /// An explicit, ordered collection of values.
    Values(Vec<Value>),
    /// Integers in `[from, to)`.
    IntRange { from: i64, to: i64 },
    /// A continuous interval `[from, to)`. Not countable.
    Continuous { from: f64, to: f64 },
    /// Wraps a range to additionally accept the unassigned sentinel.
    NullAllowing(Box<ValueRange>),
}

impl ValueRange {
    pub fn of(values: impl IntoIterator<Item = Value>) -> Self {
        ValueRange::Values(values.into_iter().collect())
    }

    pub fn int_range(from: i64, to: i64) -> Self {
        ValueRange::IntRange { from, to }
    }

    pub fn continuous(from: f64, to: f64) -> Self {
        ValueRange::Continuous { from, to }
    }

    /// Wraps this range so it also accepts [`Value::None`].
    pub fn with_null(self) -> Self {
        match self {
            ValueRange::NullAllowing(_) => self,
            other => ValueRange::NullAllowing(Box::new(other)),
        }
    }

    /// Returns true if the values can be enumerated.
    pub fn is_countable(&self) -> bool {
        match self {
            ValueRange::Values(_) | ValueRange::IntRange { .. } => true,
            ValueRange::Continuous { .. } => false,
            ValueRange::NullAllowing(inner) => inner.is_countable(),
        }
    }

    /// Number of values, or `None` when the range is not countable.
    pub fn size(&self) -> Option<usize> {
        match self {
            ValueRange::Values(values) => Some(values.len()),
            ValueRange::IntRange { from, to } => Some((*to - *from).max(0) as usize),
            ValueRange::Continuous { .. } => None,
            ValueRange::NullAllowing(inner) => inner.size().map(|size| size + 1),
        }
    }

    /// Returns true if the range holds no value at all.
    ///
    /// A continuous interval is empty when `from >= to`.
    pub fn is_empty(&self) -> bool {
        match self {
            ValueRange::Continuous { from, to } => from >= to,
            other => other.size() == Some(0),
        }
    }

    pub fn contains(&self, value: &Value) -> bool {
        match self {
            ValueRange::Values(values) => values.contains(value),
            ValueRange::IntRange { from, to } => {
                matches!(value, Value::Int(v) if *v >= *from && *v < *to)
            }
            ValueRange::Continuous { from, to } => match value {
                Value::Int(v) => (*v as f64) >= *from && (*v as f64) < *to,
                _ => false,
            },
            ValueRange::NullAllowing(inner) => value.is_none() || inner.contains(value),
        }
    }

    /// Iterates the values in their original order.
    ///
    /// Returns an empty iterator for a non-countable range; callers check
    /// [`ValueRange::is_countable`] first.
    pub fn iter(&self) -> Box<dyn Iterator<Item = Value> + '_> {
        match self {
            ValueRange::Values(values) => Box::new(values.iter().cloned()),
            ValueRange::IntRange { from, to } => Box::new((*from..*to).map(Value::Int)),
            ValueRange::Continuous { .. } => Box::new(std::iter::empty()),
            ValueRange::NullAllowing(inner) => {
                Box::new(std::iter::once(Value::None).chain(inner.iter()))
            }
        }
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueRange::Values(values) => write!(f, "{} values", values.len()),
            ValueRange::IntRange { from, to } => write!(f, "[{}, {})", from, to),
            ValueRange::Continuous { from, to } => write!(f, "[{}, {}) continuous", from, to),
            ValueRange::NullAllowing(inner) => write!(f, "{} or null", inner),
        }
    }
}
