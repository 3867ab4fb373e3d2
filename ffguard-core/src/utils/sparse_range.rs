//! Sparse integer sets
//!
//! A [`SparseRange`] is a union of exact points and closed intervals whose
//! bounds may be open-ended. The sample-rate fallback tables use it to express
//! both "exactly these rates" and "anything from 8000 Hz up".

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{FfguardError, Result};

/// One element of a [`SparseRange`]: an exact value or an interval.
///
/// In JSON a point is a bare integer and an interval is a two-element array
/// whose entries may be `null` for an unbounded end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Subrange {
    Point(i64),
    Interval(Option<i64>, Option<i64>),
}

impl Subrange {
    fn contains(&self, value: i64) -> bool {
        match *self {
            Subrange::Point(point) => point == value,
            Subrange::Interval(low, high) => {
                low.is_none_or(|low| low <= value) && high.is_none_or(|high| value <= high)
            }
        }
    }
}

/// Immutable set of points and intervals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Subrange>", into = "Vec<Subrange>")]
pub struct SparseRange {
    points: BTreeSet<i64>,
    intervals: BTreeSet<(Option<i64>, Option<i64>)>,
}

impl SparseRange {
    /// Builds a range from subranges, rejecting intervals whose lower bound
    /// is above the upper bound.
    pub fn new<I>(subranges: I) -> Result<Self>
    where
        I: IntoIterator<Item = Subrange>,
    {
        let mut range = SparseRange::default();
        for subrange in subranges {
            match subrange {
                Subrange::Point(point) => {
                    range.points.insert(point);
                }
                Subrange::Interval(Some(low), Some(high)) if low > high => {
                    return Err(FfguardError::InvalidArgument(format!(
                        "Invalid subrange: lower bound {low} is above upper bound {high}"
                    )));
                }
                Subrange::Interval(low, high) => {
                    range.intervals.insert((low, high));
                }
            }
        }
        Ok(range)
    }

    /// Builds a range containing exactly the given values.
    pub fn points<I>(values: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        SparseRange {
            points: values.into_iter().collect(),
            intervals: BTreeSet::new(),
        }
    }

    /// Builds a range containing every integer.
    pub fn unbounded() -> Self {
        SparseRange {
            points: BTreeSet::new(),
            intervals: BTreeSet::from([(None, None)]),
        }
    }

    /// Builds a range containing every integer from `low` up.
    pub fn at_least(low: i64) -> Self {
        SparseRange {
            points: BTreeSet::new(),
            intervals: BTreeSet::from([(Some(low), None)]),
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        self.points.contains(&value)
            || self
                .intervals
                .iter()
                .any(|&(low, high)| Subrange::Interval(low, high).contains(value))
    }

    pub fn subranges(&self) -> Vec<Subrange> {
        self.points
            .iter()
            .map(|&p| Subrange::Point(p))
            .chain(self.intervals.iter().map(|&(l, h)| Subrange::Interval(l, h)))
            .collect()
    }
}

impl TryFrom<Vec<Subrange>> for SparseRange {
    type Error = FfguardError;

    fn try_from(subranges: Vec<Subrange>) -> Result<Self> {
        SparseRange::new(subranges)
    }
}

impl From<SparseRange> for Vec<Subrange> {
    fn from(range: SparseRange) -> Self {
        range.subranges()
    }
}
