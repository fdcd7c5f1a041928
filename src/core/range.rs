//! Half-open byte intervals over a single source snapshot.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::core::error::RangeError;

/// `[start, stop)` in byte offsets.
///
/// The fields are public for pattern matching and literal construction.
/// A range built by hand is unchecked until [`Range::validate`] accepts it;
/// the resolver and the CLI validate every range they receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: usize,
    pub stop: usize,
}

impl Range {
    /// Build a range, rejecting inverted offsets.
    pub fn new(start: usize, stop: usize) -> Result<Self, RangeError> {
        if start > stop {
            return Err(RangeError::Inverted { start, stop });
        }
        Ok(Self { start, stop })
    }

    /// Empty range at `offset`.
    pub fn point(offset: usize) -> Self {
        Self {
            start: offset,
            stop: offset,
        }
    }

    /// Build a range and check it against `source` in one step.
    pub fn checked(start: usize, stop: usize, source: &str) -> Result<Self, RangeError> {
        let range = Self::new(start, stop)?;
        range.validate(source)?;
        Ok(range)
    }

    /// Fail unless the range is ordered, inside `source` and on char
    /// boundaries.
    pub fn validate(&self, source: &str) -> Result<(), RangeError> {
        if self.start > self.stop {
            return Err(RangeError::Inverted {
                start: self.start,
                stop: self.stop,
            });
        }
        if self.stop > source.len() {
            return Err(RangeError::InvalidRange {
                start: self.start,
                stop: self.stop,
                len: source.len(),
            });
        }
        for offset in [self.start, self.stop] {
            if !source.is_char_boundary(offset) {
                return Err(RangeError::NotCharBoundary { offset });
            }
        }
        Ok(())
    }

    pub fn length(&self) -> usize {
        self.stop - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.stop
    }

    /// `start <= offset < stop`
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.stop
    }

    /// Whether `self` lies entirely within `outer`.
    pub fn inside(&self, outer: &Range) -> bool {
        outer.start <= self.start && self.stop <= outer.stop
    }

    /// True when the ranges share at least one byte.
    pub fn overlaps(&self, other: &Range) -> bool {
        self.stop.min(other.stop) > self.start.max(other.start)
    }

    /// Slice `source` by this range. Callers validate first.
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.stop]
    }

    /// Shift both ends by a signed delta, saturating at zero.
    pub fn shifted(&self, delta: isize) -> Self {
        Self {
            start: self.start.saturating_add_signed(delta),
            stop: self.stop.saturating_add_signed(delta),
        }
    }
}

/// Preorder: outer ranges before the ranges nested inside them.
pub fn preorder(a: &Range, b: &Range) -> Ordering {
    a.start.cmp(&b.start).then(b.stop.cmp(&a.stop))
}

/// Sort ranges so that every range precedes the ranges it contains.
pub fn sort_preorder(ranges: &mut [Range]) {
    ranges.sort_by(preorder);
}

impl std::fmt::Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.stop)
    }
}
