//! Immutable edit list with a tracked cursor.
//!
//! A `Diff` is a base source plus one or more layers of changes. Each layer
//! holds non-overlapping changes against the text produced by the layers
//! before it, sorted ascending by `(start, stop)`; `then` stacks the layers of
//! a diff computed against an already-materialized source on top of ours.
//!
//! Materializing applies each layer right-to-left, so offsets inside a layer
//! always refer to that layer's input text.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::core::error::RangeError;
use crate::core::range::Range;

/// One replacement against the text a layer starts from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub range: Range,
    pub substitution: String,
}

impl Change {
    fn delta(&self) -> isize {
        self.substitution.len() as isize - self.range.length() as isize
    }

    /// Two changes conflict when they share a byte, or when an insertion
    /// point falls strictly inside the other's replaced span.
    fn conflicts(&self, range: &Range) -> bool {
        let strictly_inside = |point: &Range, outer: &Range| {
            point.is_empty() && outer.start < point.start && point.start < outer.stop
        };
        self.range.overlaps(range)
            || strictly_inside(&self.range, range)
            || strictly_inside(range, &self.range)
    }
}

#[derive(Debug, Clone)]
pub struct Diff {
    initial: String,
    cursor: usize,
    layers: Vec<Vec<Change>>,
}

impl Diff {
    pub fn from_initial_state(source: impl Into<String>, cursor: usize) -> Self {
        Self {
            initial: source.into(),
            cursor,
            layers: vec![Vec::new()],
        }
    }

    pub fn initial_source(&self) -> &str {
        &self.initial
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Every change, layer by layer, each layer in ascending order.
    pub fn changes(&self) -> impl Iterator<Item = &Change> {
        self.layers.iter().flatten()
    }

    pub fn layers(&self) -> &[Vec<Change>] {
        &self.layers
    }

    /// The fully materialized source. Pure; calling it repeatedly is cheap
    /// enough for request-sized sources and always yields the same text.
    pub fn source(&self) -> String {
        self.materialize(self.layers.len()).into_owned()
    }

    fn materialize(&self, layer_count: usize) -> Cow<'_, str> {
        let mut text = Cow::Borrowed(self.initial.as_str());
        for layer in &self.layers[..layer_count] {
            if layer.is_empty() {
                continue;
            }
            let mut out = text.into_owned();
            for change in layer.iter().rev() {
                out.replace_range(change.range.start..change.range.stop, &change.substitution);
            }
            text = Cow::Owned(out);
        }
        text
    }

    pub fn insert(&self, index: usize, text: &str) -> Result<Diff, RangeError> {
        self.replace_range(Range::point(index), text)
    }

    pub fn insert_and_move_cursor_to_stop(&self, index: usize, text: &str) -> Result<Diff, RangeError> {
        self.replace_range_and_move_cursor_to_stop(Range::point(index), text)
    }

    pub fn move_cursor(&self, cursor: usize) -> Diff {
        Diff {
            cursor,
            ..self.clone()
        }
    }

    /// Add a change to the newest layer and carry the cursor through it.
    ///
    /// The cursor shifts by the change's length delta when the change ends at
    /// or before it; a cursor inside the replaced span keeps its offset from
    /// the span start, capped at the substitution length.
    pub fn replace_range(&self, range: Range, substitution: &str) -> Result<Diff, RangeError> {
        let (diff, _) = self.add_change(range, substitution)?;
        Ok(diff)
    }

    pub fn replace_range_and_move_cursor_to_stop(
        &self,
        range: Range,
        substitution: &str,
    ) -> Result<Diff, RangeError> {
        let (diff, mapped) = self.add_change(range, substitution)?;
        Ok(diff.move_cursor(mapped.start + substitution.len()))
    }

    /// Replace the entire text the newest layer starts from.
    pub fn replace_source(&self, source: &str) -> Result<Diff, RangeError> {
        let base_len = self.materialize(self.layers.len() - 1).len();
        self.replace_range(
            Range {
                start: 0,
                stop: base_len,
            },
            source,
        )
    }

    /// Compose with a diff computed against our materialized source.
    /// Later changes land on `remaining`'s layer.
    pub fn then(&self, remaining: &Diff) -> Diff {
        let mut layers = self.layers.clone();
        layers.extend(remaining.layers.iter().filter(|l| !l.is_empty()).cloned());
        Diff {
            initial: self.initial.clone(),
            cursor: remaining.cursor,
            layers,
        }
    }

    /// Snapshot the current source and cursor as a fresh base.
    pub fn without_changes(&self) -> Diff {
        Diff::from_initial_state(self.source(), self.cursor)
    }

    /// Returns the new diff and the change's range in current coordinates.
    fn add_change(&self, range: Range, substitution: &str) -> Result<(Diff, Range), RangeError> {
        let top = self.layers.len() - 1;
        range.validate(&self.materialize(top))?;

        // no-op changes never enter the list
        if substitution.is_empty() && range.is_empty() {
            return Ok((self.clone(), range));
        }

        let layer = &self.layers[top];
        if let Some(existing) = layer.iter().find(|c| c.conflicts(&range)) {
            return Err(RangeError::Overlapping {
                new: range.to_string(),
                existing: existing.range.to_string(),
            });
        }

        let change = Change {
            range,
            substitution: substitution.to_string(),
        };

        // Changes ending at or before our start already moved our text.
        let before: isize = layer
            .iter()
            .filter(|c| c.range.stop <= range.start)
            .map(Change::delta)
            .sum();
        let mapped = range.shifted(before);

        let mut cursor = self.cursor;
        if mapped.stop <= cursor {
            cursor = cursor.saturating_add_signed(change.delta());
        } else if mapped.start < cursor && cursor < mapped.stop {
            cursor = mapped.start + (cursor - mapped.start).min(substitution.len());
        }

        let mut layers = self.layers.clone();
        let layer = &mut layers[top];
        // stable: equal keys keep insertion order
        let at = layer.partition_point(|c| (c.range.start, c.range.stop) <= (range.start, range.stop));
        layer.insert(at, change);

        Ok((
            Diff {
                initial: self.initial.clone(),
                cursor,
                layers,
            },
            mapped,
        ))
    }
}

impl PartialEq for Diff {
    fn eq(&self, other: &Self) -> bool {
        self.cursor == other.cursor && self.source() == other.source()
    }
}

impl Eq for Diff {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn r(start: usize, stop: usize) -> Range {
        Range::new(start, stop).unwrap()
    }

    #[test]
    fn test_replace_before_cursor_shifts_cursor() {
        let diff = Diff::from_initial_state("abc", 3)
            .replace_range(r(1, 2), "XY")
            .unwrap();
        assert_eq!(diff.source(), "aXYc");
        assert_eq!(diff.cursor(), 4);
    }

    #[test]
    fn test_changes_stay_sorted_and_apply_against_original() {
        let diff = Diff::from_initial_state("hello world", 0)
            .replace_range(r(6, 11), "there")
            .unwrap()
            .replace_range(r(0, 5), "hi")
            .unwrap();
        assert_eq!(diff.source(), "hi there");
        let starts: Vec<usize> = diff.changes().map(|c| c.range.start).collect();
        assert_eq!(starts, vec![0, 6]);
    }

    #[test]
    fn test_noop_changes_are_dropped() {
        let diff = Diff::from_initial_state("abc", 1).insert(2, "").unwrap();
        assert_eq!(diff.changes().count(), 0);
        assert_eq!(diff.source(), "abc");
    }

    #[test]
    fn test_cursor_inside_replacement_is_capped() {
        let diff = Diff::from_initial_state("abcdef", 4)
            .replace_range(r(1, 5), "X")
            .unwrap();
        assert_eq!(diff.source(), "aXf");
        assert_eq!(diff.cursor(), 2);

        let diff = Diff::from_initial_state("abcdef", 2)
            .replace_range(r(1, 5), "WXYZ")
            .unwrap();
        assert_eq!(diff.cursor(), 2);
    }

    #[test]
    fn test_cursor_before_change_is_untouched() {
        let diff = Diff::from_initial_state("abcdef", 1)
            .replace_range(r(3, 4), "long text")
            .unwrap();
        assert_eq!(diff.cursor(), 1);
    }

    #[test]
    fn test_insertions_at_same_point_keep_order() {
        let diff = Diff::from_initial_state("ac", 0)
            .insert(1, "b")
            .unwrap()
            .insert(1, "B")
            .unwrap();
        assert_eq!(diff.source(), "abBc");
    }

    #[test]
    fn test_overlap_is_rejected() {
        let diff = Diff::from_initial_state("abcdef", 0)
            .replace_range(r(1, 4), "x")
            .unwrap();
        assert!(matches!(
            diff.replace_range(r(3, 5), "y"),
            Err(RangeError::Overlapping { .. })
        ));
        assert!(matches!(
            diff.insert(2, "y"),
            Err(RangeError::Overlapping { .. })
        ));
        // touching at the boundary is fine
        assert_eq!(diff.insert(4, "y").unwrap().source(), "axyef");
    }

    #[test]
    fn test_out_of_bounds_is_rejected() {
        let diff = Diff::from_initial_state("abc", 0);
        assert!(matches!(
            diff.replace_range(r(2, 9), "x"),
            Err(RangeError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_move_cursor_to_stop() {
        let diff = Diff::from_initial_state("ab cd", 0)
            .replace_range(r(0, 2), "xyz")
            .unwrap()
            .replace_range_and_move_cursor_to_stop(r(3, 5), "uv")
            .unwrap();
        assert_eq!(diff.source(), "xyz uv");
        assert_eq!(diff.cursor(), 6);

        let diff = Diff::from_initial_state("ab", 0)
            .insert_and_move_cursor_to_stop(1, "__")
            .unwrap();
        assert_eq!(diff.cursor(), 3);
    }

    #[test]
    fn test_then_composes_second_pass() {
        let first = Diff::from_initial_state("let x = 1;", 0)
            .replace_range(r(4, 5), "value")
            .unwrap();
        assert_eq!(first.source(), "let value = 1;");

        // offsets here refer to the first pass's output
        let second = first
            .without_changes()
            .replace_range_and_move_cursor_to_stop(r(12, 13), "42")
            .unwrap();
        let composed = first.then(&second);

        assert_eq!(composed.source(), "let value = 42;");
        assert_eq!(composed.cursor(), 14);
        assert_eq!(composed.initial_source(), "let x = 1;");

        // further changes use the second pass's coordinates
        let more = composed.insert(0, "// ").unwrap();
        assert_eq!(more.source(), "// let value = 42;");
    }

    #[test]
    fn test_replace_source_and_equality() {
        let a = Diff::from_initial_state("abc", 0).replace_source("xyz").unwrap();
        let b = Diff::from_initial_state("q", 0).replace_range(r(0, 1), "xyz").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.source(), a.source());
        assert_ne!(a, b.move_cursor(1));
    }

    fn disjoint_edits() -> impl Strategy<Value = (usize, Vec<(usize, usize, String)>)> {
        // Carve a 40-byte source into slots; each slot holds at most one edit.
        (
            0usize..=40,
            proptest::collection::vec((any::<bool>(), 0usize..4, 0usize..4, "[a-z]{0,6}"), 8),
        )
            .prop_map(|(cursor, slots)| {
                let edits = slots
                    .into_iter()
                    .enumerate()
                    .filter(|(_, (keep, ..))| *keep)
                    .map(|(i, (_, off, len, text))| {
                        let start = i * 5 + off;
                        let stop = (start + len).min(i * 5 + 4);
                        (start, stop, text)
                    })
                    .filter(|(start, stop, _)| !(*start < cursor && cursor < *stop))
                    .collect();
                (cursor, edits)
            })
    }

    proptest! {
        #[test]
        fn prop_cursor_is_order_independent((cursor, edits) in disjoint_edits(), rotate in 0usize..8) {
            let source = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMN";
            let apply = |edits: &[(usize, usize, String)]| {
                edits.iter().fold(Diff::from_initial_state(source, cursor), |d, (s, e, t)| {
                    d.replace_range(Range::new(*s, *e).unwrap(), t).unwrap()
                })
            };

            let forward = apply(&edits);
            let mut shuffled = edits.clone();
            shuffled.reverse();
            if !shuffled.is_empty() {
                let k = rotate % shuffled.len();
                shuffled.rotate_left(k);
            }
            let other = apply(&shuffled);

            let expected = edits
                .iter()
                .filter(|(_, e, _)| *e <= cursor)
                .fold(cursor as isize, |c, (s, e, t)| c + t.len() as isize - (e - s) as isize);

            prop_assert_eq!(forward.source(), other.source());
            prop_assert_eq!(forward.cursor(), other.cursor());
            prop_assert_eq!(forward.cursor() as isize, expected);
        }
    }
}
