//! Offset-stable range markers.
//!
//! A marker is a `[start, end)` character range that follows the text it was created on:
//! inserting or deleting text before or inside the range shifts or resizes it.

use std::ops::Range;

/// Handle of a marker owned by a [`crate::Buffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerId(pub(crate) usize);

/// A tracked range.
///
/// Greediness controls insertion exactly at a boundary:
/// - `greedy_left`: text inserted at `start` becomes part of the range (start stays).
/// - `greedy_right`: text inserted at `end` becomes part of the range (end moves).
///
/// An empty, non-greedy marker behaves like a caret: text inserted at its position pushes it right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeMarker {
    /// Start offset (inclusive).
    pub start: usize,
    /// End offset (exclusive).
    pub end: usize,
    /// Expand to the left on insertion at `start`.
    pub greedy_left: bool,
    /// Expand to the right on insertion at `end`.
    pub greedy_right: bool,
}

impl RangeMarker {
    /// Create a non-greedy marker.
    pub fn new(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end.max(range.start),
            greedy_left: false,
            greedy_right: false,
        }
    }

    /// Current range.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Update offsets for `len` characters inserted at `pos`.
    pub fn update_for_insertion(&mut self, pos: usize, len: usize) {
        let was_empty = self.start == self.end;
        let start_before = self.start;

        if pos < self.start || (pos == self.start && !self.greedy_left) {
            self.start += len;
        }

        let push_end = pos < self.end
            || (pos == self.end
                && (self.greedy_right || (was_empty && pos == start_before && !self.greedy_left)));
        if push_end {
            self.end += len;
        }
        self.end = self.end.max(self.start);
    }

    /// Update offsets for the deletion of `[start, end)`.
    pub fn update_for_deletion(&mut self, start: usize, end: usize) {
        let shift = |x: usize| {
            if x >= end {
                x - (end - start)
            } else if x > start {
                start
            } else {
                x
            }
        };
        self.start = shift(self.start);
        self.end = shift(self.end);
    }
}

/// Marker storage with stable ids. Released slots are reused.
#[derive(Debug, Default)]
pub(crate) struct MarkerSet {
    slots: Vec<Option<RangeMarker>>,
    free: Vec<usize>,
}

impl MarkerSet {
    pub(crate) fn create(&mut self, marker: RangeMarker) -> MarkerId {
        if let Some(idx) = self.free.pop() {
            self.slots[idx] = Some(marker);
            MarkerId(idx)
        } else {
            self.slots.push(Some(marker));
            MarkerId(self.slots.len() - 1)
        }
    }

    pub(crate) fn get(&self, id: MarkerId) -> Option<&RangeMarker> {
        self.slots.get(id.0).and_then(|m| m.as_ref())
    }

    pub(crate) fn release(&mut self, id: MarkerId) {
        if let Some(slot) = self.slots.get_mut(id.0)
            && slot.take().is_some()
        {
            self.free.push(id.0);
        }
    }

    pub(crate) fn live_count(&self) -> usize {
        self.slots.iter().filter(|m| m.is_some()).count()
    }

    pub(crate) fn update_for_insertion(&mut self, pos: usize, len: usize) {
        for marker in self.slots.iter_mut().flatten() {
            marker.update_for_insertion(pos, len);
        }
    }

    pub(crate) fn update_for_deletion(&mut self, start: usize, end: usize) {
        for marker in self.slots.iter_mut().flatten() {
            marker.update_for_deletion(start, end);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_before_and_inside() {
        let mut m = RangeMarker::new(10..20);
        m.update_for_insertion(5, 3);
        assert_eq!(m.range(), 13..23);
        m.update_for_insertion(15, 2);
        assert_eq!(m.range(), 13..25);
        m.update_for_insertion(30, 2);
        assert_eq!(m.range(), 13..25);
    }

    #[test]
    fn test_insertion_at_boundaries_respects_greediness() {
        let mut m = RangeMarker::new(10..20);
        m.update_for_insertion(10, 2);
        m.update_for_insertion(22, 2);
        assert_eq!(m.range(), 12..22);

        let mut g = RangeMarker::new(10..20);
        g.greedy_left = true;
        g.greedy_right = true;
        g.update_for_insertion(10, 2);
        g.update_for_insertion(22, 2);
        assert_eq!(g.range(), 10..24);
    }

    #[test]
    fn test_empty_marker_moves_like_a_caret() {
        let mut m = RangeMarker::new(4..4);
        m.update_for_insertion(4, 2);
        assert_eq!(m.range(), 6..6);
        m.update_for_insertion(7, 1);
        assert_eq!(m.range(), 6..6);
    }

    #[test]
    fn test_deletion() {
        let mut m = RangeMarker::new(10..20);
        m.update_for_deletion(0, 5);
        assert_eq!(m.range(), 5..15);
        m.update_for_deletion(3, 8);
        assert_eq!(m.range(), 3..10);
        m.update_for_deletion(8, 12);
        assert_eq!(m.range(), 3..8);
        m.update_for_deletion(0, 20);
        assert_eq!(m.range(), 0..0);
    }

    #[test]
    fn test_marker_set_reuses_slots() {
        let mut set = MarkerSet::default();
        let a = set.create(RangeMarker::new(0..1));
        let b = set.create(RangeMarker::new(1..2));
        set.release(a);
        assert!(set.get(a).is_none());
        let c = set.create(RangeMarker::new(5..6));
        assert_eq!(c, a);
        assert_eq!(set.live_count(), 2);
        assert_eq!(set.get(b).unwrap().range(), 1..2);
    }
}
