//! Carets and caret tracking across edits.

use crate::buffer::Buffer;
use crate::markers::MarkerId;
use std::ops::Range;

/// A caret: an offset plus an optional selection `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caret {
    /// Caret offset (character offset).
    pub offset: usize,
    /// Selected range, if any. Never empty.
    pub selection: Option<Range<usize>>,
}

impl Caret {
    /// A caret without selection.
    pub fn at(offset: usize) -> Self {
        Self {
            offset,
            selection: None,
        }
    }

    /// A caret selecting `range`, positioned at its end.
    pub fn with_selection(range: Range<usize>) -> Self {
        let mut caret = Self::at(range.end);
        caret.set_selection(range);
        caret
    }

    /// Returns `true` if the caret has a non-empty selection.
    pub fn has_selection(&self) -> bool {
        self.selection.is_some()
    }

    /// Selection start, or the caret offset when nothing is selected.
    pub fn selection_start(&self) -> usize {
        self.selection.as_ref().map_or(self.offset, |s| s.start)
    }

    /// Selection end, or the caret offset when nothing is selected.
    pub fn selection_end(&self) -> usize {
        self.selection.as_ref().map_or(self.offset, |s| s.end)
    }

    /// `selection_start()..selection_end()`.
    pub fn selection_range(&self) -> Range<usize> {
        self.selection_start()..self.selection_end()
    }

    /// Move the caret. The selection is kept.
    pub fn move_to(&mut self, offset: usize) {
        self.offset = offset;
    }

    /// Replace the selection. An empty range clears it. The caret offset is kept.
    pub fn set_selection(&mut self, range: Range<usize>) {
        self.selection = (range.start < range.end).then_some(range);
    }

    /// Drop the selection.
    pub fn remove_selection(&mut self) {
        self.selection = None;
    }
}

/// Sort carets by position, merge overlapping selections and drop duplicates.
pub fn normalize_carets(mut carets: Vec<Caret>) -> Vec<Caret> {
    carets.sort_by(|a, b| {
        a.selection_start()
            .cmp(&b.selection_start())
            .then_with(|| a.selection_end().cmp(&b.selection_end()))
            .then_with(|| a.offset.cmp(&b.offset))
    });

    let mut merged: Vec<Caret> = Vec::with_capacity(carets.len());
    for caret in carets {
        let Some(last) = merged.last_mut() else {
            merged.push(caret);
            continue;
        };

        if caret.selection_start() < last.selection_end() {
            let start = last.selection_start().min(caret.selection_start());
            let end = last.selection_end().max(caret.selection_end());
            *last = Caret::with_selection(start..end);
        } else if caret.selection_range() == last.selection_range() {
            continue;
        } else {
            merged.push(caret);
        }
    }
    merged
}

/// Markers that carry carets through buffer edits.
#[derive(Debug, Default)]
pub(crate) struct CaretTracker {
    anchors: Vec<(MarkerId, Option<MarkerId>)>,
}

impl CaretTracker {
    pub(crate) fn track(buffer: &mut dyn Buffer, carets: &[Caret]) -> Self {
        let anchors = carets
            .iter()
            .map(|caret| {
                let at = buffer.create_range_marker(caret.offset..caret.offset, false, false);
                let selection = caret
                    .selection
                    .clone()
                    .map(|range| buffer.create_range_marker(range, false, false));
                (at, selection)
            })
            .collect();
        Self { anchors }
    }

    /// Copy tracked positions back into `carets`.
    pub(crate) fn sync(&self, buffer: &dyn Buffer, carets: &mut [Caret]) {
        for ((at, selection), caret) in self.anchors.iter().zip(carets.iter_mut()) {
            if let Some(range) = buffer.marker_range(*at) {
                caret.offset = range.start;
            }
            if let Some(marker) = selection {
                match buffer.marker_range(*marker) {
                    Some(range) => caret.set_selection(range),
                    None => caret.remove_selection(),
                }
            }
        }
    }

    pub(crate) fn release(self, buffer: &mut dyn Buffer) {
        for (at, selection) in self.anchors {
            buffer.release_marker(at);
            if let Some(marker) = selection {
                buffer.release_marker(marker);
            }
        }
    }
}
