//! Text buffer abstraction and the rope-backed [`TextBuffer`].
//!
//! The toggling engine only talks to [`Buffer`]. Hosts with their own document model implement the
//! trait directly; everyone else can use [`TextBuffer`], which keeps a [`ropey::Rope`], tracks
//! range markers across edits and logs every edit as a [`TextDeltaEdit`].

use crate::delta::{TextDelta, TextDeltaEdit};
use crate::markers::{MarkerId, MarkerSet, RangeMarker};
use ropey::Rope;
use std::ops::Range;

/// Mutable character sequence with line indexing and offset-stable markers.
///
/// All offsets are character offsets. Line numbers are zero-based. After every mutation, line and
/// offset queries must reflect the new text.
pub trait Buffer {
    /// Total number of characters.
    fn len_chars(&self) -> usize;

    /// Number of lines (a trailing line break starts a final empty line).
    fn line_count(&self) -> usize;

    /// Offset of the first character of `line`.
    fn line_start_offset(&self, line: usize) -> usize;

    /// Offset just past the last character of `line`, excluding the line break.
    fn line_end_offset(&self, line: usize) -> usize;

    /// Line containing `offset` (offsets past the end map to the last line).
    fn line_of(&self, offset: usize) -> usize;

    /// Character at `offset`.
    fn char_at(&self, offset: usize) -> Option<char>;

    /// Text of `range` (clamped to the buffer).
    fn chars_at(&self, range: Range<usize>) -> String;

    /// Whole text.
    fn text(&self) -> String {
        self.chars_at(0..self.len_chars())
    }

    /// Insert `text` at `offset`.
    fn insert(&mut self, offset: usize, text: &str);

    /// Delete `[start, end)`.
    fn delete(&mut self, start: usize, end: usize);

    /// Replace `[start, end)` with `text`.
    fn replace(&mut self, start: usize, end: usize, text: &str) {
        self.delete(start, end);
        self.insert(start, text);
    }

    /// Start tracking `range`.
    fn create_range_marker(
        &mut self,
        range: Range<usize>,
        greedy_left: bool,
        greedy_right: bool,
    ) -> MarkerId;

    /// Current range of a live marker.
    fn marker_range(&self, marker: MarkerId) -> Option<Range<usize>>;

    /// Stop tracking a marker.
    fn release_marker(&mut self, marker: MarkerId);

    /// Hint that a long run of small edits follows.
    fn begin_bulk_update(&mut self) {}

    /// End of the run started by [`Buffer::begin_bulk_update`].
    fn end_bulk_update(&mut self) {}
}

/// Rope-backed [`Buffer`] implementation.
///
/// # Example
///
/// ```rust
/// use comment_core::{Buffer, TextBuffer};
///
/// let mut buffer = TextBuffer::new("a\nb\n");
/// buffer.insert(2, "//");
/// assert_eq!(buffer.text(), "a\n//b\n");
/// assert_eq!(buffer.line_count(), 3);
/// assert_eq!(buffer.line_end_offset(1), 5);
/// ```
#[derive(Debug, Default)]
pub struct TextBuffer {
    rope: Rope,
    markers: MarkerSet,
    log: Vec<TextDeltaEdit>,
    log_start_len: usize,
    bulk_depth: usize,
    bulk_sessions: usize,
}

impl TextBuffer {
    /// Create a buffer holding `text`.
    pub fn new(text: &str) -> Self {
        let rope = Rope::from_str(text);
        let log_start_len = rope.len_chars();
        Self {
            rope,
            log_start_len,
            ..Self::default()
        }
    }

    /// Edits recorded since the last call, as one delta.
    pub fn take_delta(&mut self) -> TextDelta {
        let edits = std::mem::take(&mut self.log);
        let delta = TextDelta {
            before_char_count: self.log_start_len,
            after_char_count: self.rope.len_chars(),
            edits,
        };
        self.log_start_len = self.rope.len_chars();
        delta
    }

    /// Apply a recorded edit (used for undo/redo). The edit is logged like any other.
    pub fn apply_edit(&mut self, edit: &TextDeltaEdit) {
        let end = edit.end();
        if edit.inserted_text.is_empty() {
            self.delete(edit.start, end);
        } else {
            self.replace(edit.start, end, &edit.inserted_text);
        }
    }

    /// Returns `true` while a bulk update is open.
    pub fn is_in_bulk_update(&self) -> bool {
        self.bulk_depth > 0
    }

    /// Number of bulk updates started so far.
    pub fn bulk_update_count(&self) -> usize {
        self.bulk_sessions
    }

    /// Number of live markers.
    pub fn marker_count(&self) -> usize {
        self.markers.live_count()
    }

    fn clamp(&self, offset: usize) -> usize {
        offset.min(self.rope.len_chars())
    }

    fn record(&mut self, start: usize, deleted_text: String, inserted_text: &str) {
        tracing::trace!(
            start,
            deleted = deleted_text.as_str(),
            inserted = inserted_text,
            "buffer edit"
        );
        self.log.push(TextDeltaEdit {
            start,
            deleted_text,
            inserted_text: inserted_text.to_string(),
        });
    }
}

impl Buffer for TextBuffer {
    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn line_start_offset(&self, line: usize) -> usize {
        if line >= self.rope.len_lines() {
            return self.rope.len_chars();
        }
        self.rope.line_to_char(line)
    }

    fn line_end_offset(&self, line: usize) -> usize {
        if line >= self.rope.len_lines() {
            return self.rope.len_chars();
        }
        let start = self.rope.line_to_char(line);
        let mut end = if line + 1 < self.rope.len_lines() {
            self.rope.line_to_char(line + 1)
        } else {
            self.rope.len_chars()
        };

        if end > start && self.rope.char(end - 1) == '\n' {
            end -= 1;
            if end > start && self.rope.char(end - 1) == '\r' {
                end -= 1;
            }
        } else if end > start && line + 1 < self.rope.len_lines() {
            // Any other single-char break recognised by the rope (`\r`, U+2028, ...).
            end -= 1;
        }
        end
    }

    fn line_of(&self, offset: usize) -> usize {
        self.rope.char_to_line(self.clamp(offset))
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        (offset < self.rope.len_chars()).then(|| self.rope.char(offset))
    }

    fn chars_at(&self, range: Range<usize>) -> String {
        let start = self.clamp(range.start);
        let end = self.clamp(range.end).max(start);
        self.rope.slice(start..end).to_string()
    }

    fn insert(&mut self, offset: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        let offset = self.clamp(offset);
        self.rope.insert(offset, text);
        self.markers
            .update_for_insertion(offset, text.chars().count());
        self.record(offset, String::new(), text);
    }

    fn delete(&mut self, start: usize, end: usize) {
        let start = self.clamp(start);
        let end = self.clamp(end);
        if start >= end {
            return;
        }
        let deleted = self.rope.slice(start..end).to_string();
        self.rope.remove(start..end);
        self.markers.update_for_deletion(start, end);
        self.record(start, deleted, "");
    }

    fn replace(&mut self, start: usize, end: usize, text: &str) {
        let start = self.clamp(start);
        let end = self.clamp(end).max(start);
        let deleted = self.rope.slice(start..end).to_string();
        if start < end {
            self.rope.remove(start..end);
            self.markers.update_for_deletion(start, end);
        }
        if !text.is_empty() {
            self.rope.insert(start, text);
            self.markers
                .update_for_insertion(start, text.chars().count());
        }
        if !deleted.is_empty() || !text.is_empty() {
            self.record(start, deleted, text);
        }
    }

    fn create_range_marker(
        &mut self,
        range: Range<usize>,
        greedy_left: bool,
        greedy_right: bool,
    ) -> MarkerId {
        let start = self.clamp(range.start);
        let end = self.clamp(range.end).max(start);
        let mut marker = RangeMarker::new(start..end);
        marker.greedy_left = greedy_left;
        marker.greedy_right = greedy_right;
        self.markers.create(marker)
    }

    fn marker_range(&self, marker: MarkerId) -> Option<Range<usize>> {
        self.markers.get(marker).map(RangeMarker::range)
    }

    fn release_marker(&mut self, marker: MarkerId) {
        self.markers.release(marker);
    }

    fn begin_bulk_update(&mut self) {
        if self.bulk_depth == 0 {
            self.bulk_sessions += 1;
            tracing::debug!("bulk update started");
        }
        self.bulk_depth += 1;
    }

    fn end_bulk_update(&mut self) {
        self.bulk_depth = self.bulk_depth.saturating_sub(1);
    }
}

/// Run `f` inside a bulk update when `enabled`.
pub(crate) fn in_bulk<T>(
    buffer: &mut dyn Buffer,
    enabled: bool,
    f: impl FnOnce(&mut dyn Buffer) -> T,
) -> T {
    if enabled {
        buffer.begin_bulk_update();
    }
    let result = f(&mut *buffer);
    if enabled {
        buffer.end_bulk_update();
    }
    result
}
