//! Edit log entries.
//!
//! Every mutation a [`crate::TextBuffer`] performs is recorded as a [`TextDeltaEdit`] in
//! **character offsets**. Hosts replay the log to mirror a toggle into their own document; the
//! command executor inverts it for undo and rollback, and offset-keyed models (folds, language
//! spans) use [`TextDeltaEdit::map_offset`] to follow it.

/// Which side an offset sticks to when text is inserted exactly at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    /// Stay before the inserted text.
    Left,
    /// Move past the inserted text.
    Right,
}

/// One replacement: `deleted_text` at `start` became `inserted_text`.
///
/// `start` is relative to the document as it was right before this edit. Edits of a
/// [`TextDelta`] apply in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDeltaEdit {
    /// Character offset of the edit.
    pub start: usize,
    /// Removed text (may be empty).
    pub deleted_text: String,
    /// Added text (may be empty).
    pub inserted_text: String,
}

impl TextDeltaEdit {
    /// Removed characters.
    pub fn deleted_len(&self) -> usize {
        self.deleted_text.chars().count()
    }

    /// Added characters.
    pub fn inserted_len(&self) -> usize {
        self.inserted_text.chars().count()
    }

    /// End of the removed range, before the edit.
    pub fn end(&self) -> usize {
        self.start.saturating_add(self.deleted_len())
    }

    /// The edit that reverts `self`.
    pub fn inverted(&self) -> TextDeltaEdit {
        TextDeltaEdit {
            start: self.start,
            deleted_text: self.inserted_text.clone(),
            inserted_text: self.deleted_text.clone(),
        }
    }

    /// Where `offset` ends up after this edit.
    ///
    /// Offsets inside the removed text collapse to `start`. An offset at `start` moves past the
    /// inserted text only with [`Bias::Right`].
    pub fn map_offset(&self, offset: usize, bias: Bias) -> usize {
        let end = self.end();
        let offset = if offset >= end {
            offset - self.deleted_len()
        } else {
            offset.min(self.start)
        };
        let inserted = self.inserted_len();
        if offset > self.start || (offset == self.start && bias == Bias::Right) {
            offset + inserted
        } else {
            offset
        }
    }
}

/// All edits of one operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextDelta {
    /// Buffer length before the first edit.
    pub before_char_count: usize,
    /// Buffer length after the last edit.
    pub after_char_count: usize,
    /// Edits in application order.
    pub edits: Vec<TextDeltaEdit>,
}

impl TextDelta {
    /// Returns `true` if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Edits that revert this delta, in application order.
    pub fn inverted_edits(&self) -> Vec<TextDeltaEdit> {
        self.edits
            .iter()
            .rev()
            .map(TextDeltaEdit::inverted)
            .collect()
    }
}
