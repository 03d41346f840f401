//! Error types.

use std::ops::Range;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Fatal toggle failures.
///
/// A toggle that returns one of these may have edited the buffer partway; callers are expected to
/// roll the edits back (see [`crate::CommandExecutor`]).
pub enum ToggleError {
    #[error("malformed commenter: {0}")]
    /// The commenter's tokens are inconsistent.
    MalformedCommenter(String),

    #[error("line {line} was detected as commented but does not start with '{prefix}'")]
    /// A line cached as commented no longer carries its prefix.
    PrefixMismatch {
        /// Zero-based line index.
        line: usize,
        /// The expected prefix.
        prefix: String,
    },

    #[error("caret offset {offset} is out of bounds (buffer length {len})")]
    /// A caret or selection offset lies past the end of the buffer.
    InvalidOffset {
        /// The offending offset.
        offset: usize,
        /// Buffer length in characters.
        len: usize,
    },

    #[error("selection {start}..{end} ends before it starts")]
    /// A caret's selection range is reversed.
    ReversedSelection {
        /// Selection start.
        start: usize,
        /// Selection end.
        end: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Non-fatal conditions reported by a toggle.
///
/// Apart from [`ToggleWarning::NestedCommentsWrapped`], the block or range that produced a warning
/// is left unmodified.
pub enum ToggleWarning {
    #[error("commenting at offset {offset} would break an existing comment")]
    /// A boundary of the range lies inside an existing comment.
    IntersectsExistingComment {
        /// The boundary offset.
        offset: usize,
    },

    #[error("comment suffix at offset {offset} does not close any comment")]
    /// The range contains a stray block comment suffix.
    UnmatchedSuffix {
        /// Offset of the suffix.
        offset: usize,
    },

    #[error("{count} nested comment(s) wrapped, the first at offset {offset}")]
    /// Existing block comments were wrapped by the new one.
    NestedCommentsWrapped {
        /// Number of nested comments.
        count: usize,
        /// Offset of the first nested comment.
        offset: usize,
    },

    #[error("custom uncommenter could not uncomment {range:?}")]
    /// A custom uncommenter reported a commented range but nothing to delete.
    CustomUncommenterFailed {
        /// The reported range.
        range: Range<usize>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors returned by [`crate::CommandExecutor::execute`].
pub enum CommandError {
    #[error(transparent)]
    /// The toggle failed and was rolled back.
    Toggle(#[from] ToggleError),

    #[error("invalid range {start}..{end} (buffer length {len})")]
    /// An edit command addressed text outside the buffer.
    InvalidRange {
        /// Range start.
        start: usize,
        /// Range end.
        end: usize,
        /// Buffer length in characters.
        len: usize,
    },

    #[error("nothing to undo")]
    /// The undo stack is empty.
    NothingToUndo,

    #[error("nothing to redo")]
    /// The redo stack is empty.
    NothingToRedo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_locations() {
        let warning = ToggleWarning::IntersectsExistingComment { offset: 7 };
        assert_eq!(
            warning.to_string(),
            "commenting at offset 7 would break an existing comment"
        );
        let err: CommandError = ToggleError::PrefixMismatch {
            line: 3,
            prefix: "//".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "line 3 was detected as commented but does not start with '//'"
        );
    }
}
