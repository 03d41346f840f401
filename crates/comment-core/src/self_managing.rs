//! Protocol for languages that implement comment toggling themselves.
//!
//! A [`SelfManagingCommenter`] takes over every text decision for its language: the engine still
//! groups carets into blocks and repositions carets afterwards, but which lines count as
//! commented and what gets inserted or removed is entirely up to the implementation.
//!
//! Each toggle creates one [`CommenterState`] per block (line comments) or per range (block
//! comments) and passes that same value to every subsequent call of the operation.

use crate::buffer::Buffer;
use std::any::Any;
use std::fmt;
use std::ops::Range;

/// Opaque per-operation state owned by a [`SelfManagingCommenter`].
#[derive(Default)]
pub struct CommenterState(Option<Box<dyn Any>>);

impl CommenterState {
    /// Wrap a value.
    pub fn new<T: Any>(value: T) -> Self {
        Self(Some(Box::new(value)))
    }

    /// The sentinel used when a commenter returns no state.
    pub fn empty() -> Self {
        Self(None)
    }

    /// Returns `true` for the empty sentinel.
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Borrow the wrapped value as `T`.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.0.as_ref()?.downcast_ref()
    }

    /// Mutably borrow the wrapped value as `T`.
    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.0.as_mut()?.downcast_mut()
    }
}

impl fmt::Debug for CommenterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("CommenterState(empty)")
        } else {
            f.write_str("CommenterState(..)")
        }
    }
}

/// A commenter that performs all comment text mutations itself.
///
/// Offsets are character offsets into the buffer passed to each call.
#[allow(unused_variables)]
pub trait SelfManagingCommenter: Send + Sync {
    /// Create the state for toggling line comments on `[start_line, end_line]`.
    fn create_line_commenting_state(
        &self,
        start_line: usize,
        end_line: usize,
        buffer: &dyn Buffer,
    ) -> Option<CommenterState> {
        None
    }

    /// Create the state for toggling a block comment on `[selection_start, selection_end)`.
    fn create_block_commenting_state(
        &self,
        selection_start: usize,
        selection_end: usize,
        buffer: &dyn Buffer,
    ) -> Option<CommenterState> {
        None
    }

    /// Whether `line` (first non-blank character at `line_start`) is commented.
    fn is_line_commented(
        &self,
        line: usize,
        line_start: usize,
        buffer: &dyn Buffer,
        state: &mut CommenterState,
    ) -> bool;

    /// Comment `line`, inserting at `offset`.
    fn comment_line(
        &self,
        line: usize,
        offset: usize,
        buffer: &mut dyn Buffer,
        state: &mut CommenterState,
    );

    /// Uncomment `line`, whose comment starts at `offset`.
    fn uncomment_line(
        &self,
        line: usize,
        offset: usize,
        buffer: &mut dyn Buffer,
        state: &mut CommenterState,
    );

    /// Prefix used on `line`; the caret is placed after it on empty lines.
    fn comment_prefix(
        &self,
        line: usize,
        buffer: &dyn Buffer,
        state: &CommenterState,
    ) -> Option<String>;

    /// Block comment prefix for a selection starting at `selection_start`.
    fn block_comment_prefix(
        &self,
        selection_start: usize,
        buffer: &dyn Buffer,
        state: &CommenterState,
    ) -> Option<String>;

    /// Block comment suffix for a selection ending at `selection_end`.
    fn block_comment_suffix(
        &self,
        selection_end: usize,
        buffer: &dyn Buffer,
        state: &CommenterState,
    ) -> Option<String>;

    /// Existing block comment around the selection, if any.
    fn block_comment_range(
        &self,
        selection_start: usize,
        selection_end: usize,
        buffer: &dyn Buffer,
        state: &mut CommenterState,
    ) -> Option<Range<usize>>;

    /// Wrap `[start, end)` in a block comment and return the commented range.
    fn insert_block_comment(
        &self,
        start: usize,
        end: usize,
        buffer: &mut dyn Buffer,
        state: &mut CommenterState,
    ) -> Option<Range<usize>>;

    /// Remove the block comment covering `[start, end)`.
    fn uncomment_block_comment(
        &self,
        start: usize,
        end: usize,
        buffer: &mut dyn Buffer,
        state: &mut CommenterState,
    );
}
