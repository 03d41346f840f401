//! Grouping carets into line blocks.
//!
//! Each caret covers a line range (its selection's lines, or its own line), widened over
//! collapsed folds that touch the first or last line. Ranges that overlap or touch merge into one
//! [`Block`], so a block is toggled as a unit.

use crate::buffer::Buffer;
use crate::caret::Caret;
use crate::folding::FoldingModel;
use crate::text::{is_at_line_start, is_line_blank};

/// How a caret is repositioned after its block was toggled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretUpdate {
    /// Place the caret right after the new comment prefix (empty line, fresh comment).
    PutAtCommentStart,
    /// Move the caret to the next line, keeping its visual column.
    ShiftDown,
    /// Extend the selection back to the start of its first line.
    RestoreSelection,
}

/// Consecutive lines toggled together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// First line (inclusive).
    pub start_line: usize,
    /// Last line (inclusive).
    pub end_line: usize,
    /// Indices of the carets that produced this block.
    pub carets: Vec<usize>,
    /// Caret repositioning rule, decided by the last caret of the block.
    pub caret_update: Option<CaretUpdate>,
}

impl Block {
    /// Number of lines in the block.
    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }
}

/// Group `carets` (sorted by position) into blocks.
///
/// `after_line_comment_toggle` tells whether the previous action was a line comment toggle, which
/// turns off [`CaretUpdate::PutAtCommentStart`] for repeated toggles on an empty line.
pub fn group_carets(
    buffer: &dyn Buffer,
    carets: &[Caret],
    folding: Option<&FoldingModel>,
    after_line_comment_toggle: bool,
) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();
    if buffer.len_chars() == 0 {
        return blocks;
    }

    let collapsed_at = |offset: usize| folding.and_then(|f| f.collapsed_region_at(offset));

    for (index, caret) in carets.iter().enumerate() {
        let mut start = caret.selection_start();
        let mut end = caret.selection_end();
        let mut has_selection = caret.has_selection();

        if has_selection
            && let Some(fold) = collapsed_at(start)
            && fold.never_expands
            && fold.start == start
            && fold.end == end
        {
            has_selection = false;
        }

        loop {
            let first_line_start = buffer.line_start_offset(buffer.line_of(start));
            if first_line_start == 0 {
                break;
            }
            match collapsed_at(first_line_start - 1) {
                Some(fold) if fold.start < start => start = fold.start,
                _ => break,
            }
        }

        if !has_selection || !is_at_line_start(buffer, end) {
            loop {
                let last_line_end = buffer.line_end_offset(buffer.line_of(end));
                match collapsed_at(last_line_end) {
                    Some(fold) if fold.end > end => end = fold.end,
                    _ => break,
                }
            }
        }

        let start_line = buffer.line_of(start);
        let mut end_line = buffer.line_of(end);
        if end_line > start_line && buffer.line_start_offset(end_line) == end {
            end_line -= 1;
        }

        let whole_lines_selected = !has_selection
            || (start == buffer.line_start_offset(buffer.line_of(start))
                && end > 0
                && end == buffer.line_end_offset(buffer.line_of(end - 1)) + 1);
        let starting_new_line_comment = !has_selection
            && is_line_blank(buffer, buffer.line_of(start))
            && !after_line_comment_toggle;

        let caret_update = if starting_new_line_comment {
            Some(CaretUpdate::PutAtCommentStart)
        } else if !has_selection {
            Some(CaretUpdate::ShiftDown)
        } else if whole_lines_selected {
            Some(CaretUpdate::RestoreSelection)
        } else {
            None
        };

        match blocks.last_mut() {
            Some(last) if start_line <= last.end_line + 1 => {
                last.end_line = last.end_line.max(end_line);
                last.carets.push(index);
                last.caret_update = caret_update;
            }
            _ => blocks.push(Block {
                start_line,
                end_line,
                carets: vec![index],
                caret_update,
            }),
        }
    }
    blocks
}

/// Returns `false` when some block holds several carets over several lines; carets then stay put.
pub fn should_move_carets(blocks: &[Block]) -> bool {
    !blocks
        .iter()
        .any(|b| b.carets.len() > 1 && b.start_line != b.end_line)
}
