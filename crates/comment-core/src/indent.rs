//! Indentation measurement and generation.

use crate::buffer::Buffer;
use crate::layout::cell_width_at;
use crate::text::BLANKS;
use serde::{Deserialize, Serialize};

/// How generated indentation is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndentOptions {
    /// Width of a tab stop in cells.
    pub tab_size: usize,
    /// Emit tabs (plus trailing spaces) instead of spaces only.
    pub use_tabs: bool,
}

impl Default for IndentOptions {
    fn default() -> Self {
        Self {
            tab_size: 4,
            use_tabs: false,
        }
    }
}

impl IndentOptions {
    /// Whitespace that renders `width` cells wide from column 0.
    pub fn generate(&self, width: usize) -> String {
        if self.use_tabs && self.tab_size > 0 {
            let mut out = "\t".repeat(width / self.tab_size);
            out.push_str(&" ".repeat(width % self.tab_size));
            out
        } else {
            " ".repeat(width)
        }
    }
}

/// Width in cells of the whitespace run `[start, end)`, measured from column 0.
///
/// Stops at the first character that is neither a space nor a tab.
pub fn indent_width(buffer: &dyn Buffer, start: usize, end: usize, tab_size: usize) -> usize {
    let mut width = 0usize;
    for ch in buffer.chars_at(start..end).chars() {
        if !BLANKS.contains(&ch) {
            break;
        }
        width += cell_width_at(ch, width, tab_size);
    }
    width
}

/// Width of the leading whitespace of a string.
pub fn str_indent_width(s: &str, tab_size: usize) -> usize {
    let mut width = 0usize;
    for ch in s.chars().take_while(|c| BLANKS.contains(c)) {
        width += cell_width_at(ch, width, tab_size);
    }
    width
}

/// Smallest indentation among the non-blank lines in `[first_line, last_line]`.
///
/// Returns `None` when every line in the range is blank.
pub fn min_line_indent(
    buffer: &dyn Buffer,
    first_line: usize,
    last_line: usize,
    tab_size: usize,
) -> Option<usize> {
    let mut min: Option<usize> = None;
    for line in first_line..=last_line.min(buffer.line_count().saturating_sub(1)) {
        let start = buffer.line_start_offset(line);
        let end = buffer.line_end_offset(line);
        let text = buffer.chars_at(start..end);
        if text.chars().all(|c| BLANKS.contains(&c)) {
            continue;
        }
        let width = str_indent_width(&text, tab_size);
        min = Some(min.map_or(width, |m| m.min(width)));
    }
    min
}
