//! Visual columns and soft wrapping.
//!
//! Caret shifting after a line comment toggle is expressed in visual cells: the caret keeps its
//! x position inside its wrapped segment and lands on the first visual row of the next logical
//! line. Widths follow UAX #11; tabs advance to the next tab stop.

use unicode_width::UnicodeWidthChar;

/// Cells taken by `ch`: 2 for wide (CJK), 0 for combining marks, 1 otherwise.
pub fn char_width(ch: char) -> usize {
    ch.width().unwrap_or(1)
}

/// Width in cells of `ch` drawn at `cell_offset_in_line`. Tabs expand to the next tab stop.
pub fn cell_width_at(ch: char, cell_offset_in_line: usize, tab_width: usize) -> usize {
    match ch {
        '\t' => {
            let stop = tab_width.max(1);
            stop - cell_offset_in_line % stop
        }
        _ => char_width(ch),
    }
}

/// Cell offset from the start of `line` to the character `column`.
pub fn visual_x_for_column(line: &str, column: usize, tab_width: usize) -> usize {
    let mut x = 0usize;
    for ch in line.chars().take(column) {
        x = x.saturating_add(cell_width_at(ch, x, tab_width));
    }
    x
}

/// Column of the character whose cell span covers `x`, clamped to the line length.
///
/// `x` is measured from the start of the line.
pub fn column_for_visual_x(line: &str, x: usize, tab_width: usize) -> usize {
    let mut cur = 0usize;
    for (col, ch) in line.chars().enumerate() {
        if cur >= x {
            return col;
        }
        let w = cell_width_at(ch, cur, tab_width);
        if cur + w > x {
            return col;
        }
        cur += w;
    }
    line.chars().count()
}

/// Columns where a new visual row starts when `text` is wrapped at `width` cells.
///
/// Wrapping happens at character boundaries. A wide character that does not fit moves to the next
/// row whole.
pub fn wrap_columns(text: &str, width: usize, tab_width: usize) -> Vec<usize> {
    let mut rows = Vec::new();
    if width == 0 {
        return rows;
    }
    let len = text.chars().count();
    let (mut row_x, mut line_x) = (0usize, 0usize);
    for (col, ch) in text.chars().enumerate() {
        let w = cell_width_at(ch, line_x, tab_width);
        if row_x > 0 && row_x + w > width {
            rows.push(col);
            row_x = 0;
        }
        row_x += w;
        line_x += w;
        if row_x >= width && col + 1 < len {
            rows.push(col + 1);
            row_x = 0;
        }
    }
    rows
}

/// Column to move a caret to when shifting it from `column` on `line` to `next_line`.
///
/// The caret keeps its visual x relative to the start of its wrapped segment; the target is the
/// first visual row of `next_line`.
pub fn shifted_column(
    line: &str,
    column: usize,
    next_line: &str,
    viewport_width: Option<usize>,
    tab_width: usize,
) -> usize {
    let x_in_line = visual_x_for_column(line, column, tab_width);
    let segment_start_x = match viewport_width {
        Some(width) => wrap_columns(line, width, tab_width)
            .into_iter()
            .take_while(|&row| row <= column)
            .last()
            .map_or(0, |row| visual_x_for_column(line, row, tab_width)),
        None => 0,
    };
    let x = x_in_line - segment_start_x;

    let first_row_end = viewport_width
        .and_then(|width| wrap_columns(next_line, width, tab_width).first().copied())
        .unwrap_or_else(|| next_line.chars().count());
    column_for_visual_x(next_line, x, tab_width).min(first_row_end)
}
