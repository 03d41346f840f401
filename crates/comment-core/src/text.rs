//! Character scanning helpers shared by the togglers.
//!
//! All positions are character offsets. Helpers that read from a [`Buffer`] go through
//! [`Buffer::char_at`]/[`Buffer::chars_at`], so they always observe the text as of the last edit.

use crate::buffer::Buffer;

/// Blank characters skipped around line content.
pub(crate) const BLANKS: &[char] = &[' ', '\t'];
/// Blank characters plus line breaks.
pub(crate) const BLANKS_AND_BREAKS: &[char] = &[' ', '\t', '\n', '\r'];

/// First offset at or after `offset` whose character is not in `set` (or the buffer length).
pub(crate) fn shift_forward(buffer: &dyn Buffer, mut offset: usize, set: &[char]) -> usize {
    while let Some(ch) = buffer.char_at(offset) {
        if !set.contains(&ch) {
            break;
        }
        offset += 1;
    }
    offset
}

/// Last offset at or before `offset` whose character is not in `set`.
///
/// An offset past the end counts as a non-matching position. `None` means every character from
/// `offset` down to the buffer start is in `set`.
pub(crate) fn shift_backward(buffer: &dyn Buffer, offset: usize, set: &[char]) -> Option<usize> {
    let mut offset = offset;
    loop {
        match buffer.char_at(offset) {
            Some(ch) if set.contains(&ch) => {
                if offset == 0 {
                    return None;
                }
                offset -= 1;
            }
            _ => return Some(offset),
        }
    }
}

/// Returns `true` if `pattern` occurs at `offset`.
pub(crate) fn region_matches(buffer: &dyn Buffer, offset: usize, pattern: &str) -> bool {
    let len = pattern.chars().count();
    if offset + len > buffer.len_chars() {
        return false;
    }
    buffer.chars_at(offset..offset + len) == pattern
}

/// Returns `true` if `pattern` ends exactly at `end`.
pub(crate) fn region_matches_before(buffer: &dyn Buffer, end: usize, pattern: &str) -> bool {
    let len = pattern.chars().count();
    end >= len && region_matches(buffer, end - len, pattern)
}

/// Returns `true` if `[start, end)` contains only spaces and tabs.
pub(crate) fn is_empty_or_spaces(buffer: &dyn Buffer, start: usize, end: usize) -> bool {
    buffer
        .chars_at(start..end)
        .chars()
        .all(|c| BLANKS.contains(&c))
}

/// Returns `true` if `line` holds nothing but spaces and tabs.
pub(crate) fn is_line_blank(buffer: &dyn Buffer, line: usize) -> bool {
    is_empty_or_spaces(
        buffer,
        buffer.line_start_offset(line),
        buffer.line_end_offset(line),
    )
}

/// Returns `true` for `\n` and `\r`.
pub(crate) fn is_line_break(ch: Option<char>) -> bool {
    matches!(ch, Some('\n' | '\r'))
}

/// Returns `true` if `offset` is the first offset of its line.
pub(crate) fn is_at_line_start(buffer: &dyn Buffer, offset: usize) -> bool {
    buffer.line_start_offset(buffer.line_of(offset)) == offset
}

/// Position of `needle` inside `haystack`, searching from `from`.
pub(crate) fn find_chars(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&i| haystack[i..].starts_with(needle))
}

/// Returns `true` if `needle` occurs at `at`.
pub(crate) fn matches_at(haystack: &[char], at: usize, needle: &[char]) -> bool {
    !needle.is_empty() && haystack[at.min(haystack.len())..].starts_with(needle)
}

/// Length of `s` in characters.
pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Position of `pattern` in `[from, to)` of the buffer.
pub(crate) fn index_of(
    buffer: &dyn Buffer,
    pattern: &str,
    from: usize,
    to: usize,
) -> Option<usize> {
    if from >= to {
        return None;
    }
    let window: Vec<char> = buffer.chars_at(from..to).chars().collect();
    let needle: Vec<char> = pattern.chars().collect();
    find_chars(&window, &needle, 0).map(|i| from + i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::TextBuffer;

    #[test]
    fn test_shift_forward_and_backward() {
        let buffer = TextBuffer::new("  ab \t\ncd");
        assert_eq!(shift_forward(&buffer, 0, BLANKS), 2);
        assert_eq!(shift_forward(&buffer, 2, BLANKS), 2);
        assert_eq!(shift_backward(&buffer, 6, BLANKS_AND_BREAKS), Some(3));
        assert_eq!(shift_backward(&buffer, 1, BLANKS), None);
        assert_eq!(shift_backward(&buffer, 9, BLANKS), Some(9));
        assert_eq!(shift_forward(&buffer, 9, BLANKS), 9);

        let crlf = TextBuffer::new("x*/\r\n");
        assert_eq!(shift_backward(&crlf, 4, BLANKS_AND_BREAKS), Some(2));
        assert!(is_line_break(crlf.char_at(3)));
    }

    #[test]
    fn test_region_matches() {
        let buffer = TextBuffer::new("// x */");
        assert!(region_matches(&buffer, 0, "//"));
        assert!(!region_matches(&buffer, 6, "*/"));
        assert!(region_matches_before(&buffer, 7, "*/"));
        assert!(!region_matches_before(&buffer, 1, "*/"));
    }

    #[test]
    fn test_find_chars() {
        let hay: Vec<char> = "a/*b*/c/*".chars().collect();
        let needle: Vec<char> = "/*".chars().collect();
        assert_eq!(find_chars(&hay, &needle, 0), Some(1));
        assert_eq!(find_chars(&hay, &needle, 2), Some(7));
        assert_eq!(find_chars(&hay, &needle, 8), None);
        assert!(matches_at(&hay, 4, &['*', '/']));
        assert!(!matches_at(&hay, 8, &['*', '/']));
    }

    #[test]
    fn test_index_of_is_bounded() {
        let buffer = TextBuffer::new("<!-- a --> b -->");
        assert_eq!(index_of(&buffer, "-->", 4, 10), Some(7));
        assert_eq!(index_of(&buffer, "-->", 4, 9), None);
    }

    #[test]
    fn test_blank_lines() {
        let buffer = TextBuffer::new("a\n \t\n\nb");
        assert!(!is_line_blank(&buffer, 0));
        assert!(is_line_blank(&buffer, 1));
        assert!(is_line_blank(&buffer, 2));
        assert!(is_at_line_start(&buffer, 5));
        assert!(!is_at_line_start(&buffer, 3));
    }
}
