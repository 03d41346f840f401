//! Nested comment rewriting.
//!
//! Wrapping text that already contains block comment delimiters needs care: an interior suffix
//! would terminate the new comment early. Languages that define escape tokens get interior
//! delimiters replaced by those tokens (and restored on uncomment); languages without them get
//! the outer comment split around each nested comment instead.
//!
//! Delimiters are located with a non-overlapping left-to-right scan. Every rewrite is applied
//! from the highest offset down, so offsets collected before the first edit stay valid.

use crate::buffer::Buffer;
use crate::error::ToggleWarning;
use crate::lexer::{CommentTokenKind, CommentTokens};
use crate::text::{char_len, find_chars, matches_at, region_matches_before};
use comment_core_lang::CommenterDescriptor;
use std::ops::Range;

/// Block comment tokens of a language, with the optional escape pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BlockTokens {
    pub(crate) prefix: String,
    pub(crate) suffix: String,
    pub(crate) commented_prefix: Option<String>,
    pub(crate) commented_suffix: Option<String>,
}

impl BlockTokens {
    pub(crate) fn from_descriptor(descriptor: &CommenterDescriptor) -> Option<Self> {
        let (prefix, suffix) = descriptor.block_tokens()?;
        Some(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            commented_prefix: descriptor.commented_block_prefix().map(str::to_string),
            commented_suffix: descriptor.commented_block_suffix().map(str::to_string),
        })
    }

    pub(crate) fn has_escapes(&self) -> bool {
        self.commented_prefix.is_some() && self.commented_suffix.is_some()
    }
}

/// A delimiter found inside a range, relative to the range start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NestedMarker {
    Prefix(usize),
    Suffix(usize),
}

impl NestedMarker {
    fn position(self) -> usize {
        match self {
            NestedMarker::Prefix(p) | NestedMarker::Suffix(p) => p,
        }
    }
}

/// Delimiter positions found inside one range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct NestedMarkerList {
    pub(crate) prefixes: Vec<usize>,
    pub(crate) suffixes: Vec<usize>,
}

impl NestedMarkerList {
    /// Collect every prefix and suffix occurrence, taking whichever comes first at each step.
    pub(crate) fn scan(text: &[char], prefix: &[char], suffix: &[char]) -> Self {
        let mut list = Self::default();
        let mut position = 0usize;
        while position < text.len() {
            let next_prefix = find_chars(text, prefix, position);
            let next_suffix = find_chars(text, suffix, position);
            match (next_prefix, next_suffix) {
                (Some(p), Some(s)) if s < p => {
                    list.suffixes.push(s);
                    position = s + suffix.len();
                }
                (Some(p), _) => {
                    list.prefixes.push(p);
                    position = p + prefix.len();
                }
                (None, Some(s)) => {
                    list.suffixes.push(s);
                    position = s + suffix.len();
                }
                (None, None) => break,
            }
        }
        list
    }

    /// All markers, highest position first.
    pub(crate) fn descending(&self) -> Vec<NestedMarker> {
        let mut markers: Vec<NestedMarker> = self
            .prefixes
            .iter()
            .map(|&p| NestedMarker::Prefix(p))
            .chain(self.suffixes.iter().map(|&s| NestedMarker::Suffix(s)))
            .collect();
        markers.sort_by_key(|m| std::cmp::Reverse(m.position()));
        markers
    }
}

/// Escape tokens inside `text` that go back to being delimiters, in ascending order.
///
/// Each top-level group gives back its opening escape and the last closing escape seen before
/// the next top-level opening; escapes nested deeper stay escaped. A closing escape met outside
/// any group has no opening partner and is always given back.
fn escapes_to_restore(text: &[char], open: &[char], close: &[char]) -> Vec<NestedMarker> {
    let mut restore = Vec::new();
    let mut level = 0usize;
    let mut last_close = None;
    let mut i = 0usize;
    while i < text.len() {
        if matches_at(text, i, open) {
            if level == 0 {
                restore.extend(last_close.take().map(NestedMarker::Suffix));
                restore.push(NestedMarker::Prefix(i));
                level = 1;
            } else {
                level += 1;
            }
            i += open.len();
        } else if matches_at(text, i, close) {
            if level == 0 {
                restore.push(NestedMarker::Suffix(i));
            } else {
                last_close = Some(i);
                level -= 1;
            }
            i += close.len();
        } else {
            i += 1;
        }
    }
    restore.extend(last_close.map(NestedMarker::Suffix));
    restore.sort_by_key(|m| m.position());
    restore
}

/// Turn escaped delimiters inside `range` back into literal ones.
///
/// Returns the change in length of the range.
pub(crate) fn restore_nested_comments(
    buffer: &mut dyn Buffer,
    range: Range<usize>,
    tokens: &BlockTokens,
) -> isize {
    let (Some(commented_prefix), Some(commented_suffix)) =
        (&tokens.commented_prefix, &tokens.commented_suffix)
    else {
        return 0;
    };
    let text: Vec<char> = buffer.chars_at(range.clone()).chars().collect();
    let open: Vec<char> = commented_prefix.chars().collect();
    let close: Vec<char> = commented_suffix.chars().collect();
    let restore = escapes_to_restore(&text, &open, &close);

    let mut delta = 0isize;
    for &marker in restore.iter().rev() {
        let (at, escaped_len, literal) = match marker {
            NestedMarker::Prefix(p) => (range.start + p, open.len(), &tokens.prefix),
            NestedMarker::Suffix(s) => (range.start + s, close.len(), &tokens.suffix),
        };
        buffer.replace(at, at + escaped_len, literal);
        delta += char_len(literal) as isize - escaped_len as isize;
    }
    if !restore.is_empty() {
        tracing::trace!(markers = restore.len(), "restored nested comments");
    }
    delta
}

/// Wrap one line in a block comment (for languages without line comments).
///
/// `offset` is where the prefix goes; `content_end` is the end of the line's non-blank content.
/// Nested delimiters are escaped when the language allows it, otherwise the comment is split
/// around them. Returns `false` when nothing was inserted.
pub(crate) fn comment_line_with_block(
    buffer: &mut dyn Buffer,
    offset: usize,
    content_end: usize,
    tokens: &BlockTokens,
) -> bool {
    if content_end < offset {
        return false;
    }
    let text: Vec<char> = buffer.chars_at(offset..content_end).chars().collect();
    let prefix: Vec<char> = tokens.prefix.chars().collect();
    let suffix: Vec<char> = tokens.suffix.chars().collect();
    let list = NestedMarkerList::scan(&text, &prefix, &suffix);

    // A trailing nested suffix already closes the line.
    let reuse_last_suffix = tokens.commented_suffix.is_none()
        && list
            .suffixes
            .last()
            .is_some_and(|&s| offset + s + suffix.len() >= content_end);
    if !reuse_last_suffix {
        buffer.insert(content_end, &tokens.suffix);
    }

    for marker in list.descending() {
        match marker {
            NestedMarker::Prefix(p) => {
                if let Some(commented) = &tokens.commented_prefix {
                    buffer.replace(offset + p, offset + p + prefix.len(), commented);
                } else if p != 0 {
                    buffer.insert(offset + p, &tokens.suffix);
                }
            }
            NestedMarker::Suffix(s) => {
                if let Some(commented) = &tokens.commented_suffix {
                    buffer.replace(offset + s, offset + s + suffix.len(), commented);
                } else if offset + s + suffix.len() < content_end {
                    buffer.insert(offset + s + suffix.len(), &tokens.prefix);
                }
            }
        }
    }

    let reuse_first_prefix =
        tokens.commented_prefix.is_none() && list.prefixes.first() == Some(&0);
    if !reuse_first_prefix {
        buffer.insert(offset, &tokens.prefix);
    }
    true
}

/// Remove block comments from a line commented by [`comment_line_with_block`].
///
/// `[start, end)` spans the line's content, starting at its first comment prefix.
pub(crate) fn uncomment_line_with_block(
    buffer: &mut dyn Buffer,
    start: usize,
    end: usize,
    tokens: &BlockTokens,
) {
    let text: Vec<char> = buffer.chars_at(start..end).chars().collect();
    let prefix: Vec<char> = tokens.prefix.chars().collect();
    let suffix: Vec<char> = tokens.suffix.chars().collect();

    let mut pairs = Vec::new();
    let mut position = 0usize;
    while let Some(p) = find_chars(&text, &prefix, position) {
        position = p + prefix.len();
        let s = find_chars(&text, &suffix, position)
            .unwrap_or_else(|| text.len().saturating_sub(suffix.len()));
        pairs.push((p, s));
        position = s + suffix.len();
    }

    for &(p, s) in pairs.iter().rev() {
        let range_end = (start + s + suffix.len()).min(end);
        uncomment_block_range(buffer, start + p, range_end, tokens);
    }
}

/// Delete one `prefix ... suffix` pair, restoring escaped interior delimiters.
fn uncomment_block_range(buffer: &mut dyn Buffer, start: usize, end: usize, tokens: &BlockTokens) {
    let suffix_len = char_len(&tokens.suffix);
    let mut end = end;
    if region_matches_before(buffer, end, &tokens.suffix) && end - suffix_len >= start {
        buffer.delete(end - suffix_len, end);
        end -= suffix_len;
    }
    let prefix_len = char_len(&tokens.prefix);
    if tokens.has_escapes() && end > start + prefix_len {
        restore_nested_comments(buffer, start + prefix_len..end, tokens);
    }
    buffer.delete(start, start + prefix_len);
}

/// Result of wrapping a range with [`insert_nested_comments`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NestedWrap {
    /// Commented range after all insertions.
    pub(crate) range: Range<usize>,
    /// Informational warning about nested comments that were wrapped.
    pub(crate) nested: Option<ToggleWarning>,
}

fn block_comment_at(
    lexed: &CommentTokens,
    offset: usize,
    doc_is_block: bool,
) -> Option<Range<usize>> {
    lexed.token_at(offset).and_then(|t| match t.kind {
        CommentTokenKind::BlockComment => Some(t.range()),
        CommentTokenKind::DocComment if doc_is_block => Some(t.range()),
        _ => None,
    })
}

/// Wrap `[start, end)` with `comment_prefix`/`comment_suffix`, handling interior delimiters.
///
/// `lexed` holds the buffer's comment tokens from before this call; when present and the
/// language has no escape tokens, only delimiters that really open or close a block comment are
/// treated as nested (ones in strings or other comments are skipped), and a suffix outside any
/// comment aborts without editing.
pub(crate) fn insert_nested_comments(
    buffer: &mut dyn Buffer,
    start: usize,
    end: usize,
    comment_prefix: &str,
    comment_suffix: &str,
    tokens: &BlockTokens,
    lexed: Option<(&CommentTokens, bool)>,
) -> Result<NestedWrap, ToggleWarning> {
    let normalized_prefix: Vec<char> = comment_prefix.trim().chars().collect();
    let normalized_suffix: Vec<char> = comment_suffix.trim().chars().collect();
    let text: Vec<char> = buffer.chars_at(start..end).chars().collect();

    let mut list = NestedMarkerList::default();
    let mut nested_comment_found = false;
    let mut i = 0usize;
    while i < text.len() {
        if matches_at(&text, i, &normalized_prefix) {
            if tokens.commented_prefix.is_none()
                && let Some((lexed, doc_is_block)) = lexed
            {
                match block_comment_at(lexed, start + i, doc_is_block) {
                    Some(comment) if comment.start == start + i => nested_comment_found = true,
                    _ => {
                        i += 1;
                        continue;
                    }
                }
            }
            list.prefixes.push(i);
            i += normalized_prefix.len();
        } else if matches_at(&text, i, &normalized_suffix) {
            if tokens.commented_suffix.is_none()
                && let Some((lexed, doc_is_block)) = lexed
                && block_comment_at(lexed, start + i, doc_is_block).is_none()
            {
                return Err(ToggleWarning::UnmatchedSuffix { offset: start + i });
            }
            list.suffixes.push(i);
            i += normalized_suffix.len();
        } else {
            i += 1;
        }
    }

    let nested = if nested_comment_found {
        list.prefixes
            .first()
            .map(|&first| ToggleWarning::NestedCommentsWrapped {
                count: list.prefixes.len(),
                offset: start + first,
            })
    } else {
        None
    };

    let before = buffer.len_chars();
    let reuse_last_suffix = tokens.commented_suffix.is_none()
        && list
            .suffixes
            .last()
            .is_some_and(|&s| start + s + normalized_suffix.len() == end);
    if !reuse_last_suffix {
        buffer.insert(end, comment_suffix);
    }

    for marker in list.descending() {
        match marker {
            NestedMarker::Prefix(p) => bound_commenting(
                buffer,
                start + p,
                tokens.commented_prefix.as_deref(),
                normalized_prefix.len(),
                comment_suffix,
                false,
                start..end,
            ),
            NestedMarker::Suffix(s) => bound_commenting(
                buffer,
                start + s,
                tokens.commented_suffix.as_deref(),
                normalized_suffix.len(),
                comment_prefix,
                true,
                start..end,
            ),
        }
    }

    let reuse_first_prefix = tokens.commented_prefix.is_none() && list.prefixes.first() == Some(&0);
    if !reuse_first_prefix {
        buffer.insert(start, comment_prefix);
    }

    let after = buffer.len_chars();
    let range_end = (end + after).saturating_sub(before);
    Ok(NestedWrap {
        range: start..range_end,
        nested,
    })
}

/// Escape one nested delimiter, or split the outer comment around it.
fn bound_commenting(
    buffer: &mut dyn Buffer,
    offset: usize,
    commented: Option<&str>,
    token_len: usize,
    to_insert: &str,
    after_token: bool,
    selection: Range<usize>,
) {
    match commented {
        Some(commented) => buffer.replace(offset, offset + token_len, commented),
        None => {
            let at = if after_token { offset + token_len } else { offset };
            if offset != selection.start && at != selection.end {
                buffer.insert(at, to_insert);
            }
        }
    }
}
