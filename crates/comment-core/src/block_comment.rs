//! Block comment toggling for a single caret.
//!
//! The toggler first looks for an existing block comment: the one a custom uncommenter reports,
//! the selection itself when it holds nothing but comments, or the comment under the caret. If
//! the selection straddles that comment, or there is none, the selection is wrapped instead.

use crate::buffer::Buffer;
use crate::caret::{Caret, CaretTracker};
use crate::commenter::{Commenter, TokenCommenter};
use crate::error::{ToggleError, ToggleWarning};
use crate::indent::min_line_indent;
use crate::lexer::{CommentLexer, CommentTokenKind, CommentTokens};
use crate::nested::{BlockTokens, insert_nested_comments, restore_nested_comments};
use crate::resolver::CommenterResolver;
use crate::self_managing::{CommenterState, SelfManagingCommenter};
use crate::settings::{CommentSettings, EffectiveCommentSettings};
use crate::text::{
    BLANKS, BLANKS_AND_BREAKS, char_len, find_chars, is_at_line_start, is_line_break,
    region_matches, region_matches_before, shift_backward, shift_forward,
};
use crate::toggle::{BlockReport, ToggleAction, check_descriptor};
use std::ops::Range;
use std::sync::Arc;

/// Result of one block comment toggle.
#[derive(Debug)]
pub(crate) struct BlockCommentResult {
    pub(crate) report: BlockReport,
    pub(crate) warnings: Vec<ToggleWarning>,
}

enum Mode {
    Tokens {
        commenter: TokenCommenter,
        tokens: BlockTokens,
        lexed: CommentTokens,
    },
    SelfManaging {
        commenter: Arc<dyn SelfManagingCommenter>,
        state: CommenterState,
    },
}

struct BlockToggle<'a> {
    buffer: &'a mut dyn Buffer,
    caret: &'a mut Caret,
    tracker: Option<CaretTracker>,
    mode: Mode,
    prefix: String,
    suffix: String,
    effective: EffectiveCommentSettings,
    force_indent: bool,
    warnings: Vec<ToggleWarning>,
}

/// Toggle a block comment around the caret's selection (or at the caret).
pub(crate) fn toggle_block_comment(
    buffer: &mut dyn Buffer,
    caret: &mut Caret,
    resolver: &dyn CommenterResolver,
    settings: &CommentSettings,
) -> Result<BlockCommentResult, ToggleError> {
    let selection = caret.selection_range();
    let start_line = buffer.line_of(selection.start);
    let end_line = buffer.line_of(selection.end);
    let finish = |action, warnings| BlockCommentResult {
        report: BlockReport {
            start_line,
            end_line,
            action,
        },
        warnings,
    };

    let Some(commenter) = resolver
        .resolve_range(&*buffer, selection.start, selection.end)
        .or_else(|| resolver.resolve(&*buffer, selection.start))
        .filter(Commenter::can_comment)
    else {
        return Ok(finish(ToggleAction::Skipped, Vec::new()));
    };
    let effective = settings.effective_for(&commenter);

    let (mode, prefix, suffix, force_indent) = match commenter {
        Commenter::Tokens(t) => {
            let descriptor = t.descriptor();
            check_descriptor(descriptor)?;
            let Some(tokens) = BlockTokens::from_descriptor(descriptor) else {
                return Ok(finish(ToggleAction::Skipped, Vec::new()));
            };
            let lexed = CommentLexer::new(descriptor).tokenize_buffer(&*buffer);
            let force_indent = descriptor.force_indented_block_comment == Some(true);
            let (prefix, suffix) = (tokens.prefix.clone(), tokens.suffix.clone());
            (
                Mode::Tokens {
                    commenter: t,
                    tokens,
                    lexed,
                },
                prefix,
                suffix,
                force_indent,
            )
        }
        Commenter::SelfManaging(sm) => {
            let state = sm
                .create_block_commenting_state(selection.start, selection.end, &*buffer)
                .unwrap_or_default();
            let prefix = sm
                .block_comment_prefix(selection.start, &*buffer, &state)
                .unwrap_or_default();
            let suffix = sm
                .block_comment_suffix(selection.end, &*buffer, &state)
                .unwrap_or_default();
            (
                Mode::SelfManaging {
                    commenter: sm,
                    state,
                },
                prefix,
                suffix,
                false,
            )
        }
    };

    let tracker = CaretTracker::track(buffer, std::slice::from_ref(caret));
    let mut toggle = BlockToggle {
        buffer,
        caret,
        tracker: Some(tracker),
        mode,
        prefix,
        suffix,
        effective,
        force_indent,
        warnings: Vec::new(),
    };
    let action = toggle.run();
    toggle.release_tracker();
    Ok(finish(action, toggle.warnings))
}

impl BlockToggle<'_> {
    fn run(&mut self) -> ToggleAction {
        let selection = self.caret.selection_range();
        let has_selection = self.caret.has_selection();

        if let Some(commented) = self.find_commented_range() {
            let (sel_start, sel_end) = if has_selection {
                (selection.start, selection.end)
            } else {
                (commented.start, commented.end)
            };
            let start_outside = commented.start < sel_start || commented.start >= sel_end;
            let end_outside = commented.end <= sel_start || commented.end > sel_end;
            tracing::debug!(?commented, start_outside, end_outside, "found block comment");
            return if start_outside && end_outside {
                self.comment_range(sel_start, sel_end)
            } else {
                self.uncomment_range(commented)
            };
        }

        if has_selection {
            let range = if self.force_indent {
                self.expand_to_lines(selection.start, selection.end)
            } else {
                selection
            };
            return self.comment_range(range.start, range.end);
        }

        let offset = self.caret.offset.min(self.buffer.len_chars());
        if self.force_indent {
            let range = self.expand_to_lines(offset, offset);
            return self.comment_range(range.start, range.end);
        }
        let text = format!("{}{}", self.prefix, self.suffix);
        self.buffer.insert(offset, &text);
        self.sync_caret();
        self.caret.move_to(offset + char_len(&self.prefix));
        ToggleAction::Commented
    }

    /// Whole lines covering `[start, end]`, including the last line's break.
    fn expand_to_lines(&self, start: usize, end: usize) -> Range<usize> {
        let first = self.buffer.line_start_offset(self.buffer.line_of(start));
        let last_line = self.buffer.line_of(end);
        let last = if last_line + 1 < self.buffer.line_count() {
            self.buffer.line_start_offset(last_line + 1)
        } else {
            self.buffer.line_end_offset(last_line)
        };
        first..last
    }

    fn sync_caret(&mut self) {
        if let Some(tracker) = &self.tracker {
            tracker.sync(&*self.buffer, std::slice::from_mut(self.caret));
        }
    }

    fn release_tracker(&mut self) {
        if let Some(tracker) = self.tracker.take() {
            tracker.release(self.buffer);
        }
    }

    fn find_commented_range(&mut self) -> Option<Range<usize>> {
        let selection = self.caret.selection_range();
        let has_selection = self.caret.has_selection();
        match &mut self.mode {
            Mode::Tokens {
                commenter,
                tokens,
                lexed,
            } => {
                if has_selection && let Some(custom) = commenter.custom_uncommenter() {
                    let text = self.buffer.chars_at(selection.clone());
                    return custom
                        .find_maximum_commented_range(&text)
                        .map(|r| r.start + selection.start..r.end + selection.start);
                }
                let prefix = tokens.prefix.trim();
                let suffix = tokens.suffix.trim();
                let buffer = &*self.buffer;
                let selected = if selection_has_only_comments(buffer, lexed, selection.clone()) {
                    selected_comment(buffer, has_selection, selection.clone(), prefix, suffix)
                } else {
                    None
                };
                selected.or_else(|| {
                    comment_at_caret(buffer, lexed, self.caret, has_selection, prefix, suffix)
                })
            }
            Mode::SelfManaging { commenter, state } => {
                commenter.block_comment_range(selection.start, selection.end, &*self.buffer, state)
            }
        }
    }

    fn breaks_existing_comment(&self, offset: usize, including_after_line_comment: bool) -> bool {
        let Mode::Tokens {
            commenter, lexed, ..
        } = &self.mode
        else {
            return false;
        };
        if offset == 0 {
            return false;
        }
        let Some(token) = lexed.comment_at(offset - 1) else {
            return false;
        };
        token.end > offset
            || (including_after_line_comment
                && token.end == offset
                && token.kind == CommentTokenKind::LineComment
                && commenter.descriptor().line_suffix().is_none())
    }

    fn comment_range(&mut self, start: usize, end: usize) -> ToggleAction {
        let broken = if self.breaks_existing_comment(start, true) {
            Some(start)
        } else if self.breaks_existing_comment(end, false) {
            Some(end)
        } else {
            None
        };
        if let Some(offset) = broken {
            tracing::warn!(offset, "block comment would break an existing comment");
            self.warnings
                .push(ToggleWarning::IntersectsExistingComment { offset });
            return ToggleAction::Skipped;
        }

        let caret_line = self.buffer.line_of(self.caret.offset);
        let caret_column = self
            .caret
            .offset
            .saturating_sub(self.buffer.line_start_offset(caret_line));

        let whole_lines = end > start
            && is_at_line_start(&*self.buffer, start)
            && self.buffer.char_at(end - 1) == Some('\n');
        let (prefix, suffix) = if whole_lines {
            let space = if self.effective.block_comment_with_indent {
                let first = self.buffer.line_of(start);
                let last = self.buffer.line_of(end - 1);
                let tab_size = self.effective.indent.tab_size;
                let width = min_line_indent(&*self.buffer, first, last, tab_size).unwrap_or(0);
                self.effective.indent.generate(width)
            } else {
                String::new()
            };
            let mut prefix = format!("{space}{}", self.prefix);
            if !self.prefix.ends_with('\n') {
                prefix.push('\n');
            }
            let bare_suffix = self.suffix.strip_prefix('\n').unwrap_or(&self.suffix);
            (prefix, format!("{space}{bare_suffix}\n"))
        } else {
            (self.prefix.clone(), self.suffix.clone())
        };

        let range = match self.insert_block(start, end, &prefix, &suffix) {
            Ok(range) => range,
            Err(warning) => {
                tracing::warn!(%warning, "block comment aborted");
                self.warnings.push(warning);
                return ToggleAction::Skipped;
            }
        };

        self.sync_caret();
        if let Some(range) = range {
            self.caret.set_selection(range);
            let (line, column) = if whole_lines {
                (caret_line + 1, caret_column)
            } else {
                (caret_line, caret_column + char_len(&self.prefix))
            };
            let offset = self.logical_offset(line, column);
            self.caret.move_to(offset);
        }
        ToggleAction::Commented
    }

    /// Offset of `(line, column)`, clamped to the buffer and to the line's end.
    fn logical_offset(&self, line: usize, column: usize) -> usize {
        let line = line.min(self.buffer.line_count().saturating_sub(1));
        let start = self.buffer.line_start_offset(line);
        let end = self.buffer.line_end_offset(line);
        (start + column).min(end)
    }

    fn insert_block(
        &mut self,
        start: usize,
        end: usize,
        prefix: &str,
        suffix: &str,
    ) -> Result<Option<Range<usize>>, ToggleWarning> {
        match &mut self.mode {
            Mode::SelfManaging { commenter, state } => {
                Ok(commenter.insert_block_comment(start, end, self.buffer, state))
            }
            Mode::Tokens {
                commenter,
                tokens,
                lexed,
            } => {
                let doc_is_block = commenter.descriptor().doc_comment_is_block_comment();
                let wrap = insert_nested_comments(
                    self.buffer,
                    start,
                    end,
                    prefix,
                    suffix,
                    tokens,
                    Some((&*lexed, doc_is_block)),
                )?;
                if let Some(nested) = wrap.nested {
                    tracing::debug!(%nested, "wrapped nested comments");
                    self.warnings.push(nested);
                }
                let Some(escaper) = commenter.escaper() else {
                    return Ok(Some(wrap.range));
                };
                let marker = self
                    .buffer
                    .create_range_marker(wrap.range.clone(), false, false);
                escaper.escape(self.buffer, marker);
                let range = self.buffer.marker_range(marker).unwrap_or(wrap.range);
                self.buffer.release_marker(marker);
                Ok(Some(range))
            }
        }
    }

    fn uncomment_range(&mut self, range: Range<usize>) -> ToggleAction {
        let (commenter, tokens) = match &mut self.mode {
            Mode::SelfManaging { commenter, state } => {
                commenter.uncomment_block_comment(range.start, range.end, self.buffer, state);
                self.sync_caret();
                return ToggleAction::Uncommented;
            }
            Mode::Tokens {
                commenter, tokens, ..
            } => (commenter.clone(), tokens.clone()),
        };

        let pairs: Vec<(Range<usize>, Range<usize>)> = match commenter.custom_uncommenter() {
            Some(custom) => {
                let text = self.buffer.chars_at(range.clone());
                let pairs: Vec<_> = custom
                    .comment_ranges_to_delete(&text)
                    .into_iter()
                    .map(|(open, close)| {
                        (
                            open.start + range.start..open.end + range.start,
                            close.start + range.start..close.end + range.start,
                        )
                    })
                    .collect();
                if pairs.is_empty() {
                    tracing::warn!(?range, "custom uncommenter found nothing to delete");
                    self.warnings
                        .push(ToggleWarning::CustomUncommenterFailed { range });
                    return ToggleAction::Skipped;
                }
                pairs
            }
            None => self.token_pairs(range.clone(), &tokens),
        };

        let marker = commenter
            .escaper()
            .map(|_| self.buffer.create_range_marker(range.clone(), false, false));
        for (open, close) in pairs.iter().rev() {
            if close.start < open.end {
                continue;
            }
            self.buffer.delete(close.start, close.end);
            if tokens.has_escapes() && close.start > open.end {
                restore_nested_comments(self.buffer, open.end..close.start, &tokens);
            }
            self.buffer.delete(open.start, open.end);
        }
        if let Some(marker) = marker {
            if let Some(escaper) = commenter.escaper() {
                escaper.unescape(self.buffer, marker);
            }
            self.buffer.release_marker(marker);
        }
        self.sync_caret();
        ToggleAction::Uncommented
    }

    /// Prefix/suffix deletion ranges for every comment inside `range`.
    fn token_pairs(
        &self,
        range: Range<usize>,
        tokens: &BlockTokens,
    ) -> Vec<(Range<usize>, Range<usize>)> {
        let text: Vec<char> = self.buffer.chars_at(range.clone()).chars().collect();
        let prefix: Vec<char> = tokens.prefix.trim().chars().collect();
        let suffix: Vec<char> = tokens.suffix.trim().chars().collect();

        let mut pairs = Vec::new();
        let mut position = 0usize;
        while let Some(p) = find_chars(&text, &prefix, position) {
            let s = find_chars(&text, &suffix, p + prefix.len()).unwrap_or(text.len());
            let e = (s + suffix.len()).min(text.len());
            position = e.max(p + prefix.len());
            pairs.push(self.comment_block(
                range.start + p,
                range.start + e,
                prefix.len(),
                &tokens.suffix,
            ));
        }
        pairs
    }

    fn comment_block(
        &self,
        start: usize,
        end: usize,
        prefix_len: usize,
        suffix: &str,
    ) -> (Range<usize>, Range<usize>) {
        let suffix = suffix.trim();
        let suffix_len = char_len(suffix);
        let ends_properly = end >= start + prefix_len + suffix_len
            && region_matches_before(&*self.buffer, end, suffix);
        let open = self.expand_range(start, start + prefix_len);
        let close = if ends_properly {
            self.expand_range(end - suffix_len, end)
        } else {
            end..end
        };
        (open, close)
    }

    /// Widen a token deletion to its whole line when the token is alone on it.
    fn expand_range(&self, start: usize, end: usize) -> Range<usize> {
        let before = if start == 0 {
            None
        } else {
            shift_backward(&*self.buffer, start - 1, BLANKS)
        };
        let line_starts_before = before.is_none_or(|o| is_line_break(self.buffer.char_at(o)));
        if !line_starts_before {
            return start..end;
        }

        let len = self.buffer.len_chars();
        let after = shift_forward(&*self.buffer, end, BLANKS);
        let at_break = after == len || is_line_break(self.buffer.char_at(after));
        if !at_break {
            return start..end;
        }

        let new_start = before.map_or(0, |o| o + 1);
        let mut new_end = end;
        if after < len {
            new_end = after + 1;
            if self.buffer.char_at(after) == Some('\r')
                && self.buffer.char_at(after + 1) == Some('\n')
            {
                new_end += 1;
            }
        }
        new_start..new_end
    }
}

/// Returns `true` if every non-whitespace character of the selection is inside a comment.
fn selection_has_only_comments(
    buffer: &dyn Buffer,
    lexed: &CommentTokens,
    selection: Range<usize>,
) -> bool {
    let start = selection.start;
    buffer
        .chars_at(selection)
        .chars()
        .enumerate()
        .all(|(i, ch)| ch.is_whitespace() || lexed.comment_at(start + i).is_some())
}

/// The selection trimmed of whitespace, if it starts with `prefix` and ends with `suffix`.
fn selected_comment(
    buffer: &dyn Buffer,
    has_selection: bool,
    selection: Range<usize>,
    prefix: &str,
    suffix: &str,
) -> Option<Range<usize>> {
    if !has_selection {
        return None;
    }
    let start = shift_forward(buffer, selection.start, BLANKS_AND_BREAKS);
    let end = shift_backward(buffer, selection.end - 1, BLANKS_AND_BREAKS).map_or(0, |o| o + 1);
    let fits = end >= start && end - start >= char_len(prefix) + char_len(suffix);
    (fits && region_matches(buffer, start, prefix) && region_matches_before(buffer, end, suffix))
        .then_some(start..end)
}

/// The block comment under the caret, if it lies within the selection.
fn comment_at_caret(
    buffer: &dyn Buffer,
    lexed: &CommentTokens,
    caret: &Caret,
    has_selection: bool,
    prefix: &str,
    suffix: &str,
) -> Option<Range<usize>> {
    let selection = caret.selection_range();
    let mut offset = caret.offset;
    if has_selection {
        if offset == selection.end {
            offset = offset.saturating_sub(1);
        }
        if offset <= selection.start {
            offset += 1;
        }
    }
    let token = lexed.comment_at(offset)?;
    if has_selection && !(selection.start <= token.start && token.end <= selection.end) {
        return None;
    }
    let text = buffer.chars_at(token.range());
    let long_enough = char_len(&text) >= char_len(prefix) + char_len(suffix);
    (long_enough && text.starts_with(prefix) && text.ends_with(suffix)).then(|| token.range())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::TextBuffer;
    use crate::resolver::SingleLanguageResolver;
    use comment_core_lang::CommenterDescriptor;
    use pretty_assertions::assert_eq;

    fn c_like() -> CommenterDescriptor {
        CommenterDescriptor::line_and_block("//", "/*", "*/").with_string_quotes(['"'])
    }

    fn run(
        text: &str,
        caret: &mut Caret,
        descriptor: CommenterDescriptor,
    ) -> (String, BlockCommentResult) {
        let mut buffer = TextBuffer::new(text);
        let resolver = SingleLanguageResolver::new(descriptor);
        let settings = CommentSettings::default();
        let result = toggle_block_comment(&mut buffer, caret, &resolver, &settings).unwrap();
        assert_eq!(buffer.marker_count(), 0);
        (buffer.text(), result)
    }

    #[test]
    fn test_wrap_selection_and_back() {
        let mut caret = Caret::with_selection(0..1);
        let (text, result) = run("x", &mut caret, CommenterDescriptor::block("/*", "*/"));
        assert_eq!(text, "/*x*/");
        assert_eq!(result.report.action, ToggleAction::Commented);
        assert_eq!(caret.selection, Some(0..5));
        assert_eq!(caret.offset, 3);

        let (text, result) = run(&text, &mut caret, CommenterDescriptor::block("/*", "*/"));
        assert_eq!(text, "x");
        assert_eq!(result.report.action, ToggleAction::Uncommented);
    }

    #[test]
    fn test_whole_lines_get_delimiter_lines() {
        let mut caret = Caret::with_selection(0..8);
        let (text, _) = run("  a\n  b\nc", &mut caret, c_like());
        assert_eq!(text, "/*\n  a\n  b\n*/\nc");
        assert_eq!(caret.selection, Some(0..14));

        let (text, _) = run(&text, &mut caret, c_like());
        assert_eq!(text, "  a\n  b\nc");
    }

    #[test]
    fn test_bare_caret_inserts_empty_comment() {
        let mut caret = Caret::at(2);
        let (text, _) = run("ab", &mut caret, c_like());
        assert_eq!(text, "ab/**/");
        assert_eq!(caret.offset, 4);
        assert!(!caret.has_selection());
    }

    #[test]
    fn test_caret_inside_comment_uncomments() {
        let mut caret = Caret::at(4);
        let (text, result) = run("a /* b */ c", &mut caret, c_like());
        assert_eq!(text, "a  b  c");
        assert_eq!(result.report.action, ToggleAction::Uncommented);
        assert_eq!(caret.offset, 2);
    }

    #[test]
    fn test_start_inside_line_comment_warns() {
        let mut caret = Caret::with_selection(3..7);
        let (text, result) = run("// c\nx = 1", &mut caret, c_like());
        assert_eq!(text, "// c\nx = 1");
        assert_eq!(result.report.action, ToggleAction::Skipped);
        assert_eq!(
            result.warnings,
            vec![ToggleWarning::IntersectsExistingComment { offset: 3 }]
        );
    }

    #[test]
    fn test_stray_suffix_warns() {
        let mut caret = Caret::with_selection(0..6);
        let (text, result) = run("a */ b", &mut caret, c_like());
        assert_eq!(text, "a */ b");
        assert_eq!(result.warnings, vec![ToggleWarning::UnmatchedSuffix { offset: 2 }]);
    }

    #[test]
    fn test_nested_escape_round_trip() {
        let escaping = CommenterDescriptor::block("/*", "*/").with_nesting_escape("\\*", "*\\");
        let mut caret = Caret {
            offset: 0,
            selection: Some(0..7),
        };
        let (text, _) = run("a /*b*/", &mut caret, escaping.clone());
        assert_eq!(text, "/*a \\*b*\\*/");
        assert_eq!(caret.selection, Some(0..11));

        let (text, result) = run(&text, &mut caret, escaping);
        assert_eq!(text, "a /*b*/");
        assert_eq!(result.report.action, ToggleAction::Uncommented);
    }

    #[test]
    fn test_selection_covering_whole_comment_uncomments() {
        let mut caret = Caret::with_selection(0..9);
        let (text, result) = run("/*inner*/", &mut caret, c_like());
        assert_eq!(text, "inner");
        assert_eq!(result.report.action, ToggleAction::Uncommented);
    }

    #[test]
    fn test_selected_comment_before_crlf_uncomments() {
        let mut caret = Caret::with_selection(0..7);
        let (text, result) = run("/*a*/\r\n", &mut caret, c_like());
        assert_eq!(text, "a\r\n");
        assert_eq!(result.report.action, ToggleAction::Uncommented);
    }

    #[test]
    fn test_selection_beside_comment_is_wrapped() {
        let mut caret = Caret::with_selection(0..3);
        let (text, _) = run("abc /* d */", &mut caret, c_like());
        assert_eq!(text, "/*abc*/ /* d */");
    }

    #[test]
    fn test_mismatched_escape_tokens_are_fatal() {
        let mut descriptor = CommenterDescriptor::block("/*", "*/");
        descriptor.commented_block_prefix = Some("\\*".to_string());
        let mut buffer = TextBuffer::new("x");
        let resolver = SingleLanguageResolver::new(descriptor);
        let err = toggle_block_comment(
            &mut buffer,
            &mut Caret::with_selection(0..1),
            &resolver,
            &CommentSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ToggleError::MalformedCommenter(_)));
        assert_eq!(buffer.text(), "x");
    }
}
