//! Line comment toggling.
//!
//! Every block is planned before the first edit: commenters are resolved, each line is checked,
//! and the block's direction is fixed (it is uncommented only when every relevant line already is).
//! Edits then run from the last block to the first and from the bottom line up, so the offsets
//! cached during planning stay valid.

use crate::buffer::{Buffer, in_bulk};
use crate::caret::{Caret, CaretTracker};
use crate::commenter::{Commenter, TokenCommenter};
use crate::error::ToggleError;
use crate::folding::FoldingModel;
use crate::grouper::{Block, CaretUpdate, group_carets, should_move_carets};
use crate::indent::{IndentOptions, indent_width, min_line_indent};
use crate::layout::{cell_width_at, shifted_column};
use crate::nested::{BlockTokens, comment_line_with_block, uncomment_line_with_block};
use crate::resolver::CommenterResolver;
use crate::self_managing::CommenterState;
use crate::settings::CommentSettings;
use crate::text::{
    BLANKS, char_len, index_of, is_empty_or_spaces, is_line_blank, region_matches,
    region_matches_before, shift_backward, shift_forward,
};
use crate::toggle::{BlockReport, ToggleAction};

/// Cached location of a line's existing comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CommentedLine {
    /// First non-blank offset of the line.
    start: usize,
    /// End of the commented content (block-form lines only).
    end: Option<usize>,
}

#[derive(Debug, Clone)]
struct LinePlan {
    commenter: Option<Commenter>,
    commented: Option<CommentedLine>,
}

#[derive(Debug)]
struct BlockPlan {
    start_line: usize,
    end_line: usize,
    lines: Vec<LinePlan>,
    states: Vec<(Commenter, CommenterState)>,
    action: ToggleAction,
    comment_with_indent: bool,
    indent: IndentOptions,
    min_indent: usize,
}

impl BlockPlan {
    fn is_single_line(&self) -> bool {
        self.start_line == self.end_line
    }

    fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }

    fn line(&self, line: usize) -> &LinePlan {
        &self.lines[line - self.start_line]
    }
}

fn state_for<'s>(
    states: &'s mut [(Commenter, CommenterState)],
    commenter: &Commenter,
) -> Option<&'s mut CommenterState> {
    states
        .iter_mut()
        .find(|(c, _)| c.same_as(commenter))
        .map(|(_, s)| s)
}

/// End of the line's non-blank content (the line start for blank lines).
fn content_end(buffer: &dyn Buffer, line: usize) -> usize {
    let start = buffer.line_start_offset(line);
    let end = buffer.line_end_offset(line);
    if end == start {
        return start;
    }
    shift_backward(buffer, end - 1, BLANKS).map_or(start, |last| (last + 1).max(start))
}

/// Toggle line comments for every caret.
pub(crate) fn toggle_line_comments(
    buffer: &mut dyn Buffer,
    carets: &mut [Caret],
    resolver: &dyn CommenterResolver,
    settings: &CommentSettings,
    folding: Option<&FoldingModel>,
    after_line_comment_toggle: bool,
) -> Result<Vec<BlockReport>, ToggleError> {
    let blocks = group_carets(&*buffer, carets, folding, after_line_comment_toggle);
    let move_carets = should_move_carets(&blocks);
    let mut plans: Vec<BlockPlan> = blocks
        .iter()
        .map(|block| plan_block(&*buffer, block, resolver, settings))
        .collect();

    let tracker = CaretTracker::track(buffer, carets);
    let mut result = Ok(());
    for plan in plans.iter_mut().rev() {
        tracing::debug!(
            start_line = plan.start_line,
            end_line = plan.end_line,
            action = ?plan.action,
            "toggling line comments"
        );
        if let Err(err) = apply_block(buffer, plan, settings) {
            result = Err(err);
            break;
        }
    }
    tracker.sync(&*buffer, carets);
    tracker.release(buffer);
    result?;

    if move_carets {
        for (block, plan) in blocks.iter().zip(&plans) {
            update_carets(&*buffer, block, plan, carets, settings);
        }
    }

    Ok(plans
        .iter()
        .map(|plan| BlockReport {
            start_line: plan.start_line,
            end_line: plan.end_line,
            action: plan.action,
        })
        .collect())
}

fn plan_block(
    buffer: &dyn Buffer,
    block: &Block,
    resolver: &dyn CommenterResolver,
    settings: &CommentSettings,
) -> BlockPlan {
    let (start_line, end_line) = (block.start_line, block.end_line);
    let shared = resolver.resolve_range(
        buffer,
        buffer.line_start_offset(start_line),
        buffer.line_end_offset(end_line),
    );
    let commenters: Vec<Option<Commenter>> = (start_line..=end_line)
        .map(|line| {
            let commenter = match &shared {
                Some(c) => Some(c.clone()),
                None => {
                    let at = shift_forward(buffer, buffer.line_start_offset(line), BLANKS);
                    resolver.resolve(buffer, at)
                }
            };
            commenter.filter(Commenter::can_comment)
        })
        .collect();

    let mut states: Vec<(Commenter, CommenterState)> = Vec::new();
    for commenter in commenters.iter().flatten() {
        if let Commenter::SelfManaging(sm) = commenter
            && !states.iter().any(|(c, _)| c.same_as(commenter))
        {
            let state = sm
                .create_line_commenting_state(start_line, end_line, buffer)
                .unwrap_or_default();
            states.push((commenter.clone(), state));
        }
    }

    let single_line = start_line == end_line;
    let mut lines = Vec::with_capacity(commenters.len());
    let mut first_uncommented: Option<Commenter> = None;
    let mut any_commented = false;
    for (line, commenter) in (start_line..).zip(commenters) {
        let commented = match &commenter {
            Some(c) if first_uncommented.is_none() => {
                let detected = detect_commented_line(buffer, line, c, single_line, &mut states);
                if detected.is_none() && (single_line || !is_line_blank(buffer, line)) {
                    first_uncommented = Some(c.clone());
                }
                detected
            }
            _ => None,
        };
        any_commented |= commented.is_some();
        lines.push(LinePlan {
            commenter,
            commented,
        });
    }

    let action = if first_uncommented.is_some() {
        ToggleAction::Commented
    } else if any_commented {
        ToggleAction::Uncommented
    } else {
        ToggleAction::Skipped
    };

    let effective = first_uncommented
        .as_ref()
        .or_else(|| lines.iter().find_map(|l| l.commenter.as_ref()))
        .map(|c| settings.effective_for(c));
    let comment_with_indent = effective.is_some_and(|e| e.line_comment_with_indent);
    let indent = effective.map_or_else(|| settings.indent(), |e| e.indent);
    let min_indent = if action == ToggleAction::Commented && comment_with_indent {
        compute_min_indent(buffer, resolver, start_line, end_line, indent.tab_size)
    } else {
        0
    };

    BlockPlan {
        start_line,
        end_line,
        lines,
        states,
        action,
        comment_with_indent,
        indent,
        min_indent,
    }
}

fn detect_commented_line(
    buffer: &dyn Buffer,
    line: usize,
    commenter: &Commenter,
    single_line: bool,
    states: &mut [(Commenter, CommenterState)],
) -> Option<CommentedLine> {
    let line_start = shift_forward(buffer, buffer.line_start_offset(line), BLANKS);
    match commenter {
        Commenter::SelfManaging(sm) => {
            let state = state_for(states, commenter)?;
            sm.is_line_commented(line, line_start, buffer, state)
                .then_some(CommentedLine {
                    start: line_start,
                    end: None,
                })
        }
        Commenter::Tokens(t) => {
            let descriptor = t.descriptor();
            if let Some(prefix) = descriptor.line_prefix() {
                return region_matches(buffer, line_start, prefix.trim_end()).then_some(
                    CommentedLine {
                        start: line_start,
                        end: None,
                    },
                );
            }
            let tokens = BlockTokens::from_descriptor(descriptor)?;
            let end = content_end(buffer, line).max(line_start);
            let wrapped = end - line_start >= char_len(&tokens.prefix) + char_len(&tokens.suffix)
                && region_matches(buffer, line_start, &tokens.prefix)
                && region_matches_before(buffer, end, &tokens.suffix);
            ((line_start == end && !single_line) || wrapped).then_some(CommentedLine {
                start: line_start,
                end: Some(end),
            })
        }
    }
}

/// Smallest indentation of the block's non-blank lines, lowered to the start of a comment on
/// the line just above.
fn compute_min_indent(
    buffer: &dyn Buffer,
    resolver: &dyn CommenterResolver,
    start_line: usize,
    end_line: usize,
    tab_size: usize,
) -> usize {
    let mut min = min_line_indent(buffer, start_line, end_line, tab_size);
    if start_line > 0 {
        let previous = start_line - 1;
        let line_start = buffer.line_start_offset(previous);
        let comment_start = shift_forward(buffer, line_start, BLANKS);
        let prefix = resolver.resolve(buffer, comment_start).and_then(|c| {
            let d = c.descriptor()?;
            d.line_prefix()
                .or_else(|| d.block_tokens().map(|(p, _)| p))
                .map(str::to_string)
        });
        if let Some(prefix) = prefix
            && region_matches(buffer, comment_start, &prefix)
        {
            let width = indent_width(buffer, line_start, comment_start, tab_size);
            min = Some(min.map_or(width, |m| m.min(width)));
        }
    }
    min.unwrap_or(0)
}

fn apply_block(
    buffer: &mut dyn Buffer,
    plan: &mut BlockPlan,
    settings: &CommentSettings,
) -> Result<(), ToggleError> {
    let bulk = plan.line_count() >= settings.bulk_lines_trigger;
    in_bulk(buffer, bulk, |buffer| match plan.action {
        ToggleAction::Commented => {
            if plan.comment_with_indent {
                comment_with_indent(buffer, plan, settings);
            } else {
                for line in (plan.start_line..=plan.end_line).rev() {
                    let offset = buffer.line_start_offset(line);
                    comment_line(buffer, plan, line, offset, settings);
                }
            }
            Ok(())
        }
        ToggleAction::Uncommented => uncomment_block(buffer, plan, settings),
        ToggleAction::Skipped => Ok(()),
    })
}

fn comment_with_indent(buffer: &mut dyn Buffer, plan: &mut BlockPlan, settings: &CommentSettings) {
    let tab_size = plan.indent.tab_size;
    for line in (plan.start_line..=plan.end_line).rev() {
        let Some(commenter) = plan.line(line).commenter.as_ref() else {
            continue;
        };
        let block_form = commenter.descriptor().is_some_and(|d| !d.has_line());
        if block_form && !plan.is_single_line() && is_line_blank(&*buffer, line) {
            continue;
        }

        let line_start = buffer.line_start_offset(line);
        let mut offset = line_start;
        let mut width = 0usize;
        while width < plan.min_indent {
            match buffer.char_at(offset) {
                Some(ch) if BLANKS.contains(&ch) => {
                    width += cell_width_at(ch, width, tab_size);
                    offset += 1;
                }
                _ => {
                    let whitespace = plan.indent.generate(plan.min_indent);
                    buffer.replace(line_start, offset, &whitespace);
                    offset = line_start + char_len(&whitespace);
                    break;
                }
            }
        }
        comment_line(buffer, plan, line, offset, settings);
    }
}

fn comment_line(
    buffer: &mut dyn Buffer,
    plan: &mut BlockPlan,
    line: usize,
    offset: usize,
    settings: &CommentSettings,
) {
    let Some(commenter) = plan.line(line).commenter.clone() else {
        return;
    };
    match &commenter {
        Commenter::SelfManaging(sm) => {
            if let Some(state) = state_for(&mut plan.states, &commenter) {
                sm.comment_line(line, offset, buffer, state);
            }
        }
        Commenter::Tokens(t) => {
            let add_space = settings.effective_for(&commenter).line_comment_add_space;
            comment_line_with_tokens(buffer, t, line, offset, plan.is_single_line(), add_space);
        }
    }
}

fn comment_line_with_tokens(
    buffer: &mut dyn Buffer,
    commenter: &TokenCommenter,
    line: usize,
    offset: usize,
    single_line: bool,
    add_space: bool,
) {
    let descriptor = commenter.descriptor();
    let shifted = shift_forward(&*buffer, offset, BLANKS);

    if let Some(prefix) = descriptor.line_prefix() {
        if let Some(suffix) = descriptor.line_suffix() {
            if !region_matches(&*buffer, shifted, prefix) {
                let end = content_end(&*buffer, line).max(shifted);
                if !region_matches_before(&*buffer, end, suffix) {
                    buffer.insert(end, suffix);
                }
                buffer.insert(offset, prefix);
            }
        } else {
            let mut text = prefix.to_string();
            if add_space && !matches!(buffer.char_at(shifted), None | Some('\n' | '\r')) {
                text.push(' ');
            }
            buffer.insert(offset, &text);
        }
        return;
    }

    let Some(tokens) = BlockTokens::from_descriptor(descriptor) else {
        return;
    };
    let end = content_end(&*buffer, line);
    if end <= shifted && !single_line {
        return;
    }
    let end = end.max(offset);
    let marker = commenter
        .escaper()
        .map(|_| buffer.create_range_marker(offset..end, true, true));
    if comment_line_with_block(buffer, offset, end, &tokens)
        && let (Some(escaper), Some(marker)) = (commenter.escaper(), marker)
    {
        escaper.escape(buffer, marker);
    }
    if let Some(marker) = marker {
        buffer.release_marker(marker);
    }
}

fn uncomment_block(
    buffer: &mut dyn Buffer,
    plan: &mut BlockPlan,
    settings: &CommentSettings,
) -> Result<(), ToggleError> {
    for line in (plan.start_line..=plan.end_line).rev() {
        let LinePlan {
            commenter: Some(commenter),
            commented: Some(commented),
        } = plan.line(line).clone()
        else {
            continue;
        };
        if commented.end == Some(commented.start) {
            continue;
        }
        match &commenter {
            Commenter::SelfManaging(sm) => {
                if let Some(state) = state_for(&mut plan.states, &commenter) {
                    sm.uncomment_line(line, commented.start, buffer, state);
                }
            }
            Commenter::Tokens(t) => {
                let remove_space = settings.effective_for(&commenter).line_comment_add_space;
                uncomment_line_with_tokens(buffer, t, line, commented, remove_space)?;
            }
        }
    }
    Ok(())
}

fn uncomment_line_with_tokens(
    buffer: &mut dyn Buffer,
    commenter: &TokenCommenter,
    line: usize,
    commented: CommentedLine,
    remove_space: bool,
) -> Result<(), ToggleError> {
    let descriptor = commenter.descriptor();
    let start = commented.start;

    if let Some(prefix) = descriptor.line_prefix() {
        if let Some(suffix) = descriptor.line_suffix() {
            let mut end = commented
                .end
                .unwrap_or_else(|| buffer.line_end_offset(line));
            while end > start && buffer.char_at(end - 1).is_some_and(char::is_whitespace) {
                end -= 1;
            }
            if let Some(pos) = index_of(&*buffer, suffix, start + char_len(prefix), end) {
                buffer.delete(pos, pos + char_len(suffix));
            }
        }

        let spaced = format!("{prefix} ");
        let trimmed = prefix.trim();
        let to_delete = if remove_space && region_matches(&*buffer, start, &spaced) {
            char_len(&spaced)
        } else if region_matches(&*buffer, start, prefix) {
            char_len(prefix)
        } else if !trimmed.is_empty() && region_matches(&*buffer, start, trimmed) {
            char_len(trimmed)
        } else {
            return Err(ToggleError::PrefixMismatch {
                line,
                prefix: prefix.to_string(),
            });
        };
        buffer.delete(start, start + to_delete);

        let line_start = buffer.line_start_offset(line);
        let line_end = buffer.line_end_offset(line);
        if line_end > line_start && is_empty_or_spaces(&*buffer, line_start, line_end) {
            buffer.delete(line_start, line_end);
        }
        return Ok(());
    }

    let Some(tokens) = BlockTokens::from_descriptor(descriptor) else {
        return Ok(());
    };
    let end = commented.end.unwrap_or_else(|| content_end(&*buffer, line));
    let marker = commenter
        .escaper()
        .map(|_| buffer.create_range_marker(start..end, false, false));
    uncomment_line_with_block(buffer, start, end, &tokens);
    if let Some(marker) = marker {
        if let Some(escaper) = commenter.escaper() {
            escaper.unescape(buffer, marker);
        }
        buffer.release_marker(marker);
    }
    Ok(())
}

fn update_carets(
    buffer: &dyn Buffer,
    block: &Block,
    plan: &BlockPlan,
    carets: &mut [Caret],
    settings: &CommentSettings,
) {
    let Some(update) = block.caret_update else {
        return;
    };
    for &index in &block.carets {
        let Some(caret) = carets.get_mut(index) else {
            continue;
        };
        match update {
            CaretUpdate::PutAtCommentStart => {
                let Some(commenter) = plan.lines.first().and_then(|l| l.commenter.as_ref()) else {
                    continue;
                };
                let prefix = match commenter {
                    Commenter::SelfManaging(sm) => plan
                        .states
                        .iter()
                        .find(|(c, _)| c.same_as(commenter))
                        .and_then(|(_, state)| sm.comment_prefix(block.start_line, buffer, state))
                        .unwrap_or_default(),
                    Commenter::Tokens(t) => {
                        let d = t.descriptor();
                        d.line_prefix()
                            .or_else(|| d.block_tokens().map(|(p, _)| p))
                            .unwrap_or_default()
                            .to_string()
                    }
                };
                let line_start =
                    shift_forward(buffer, buffer.line_start_offset(block.start_line), BLANKS);
                let offset = shift_forward(buffer, line_start + char_len(&prefix), BLANKS);
                caret.move_to(offset.min(buffer.len_chars()));
            }
            CaretUpdate::ShiftDown => {
                let line = buffer.line_of(caret.offset);
                if line + 1 >= buffer.line_count() {
                    continue;
                }
                let line_start = buffer.line_start_offset(line);
                let text = buffer.chars_at(line_start..buffer.line_end_offset(line));
                let next_start = buffer.line_start_offset(line + 1);
                let next = buffer.chars_at(next_start..buffer.line_end_offset(line + 1));
                let column = shifted_column(
                    &text,
                    caret.offset.saturating_sub(line_start),
                    &next,
                    settings.soft_wrap_width,
                    plan.indent.tab_size,
                );
                caret.remove_selection();
                caret.move_to(next_start + column);
            }
            CaretUpdate::RestoreSelection => {
                if let Some(selection) = caret.selection.clone() {
                    let start = buffer.line_start_offset(buffer.line_of(selection.start));
                    caret.set_selection(start..selection.end);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::TextBuffer;
    use crate::resolver::SingleLanguageResolver;
    use comment_core_lang::CommenterDescriptor;
    use pretty_assertions::assert_eq;

    fn toggle(text: &str, carets: &mut [Caret], descriptor: CommenterDescriptor) -> String {
        toggle_with(text, carets, descriptor, &CommentSettings::default())
    }

    fn toggle_with(
        text: &str,
        carets: &mut [Caret],
        descriptor: CommenterDescriptor,
        settings: &CommentSettings,
    ) -> String {
        let mut buffer = TextBuffer::new(text);
        let resolver = SingleLanguageResolver::new(descriptor);
        toggle_line_comments(&mut buffer, carets, &resolver, settings, None, false).unwrap();
        assert_eq!(buffer.marker_count(), 0);
        buffer.text()
    }

    #[test]
    fn test_comment_and_uncomment_selection() {
        let mut carets = [Caret::with_selection(0..4)];
        let commented = toggle("a\nb\n", &mut carets, CommenterDescriptor::line("//"));
        assert_eq!(commented, "//a\n//b\n");
        assert_eq!(carets[0].selection, Some(0..8));

        let uncommented = toggle(&commented, &mut carets, CommenterDescriptor::line("//"));
        assert_eq!(uncommented, "a\nb\n");
    }

    #[test]
    fn test_add_space() {
        let settings = CommentSettings {
            line_comment_add_space: true,
            ..Default::default()
        };
        let mut carets = [Caret::with_selection(0..4)];
        let commented = toggle_with(
            "a\nb\n",
            &mut carets,
            CommenterDescriptor::line("//"),
            &settings,
        );
        assert_eq!(commented, "// a\n// b\n");
        let mut carets = [Caret::with_selection(0..10)];
        let uncommented = toggle_with(
            &commented,
            &mut carets,
            CommenterDescriptor::line("//"),
            &settings,
        );
        assert_eq!(uncommented, "a\nb\n");
    }

    #[test]
    fn test_mixed_block_is_commented() {
        let mut carets = [Caret::with_selection(0..8)];
        let text = toggle("//a\nb\n//c", &mut carets, CommenterDescriptor::line("//"));
        assert_eq!(text, "////a\n//b\n////c");
    }

    #[test]
    fn test_blank_lines_do_not_decide_direction() {
        let mut carets = [Caret::with_selection(0..7)];
        let text = toggle("//a\n\n//b", &mut carets, CommenterDescriptor::line("//"));
        assert_eq!(text, "a\n\nb");
    }

    #[test]
    fn test_shift_down_after_toggle() {
        let mut carets = [Caret::at(1)];
        let text = toggle("abc\ndef", &mut carets, CommenterDescriptor::line("#"));
        assert_eq!(text, "#abc\ndef");
        assert_eq!(carets[0].offset, 7);
    }

    #[test]
    fn test_caret_on_blank_line_goes_after_prefix() {
        let settings = CommentSettings {
            line_comment_add_space: true,
            ..Default::default()
        };
        let mut carets = [Caret::at(2)];
        let text = toggle_with(
            "a\n\nb",
            &mut carets,
            CommenterDescriptor::line("//"),
            &settings,
        );
        assert_eq!(text, "a\n//\nb");
        assert_eq!(carets[0].offset, 4);
    }

    #[test]
    fn test_indented_commenting() {
        let settings = CommentSettings {
            line_comment_at_first_column: false,
            ..Default::default()
        };
        let mut carets = [Caret::with_selection(0..19)];
        let text = toggle_with(
            "    a\n\n      b\n    c",
            &mut carets,
            CommenterDescriptor::line("//"),
            &settings,
        );
        assert_eq!(text, "    //a\n    //\n    //  b\n    //c");

        let mut carets = [Caret::with_selection(0..text.chars().count())];
        let back = toggle_with(
            &text,
            &mut carets,
            CommenterDescriptor::line("//"),
            &settings,
        );
        assert_eq!(back, "    a\n\n      b\n    c");
    }

    #[test]
    fn test_line_suffix() {
        let html = CommenterDescriptor::line("<!--").with_line_suffix("-->");
        let mut carets = [Caret::at(0)];
        let text = toggle("text  ", &mut carets, html.clone());
        assert_eq!(text, "<!--text-->  ");
        let mut carets = [Caret::at(0)];
        assert_eq!(toggle(&text, &mut carets, html), "text  ");
    }

    #[test]
    fn test_block_form_lines() {
        let css = CommenterDescriptor::block("/*", "*/");
        let mut carets = [Caret::with_selection(0..9)];
        let text = toggle("a {\n\n  b\n}", &mut carets, css.clone());
        assert_eq!(text, "/*a {*/\n\n/*  b*/\n}");

        let mut carets = [Caret::with_selection(0..17)];
        assert_eq!(toggle(&text, &mut carets, css), "a {\n\n  b\n}");
    }

    #[test]
    fn test_unresolvable_language_is_skipped() {
        let mut buffer = TextBuffer::new("a\nb");
        let resolver = SingleLanguageResolver::new(CommenterDescriptor::default());
        let reports = toggle_line_comments(
            &mut buffer,
            &mut [Caret::at(0)],
            &resolver,
            &CommentSettings::default(),
            None,
            false,
        )
        .unwrap();
        assert_eq!(buffer.text(), "a\nb");
        assert_eq!(reports[0].action, ToggleAction::Skipped);
    }

    #[test]
    fn test_bulk_trigger() {
        let settings = CommentSettings {
            bulk_lines_trigger: 2,
            ..Default::default()
        };
        let mut buffer = TextBuffer::new("a\nb\nc");
        let resolver = SingleLanguageResolver::new(CommenterDescriptor::line("#"));
        toggle_line_comments(
            &mut buffer,
            &mut [Caret::with_selection(0..5)],
            &resolver,
            &settings,
            None,
            false,
        )
        .unwrap();
        assert_eq!(buffer.text(), "#a\n#b\n#c");
        assert_eq!(buffer.bulk_update_count(), 1);
    }
}
