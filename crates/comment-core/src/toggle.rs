//! Toggle entry points.
//!
//! [`CommentToggler`] borrows everything a toggle needs (resolver, settings, folding) and runs
//! the line or block algorithm against a buffer and its carets. It holds no state of its own, so
//! one toggler can serve any number of calls.

use crate::block_comment;
use crate::buffer::Buffer;
use crate::caret::Caret;
use crate::commenter::Commenter;
use crate::error::{ToggleError, ToggleWarning};
use crate::folding::FoldingModel;
use crate::line_comment;
use crate::resolver::CommenterResolver;
use crate::settings::CommentSettings;
use comment_core_lang::CommenterDescriptor;

/// What a toggle did to one block of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    /// Comment markers were added.
    Commented,
    /// Comment markers were removed.
    Uncommented,
    /// Nothing was changed (no commenter, or a warning stopped the edit).
    Skipped,
}

/// Per-block summary of a toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockReport {
    /// First line of the block, before the toggle.
    pub start_line: usize,
    /// Last line of the block (inclusive), before the toggle.
    pub end_line: usize,
    /// Action taken.
    pub action: ToggleAction,
}

/// Result of a successful toggle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// One report per block, in buffer order.
    pub blocks: Vec<BlockReport>,
    /// Non-fatal conditions, in the order they were hit.
    pub warnings: Vec<ToggleWarning>,
}

impl ToggleOutcome {
    /// Returns `true` if at least one block was commented or uncommented.
    pub fn changed(&self) -> bool {
        self.blocks.iter().any(|b| b.action != ToggleAction::Skipped)
    }
}

/// Runs comment toggles with a fixed resolver and settings.
///
/// # Example
///
/// ```rust
/// use comment_core::{Caret, CommentSettings, CommentToggler, SingleLanguageResolver, TextBuffer};
/// use comment_core::{Buffer, CommenterDescriptor};
///
/// let resolver = SingleLanguageResolver::new(CommenterDescriptor::line("#"));
/// let settings = CommentSettings::default();
/// let toggler = CommentToggler::new(&resolver, &settings);
///
/// let mut buffer = TextBuffer::new("a = 1\nb = 2\n");
/// let mut carets = [Caret::with_selection(0..12)];
/// toggler.toggle_line_comments(&mut buffer, &mut carets).unwrap();
/// assert_eq!(buffer.text(), "#a = 1\n#b = 2\n");
/// ```
#[derive(Clone, Copy)]
pub struct CommentToggler<'a> {
    resolver: &'a dyn CommenterResolver,
    settings: &'a CommentSettings,
    folding: Option<&'a FoldingModel>,
    after_line_comment_toggle: bool,
}

impl<'a> CommentToggler<'a> {
    /// Create a toggler.
    pub fn new(resolver: &'a dyn CommenterResolver, settings: &'a CommentSettings) -> Self {
        Self {
            resolver,
            settings,
            folding: None,
            after_line_comment_toggle: false,
        }
    }

    /// Let collapsed folds widen caret blocks.
    pub fn with_folding(mut self, folding: &'a FoldingModel) -> Self {
        self.folding = Some(folding);
        self
    }

    /// Tell the toggler the previous user action was also a line comment toggle.
    pub fn after_line_comment_toggle(mut self, value: bool) -> Self {
        self.after_line_comment_toggle = value;
        self
    }

    /// Toggle line comments for every caret.
    ///
    /// Carets are sorted by position in place before grouping. On error the buffer may hold
    /// partial edits; the caller is expected to revert them (see [`crate::CommandExecutor`]).
    pub fn toggle_line_comments(
        &self,
        buffer: &mut dyn Buffer,
        carets: &mut [Caret],
    ) -> Result<ToggleOutcome, ToggleError> {
        validate_carets(&*buffer, carets)?;
        carets.sort_by_key(|c| (c.selection_start(), c.selection_end()));
        for caret in carets.iter() {
            if let Some(Commenter::Tokens(t)) =
                self.resolver.resolve(&*buffer, caret.selection_start())
            {
                check_descriptor(t.descriptor())?;
            }
        }

        let blocks = line_comment::toggle_line_comments(
            buffer,
            carets,
            self.resolver,
            self.settings,
            self.folding,
            self.after_line_comment_toggle,
        )?;
        Ok(ToggleOutcome {
            blocks,
            warnings: Vec::new(),
        })
    }

    /// Toggle a block comment around `caret`'s selection, or at the caret.
    pub fn toggle_block_comment(
        &self,
        buffer: &mut dyn Buffer,
        caret: &mut Caret,
    ) -> Result<ToggleOutcome, ToggleError> {
        validate_carets(&*buffer, std::slice::from_ref(caret))?;
        let result =
            block_comment::toggle_block_comment(buffer, caret, self.resolver, self.settings)?;
        Ok(ToggleOutcome {
            blocks: vec![result.report],
            warnings: result.warnings,
        })
    }
}

/// Reject descriptors whose escape tokens are only half defined.
pub(crate) fn check_descriptor(descriptor: &CommenterDescriptor) -> Result<(), ToggleError> {
    if descriptor.commented_block_prefix().is_some()
        != descriptor.commented_block_suffix().is_some()
    {
        return Err(ToggleError::MalformedCommenter(
            "escaped block comment prefix and suffix must be set together".to_string(),
        ));
    }
    Ok(())
}

fn validate_carets(buffer: &dyn Buffer, carets: &[Caret]) -> Result<(), ToggleError> {
    let len = buffer.len_chars();
    for caret in carets {
        if let Some(selection) = &caret.selection
            && selection.start > selection.end
        {
            return Err(ToggleError::ReversedSelection {
                start: selection.start,
                end: selection.end,
            });
        }
        let furthest = caret.offset.max(caret.selection_end());
        if furthest > len {
            return Err(ToggleError::InvalidOffset {
                offset: furthest,
                len,
            });
        }
    }
    Ok(())
}
