//! Command executor for comment toggling.
//!
//! Wraps a [`TextBuffer`], its carets, folding and comment settings behind one command enum, so a
//! frontend can drive comment toggling the same way it drives typing.
//!
//! Every command that edits text becomes one undo step holding its edits and the carets before
//! and after. A toggle that fails with a [`ToggleError`] is reverted before the error is
//! returned, so a failed toggle never leaves partial edits behind.
//!
//! # Example
//!
//! ```rust
//! use comment_core::{Command, CommandExecutor, CommentSettings, CommenterDescriptor};
//! use comment_core::{Caret, SingleLanguageResolver};
//!
//! let resolver = SingleLanguageResolver::new(CommenterDescriptor::line("//"));
//! let mut executor = CommandExecutor::new("let a = 1;\n", resolver, CommentSettings::default());
//!
//! executor.execute(Command::ToggleLineComment).unwrap();
//! assert_eq!(executor.text(), "//let a = 1;\n");
//!
//! executor.execute(Command::Undo).unwrap();
//! assert_eq!(executor.text(), "let a = 1;\n");
//! ```

use crate::buffer::{Buffer, TextBuffer};
use crate::caret::{Caret, CaretTracker, normalize_carets};
use crate::delta::{TextDelta, TextDeltaEdit};
use crate::error::{CommandError, ToggleError};
use crate::folding::{FoldRegion, FoldingModel};
use crate::resolver::CommenterResolver;
use crate::settings::CommentSettings;
use crate::toggle::{CommentToggler, ToggleOutcome};
use std::collections::VecDeque;

/// Everything a frontend can ask the executor to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Toggle line comments for every caret.
    ToggleLineComment,
    /// Toggle a block comment around the primary (first) caret.
    ToggleBlockComment,
    /// Insert text at a character offset.
    Insert {
        /// Character offset.
        offset: usize,
        /// Text to insert.
        text: String,
    },
    /// Delete `[start, end)`.
    Delete {
        /// Inclusive start character offset.
        start: usize,
        /// Exclusive end character offset.
        end: usize,
    },
    /// Replace all carets.
    SetCarets(Vec<Caret>),
    /// Add a collapsed fold over `[start, end)`.
    Fold {
        /// Inclusive start character offset.
        start: usize,
        /// Exclusive end character offset.
        end: usize,
    },
    /// Expand the innermost fold containing `offset`.
    Unfold {
        /// Character offset inside the fold.
        offset: usize,
    },
    /// Undo the last step.
    Undo,
    /// Redo the last undone step.
    Redo,
}

/// What a successful command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Done; nothing to report.
    Success,
    /// A toggle ran; carries its report and warnings.
    Toggled(ToggleOutcome),
}

#[derive(Debug, Clone)]
struct UndoStep {
    edits: Vec<TextDeltaEdit>,
    before_carets: Vec<Caret>,
    after_carets: Vec<Caret>,
}

/// Bounded undo history; the oldest step is dropped once `limit` is reached.
#[derive(Debug)]
struct History {
    undo: VecDeque<UndoStep>,
    redo: Vec<UndoStep>,
    limit: usize,
}

impl History {
    fn with_limit(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit,
        }
    }

    /// Records a fresh edit. Anything that could be redone is gone after this.
    fn record(&mut self, step: UndoStep) {
        self.redo.clear();
        self.push_undo(step);
    }

    fn push_undo(&mut self, step: UndoStep) {
        if self.undo.len() >= self.limit {
            self.undo.pop_front();
        }
        self.undo.push_back(step);
    }
}

/// Command executor
///
/// Owns the buffer, carets, folding model, commenter resolver and settings. Commands run one at
/// a time; the executor remembers the previous command so repeated line comment toggles on an
/// empty line do not keep jumping the caret.
pub struct CommandExecutor {
    buffer: TextBuffer,
    carets: Vec<Caret>,
    folding: FoldingModel,
    resolver: Box<dyn CommenterResolver>,
    settings: CommentSettings,
    /// Command history
    command_history: Vec<Command>,
    history: History,
    /// Delta of the last executed text modification (cleared on each `execute()` call).
    last_text_delta: Option<TextDelta>,
}

impl CommandExecutor {
    /// Create an executor with one caret at offset 0.
    pub fn new(
        text: &str,
        resolver: impl CommenterResolver + 'static,
        settings: CommentSettings,
    ) -> Self {
        Self {
            buffer: TextBuffer::new(text),
            carets: vec![Caret::at(0)],
            folding: FoldingModel::new(),
            resolver: Box::new(resolver),
            settings,
            command_history: Vec::new(),
            history: History::with_limit(1000),
            last_text_delta: None,
        }
    }

    /// Runs one command.
    pub fn execute(&mut self, command: Command) -> Result<CommandResult, CommandError> {
        self.last_text_delta = None;
        let after_line_comment_toggle = matches!(
            self.command_history.last(),
            Some(Command::ToggleLineComment)
        );
        self.command_history.push(command.clone());

        match command {
            Command::ToggleLineComment => self.execute_toggle_line(after_line_comment_toggle),
            Command::ToggleBlockComment => self.execute_toggle_block(),
            Command::Insert { offset, text } => self.execute_insert(offset, text),
            Command::Delete { start, end } => self.execute_delete(start, end),
            Command::SetCarets(carets) => self.execute_set_carets(carets),
            Command::Fold { start, end } => self.execute_fold(start, end),
            Command::Unfold { offset } => {
                self.folding.expand_at(offset);
                Ok(CommandResult::Success)
            }
            Command::Undo => self.execute_undo(),
            Command::Redo => self.execute_redo(),
        }
    }

    /// Batch execute commands, stopping at the first error.
    pub fn execute_batch(
        &mut self,
        commands: Vec<Command>,
    ) -> Result<Vec<CommandResult>, CommandError> {
        commands
            .into_iter()
            .map(|command| self.execute(command))
            .collect()
    }

    /// Current text.
    pub fn text(&self) -> String {
        self.buffer.text()
    }

    /// The buffer.
    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    /// Current carets, sorted by position.
    pub fn carets(&self) -> &[Caret] {
        &self.carets
    }

    /// The folding model.
    pub fn folding(&self) -> &FoldingModel {
        &self.folding
    }

    /// Comment settings.
    pub fn settings(&self) -> &CommentSettings {
        &self.settings
    }

    /// Replace the comment settings.
    pub fn set_settings(&mut self, settings: CommentSettings) {
        self.settings = settings;
    }

    /// Commands executed so far, including failed ones.
    pub fn command_history(&self) -> &[Command] {
        &self.command_history
    }

    /// Returns `true` if there is a step to undo.
    pub fn can_undo(&self) -> bool {
        !self.history.undo.is_empty()
    }

    /// Returns `true` if there is a step to redo.
    pub fn can_redo(&self) -> bool {
        !self.history.redo.is_empty()
    }

    /// Number of steps that can be undone.
    pub fn undo_depth(&self) -> usize {
        self.history.undo.len()
    }

    /// Delta produced by the last successful `execute()` call, if it changed the text.
    pub fn last_text_delta(&self) -> Option<&TextDelta> {
        self.last_text_delta.as_ref()
    }

    /// Take the delta produced by the last successful `execute()` call.
    pub fn take_last_text_delta(&mut self) -> Option<TextDelta> {
        self.last_text_delta.take()
    }

    fn execute_toggle_line(
        &mut self,
        after_line_comment_toggle: bool,
    ) -> Result<CommandResult, CommandError> {
        let mut carets = self.carets.clone();
        let toggler = CommentToggler::new(&*self.resolver, &self.settings)
            .with_folding(&self.folding)
            .after_line_comment_toggle(after_line_comment_toggle);
        let result = toggler.toggle_line_comments(&mut self.buffer, &mut carets);
        self.finish_toggle(result, carets)
    }

    fn execute_toggle_block(&mut self) -> Result<CommandResult, CommandError> {
        let mut carets = self.carets.clone();
        let result = match carets.first_mut() {
            Some(primary) => CommentToggler::new(&*self.resolver, &self.settings)
                .toggle_block_comment(&mut self.buffer, primary),
            None => Ok(ToggleOutcome::default()),
        };
        self.finish_toggle(result, carets)
    }

    fn finish_toggle(
        &mut self,
        result: Result<ToggleOutcome, ToggleError>,
        carets: Vec<Caret>,
    ) -> Result<CommandResult, CommandError> {
        let delta = self.buffer.take_delta();
        match result {
            Ok(outcome) => {
                let before = std::mem::replace(&mut self.carets, normalize_carets(carets));
                self.record(delta, before);
                Ok(CommandResult::Toggled(outcome))
            }
            Err(err) => {
                for edit in delta.inverted_edits() {
                    self.buffer.apply_edit(&edit);
                }
                self.buffer.take_delta();
                tracing::warn!(%err, edits = delta.edits.len(), "toggle failed, edits rolled back");
                Err(err.into())
            }
        }
    }

    /// Push an undo step for `delta` and let folds and language spans follow it.
    fn record(&mut self, delta: TextDelta, before_carets: Vec<Caret>) {
        if delta.is_empty() {
            return;
        }
        self.follow_edits(&delta.edits);
        self.history.record(UndoStep {
            edits: delta.edits.clone(),
            before_carets,
            after_carets: self.carets.clone(),
        });
        self.last_text_delta = Some(delta);
    }

    fn follow_edits(&mut self, edits: &[TextDeltaEdit]) {
        for edit in edits {
            self.folding.apply_edit(edit);
            self.resolver.apply_edit(edit);
        }
    }

    fn check_range(&self, start: usize, end: usize) -> Result<(), CommandError> {
        let len = self.buffer.len_chars();
        if start > end || end > len {
            return Err(CommandError::InvalidRange { start, end, len });
        }
        Ok(())
    }

    /// Run `edit` with carets tracked across it, then record the step.
    fn execute_edit(&mut self, edit: impl FnOnce(&mut TextBuffer)) -> CommandResult {
        let before = self.carets.clone();
        let tracker = CaretTracker::track(&mut self.buffer, &self.carets);
        edit(&mut self.buffer);
        tracker.sync(&self.buffer, &mut self.carets);
        tracker.release(&mut self.buffer);
        self.carets = normalize_carets(std::mem::take(&mut self.carets));
        let delta = self.buffer.take_delta();
        self.record(delta, before);
        CommandResult::Success
    }

    fn execute_insert(
        &mut self,
        offset: usize,
        text: String,
    ) -> Result<CommandResult, CommandError> {
        self.check_range(offset, offset)?;
        if text.is_empty() {
            return Ok(CommandResult::Success);
        }
        Ok(self.execute_edit(|buffer| buffer.insert(offset, &text)))
    }

    fn execute_delete(&mut self, start: usize, end: usize) -> Result<CommandResult, CommandError> {
        self.check_range(start, end)?;
        if start == end {
            return Ok(CommandResult::Success);
        }
        Ok(self.execute_edit(|buffer| buffer.delete(start, end)))
    }

    fn execute_set_carets(&mut self, carets: Vec<Caret>) -> Result<CommandResult, CommandError> {
        for caret in &carets {
            self.check_range(caret.selection_start(), caret.selection_end())?;
            self.check_range(caret.offset, caret.offset)?;
        }
        self.carets = normalize_carets(carets);
        Ok(CommandResult::Success)
    }

    fn execute_fold(&mut self, start: usize, end: usize) -> Result<CommandResult, CommandError> {
        self.check_range(start, end)?;
        let mut region = FoldRegion::new(start, end);
        region.collapse();
        if !self.folding.add_region(region) {
            self.folding.collapse_at(start);
        }
        Ok(CommandResult::Success)
    }

    fn execute_undo(&mut self) -> Result<CommandResult, CommandError> {
        let Some(step) = self.history.undo.pop_back() else {
            return Err(CommandError::NothingToUndo);
        };

        for edit in step.edits.iter().rev() {
            self.buffer.apply_edit(&edit.inverted());
        }
        let delta = self.buffer.take_delta();
        self.follow_edits(&delta.edits);
        self.carets = step.before_carets.clone();
        self.last_text_delta = Some(delta);
        self.history.redo.push(step);
        Ok(CommandResult::Success)
    }

    fn execute_redo(&mut self) -> Result<CommandResult, CommandError> {
        let Some(step) = self.history.redo.pop() else {
            return Err(CommandError::NothingToRedo);
        };

        for edit in &step.edits {
            self.buffer.apply_edit(edit);
        }
        let delta = self.buffer.take_delta();
        self.follow_edits(&delta.edits);
        self.carets = step.after_carets.clone();
        self.last_text_delta = Some(delta);
        self.history.push_undo(step);
        Ok(CommandResult::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::SingleLanguageResolver;
    use comment_core_lang::CommenterDescriptor;
    use pretty_assertions::assert_eq;

    fn executor(text: &str) -> CommandExecutor {
        let resolver =
            SingleLanguageResolver::new(CommenterDescriptor::line_and_block("//", "/*", "*/"));
        CommandExecutor::new(text, resolver, CommentSettings::default())
    }

    #[test]
    fn test_toggle_undo_redo() {
        let mut ex = executor("a\nb\n");
        ex.execute(Command::SetCarets(vec![Caret::with_selection(0..4)]))
            .unwrap();
        ex.execute(Command::ToggleLineComment).unwrap();
        assert_eq!(ex.text(), "//a\n//b\n");
        assert_eq!(ex.carets(), &[Caret::with_selection(0..8)]);

        ex.execute(Command::Undo).unwrap();
        assert_eq!(ex.text(), "a\nb\n");
        assert_eq!(ex.carets(), &[Caret::with_selection(0..4)]);

        ex.execute(Command::Redo).unwrap();
        assert_eq!(ex.text(), "//a\n//b\n");
        assert_eq!(ex.carets(), &[Caret::with_selection(0..8)]);
        assert_eq!(ex.undo_depth(), 1);
    }

    #[test]
    fn test_empty_stacks() {
        let mut ex = executor("x");
        assert_eq!(ex.execute(Command::Undo), Err(CommandError::NothingToUndo));
        assert_eq!(ex.execute(Command::Redo), Err(CommandError::NothingToRedo));
    }

    #[test]
    fn test_insert_and_delete_track_carets() {
        let mut ex = executor("abc");
        ex.execute(Command::SetCarets(vec![Caret::at(2)])).unwrap();
        ex.execute(Command::Insert {
            offset: 0,
            text: "xy".to_string(),
        })
        .unwrap();
        assert_eq!(ex.text(), "xyabc");
        assert_eq!(ex.carets(), &[Caret::at(4)]);

        ex.execute(Command::Delete { start: 0, end: 1 }).unwrap();
        assert_eq!(ex.text(), "yabc");
        assert_eq!(ex.carets(), &[Caret::at(3)]);

        let err = ex
            .execute(Command::Delete { start: 2, end: 9 })
            .unwrap_err();
        assert_eq!(
            err,
            CommandError::InvalidRange {
                start: 2,
                end: 9,
                len: 4,
            }
        );
    }

    #[test]
    fn test_failed_toggle_leaves_no_step() {
        let mut descriptor = CommenterDescriptor::block("/*", "*/");
        descriptor.commented_block_prefix = Some("\\*".to_string());
        let mut ex = CommandExecutor::new(
            "abc",
            SingleLanguageResolver::new(descriptor),
            CommentSettings::default(),
        );
        ex.execute(Command::SetCarets(vec![Caret::with_selection(0..3)]))
            .unwrap();
        let err = ex.execute(Command::ToggleBlockComment).unwrap_err();
        assert!(matches!(
            err,
            CommandError::Toggle(ToggleError::MalformedCommenter(_))
        ));
        assert_eq!(ex.text(), "abc");
        assert!(!ex.can_undo());
    }

    #[test]
    fn test_folds_follow_toggles() {
        let mut ex = executor("a\nb {\n  c\n}\n");
        ex.execute(Command::Fold { start: 5, end: 10 }).unwrap();
        ex.execute(Command::SetCarets(vec![Caret::at(0)])).unwrap();
        ex.execute(Command::ToggleLineComment).unwrap();
        assert_eq!(ex.text(), "//a\nb {\n  c\n}\n");
        assert_eq!(ex.folding().regions()[0].start, 7);
        assert_eq!(ex.folding().regions()[0].end, 12);
    }

    #[test]
    fn test_repeated_toggle_on_empty_line() {
        let mut ex = executor("a\n\nb");
        ex.execute(Command::SetCarets(vec![Caret::at(2)])).unwrap();
        ex.execute(Command::ToggleLineComment).unwrap();
        assert_eq!(ex.text(), "a\n//\nb");
        assert_eq!(ex.carets(), &[Caret::at(4)]);

        ex.execute(Command::ToggleLineComment).unwrap();
        assert_eq!(ex.text(), "a\n\nb");
        assert_eq!(ex.carets(), &[Caret::at(3)]);
    }
}
