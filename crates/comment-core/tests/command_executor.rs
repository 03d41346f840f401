use comment_core::{
    Buffer, Caret, Command, CommandError, CommandExecutor, CommandResult, CommentSettings,
    Commenter, CommenterDescriptor, CommenterState, LanguageMapResolver, SelfManagingCommenter,
    SingleLanguageResolver, ToggleError, ToggleWarning,
};
use pretty_assertions::assert_eq;
use std::ops::Range;

fn c_like() -> SingleLanguageResolver {
    SingleLanguageResolver::new(CommenterDescriptor::line_and_block("//", "/*", "*/"))
}

#[test]
fn test_block_toggle_undo_redo() {
    let mut ex = CommandExecutor::new("let x = 1;", c_like(), CommentSettings::default());
    ex.execute(Command::SetCarets(vec![Caret::with_selection(4..5)]))
        .unwrap();

    let result = ex.execute(Command::ToggleBlockComment).unwrap();
    assert!(matches!(result, CommandResult::Toggled(ref outcome) if outcome.changed()));
    assert_eq!(ex.text(), "let /*x*/ = 1;");
    let delta = ex.take_last_text_delta().unwrap();
    assert_eq!(delta.before_char_count, 10);
    assert_eq!(delta.after_char_count, 14);

    ex.execute(Command::Undo).unwrap();
    assert_eq!(ex.text(), "let x = 1;");
    assert_eq!(ex.carets(), &[Caret::with_selection(4..5)]);
    assert!(ex.can_redo());

    ex.execute(Command::Redo).unwrap();
    assert_eq!(ex.text(), "let /*x*/ = 1;");
    assert!(!ex.can_redo());
}

#[test]
fn test_new_edit_clears_redo() {
    let mut ex = CommandExecutor::new("a\n", c_like(), CommentSettings::default());
    ex.execute_batch(vec![Command::ToggleLineComment, Command::Undo])
        .unwrap();
    assert!(ex.can_redo());

    ex.execute(Command::Insert {
        offset: 0,
        text: "b".to_string(),
    })
    .unwrap();
    assert!(!ex.can_redo());
    assert_eq!(ex.text(), "ba\n");
    assert_eq!(ex.command_history().len(), 3);
}

#[test]
fn test_warning_only_toggle_records_nothing() {
    let mut ex = CommandExecutor::new("a */ b", c_like(), CommentSettings::default());
    ex.execute(Command::SetCarets(vec![Caret::with_selection(0..6)]))
        .unwrap();

    let result = ex.execute(Command::ToggleBlockComment).unwrap();
    let CommandResult::Toggled(outcome) = result else {
        panic!("expected a toggle result");
    };
    assert_eq!(outcome.warnings, vec![ToggleWarning::UnmatchedSuffix { offset: 2 }]);
    assert!(!ex.can_undo());
    assert!(ex.last_text_delta().is_none());
}

/// A commenter that claims every line is commented and then deletes too much.
struct Greedy;

impl SelfManagingCommenter for Greedy {
    fn is_line_commented(
        &self,
        _line: usize,
        _line_start: usize,
        _buffer: &dyn Buffer,
        _state: &mut CommenterState,
    ) -> bool {
        true
    }

    fn comment_line(
        &self,
        _line: usize,
        _offset: usize,
        _buffer: &mut dyn Buffer,
        _state: &mut CommenterState,
    ) {
    }

    fn uncomment_line(
        &self,
        _line: usize,
        offset: usize,
        buffer: &mut dyn Buffer,
        _state: &mut CommenterState,
    ) {
        buffer.delete(0, offset + 4);
    }

    fn comment_prefix(
        &self,
        _line: usize,
        _buffer: &dyn Buffer,
        _state: &CommenterState,
    ) -> Option<String> {
        Some("REM ".to_string())
    }

    fn block_comment_prefix(
        &self,
        _start: usize,
        _buffer: &dyn Buffer,
        _state: &CommenterState,
    ) -> Option<String> {
        None
    }

    fn block_comment_suffix(
        &self,
        _end: usize,
        _buffer: &dyn Buffer,
        _state: &CommenterState,
    ) -> Option<String> {
        None
    }

    fn block_comment_range(
        &self,
        _start: usize,
        _end: usize,
        _buffer: &dyn Buffer,
        _state: &mut CommenterState,
    ) -> Option<Range<usize>> {
        None
    }

    fn insert_block_comment(
        &self,
        _start: usize,
        _end: usize,
        _buffer: &mut dyn Buffer,
        _state: &mut CommenterState,
    ) -> Option<Range<usize>> {
        None
    }

    fn uncomment_block_comment(
        &self,
        _start: usize,
        _end: usize,
        _buffer: &mut dyn Buffer,
        _state: &mut CommenterState,
    ) {
    }
}

#[test]
fn test_failed_toggle_is_rolled_back() {
    let mut resolver = LanguageMapResolver::new(CommenterDescriptor::line("//"));
    resolver.add_span(4..9, Commenter::self_managing(Greedy));
    let mut ex = CommandExecutor::new("//a\nREM b", resolver, CommentSettings::default());
    let carets = vec![Caret::with_selection(0..9)];
    ex.execute(Command::SetCarets(carets.clone())).unwrap();

    let err = ex.execute(Command::ToggleLineComment).unwrap_err();
    assert_eq!(
        err,
        CommandError::Toggle(ToggleError::PrefixMismatch {
            line: 0,
            prefix: "//".to_string(),
        })
    );
    assert_eq!(ex.text(), "//a\nREM b");
    assert_eq!(ex.carets(), carets.as_slice());
    assert!(!ex.can_undo());
    assert_eq!(ex.buffer().marker_count(), 0);
}

#[test]
fn test_language_spans_follow_edits() {
    let mut resolver = LanguageMapResolver::new(CommenterDescriptor::block("<!--", "-->"));
    resolver.add_span(4..10, CommenterDescriptor::line("//"));
    let mut ex = CommandExecutor::new("<a>\nvar x\n", resolver, CommentSettings::default());

    ex.execute(Command::Insert {
        offset: 0,
        text: "<b>\n".to_string(),
    })
    .unwrap();
    ex.execute(Command::SetCarets(vec![Caret::at(8)])).unwrap();
    ex.execute(Command::ToggleLineComment).unwrap();
    assert_eq!(ex.text(), "<b>\n<a>\n//var x\n");
}

#[test]
fn test_unfold_and_invalid_carets() {
    let mut ex = CommandExecutor::new("a\nb\nc", c_like(), CommentSettings::default());
    ex.execute(Command::Fold { start: 1, end: 3 }).unwrap();
    assert!(ex.folding().regions()[0].is_collapsed);
    ex.execute(Command::Unfold { offset: 2 }).unwrap();
    assert!(!ex.folding().regions()[0].is_collapsed);

    let err = ex
        .execute(Command::SetCarets(vec![Caret::at(42)]))
        .unwrap_err();
    assert_eq!(
        err,
        CommandError::InvalidRange {
            start: 42,
            end: 42,
            len: 5,
        }
    );
}
