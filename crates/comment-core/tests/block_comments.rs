use comment_core::{
    Buffer, Caret, CommentSettings, CommentToggler, CommenterDescriptor, CustomUncommenter,
    EscapingCommenter, MarkerId, SingleLanguageResolver, TextBuffer, ToggleAction, ToggleOutcome,
    ToggleWarning, TokenCommenter,
};
use pretty_assertions::assert_eq;
use std::ops::Range;

fn c_like() -> CommenterDescriptor {
    CommenterDescriptor::line_and_block("//", "/*", "*/").with_string_quotes(['"'])
}

fn toggle_block(
    buffer: &mut TextBuffer,
    caret: &mut Caret,
    resolver: &SingleLanguageResolver,
    settings: &CommentSettings,
) -> ToggleOutcome {
    let outcome = CommentToggler::new(resolver, settings)
        .toggle_block_comment(buffer, caret)
        .unwrap();
    assert_eq!(buffer.marker_count(), 0);
    outcome
}

#[test]
fn test_wrap_and_unwrap_selection() {
    let resolver = SingleLanguageResolver::new(c_like());
    let settings = CommentSettings::default();
    let mut buffer = TextBuffer::new("x");
    let mut caret = Caret::with_selection(0..1);

    toggle_block(&mut buffer, &mut caret, &resolver, &settings);
    assert_eq!(buffer.text(), "/*x*/");
    toggle_block(&mut buffer, &mut caret, &resolver, &settings);
    assert_eq!(buffer.text(), "x");
}

#[test]
fn test_nested_comment_is_escaped_and_restored() {
    let escaping = CommenterDescriptor::block("/*", "*/").with_nesting_escape("\\*", "*\\");
    let resolver = SingleLanguageResolver::new(escaping);
    let settings = CommentSettings::default();
    let mut buffer = TextBuffer::new("a /*inner*/");
    let mut caret = Caret {
        offset: 0,
        selection: Some(0..11),
    };

    let outcome = toggle_block(&mut buffer, &mut caret, &resolver, &settings);
    assert_eq!(buffer.text(), "/*a \\*inner*\\*/");
    assert!(outcome.warnings.is_empty());

    toggle_block(&mut buffer, &mut caret, &resolver, &settings);
    assert_eq!(buffer.text(), "a /*inner*/");
}

#[test]
fn test_stray_suffix_survives_escaping_round_trip() {
    let escaping = CommenterDescriptor::block("/*", "*/").with_nesting_escape("\\*", "*\\");
    let resolver = SingleLanguageResolver::new(escaping);
    let settings = CommentSettings::default();
    for text in ["*/ x", "q*/", "a */ b */"] {
        let mut buffer = TextBuffer::new(text);
        let mut caret = Caret::with_selection(0..text.chars().count());

        toggle_block(&mut buffer, &mut caret, &resolver, &settings);
        assert_ne!(buffer.text(), text);
        toggle_block(&mut buffer, &mut caret, &resolver, &settings);
        assert_eq!(buffer.text(), text);
    }
}

#[test]
fn test_range_starting_in_line_comment_is_left_alone() {
    let resolver = SingleLanguageResolver::new(c_like());
    let settings = CommentSettings::default();
    let mut buffer = TextBuffer::new("// note\nlet x = 1;");
    let mut caret = Caret::with_selection(3..18);

    let outcome = toggle_block(&mut buffer, &mut caret, &resolver, &settings);
    assert_eq!(buffer.text(), "// note\nlet x = 1;");
    assert_eq!(outcome.blocks[0].action, ToggleAction::Skipped);
    assert_eq!(
        outcome.warnings,
        vec![ToggleWarning::IntersectsExistingComment { offset: 3 }]
    );
}

#[test]
fn test_nested_comment_splits_outer_comment() {
    let resolver = SingleLanguageResolver::new(c_like());
    let settings = CommentSettings::default();
    let mut buffer = TextBuffer::new("a /* b */ c");
    let mut caret = Caret::with_selection(0..11);

    let outcome = toggle_block(&mut buffer, &mut caret, &resolver, &settings);
    assert_eq!(buffer.text(), "/*a *//* b *//* c*/");
    assert_eq!(outcome.blocks[0].action, ToggleAction::Commented);
    assert_eq!(
        outcome.warnings,
        vec![ToggleWarning::NestedCommentsWrapped {
            count: 1,
            offset: 2
        }]
    );
}

#[test]
fn test_whole_lines_follow_indentation() {
    let resolver = SingleLanguageResolver::new(c_like());
    let settings = CommentSettings {
        block_comment_at_first_column: false,
        ..CommentSettings::default()
    };
    let text = "fn f() {\n    x();\n    y();\n}";
    let mut buffer = TextBuffer::new(text);
    let mut caret = Caret::with_selection(9..27);

    toggle_block(&mut buffer, &mut caret, &resolver, &settings);
    assert_eq!(
        buffer.text(),
        "fn f() {\n    /*\n    x();\n    y();\n    */\n}"
    );
    assert_eq!(caret.selection, Some(9..41));

    toggle_block(&mut buffer, &mut caret, &resolver, &settings);
    assert_eq!(buffer.text(), text);
}

#[test]
fn test_empty_comment_at_bare_caret() {
    let resolver = SingleLanguageResolver::new(c_like());
    let settings = CommentSettings::default();
    let mut buffer = TextBuffer::new("ab");
    let mut caret = Caret::at(2);

    toggle_block(&mut buffer, &mut caret, &resolver, &settings);
    assert_eq!(buffer.text(), "ab/**/");
    assert_eq!(caret, Caret::at(4));

    let outcome = toggle_block(&mut buffer, &mut caret, &resolver, &settings);
    assert_eq!(buffer.text(), "ab");
    assert_eq!(outcome.blocks[0].action, ToggleAction::Uncommented);
}

/// Template-style comments `{# ... #}` that need their own matching.
struct HashBraces;

impl CustomUncommenter for HashBraces {
    fn find_maximum_commented_range(&self, text: &str) -> Option<Range<usize>> {
        let trimmed = text.trim_end();
        trimmed
            .starts_with("{#")
            .then(|| 0..trimmed.chars().count())
    }

    fn comment_ranges_to_delete(&self, text: &str) -> Vec<(Range<usize>, Range<usize>)> {
        let len = text.chars().count();
        if len >= 4 && text.starts_with("{#") && text.ends_with("#}") {
            vec![(0..2, len - 2..len)]
        } else {
            Vec::new()
        }
    }
}

#[test]
fn test_custom_uncommenter() {
    let descriptor = CommenterDescriptor::block("{#", "#}");
    let commenter = TokenCommenter::new(descriptor).with_custom_uncommenter(HashBraces);
    let resolver = SingleLanguageResolver::new(commenter);
    let settings = CommentSettings::default();

    let mut buffer = TextBuffer::new("{#x#}");
    let mut caret = Caret::with_selection(0..5);
    let outcome = toggle_block(&mut buffer, &mut caret, &resolver, &settings);
    assert_eq!(buffer.text(), "x");
    assert_eq!(outcome.blocks[0].action, ToggleAction::Uncommented);

    let mut buffer = TextBuffer::new("{#x");
    let mut caret = Caret::with_selection(0..3);
    let outcome = toggle_block(&mut buffer, &mut caret, &resolver, &settings);
    assert_eq!(buffer.text(), "{#x");
    assert_eq!(
        outcome.warnings,
        vec![ToggleWarning::CustomUncommenterFailed { range: 0..3 }]
    );
}

/// Markup comments may not contain `--`; it is written as `- -` while commented.
struct DoubleDash;

impl DoubleDash {
    fn rewrite(buffer: &mut dyn Buffer, marker: MarkerId, from: &str, to: &str) {
        let Some(range) = buffer.marker_range(marker) else {
            return;
        };
        let text: Vec<char> = buffer.chars_at(range.clone()).chars().collect();
        let from: Vec<char> = from.chars().collect();
        let mut hits = Vec::new();
        let mut i = 0;
        while i + from.len() <= text.len() {
            if text[i..i + from.len()] == from[..] {
                hits.push(i);
                i += from.len();
            } else {
                i += 1;
            }
        }
        for hit in hits.into_iter().rev() {
            let at = range.start + hit;
            buffer.replace(at, at + from.len(), to);
        }
    }
}

impl EscapingCommenter for DoubleDash {
    fn escape(&self, buffer: &mut dyn Buffer, marker: MarkerId) {
        let Some(range) = buffer.marker_range(marker) else {
            return;
        };
        if range.end - range.start < 7 {
            return;
        }
        let inner = buffer.create_range_marker(range.start + 4..range.end - 3, false, false);
        Self::rewrite(buffer, inner, "--", "- -");
        buffer.release_marker(inner);
    }

    fn unescape(&self, buffer: &mut dyn Buffer, marker: MarkerId) {
        Self::rewrite(buffer, marker, "- -", "--");
    }
}

#[test]
fn test_escaping_commenter_round_trip() {
    let commenter =
        TokenCommenter::new(CommenterDescriptor::block("<!--", "-->")).with_escaper(DoubleDash);
    let resolver = SingleLanguageResolver::new(commenter);
    let settings = CommentSettings::default();
    let mut buffer = TextBuffer::new("a--b");
    let mut caret = Caret::with_selection(0..4);

    toggle_block(&mut buffer, &mut caret, &resolver, &settings);
    assert_eq!(buffer.text(), "<!--a- -b-->");
    assert_eq!(caret.selection, Some(0..12));

    toggle_block(&mut buffer, &mut caret, &resolver, &settings);
    assert_eq!(buffer.text(), "a--b");
}
