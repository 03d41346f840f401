//! Toggling twice with the carets the first toggle left behind restores the text.

use comment_core::{
    Buffer, Caret, CommentSettings, CommentToggler, CommenterDescriptor, SingleLanguageResolver,
    TextBuffer,
};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ALPHABET: &[char] = &['a', 'b', 'x', 'y', '1', '=', ';', '(', ')', ' '];

/// Lines with optional indentation and at least one visible character each.
fn random_text(rng: &mut StdRng) -> String {
    let lines = rng.gen_range(1..6);
    let mut out = Vec::with_capacity(lines);
    for _ in 0..lines {
        let mut line = " ".repeat(rng.gen_range(0..5));
        line.push(['a', 'b', 'x', 'y'][rng.gen_range(0..4)]);
        for _ in 0..rng.gen_range(0..8) {
            line.push(ALPHABET[rng.gen_range(0..ALPHABET.len())]);
        }
        out.push(line);
    }
    let mut text = out.join("\n");
    if rng.gen_bool(0.5) {
        text.push('\n');
    }
    text
}

fn random_settings(rng: &mut StdRng) -> CommentSettings {
    CommentSettings {
        line_comment_at_first_column: rng.gen_bool(0.5),
        line_comment_add_space: rng.gen_bool(0.5),
        block_comment_at_first_column: rng.gen_bool(0.5),
        ..CommentSettings::default()
    }
}

#[test]
fn test_line_comment_round_trip() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for descriptor in [CommenterDescriptor::line("//"), CommenterDescriptor::line("#")] {
        let resolver = SingleLanguageResolver::new(descriptor);
        for _ in 0..200 {
            let text = random_text(&mut rng);
            let settings = random_settings(&mut rng);
            let toggler = CommentToggler::new(&resolver, &settings);
            let mut buffer = TextBuffer::new(&text);

            let line_count = buffer.line_count();
            let first = rng.gen_range(0..line_count);
            let last = rng.gen_range(first..line_count);
            let select = |buffer: &TextBuffer| {
                let start = buffer.line_start_offset(first);
                let end = buffer.line_end_offset(last);
                if start == end {
                    Caret::at(start)
                } else {
                    Caret::with_selection(start..end)
                }
            };

            let mut carets = [select(&buffer)];
            toggler
                .toggle_line_comments(&mut buffer, &mut carets)
                .unwrap();
            let mut carets = [select(&buffer)];
            toggler
                .toggle_line_comments(&mut buffer, &mut carets)
                .unwrap();
            assert_eq!(
                buffer.text(),
                text,
                "lines {first}..={last} with {settings:?}"
            );
            assert_eq!(buffer.marker_count(), 0);
        }
    }
}

#[test]
fn test_block_comment_round_trip() {
    let mut rng = StdRng::seed_from_u64(0xb10c);
    let resolver =
        SingleLanguageResolver::new(CommenterDescriptor::line_and_block("//", "/*", "*/"));
    for _ in 0..300 {
        let text = random_text(&mut rng);
        let settings = random_settings(&mut rng);
        let toggler = CommentToggler::new(&resolver, &settings);
        let mut buffer = TextBuffer::new(&text);

        let len = buffer.len_chars();
        let start = rng.gen_range(0..=len);
        let mut caret = if start < len && rng.gen_bool(0.8) {
            Caret::with_selection(start..rng.gen_range(start + 1..=len))
        } else {
            Caret::at(start)
        };
        let original = caret.clone();

        toggler
            .toggle_block_comment(&mut buffer, &mut caret)
            .unwrap();
        assert_ne!(buffer.text(), text);
        toggler
            .toggle_block_comment(&mut buffer, &mut caret)
            .unwrap();
        assert_eq!(buffer.text(), text, "caret {original:?} with {settings:?}");
        assert_eq!(buffer.marker_count(), 0);
    }
}
