//! Lightweight comment lexer driven by a [`CommenterDescriptor`].
//!
//! The lexer only recognizes what the block comment toggler needs to reason about: line comments,
//! block comments, documentation comments, and string literals (so that delimiters inside strings
//! are not mistaken for comment tokens). Everything else is plain text.

use crate::buffer::Buffer;
use crate::text::matches_at;
use comment_core_lang::CommenterDescriptor;
use std::ops::Range;

/// Kind of a lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentTokenKind {
    /// Line comment (up to the line end, or through the line suffix).
    LineComment,
    /// Block comment.
    BlockComment,
    /// Documentation comment.
    DocComment,
    /// String literal.
    StringLiteral,
}

impl CommentTokenKind {
    /// Returns `true` for the three comment kinds.
    pub fn is_comment(self) -> bool {
        !matches!(self, CommentTokenKind::StringLiteral)
    }
}

/// A lexed token over `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentToken {
    /// Token kind.
    pub kind: CommentTokenKind,
    /// Start offset (inclusive).
    pub start: usize,
    /// End offset (exclusive).
    pub end: usize,
}

impl CommentToken {
    /// `start..end`.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Tokens of one text, sorted by offset and non-overlapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentTokens {
    tokens: Vec<CommentToken>,
}

impl CommentTokens {
    /// All tokens in order.
    pub fn as_slice(&self) -> &[CommentToken] {
        &self.tokens
    }

    /// Token covering `offset`.
    pub fn token_at(&self, offset: usize) -> Option<&CommentToken> {
        let idx = self.tokens.partition_point(|t| t.end <= offset);
        self.tokens.get(idx).filter(|t| t.start <= offset)
    }

    /// Comment token (of any kind) covering `offset`.
    pub fn comment_at(&self, offset: usize) -> Option<&CommentToken> {
        self.token_at(offset).filter(|t| t.kind.is_comment())
    }
}

#[derive(Debug, Clone, Copy)]
enum Opener {
    Line,
    Block,
    EmptyBlock,
    Doc,
}

/// Tokenizer for one language's comment grammar.
#[derive(Debug, Clone)]
pub struct CommentLexer {
    line_prefix: Vec<char>,
    line_suffix: Vec<char>,
    block_prefix: Vec<char>,
    block_suffix: Vec<char>,
    doc_prefix: Vec<char>,
    doc_suffix: Vec<char>,
    nested: bool,
    quotes: Vec<char>,
}

fn chars(token: Option<&str>) -> Vec<char> {
    token
        .map(|t| t.trim().chars().collect())
        .unwrap_or_default()
}

impl CommentLexer {
    /// Build a lexer for `descriptor`.
    pub fn new(descriptor: &CommenterDescriptor) -> Self {
        let (block_prefix, block_suffix) = descriptor.block_tokens().unzip();
        let (doc_prefix, doc_suffix) = descriptor.doc_tokens().unzip();
        Self {
            line_prefix: chars(descriptor.line_prefix()),
            line_suffix: chars(descriptor.line_suffix()),
            block_prefix: chars(block_prefix),
            block_suffix: chars(block_suffix),
            doc_prefix: chars(doc_prefix),
            doc_suffix: chars(doc_suffix),
            nested: descriptor.nested_block_comments,
            quotes: descriptor.string_quotes.clone(),
        }
    }

    /// Tokenize the whole buffer.
    pub fn tokenize_buffer(&self, buffer: &dyn Buffer) -> CommentTokens {
        let text: Vec<char> = buffer.text().chars().collect();
        self.tokenize(&text)
    }

    /// Tokenize `text`.
    pub fn tokenize(&self, text: &[char]) -> CommentTokens {
        let mut tokens = Vec::new();
        let mut i = 0usize;
        while i < text.len() {
            let ch = text[i];
            if self.quotes.contains(&ch) {
                let end = self.string_end(text, i, ch);
                tokens.push(CommentToken {
                    kind: CommentTokenKind::StringLiteral,
                    start: i,
                    end,
                });
                i = end;
                continue;
            }

            match self.opener_at(text, i) {
                Some(Opener::Line) => {
                    let end = self.line_comment_end(text, i);
                    tokens.push(CommentToken {
                        kind: CommentTokenKind::LineComment,
                        start: i,
                        end,
                    });
                    i = end;
                }
                Some(Opener::EmptyBlock) => {
                    let end = i + self.block_prefix.len() + self.block_suffix.len();
                    tokens.push(CommentToken {
                        kind: CommentTokenKind::BlockComment,
                        start: i,
                        end,
                    });
                    i = end;
                }
                Some(Opener::Block) => {
                    let end = self.block_end(text, i, &self.block_prefix, &self.block_suffix);
                    tokens.push(CommentToken {
                        kind: CommentTokenKind::BlockComment,
                        start: i,
                        end,
                    });
                    i = end;
                }
                Some(Opener::Doc) => {
                    let end = self.block_end(text, i, &self.doc_prefix, &self.doc_suffix);
                    tokens.push(CommentToken {
                        kind: CommentTokenKind::DocComment,
                        start: i,
                        end,
                    });
                    i = end;
                }
                None => i += 1,
            }
        }
        CommentTokens { tokens }
    }

    fn opener_at(&self, text: &[char], i: usize) -> Option<Opener> {
        // "/**/" is an empty block comment, not an unterminated doc comment.
        if matches_at(text, i, &self.block_prefix)
            && matches_at(text, i + self.block_prefix.len(), &self.block_suffix)
        {
            return Some(Opener::EmptyBlock);
        }

        let mut best: Option<(usize, Opener)> = None;
        let candidates = [
            (&self.doc_prefix, Opener::Doc),
            (&self.block_prefix, Opener::Block),
            (&self.line_prefix, Opener::Line),
        ];
        for (prefix, opener) in candidates {
            if matches_at(text, i, prefix) && best.is_none_or(|(len, _)| prefix.len() > len) {
                best = Some((prefix.len(), opener));
            }
        }
        best.map(|(_, opener)| opener)
    }

    fn string_end(&self, text: &[char], start: usize, quote: char) -> usize {
        let mut i = start + 1;
        while i < text.len() {
            match text[i] {
                '\\' => i += 2,
                '\n' => return i,
                c if c == quote => return i + 1,
                _ => i += 1,
            }
        }
        text.len()
    }

    fn line_comment_end(&self, text: &[char], start: usize) -> usize {
        let mut i = start + self.line_prefix.len();
        while i < text.len() && text[i] != '\n' {
            if matches_at(text, i, &self.line_suffix) {
                return i + self.line_suffix.len();
            }
            i += 1;
        }
        i
    }

    fn block_end(&self, text: &[char], start: usize, prefix: &[char], suffix: &[char]) -> usize {
        let mut depth = 1usize;
        let mut i = start + prefix.len();
        while i < text.len() {
            if self.nested && matches_at(text, i, prefix) {
                depth += 1;
                i += prefix.len();
            } else if matches_at(text, i, suffix) {
                depth -= 1;
                i += suffix.len();
                if depth == 0 {
                    return i;
                }
            } else {
                i += 1;
            }
        }
        text.len()
    }
}
