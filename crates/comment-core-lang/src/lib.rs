#![warn(missing_docs)]
//! `comment-core-lang` - data-driven comment token configuration for `comment-core`.
//!
//! This crate intentionally stays lightweight and does **not** know anything about buffers,
//! carets or parsing. It provides the per-language [`CommenterDescriptor`] that the toggling
//! engine consumes, plus a [`LanguageRegistry`] with built-in descriptors for common languages.

mod registry;

pub use registry::{LanguageRegistry, RegistryError};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a language (e.g. `"rust"`, `"html"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageId(String);

impl LanguageId {
    /// Create a language id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LanguageId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Comment tokens and toggling capabilities of a language.
///
/// Every token is optional. A language with neither a line prefix nor a block prefix/suffix pair
/// cannot be commented at all; the engine skips such lines silently.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommenterDescriptor {
    /// Line comment prefix (e.g. `//`, `#`).
    pub line_prefix: Option<String>,
    /// Line comment suffix, for languages whose line comments must be closed on the same line.
    pub line_suffix: Option<String>,
    /// Block comment start token (e.g. `/*`).
    pub block_prefix: Option<String>,
    /// Block comment end token (e.g. `*/`).
    pub block_suffix: Option<String>,
    /// Escaped form of [`Self::block_prefix`] used when a block comment is nested inside another.
    pub commented_block_prefix: Option<String>,
    /// Escaped form of [`Self::block_suffix`] used when a block comment is nested inside another.
    pub commented_block_suffix: Option<String>,
    /// Documentation comment start token (e.g. `/**`).
    pub doc_prefix: Option<String>,
    /// Documentation comment end token (e.g. `*/`).
    pub doc_suffix: Option<String>,
    /// Whether the lexer lets block comments nest (Rust, Haskell, OCaml).
    pub nested_block_comments: bool,
    /// Characters that open and close string literals. Comment delimiters inside strings are ignored.
    pub string_quotes: Vec<char>,
    /// Overrides the "comment with indent" setting for line comments when set.
    pub force_indented_line_comment: Option<bool>,
    /// Forces block comments to cover whole lines when set to `Some(true)`.
    pub force_indented_block_comment: Option<bool>,
}

impl CommenterDescriptor {
    /// Create a descriptor that supports only line comments.
    pub fn line(prefix: impl Into<String>) -> Self {
        Self {
            line_prefix: Some(prefix.into()),
            ..Self::default()
        }
    }

    /// Create a descriptor that supports only block comments.
    pub fn block(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            block_prefix: Some(prefix.into()),
            block_suffix: Some(suffix.into()),
            ..Self::default()
        }
    }

    /// Create a descriptor that supports both line and block comments.
    pub fn line_and_block(
        line: impl Into<String>,
        block_prefix: impl Into<String>,
        block_suffix: impl Into<String>,
    ) -> Self {
        Self {
            line_prefix: Some(line.into()),
            block_prefix: Some(block_prefix.into()),
            block_suffix: Some(block_suffix.into()),
            ..Self::default()
        }
    }

    /// Set the line comment suffix.
    pub fn with_line_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.line_suffix = Some(suffix.into());
        self
    }

    /// Set the escape tokens used for block comments nested inside block comments.
    pub fn with_nesting_escape(
        mut self,
        commented_prefix: impl Into<String>,
        commented_suffix: impl Into<String>,
    ) -> Self {
        self.commented_block_prefix = Some(commented_prefix.into());
        self.commented_block_suffix = Some(commented_suffix.into());
        self
    }

    /// Set the documentation comment tokens.
    pub fn with_doc_comment(
        mut self,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Self {
        self.doc_prefix = Some(prefix.into());
        self.doc_suffix = Some(suffix.into());
        self
    }

    /// Mark block comments as lexically nesting.
    pub fn with_nested_block_comments(mut self) -> Self {
        self.nested_block_comments = true;
        self
    }

    /// Set the string literal quote characters.
    pub fn with_string_quotes(mut self, quotes: impl IntoIterator<Item = char>) -> Self {
        self.string_quotes = quotes.into_iter().collect();
        self
    }

    /// Override indentation behaviour for line and block comments.
    pub fn with_forced_indent(mut self, line: Option<bool>, block: Option<bool>) -> Self {
        self.force_indented_line_comment = line;
        self.force_indented_block_comment = block;
        self
    }

    /// Line comment prefix, if configured and non-empty.
    pub fn line_prefix(&self) -> Option<&str> {
        non_empty(&self.line_prefix)
    }

    /// Line comment suffix, if configured and non-empty.
    pub fn line_suffix(&self) -> Option<&str> {
        non_empty(&self.line_suffix)
    }

    /// Block comment prefix/suffix pair, if both are configured.
    pub fn block_tokens(&self) -> Option<(&str, &str)> {
        Some((non_empty(&self.block_prefix)?, non_empty(&self.block_suffix)?))
    }

    /// Escaped block comment prefix, if configured.
    pub fn commented_block_prefix(&self) -> Option<&str> {
        non_empty(&self.commented_block_prefix)
    }

    /// Escaped block comment suffix, if configured.
    pub fn commented_block_suffix(&self) -> Option<&str> {
        non_empty(&self.commented_block_suffix)
    }

    /// Documentation comment prefix/suffix pair, if both are configured.
    pub fn doc_tokens(&self) -> Option<(&str, &str)> {
        Some((non_empty(&self.doc_prefix)?, non_empty(&self.doc_suffix)?))
    }

    /// Returns `true` if a line comment token is configured.
    pub fn has_line(&self) -> bool {
        self.line_prefix().is_some()
    }

    /// Returns `true` if both block comment tokens are configured.
    pub fn has_block(&self) -> bool {
        self.block_tokens().is_some()
    }

    /// Returns `true` if the language can be commented at all.
    pub fn can_comment(&self) -> bool {
        self.has_line() || self.has_block()
    }

    /// Returns `true` if both nesting escape tokens are configured.
    pub fn has_nesting_escape(&self) -> bool {
        self.commented_block_prefix().is_some() && self.commented_block_suffix().is_some()
    }

    /// Returns `true` if documentation comments are block comments with a longer prefix
    /// (e.g. `/**` + `*/` against `/*` + `*/`).
    pub fn doc_comment_is_block_comment(&self) -> bool {
        match (self.block_tokens(), self.doc_tokens()) {
            (Some((bp, bs)), Some((dp, ds))) => dp.starts_with(bp) && ds.ends_with(bs),
            _ => false,
        }
    }
}

fn non_empty(token: &Option<String>) -> Option<&str> {
    token.as_deref().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tokens_are_ignored() {
        let d = CommenterDescriptor {
            line_prefix: Some(String::new()),
            block_prefix: Some("/*".into()),
            block_suffix: None,
            ..Default::default()
        };
        assert!(!d.has_line());
        assert!(!d.has_block());
        assert!(!d.can_comment());
    }

    #[test]
    fn test_doc_comment_is_block_comment() {
        let d = CommenterDescriptor::line_and_block("//", "/*", "*/").with_doc_comment("/**", "*/");
        assert!(d.doc_comment_is_block_comment());

        let d = CommenterDescriptor::line_and_block("#", "\"\"\"", "\"\"\"")
            .with_doc_comment("##", "\n");
        assert!(!d.doc_comment_is_block_comment());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let d: CommenterDescriptor =
            serde_json::from_str(r#"{ "line_prefix": "--", "string_quotes": ["'"] }"#).unwrap();
        assert_eq!(d.line_prefix(), Some("--"));
        assert_eq!(d.string_quotes, vec!['\'']);
        assert!(d.block_tokens().is_none());
        assert!(!d.nested_block_comments);
    }
}
