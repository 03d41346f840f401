//! Comment style settings.
//!
//! Settings are passed explicitly to every toggle. A language can override the global values; a
//! descriptor's forced-indent flag beats both.

use crate::commenter::Commenter;
use crate::indent::IndentOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Global comment style, with optional per-language overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentSettings {
    /// Put line comments at column 0 instead of at the block's indentation.
    pub line_comment_at_first_column: bool,
    /// Insert a space after the line comment prefix.
    pub line_comment_add_space: bool,
    /// Put whole-line block comment delimiters at column 0.
    pub block_comment_at_first_column: bool,
    /// Blocks with at least this many lines are edited inside a bulk update.
    pub bulk_lines_trigger: usize,
    /// Width of a tab stop in cells.
    pub tab_size: usize,
    /// Generate indentation with tabs.
    pub use_tabs: bool,
    /// Soft wrap width in cells; `None` disables wrapping.
    pub soft_wrap_width: Option<usize>,
    /// Overrides keyed by language id.
    pub languages: BTreeMap<String, LanguageCommentSettings>,
}

impl Default for CommentSettings {
    fn default() -> Self {
        Self {
            line_comment_at_first_column: true,
            line_comment_add_space: false,
            block_comment_at_first_column: true,
            bulk_lines_trigger: 500,
            tab_size: 4,
            use_tabs: false,
            soft_wrap_width: None,
            languages: BTreeMap::new(),
        }
    }
}

/// Per-language overrides. Unset fields fall back to the global value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageCommentSettings {
    /// Overrides [`CommentSettings::line_comment_at_first_column`].
    pub line_comment_at_first_column: Option<bool>,
    /// Overrides [`CommentSettings::line_comment_add_space`].
    pub line_comment_add_space: Option<bool>,
    /// Overrides [`CommentSettings::block_comment_at_first_column`].
    pub block_comment_at_first_column: Option<bool>,
    /// Overrides [`CommentSettings::tab_size`].
    pub tab_size: Option<usize>,
    /// Overrides [`CommentSettings::use_tabs`].
    pub use_tabs: Option<bool>,
}

/// Settings resolved for one commenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveCommentSettings {
    /// Line comments follow the block's indentation.
    pub line_comment_with_indent: bool,
    /// Insert a space after the line comment prefix.
    pub line_comment_add_space: bool,
    /// Whole-line block comment delimiters follow the block's indentation.
    pub block_comment_with_indent: bool,
    /// Indentation generation.
    pub indent: IndentOptions,
}

impl CommentSettings {
    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Global indentation options.
    pub fn indent(&self) -> IndentOptions {
        IndentOptions {
            tab_size: self.tab_size,
            use_tabs: self.use_tabs,
        }
    }

    /// Resolve the settings that apply to `commenter`.
    pub fn effective_for(&self, commenter: &Commenter) -> EffectiveCommentSettings {
        let overrides = commenter
            .language()
            .and_then(|id| self.languages.get(id.as_str()));
        let pick = |get: fn(&LanguageCommentSettings) -> Option<bool>, global: bool| {
            overrides.and_then(get).unwrap_or(global)
        };

        let descriptor = commenter.descriptor();
        let line_with_indent = descriptor
            .and_then(|d| d.force_indented_line_comment)
            .unwrap_or_else(|| {
                !pick(
                    |o| o.line_comment_at_first_column,
                    self.line_comment_at_first_column,
                )
            });
        let block_with_indent = descriptor
            .and_then(|d| d.force_indented_block_comment)
            .unwrap_or_else(|| {
                !pick(
                    |o| o.block_comment_at_first_column,
                    self.block_comment_at_first_column,
                )
            });

        EffectiveCommentSettings {
            line_comment_with_indent: line_with_indent,
            line_comment_add_space: pick(|o| o.line_comment_add_space, self.line_comment_add_space),
            block_comment_with_indent: block_with_indent,
            indent: IndentOptions {
                tab_size: overrides.and_then(|o| o.tab_size).unwrap_or(self.tab_size),
                use_tabs: pick(|o| o.use_tabs, self.use_tabs),
            },
        }
    }
}
