//! Built-in and user-supplied language descriptors.

use crate::{CommenterDescriptor, LanguageId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors produced while loading a language registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("JSON parse error: {0}")]
    /// The registry document is not valid JSON (or does not match the schema).
    Json(#[from] serde_json::Error),

    #[error("language '{0}' has neither line nor block comment tokens")]
    /// A language entry cannot be used to comment anything.
    NoCommentTokens(String),

    #[error("language '{language}' defines only one of the nesting escape tokens")]
    /// `commented_block_prefix` and `commented_block_suffix` must be given together.
    HalfNestingEscape {
        /// Offending language id.
        language: String,
    },
}

/// One registry entry: the comment descriptor plus the file extensions it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageEntry {
    /// Comment tokens.
    #[serde(flatten)]
    pub descriptor: CommenterDescriptor,
    /// File extensions (without the leading dot).
    pub extensions: Vec<String>,
}

/// A table of language descriptors keyed by [`LanguageId`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageRegistry {
    entries: BTreeMap<LanguageId, LanguageEntry>,
}

impl LanguageRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in languages.
    pub fn builtin() -> Self {
        let c_like = || {
            CommenterDescriptor::line_and_block("//", "/*", "*/")
                .with_doc_comment("/**", "*/")
                .with_string_quotes(['"', '\''])
        };
        let xml_like = || {
            CommenterDescriptor::block("<!--", "-->")
                .with_nesting_escape("&lt;!&ndash;", "&ndash;&gt;")
                .with_string_quotes(['"'])
        };

        let mut registry = Self::new();
        registry.insert("c", c_like(), &["c", "h"]);
        registry.insert("cpp", c_like(), &["cpp", "cc", "cxx", "hpp", "hh"]);
        registry.insert("java", c_like(), &["java"]);
        registry.insert(
            "kotlin",
            c_like().with_nested_block_comments(),
            &["kt", "kts"],
        );
        registry.insert("javascript", c_like(), &["js", "mjs", "cjs", "jsx"]);
        registry.insert("typescript", c_like(), &["ts", "tsx"]);
        registry.insert("go", c_like(), &["go"]);
        registry.insert("php", c_like(), &["php"]);
        registry.insert(
            "rust",
            CommenterDescriptor::line_and_block("//", "/*", "*/")
                .with_doc_comment("/**", "*/")
                .with_nested_block_comments()
                .with_string_quotes(['"']),
            &["rs"],
        );
        registry.insert(
            "css",
            CommenterDescriptor::block("/*", "*/").with_string_quotes(['"', '\'']),
            &["css"],
        );
        registry.insert(
            "sql",
            CommenterDescriptor::line_and_block("--", "/*", "*/").with_string_quotes(['\'']),
            &["sql"],
        );
        registry.insert(
            "lua",
            CommenterDescriptor::line_and_block("--", "--[[", "]]").with_string_quotes(['"', '\'']),
            &["lua"],
        );
        registry.insert(
            "haskell",
            CommenterDescriptor::line_and_block("--", "{-", "-}")
                .with_nested_block_comments()
                .with_string_quotes(['"']),
            &["hs"],
        );
        registry.insert(
            "ocaml",
            CommenterDescriptor::block("(*", "*)")
                .with_nested_block_comments()
                .with_string_quotes(['"']),
            &["ml", "mli"],
        );
        registry.insert(
            "racket",
            CommenterDescriptor::line_and_block(";", "#|", "|#")
                .with_nested_block_comments()
                .with_string_quotes(['"']),
            &["rkt", "scm", "lisp"],
        );
        registry.insert(
            "python",
            CommenterDescriptor::line("#").with_string_quotes(['"', '\'']),
            &["py", "pyi"],
        );
        registry.insert(
            "shell",
            CommenterDescriptor::line("#").with_string_quotes(['"', '\'']),
            &["sh", "bash", "zsh"],
        );
        registry.insert(
            "toml",
            CommenterDescriptor::line("#").with_string_quotes(['"', '\'']),
            &["toml"],
        );
        registry.insert("yaml", CommenterDescriptor::line("#"), &["yaml", "yml"]);
        registry.insert("ini", CommenterDescriptor::line(";"), &["ini", "cfg"]);
        registry.insert("html", xml_like(), &["html", "htm"]);
        registry.insert("xml", xml_like(), &["xml", "svg", "xsd"]);
        registry
    }

    /// Load a registry from a JSON object of the form `{ "<id>": { ...descriptor, "extensions": [...] } }`.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let raw: BTreeMap<String, LanguageEntry> = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for (id, entry) in raw {
            validate(&id, &entry.descriptor)?;
            registry.entries.insert(LanguageId::new(id), entry);
        }
        Ok(registry)
    }

    /// Merge `other` into `self`; entries of `other` replace entries with the same id.
    pub fn extend(&mut self, other: LanguageRegistry) {
        self.entries.extend(other.entries);
    }

    fn insert(&mut self, id: &str, descriptor: CommenterDescriptor, extensions: &[&str]) {
        self.entries.insert(
            LanguageId::new(id),
            LanguageEntry {
                descriptor,
                extensions: extensions.iter().map(|e| e.to_string()).collect(),
            },
        );
    }

    /// Register (or replace) a language descriptor.
    pub fn register(&mut self, id: impl Into<LanguageId>, descriptor: CommenterDescriptor) {
        let id = id.into();
        let extensions = self
            .entries
            .remove(&id)
            .map(|e| e.extensions)
            .unwrap_or_default();
        let entry = LanguageEntry {
            descriptor,
            extensions,
        };
        self.entries.insert(id, entry);
    }

    /// Look up a descriptor by language id.
    pub fn get(&self, id: &LanguageId) -> Option<&CommenterDescriptor> {
        self.entries.get(id).map(|e| &e.descriptor)
    }

    /// Find the language registered for a file extension (case-insensitive, no leading dot).
    pub fn language_for_extension(&self, extension: &str) -> Option<&LanguageId> {
        let extension = extension.trim_start_matches('.');
        self.entries
            .iter()
            .find(|(_, e)| e.extensions.iter().any(|x| x.eq_ignore_ascii_case(extension)))
            .map(|(id, _)| id)
    }

    /// Iterate over all registered languages in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&LanguageId, &CommenterDescriptor)> {
        self.entries.iter().map(|(id, e)| (id, &e.descriptor))
    }

    /// Number of registered languages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no language is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate(id: &str, descriptor: &CommenterDescriptor) -> Result<(), RegistryError> {
    if !descriptor.can_comment() {
        return Err(RegistryError::NoCommentTokens(id.to_string()));
    }
    if descriptor.commented_block_prefix().is_some()
        != descriptor.commented_block_suffix().is_some()
    {
        return Err(RegistryError::HalfNestingEscape {
            language: id.to_string(),
        });
    }
    Ok(())
}
