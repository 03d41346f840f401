//! Commenters: what the togglers act on for a given position.
//!
//! A [`Commenter`] is resolved once per block (or per line when a block mixes languages) and then
//! matched as a whole; the engine never re-inspects capabilities line by line.

use crate::buffer::Buffer;
use crate::markers::MarkerId;
use crate::self_managing::SelfManagingCommenter;
use comment_core_lang::{CommenterDescriptor, LanguageId, LanguageRegistry};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// Locates commented regions for languages whose comments cannot be found by token matching.
pub trait CustomUncommenter: Send + Sync {
    /// Largest commented range inside `text` (offsets relative to `text`).
    fn find_maximum_commented_range(&self, text: &str) -> Option<Range<usize>>;

    /// `(open, close)` token ranges to delete from `text` (offsets relative to `text`).
    fn comment_ranges_to_delete(&self, text: &str) -> Vec<(Range<usize>, Range<usize>)>;
}

/// Escapes text that would otherwise terminate a freshly inserted comment.
pub trait EscapingCommenter: Send + Sync {
    /// Escape the content of the commented range tracked by `marker`.
    fn escape(&self, buffer: &mut dyn Buffer, marker: MarkerId);

    /// Undo [`EscapingCommenter::escape`] inside the range tracked by `marker`.
    fn unescape(&self, buffer: &mut dyn Buffer, marker: MarkerId);
}

/// Token-driven commenter: a descriptor plus optional code hooks.
#[derive(Clone)]
pub struct TokenCommenter {
    descriptor: Arc<CommenterDescriptor>,
    language: Option<LanguageId>,
    custom_uncommenter: Option<Arc<dyn CustomUncommenter>>,
    escaper: Option<Arc<dyn EscapingCommenter>>,
}

impl TokenCommenter {
    /// Wrap a descriptor.
    pub fn new(descriptor: CommenterDescriptor) -> Self {
        Self {
            descriptor: Arc::new(descriptor),
            language: None,
            custom_uncommenter: None,
            escaper: None,
        }
    }

    /// Tag the commenter with its language, which selects per-language settings.
    pub fn with_language(mut self, language: impl Into<LanguageId>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Attach a custom uncommenter.
    pub fn with_custom_uncommenter(mut self, hook: impl CustomUncommenter + 'static) -> Self {
        self.custom_uncommenter = Some(Arc::new(hook));
        self
    }

    /// Attach an escaping hook.
    pub fn with_escaper(mut self, hook: impl EscapingCommenter + 'static) -> Self {
        self.escaper = Some(Arc::new(hook));
        self
    }

    /// Comment tokens.
    pub fn descriptor(&self) -> &CommenterDescriptor {
        &self.descriptor
    }

    /// Language tag, if any.
    pub fn language(&self) -> Option<&LanguageId> {
        self.language.as_ref()
    }

    /// Custom uncommenter, if attached.
    pub fn custom_uncommenter(&self) -> Option<&dyn CustomUncommenter> {
        self.custom_uncommenter.as_deref()
    }

    /// Escaping hook, if attached.
    pub fn escaper(&self) -> Option<&dyn EscapingCommenter> {
        self.escaper.as_deref()
    }
}

impl fmt::Debug for TokenCommenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCommenter")
            .field("descriptor", &self.descriptor)
            .field("language", &self.language)
            .field("custom_uncommenter", &self.custom_uncommenter.is_some())
            .field("escaper", &self.escaper.is_some())
            .finish()
    }
}

/// What the togglers use for one position.
#[derive(Clone)]
pub enum Commenter {
    /// Generic token-based toggling.
    Tokens(TokenCommenter),
    /// The language performs toggling itself.
    SelfManaging(Arc<dyn SelfManagingCommenter>),
}

impl Commenter {
    /// Token commenter for `descriptor`.
    pub fn tokens(descriptor: CommenterDescriptor) -> Self {
        Commenter::Tokens(TokenCommenter::new(descriptor))
    }

    /// Self-managing commenter.
    pub fn self_managing(commenter: impl SelfManagingCommenter + 'static) -> Self {
        Commenter::SelfManaging(Arc::new(commenter))
    }

    /// Token commenter for a registered language.
    pub fn from_registry(registry: &LanguageRegistry, id: &LanguageId) -> Option<Self> {
        registry
            .get(id)
            .cloned()
            .map(|d| Commenter::Tokens(TokenCommenter::new(d).with_language(id.clone())))
    }

    /// Returns `true` if both values come from the same construction.
    pub fn same_as(&self, other: &Commenter) -> bool {
        match (self, other) {
            (Commenter::Tokens(a), Commenter::Tokens(b)) => {
                Arc::ptr_eq(&a.descriptor, &b.descriptor)
            }
            (Commenter::SelfManaging(a), Commenter::SelfManaging(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Returns `false` for token commenters without any comment tokens.
    pub fn can_comment(&self) -> bool {
        match self {
            Commenter::Tokens(t) => t.descriptor.can_comment(),
            Commenter::SelfManaging(_) => true,
        }
    }

    /// Language tag of a token commenter.
    pub fn language(&self) -> Option<&LanguageId> {
        match self {
            Commenter::Tokens(t) => t.language(),
            Commenter::SelfManaging(_) => None,
        }
    }

    /// Descriptor of a token commenter.
    pub fn descriptor(&self) -> Option<&CommenterDescriptor> {
        match self {
            Commenter::Tokens(t) => Some(t.descriptor()),
            Commenter::SelfManaging(_) => None,
        }
    }
}

impl fmt::Debug for Commenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Commenter::Tokens(t) => t.fmt(f),
            Commenter::SelfManaging(_) => f.write_str("SelfManaging(..)"),
        }
    }
}

impl From<CommenterDescriptor> for Commenter {
    fn from(descriptor: CommenterDescriptor) -> Self {
        Commenter::tokens(descriptor)
    }
}

impl From<TokenCommenter> for Commenter {
    fn from(commenter: TokenCommenter) -> Self {
        Commenter::Tokens(commenter)
    }
}
