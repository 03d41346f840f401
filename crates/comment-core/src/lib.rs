#![warn(missing_docs)]
//! Comment Core - Headless Comment Toggling Engine
//!
//! # Overview
//!
//! `comment-core` implements the "toggle line comment" and "toggle block comment" editor actions
//! without any UI. The caller hands in a buffer, its carets, a resolver from position to
//! commenter and the comment settings; the engine edits the buffer and moves the carets.
//!
//! # Core Features
//!
//! - **Caret grouping**: carets on touching lines form one block with one comment/uncomment decision
//! - **Line comments**: prefix/suffix insertion with indentation, space-after-prefix and block fallback
//! - **Block comments**: wrap or unwrap a selection, with nested comment escaping or splitting
//! - **Self-managing commenters**: languages that perform the text edits themselves
//! - **Mixed languages**: resolvers map offsets to commenters, one per language span
//! - **Undo**: every edit is logged as a [`TextDelta`]; [`CommandExecutor`] turns toggles into undo steps
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Command Executor (undo/redo, rollback)     │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  CommentToggler (line / block)              │  ← Toggle Algorithms
//! ├─────────────────────────────────────────────┤
//! │  Grouper · Nested Rewriter · Lexer          │  ← Planning
//! ├─────────────────────────────────────────────┤
//! │  Commenters & Resolvers                     │  ← Language Capabilities
//! ├─────────────────────────────────────────────┤
//! │  Buffer (rope + range markers + delta log)  │  ← Text Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use comment_core::{Buffer, Caret, CommentSettings, CommentToggler, CommenterDescriptor};
//! use comment_core::{SingleLanguageResolver, TextBuffer};
//!
//! let resolver = SingleLanguageResolver::new(CommenterDescriptor::line_and_block("//", "/*", "*/"));
//! let settings = CommentSettings::default();
//! let toggler = CommentToggler::new(&resolver, &settings);
//!
//! let mut buffer = TextBuffer::new("let x = 1;");
//! let mut caret = Caret::with_selection(4..5);
//! toggler.toggle_block_comment(&mut buffer, &mut caret).unwrap();
//! assert_eq!(buffer.text(), "let /*x*/ = 1;");
//!
//! toggler.toggle_block_comment(&mut buffer, &mut caret).unwrap();
//! assert_eq!(buffer.text(), "let x = 1;");
//! ```
//!
//! # Module Description
//!
//! - [`buffer`] - Buffer trait and rope-backed [`TextBuffer`]
//! - [`grouper`] - Caret to block grouping
//! - [`toggle`] - Line and block toggle entry points
//! - [`commenter`] - Token commenters and capability hooks
//! - [`self_managing`] - Protocol for languages that edit comments themselves
//! - [`resolver`] - Position to commenter resolution
//! - [`lexer`] - Comment and string tokenizer
//! - [`settings`] - Comment style configuration
//! - [`commands`] - Command executor with undo/redo
//!
//! # Offsets
//!
//! Every offset in the public API is a character offset (Unicode scalar values), never a byte
//! offset. Line breaks are `\n` or `\r\n`; `\r\n` counts as two characters.

mod block_comment;
pub mod buffer;
pub mod caret;
pub mod commands;
pub mod commenter;
pub mod delta;
pub mod error;
pub mod folding;
pub mod grouper;
pub mod indent;
pub mod layout;
pub mod lexer;
mod line_comment;
pub mod markers;
mod nested;
pub mod resolver;
pub mod self_managing;
pub mod settings;
mod text;
pub mod toggle;

pub use buffer::{Buffer, TextBuffer};
pub use caret::{Caret, normalize_carets};
pub use commands::{Command, CommandExecutor, CommandResult};
pub use commenter::{Commenter, CustomUncommenter, EscapingCommenter, TokenCommenter};
pub use delta::{Bias, TextDelta, TextDeltaEdit};
pub use error::{CommandError, ToggleError, ToggleWarning};
pub use folding::{FoldRegion, FoldingModel};
pub use grouper::{Block, CaretUpdate, group_carets, should_move_carets};
pub use indent::IndentOptions;
pub use lexer::{CommentLexer, CommentToken, CommentTokenKind, CommentTokens};
pub use markers::{MarkerId, RangeMarker};
pub use resolver::{CommenterResolver, LanguageMapResolver, SingleLanguageResolver};
pub use self_managing::{CommenterState, SelfManagingCommenter};
pub use settings::{CommentSettings, EffectiveCommentSettings, LanguageCommentSettings};
pub use toggle::{BlockReport, CommentToggler, ToggleAction, ToggleOutcome};

pub use comment_core_lang::{CommenterDescriptor, LanguageId, LanguageRegistry};
