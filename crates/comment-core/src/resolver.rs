//! Position to [`Commenter`] resolution.

use crate::buffer::Buffer;
use crate::commenter::Commenter;
use crate::delta::{Bias, TextDeltaEdit};
use comment_core_lang::{LanguageId, LanguageRegistry};
use std::ops::Range;

/// Maps buffer positions to commenters.
pub trait CommenterResolver {
    /// Commenter for the language at `offset`.
    fn resolve(&self, buffer: &dyn Buffer, offset: usize) -> Option<Commenter>;

    /// The single commenter covering `[start, end)`, or `None` if the range mixes languages.
    fn resolve_range(&self, buffer: &dyn Buffer, start: usize, end: usize) -> Option<Commenter> {
        let first = self.resolve(buffer, start)?;
        if end > start {
            let last = self.resolve(buffer, end - 1)?;
            if !first.same_as(&last) {
                return None;
            }
        }
        Some(first)
    }

    /// Keep position data in step with a buffer edit.
    fn apply_edit(&mut self, _edit: &TextDeltaEdit) {}
}

/// Resolver for a buffer written in one language.
#[derive(Debug, Clone)]
pub struct SingleLanguageResolver {
    commenter: Commenter,
}

impl SingleLanguageResolver {
    /// Resolve every offset to `commenter`.
    pub fn new(commenter: impl Into<Commenter>) -> Self {
        Self {
            commenter: commenter.into(),
        }
    }

    /// Resolver for a registered language.
    pub fn from_registry(registry: &LanguageRegistry, id: &LanguageId) -> Option<Self> {
        Commenter::from_registry(registry, id).map(Self::new)
    }
}

impl CommenterResolver for SingleLanguageResolver {
    fn resolve(&self, _buffer: &dyn Buffer, _offset: usize) -> Option<Commenter> {
        Some(self.commenter.clone())
    }

    fn resolve_range(&self, _buffer: &dyn Buffer, _start: usize, _end: usize) -> Option<Commenter> {
        Some(self.commenter.clone())
    }
}

/// An embedded-language span.
#[derive(Debug, Clone)]
struct LanguageSpan {
    start: usize,
    end: usize,
    commenter: Commenter,
}

/// Resolver for a base language with embedded language spans (e.g. `<script>` in HTML).
///
/// Spans are kept sorted by start together with a prefix maximum of their ends, so a point query
/// walks backwards only while an earlier span can still reach the offset. Where spans nest, the
/// innermost one wins.
#[derive(Debug, Clone)]
pub struct LanguageMapResolver {
    base: Commenter,
    spans: Vec<LanguageSpan>,
    prefix_max_end: Vec<usize>,
}

impl LanguageMapResolver {
    /// Resolver whose uncovered offsets use `base`.
    pub fn new(base: impl Into<Commenter>) -> Self {
        Self {
            base: base.into(),
            spans: Vec::new(),
            prefix_max_end: Vec::new(),
        }
    }

    /// Mark `range` as written in the language of `commenter`. Empty ranges are ignored.
    pub fn add_span(&mut self, range: Range<usize>, commenter: impl Into<Commenter>) {
        if range.start >= range.end {
            return;
        }
        let pos = self.spans.partition_point(|s| s.start <= range.start);
        self.spans.insert(
            pos,
            LanguageSpan {
                start: range.start,
                end: range.end,
                commenter: commenter.into(),
            },
        );
        self.rebuild_prefix_max_end();
    }

    /// Number of spans.
    pub fn span_count(&self) -> usize {
        self.spans.len()
    }

    fn rebuild_prefix_max_end(&mut self) {
        self.prefix_max_end.clear();
        let mut max_end = 0usize;
        for span in &self.spans {
            max_end = max_end.max(span.end);
            self.prefix_max_end.push(max_end);
        }
    }

    fn innermost_at(&self, offset: usize) -> Option<&LanguageSpan> {
        let idx = self.spans.partition_point(|s| s.start <= offset);
        let mut best: Option<&LanguageSpan> = None;
        for i in (0..idx).rev() {
            if self.prefix_max_end[i] <= offset {
                break;
            }
            let span = &self.spans[i];
            if offset < span.end && best.is_none_or(|b| span.end - span.start < b.end - b.start) {
                best = Some(span);
            }
        }
        best
    }
}

impl CommenterResolver for LanguageMapResolver {
    fn resolve(&self, _buffer: &dyn Buffer, offset: usize) -> Option<Commenter> {
        Some(
            self.innermost_at(offset)
                .map_or_else(|| self.base.clone(), |s| s.commenter.clone()),
        )
    }

    fn resolve_range(&self, buffer: &dyn Buffer, start: usize, end: usize) -> Option<Commenter> {
        let first = self.resolve(buffer, start)?;
        // Any span boundary strictly inside the range means a language switch.
        let switches = self.spans.iter().any(|s| {
            (s.start > start && s.start < end) || (s.end > start && s.end < end)
        });
        if switches {
            return None;
        }
        Some(first)
    }

    fn apply_edit(&mut self, edit: &TextDeltaEdit) {
        for span in &mut self.spans {
            // Text typed at the end of a span belongs to it.
            span.start = edit.map_offset(span.start, Bias::Right);
            span.end = edit.map_offset(span.end, Bias::Right);
        }
        self.spans.retain(|s| s.start < s.end);
        self.spans.sort_by_key(|s| s.start);
        self.rebuild_prefix_max_end();
    }
}
