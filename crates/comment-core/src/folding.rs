//! Offset-based fold regions.
//!
//! The line comment grouper needs to know which text is hidden behind a collapsed fold so that a
//! caret next to the fold comments the hidden lines too.

use crate::delta::{Bias, TextDelta, TextDeltaEdit};

/// Fold region over `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldRegion {
    /// Start offset (inclusive).
    pub start: usize,
    /// End offset (exclusive).
    pub end: usize,
    /// Whether folded
    pub is_collapsed: bool,
    /// Placeholder text shown when folded (e.g., "[...]")
    pub placeholder: String,
    /// A region that can never be expanded. Hosts select such regions as a whole.
    pub never_expands: bool,
}

impl FoldRegion {
    /// Create an expanded fold region.
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            is_collapsed: false,
            placeholder: String::from("[...]"),
            never_expands: false,
        }
    }

    /// Create a fold region with a custom placeholder string.
    pub fn with_placeholder(start: usize, end: usize, placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            ..Self::new(start, end)
        }
    }

    /// Create a collapsed region that never expands.
    pub fn never_expanding(start: usize, end: usize, placeholder: impl Into<String>) -> Self {
        Self {
            is_collapsed: true,
            never_expands: true,
            ..Self::with_placeholder(start, end, placeholder)
        }
    }

    /// Collapse
    pub fn collapse(&mut self) {
        self.is_collapsed = true;
    }

    /// Expand (no-op for regions that never expand).
    pub fn expand(&mut self) {
        if !self.never_expands {
            self.is_collapsed = false;
        }
    }

    /// Returns `true` if `offset` lies in `[start, end)`.
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// Fold regions of one buffer, kept sorted by `(start, end)`.
#[derive(Debug, Clone, Default)]
pub struct FoldingModel {
    regions: Vec<FoldRegion>,
}

impl FoldingModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a region. Empty regions and exact duplicates are rejected.
    pub fn add_region(&mut self, region: FoldRegion) -> bool {
        if region.start >= region.end
            || self
                .regions
                .iter()
                .any(|r| r.start == region.start && r.end == region.end)
        {
            return false;
        }
        let pos = self
            .regions
            .binary_search_by_key(&(region.start, region.end), |r| (r.start, r.end))
            .unwrap_or_else(|pos| pos);
        self.regions.insert(pos, region);
        true
    }

    /// Remove the region covering exactly `[start, end)`.
    pub fn remove_region(&mut self, start: usize, end: usize) -> bool {
        if let Some(pos) = self
            .regions
            .iter()
            .position(|r| r.start == start && r.end == end)
        {
            self.regions.remove(pos);
            true
        } else {
            false
        }
    }

    /// All regions in `(start, end)` order.
    pub fn regions(&self) -> &[FoldRegion] {
        &self.regions
    }

    /// Outermost collapsed region containing `offset`.
    pub fn collapsed_region_at(&self, offset: usize) -> Option<&FoldRegion> {
        self.regions
            .iter()
            .filter(|r| r.is_collapsed && r.contains(offset))
            .min_by_key(|r| (r.start, std::cmp::Reverse(r.end)))
    }

    /// Collapse the innermost region containing `offset`.
    pub fn collapse_at(&mut self, offset: usize) -> bool {
        match self.innermost_mut(offset) {
            Some(region) => {
                region.collapse();
                true
            }
            None => false,
        }
    }

    /// Expand the innermost region containing `offset`.
    pub fn expand_at(&mut self, offset: usize) -> bool {
        match self.innermost_mut(offset) {
            Some(region) if !region.never_expands => {
                region.expand();
                true
            }
            _ => false,
        }
    }

    fn innermost_mut(&mut self, offset: usize) -> Option<&mut FoldRegion> {
        self.regions
            .iter_mut()
            .filter(|r| r.contains(offset))
            .min_by_key(|r| r.end - r.start)
    }

    /// Shift regions for one buffer edit. Regions that become empty are dropped.
    pub fn apply_edit(&mut self, edit: &TextDeltaEdit) {
        for region in &mut self.regions {
            region.start = edit.map_offset(region.start, Bias::Right);
            region.end = edit.map_offset(region.end, Bias::Left);
        }
        self.regions.retain(|r| r.start < r.end);
        self.regions.sort_by_key(|r| (r.start, r.end));
        self.regions
            .dedup_by(|a, b| a.start == b.start && a.end == b.end);
    }

    /// Shift regions for every edit of `delta`, in order.
    pub fn apply_delta(&mut self, delta: &TextDelta) {
        for edit in &delta.edits {
            self.apply_edit(edit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(start: usize, text: &str) -> TextDeltaEdit {
        TextDeltaEdit {
            start,
            deleted_text: String::new(),
            inserted_text: text.to_string(),
        }
    }

    #[test]
    fn test_collapsed_region_lookup_prefers_outermost() {
        let mut model = FoldingModel::new();
        let mut outer = FoldRegion::new(2, 20);
        outer.collapse();
        let mut inner = FoldRegion::new(5, 10);
        inner.collapse();
        assert!(model.add_region(inner));
        assert!(model.add_region(outer));
        assert!(!model.add_region(FoldRegion::new(5, 10)));
        assert!(!model.add_region(FoldRegion::new(7, 7)));

        assert_eq!(model.collapsed_region_at(6).map(|r| r.start), Some(2));
        assert_eq!(model.collapsed_region_at(20), None);
        assert_eq!(model.collapsed_region_at(1), None);
    }

    #[test]
    fn test_expanded_regions_are_ignored() {
        let mut model = FoldingModel::new();
        model.add_region(FoldRegion::new(0, 5));
        assert!(model.collapsed_region_at(2).is_none());
        assert!(model.collapse_at(2));
        assert!(model.collapsed_region_at(2).is_some());
        assert!(model.expand_at(2));
        assert!(model.collapsed_region_at(2).is_none());
    }

    #[test]
    fn test_never_expanding_region_stays_collapsed() {
        let mut model = FoldingModel::new();
        model.add_region(FoldRegion::never_expanding(3, 8, "..."));
        assert!(!model.expand_at(4));
        assert!(model.collapsed_region_at(4).is_some_and(|r| r.never_expands));
    }

    #[test]
    fn test_regions_follow_edits() {
        let mut model = FoldingModel::new();
        model.add_region(FoldRegion::new(4, 10));
        model.apply_edit(&insert(0, "//"));
        assert_eq!(model.regions()[0].start, 6);
        assert_eq!(model.regions()[0].end, 12);

        model.apply_edit(&insert(8, "xx"));
        assert_eq!(model.regions()[0].end, 14);

        model.apply_edit(&insert(6, "//").inverted());
        assert_eq!((model.regions()[0].start, model.regions()[0].end), (6, 12));

        let wipe = TextDeltaEdit {
            start: 0,
            deleted_text: "x".repeat(20),
            inserted_text: String::new(),
        };
        model.apply_edit(&wipe);
        assert!(model.regions().is_empty());
    }

    #[test]
    fn test_remove_region() {
        let mut model = FoldingModel::new();
        model.add_region(FoldRegion::with_placeholder(0, 3, "{...}"));
        assert_eq!(model.regions()[0].placeholder, "{...}");
        assert!(!model.remove_region(0, 2));
        assert!(model.remove_region(0, 3));
        assert!(model.regions().is_empty());
    }
}
