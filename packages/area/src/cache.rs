//! Memoized descendant lookups.
//!
//! The area tree rarely changes within a session while the selected
//! periods and indicator change often. [`DescendantsCache`] keeps one
//! [`LeafDescendants`] map per `(max_observed_level, target_level)` pair so
//! repeated selections reuse the previous walk.

use std::collections::BTreeMap;

use naomi_area_models::{AreaLevel, AreaNode};

use crate::index::{LeafDescendants, leaf_descendants_of};

/// Per-tree cache of [`leaf_descendants_of`] results.
#[derive(Debug)]
pub struct DescendantsCache<'a> {
    tree: &'a AreaNode,
    entries: BTreeMap<(AreaLevel, AreaLevel), LeafDescendants>,
    hits: u64,
    misses: u64,
}

impl<'a> DescendantsCache<'a> {
    /// Creates an empty cache for `tree`.
    #[must_use]
    pub const fn new(tree: &'a AreaNode) -> Self {
        Self {
            tree,
            entries: BTreeMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Returns the descendants of every area at `target_level` that sit at
    /// `max_observed_level`, computing them on first use.
    pub fn get(
        &mut self,
        target_level: AreaLevel,
        max_observed_level: AreaLevel,
    ) -> &LeafDescendants {
        let tree = self.tree;
        let key = (max_observed_level, target_level);

        if self.entries.contains_key(&key) {
            self.hits += 1;
        } else {
            self.misses += 1;
            log::debug!(
                "Computing descendants for level {target_level} at finest level {max_observed_level}"
            );
        }

        self.entries
            .entry(key)
            .or_insert_with(|| leaf_descendants_of(tree, target_level, max_observed_level))
    }

    /// Drops every cached entry. Call this when the tree is replaced.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached level pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since creation.
    #[must_use]
    pub const fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
