//! Flattened lookups over an area hierarchy.
//!
//! [`AreaHierarchyIndex`] is built once per (tree, observation set) and
//! answers level and descendant queries without re-walking the tree for
//! each lookup.

use std::collections::{BTreeMap, BTreeSet};

use naomi_area_models::{AreaLevel, AreaNode};

/// Maps each area at a selected level to the finest-level area ids beneath
/// it.
pub type LeafDescendants = BTreeMap<String, BTreeSet<String>>;

/// Id and level lookups for one area tree, plus the finest level that
/// actually carries observation data.
#[derive(Debug, Clone)]
pub struct AreaHierarchyIndex<'a> {
    tree: &'a AreaNode,
    area_level_of: BTreeMap<String, AreaLevel>,
    max_observed_level: Option<AreaLevel>,
}

impl<'a> AreaHierarchyIndex<'a> {
    /// Flattens `tree` and records the deepest of `observed_levels`.
    ///
    /// `observed_levels` is normally the `area_level` of every observation
    /// row. When it is empty there is no finest level and every descendant
    /// query returns an empty map.
    ///
    /// Area ids are assumed unique. Run
    /// [`validate_tree`](crate::validate_tree) first when the tree comes
    /// from an untrusted source; with duplicates the last occurrence in
    /// pre-order wins.
    #[must_use]
    pub fn build(tree: &'a AreaNode, observed_levels: impl IntoIterator<Item = AreaLevel>) -> Self {
        let area_level_of: BTreeMap<String, AreaLevel> = tree
            .iter()
            .map(|node| (node.id.clone(), node.level))
            .collect();
        let max_observed_level = observed_levels.into_iter().max();

        log::debug!(
            "Indexed {} areas under '{}', finest observed level {:?}",
            area_level_of.len(),
            tree.id,
            max_observed_level
        );

        Self {
            tree,
            area_level_of,
            max_observed_level,
        }
    }

    /// The deepest `area_level` present in the observations, if any.
    #[must_use]
    pub const fn max_observed_level(&self) -> Option<AreaLevel> {
        self.max_observed_level
    }

    /// Every area id in the tree mapped to its level.
    #[must_use]
    pub const fn area_level_of(&self) -> &BTreeMap<String, AreaLevel> {
        &self.area_level_of
    }

    /// Returns the level of `area_id`, or `None` if the tree has no such
    /// area.
    #[must_use]
    pub fn level_of(&self, area_id: &str) -> Option<AreaLevel> {
        self.area_level_of.get(area_id).copied()
    }

    /// Returns the ids of every area at `level`.
    #[must_use]
    pub fn areas_at_level(&self, level: AreaLevel) -> BTreeSet<String> {
        self.area_level_of
            .iter()
            .filter(|(_, l)| **l == level)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Returns the ids of every area at the finest observed level. Empty
    /// when there are no observations.
    #[must_use]
    pub fn finest_areas(&self) -> BTreeSet<String> {
        self.max_observed_level
            .map(|level| self.areas_at_level(level))
            .unwrap_or_default()
    }

    /// Number of areas at each level, shallowest first.
    #[must_use]
    pub fn level_counts(&self) -> BTreeMap<AreaLevel, usize> {
        let mut counts = BTreeMap::new();
        for level in self.area_level_of.values() {
            *counts.entry(*level).or_insert(0) += 1;
        }
        counts
    }

    /// Resolves finest-level descendants for every area at `target_level`.
    ///
    /// See [`leaf_descendants_of`] for the exclusion rules. Returns an empty
    /// map when there are no observations.
    #[must_use]
    pub fn leaf_descendants(&self, target_level: AreaLevel) -> LeafDescendants {
        self.max_observed_level
            .map(|max| leaf_descendants_of(self.tree, target_level, max))
            .unwrap_or_default()
    }
}

/// For each node at `target_level`, collects the ids of its descendants at
/// `max_observed_level`.
///
/// * When `target_level == max_observed_level` each node is its own sole
///   descendant.
/// * A node with no descendant at `max_observed_level` is left out of the
///   result entirely; it contributes no rollup entry.
/// * A `target_level` finer than `max_observed_level`, or one that no node
///   in the tree has, yields an empty map.
#[must_use]
pub fn leaf_descendants_of(
    tree: &AreaNode,
    target_level: AreaLevel,
    max_observed_level: AreaLevel,
) -> LeafDescendants {
    let mut result = LeafDescendants::new();

    if target_level > max_observed_level {
        log::debug!(
            "Target level {target_level} is finer than observed level {max_observed_level}, nothing to roll up"
        );
        return result;
    }

    for node in tree.iter().filter(|node| node.level == target_level) {
        let leaves = finest_under(node, max_observed_level);
        if leaves.is_empty() {
            log::debug!(
                "Area '{}' has no descendants at level {max_observed_level}, excluding",
                node.id
            );
            continue;
        }
        result.insert(node.id.clone(), leaves);
    }

    result
}

/// Depth-first walk below `root` over an explicit stack, stopping at
/// `finest_level`. Children are always deeper than their parent, so
/// nothing under a node at or past `finest_level` can match.
fn finest_under(root: &AreaNode, finest_level: AreaLevel) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    let mut stack: Vec<&AreaNode> = vec![root];

    while let Some(node) = stack.pop() {
        if node.level == finest_level {
            found.insert(node.id.clone());
        } else if node.level < finest_level {
            stack.extend(node.children.iter().rev());
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    /// National -> 2 regions -> 4 districts, plus a region with no
    /// districts.
    fn tree() -> AreaNode {
        AreaNode::with_children(
            "MWI",
            0,
            vec![
                AreaNode::with_children(
                    "MWI_1",
                    1,
                    vec![AreaNode::leaf("MWI_1_1", 2), AreaNode::leaf("MWI_1_2", 2)],
                ),
                AreaNode::with_children(
                    "MWI_2",
                    1,
                    vec![AreaNode::leaf("MWI_2_1", 2), AreaNode::leaf("MWI_2_2", 2)],
                ),
                AreaNode::leaf("MWI_3", 1),
            ],
        )
    }

    fn ids(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn maps_every_area_to_its_level() {
        let tree = tree();
        let index = AreaHierarchyIndex::build(&tree, [2, 2, 1]);
        assert_eq!(index.area_level_of().len(), 8);
        assert_eq!(index.level_of("MWI"), Some(0));
        assert_eq!(index.level_of("MWI_2_1"), Some(2));
        assert_eq!(index.level_of("ZMB"), None);
        assert_eq!(index.max_observed_level(), Some(2));
    }

    #[test]
    fn resolves_region_descendants() {
        let tree = tree();
        let result = leaf_descendants_of(&tree, 1, 2);
        assert_eq!(result.len(), 2);
        assert_eq!(result["MWI_1"], ids(&["MWI_1_1", "MWI_1_2"]));
        assert_eq!(result["MWI_2"], ids(&["MWI_2_1", "MWI_2_2"]));
    }

    #[test]
    fn excludes_areas_without_finest_descendants() {
        let tree = tree();
        let result = leaf_descendants_of(&tree, 1, 2);
        assert!(!result.contains_key("MWI_3"));
    }

    #[test]
    fn national_level_collects_all_districts() {
        let tree = tree();
        let result = leaf_descendants_of(&tree, 0, 2);
        assert_eq!(
            result["MWI"],
            ids(&["MWI_1_1", "MWI_1_2", "MWI_2_1", "MWI_2_2"])
        );
    }

    #[test]
    fn finest_level_maps_each_area_to_itself() {
        let tree = tree();
        let result = leaf_descendants_of(&tree, 2, 2);
        assert_eq!(result.len(), 4);
        assert_eq!(result["MWI_1_2"], ids(&["MWI_1_2"]));
    }

    #[test]
    fn finer_or_unknown_target_level_is_empty() {
        let tree = tree();
        assert!(leaf_descendants_of(&tree, 3, 2).is_empty());
        assert!(leaf_descendants_of(&tree, 7, 9).is_empty());
    }

    #[test]
    fn no_observations_means_nothing_to_roll_up() {
        let tree = tree();
        let index = AreaHierarchyIndex::build(&tree, []);
        assert_eq!(index.max_observed_level(), None);
        assert!(index.leaf_descendants(1).is_empty());
        assert!(index.finest_areas().is_empty());
    }

    #[test]
    fn shallower_observations_stop_the_walk_early() {
        let tree = tree();
        let index = AreaHierarchyIndex::build(&tree, [1]);
        let result = index.leaf_descendants(0);
        assert_eq!(result["MWI"], ids(&["MWI_1", "MWI_2", "MWI_3"]));
    }

    #[test]
    fn counts_areas_per_level() {
        let tree = tree();
        let index = AreaHierarchyIndex::build(&tree, [2]);
        let counts = index.level_counts();
        assert_eq!(counts[&0], 1);
        assert_eq!(counts[&1], 3);
        assert_eq!(counts[&2], 4);
        assert_eq!(index.finest_areas().len(), 4);
    }
}
