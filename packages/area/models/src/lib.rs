#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Administrative area hierarchy types.
//!
//! An area hierarchy is a tree of administrative regions (country, region,
//! district, ...) where each node carries an integer depth. Level 0 is the
//! national level and levels increase toward finer granularity.

use serde::{Deserialize, Serialize};

/// Administrative depth of an area. `0` is the national level.
pub type AreaLevel = u32;

/// One node in the administrative area hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaNode {
    /// Unique area identifier (e.g. `"MWI_1_2"`).
    #[serde(alias = "area_id")]
    pub id: String,
    /// Administrative depth of this node.
    #[serde(alias = "area_level")]
    pub level: AreaLevel,
    /// Child areas, in source order. Empty for structural leaves.
    #[serde(default)]
    pub children: Vec<Self>,
}

impl AreaNode {
    /// Creates a node without children.
    #[must_use]
    pub fn leaf(id: impl Into<String>, level: AreaLevel) -> Self {
        Self {
            id: id.into(),
            level,
            children: Vec::new(),
        }
    }

    /// Creates a node with the given children.
    #[must_use]
    pub fn with_children(id: impl Into<String>, level: AreaLevel, children: Vec<Self>) -> Self {
        Self {
            id: id.into(),
            level,
            children,
        }
    }

    /// Returns an iterator over this node and all of its descendants.
    ///
    /// Nodes are yielded depth-first in pre-order: a parent always comes
    /// before its children, and siblings keep their source order.
    #[must_use]
    pub fn iter(&self) -> AreaNodeIter<'_> {
        AreaNodeIter { stack: vec![self] }
    }
}

/// Depth-first pre-order iterator over an [`AreaNode`] subtree.
///
/// Backed by an explicit stack; children are pushed in reverse so that
/// they pop in source order.
pub struct AreaNodeIter<'a> {
    stack: Vec<&'a AreaNode>,
}

impl<'a> Iterator for AreaNodeIter<'a> {
    type Item = &'a AreaNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

impl<'a> IntoIterator for &'a AreaNode {
    type Item = &'a AreaNode;
    type IntoIter = AreaNodeIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn malawi() -> AreaNode {
        AreaNode::with_children(
            "MWI",
            0,
            vec![
                AreaNode::with_children(
                    "MWI_1",
                    1,
                    vec![AreaNode::leaf("MWI_1_1", 2), AreaNode::leaf("MWI_1_2", 2)],
                ),
                AreaNode::leaf("MWI_2", 1),
            ],
        )
    }

    #[test]
    fn iterates_in_pre_order() {
        let tree = malawi();
        let ids: Vec<&str> = tree.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["MWI", "MWI_1", "MWI_1_1", "MWI_1_2", "MWI_2"]);
    }

    #[test]
    fn deserializes_area_id_aliases() {
        let tree: AreaNode = serde_json::from_value(serde_json::json!({
            "area_id": "MWI",
            "area_level": 0,
            "children": [{ "id": "MWI_1", "level": 1 }]
        }))
        .unwrap();
        assert_eq!(tree.id, "MWI");
        assert_eq!(tree.children[0].id, "MWI_1");
        assert!(tree.children[0].children.is_empty());
    }
}
