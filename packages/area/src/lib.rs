#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Area hierarchy index and descendant lookups.
//!
//! Flattens an administrative area tree into id-to-level lookups and
//! resolves, for any coarser level, which finest-level areas sit beneath
//! each node. Rollups use these descendant sets to sum finest-level values
//! into the level a user asked to view.

pub mod cache;
pub mod index;
pub mod validate;

pub use cache::DescendantsCache;
pub use index::{AreaHierarchyIndex, LeafDescendants, leaf_descendants_of};
pub use validate::validate_tree;

use naomi_area_models::AreaLevel;
use thiserror::Error;

/// Errors that can occur when validating an area hierarchy.
#[derive(Debug, Error)]
pub enum AreaError {
    /// The same area id appears more than once in the tree.
    #[error("Duplicate area id '{id}' in area hierarchy")]
    DuplicateAreaId {
        /// The repeated id.
        id: String,
    },

    /// A child node is not strictly deeper than its parent.
    #[error(
        "Area '{child}' (level {child_level}) must be deeper than its parent '{parent}' (level {parent_level})"
    )]
    LevelOrder {
        /// Parent area id.
        parent: String,
        /// Parent level.
        parent_level: AreaLevel,
        /// Child area id.
        child: String,
        /// Child level.
        child_level: AreaLevel,
    },
}
