//! Structural checks for area trees received from outside the process.

use std::collections::BTreeSet;

use naomi_area_models::AreaNode;

use crate::AreaError;

/// Rejects trees with repeated area ids or children that are not deeper
/// than their parent.
///
/// # Errors
///
/// * [`AreaError::DuplicateAreaId`] on the first id seen twice (pre-order).
/// * [`AreaError::LevelOrder`] on the first child whose level is not
///   greater than its parent's.
pub fn validate_tree(tree: &AreaNode) -> Result<(), AreaError> {
    let mut seen = BTreeSet::new();

    for node in tree {
        if !seen.insert(node.id.as_str()) {
            return Err(AreaError::DuplicateAreaId {
                id: node.id.clone(),
            });
        }

        if let Some(child) = node.children.iter().find(|c| c.level <= node.level) {
            return Err(AreaError::LevelOrder {
                parent: node.id.clone(),
                parent_level: node.level,
                child: child.id.clone(),
                child_level: child.level,
            });
        }
    }

    log::debug!("Validated area tree '{}' ({} areas)", tree.id, seen.len());

    Ok(())
}
