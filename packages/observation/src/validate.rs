//! One-time checks of observation rows against the area hierarchy.

use std::collections::BTreeSet;

use naomi_area::AreaHierarchyIndex;
use naomi_observation_models::ObservationRow;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::ObservationError;

/// What to do when two rows share the same
/// `(area_id, calendar_quarter, age_group, sex)`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DuplicateRowPolicy {
    /// Keep both rows; they are summed during aggregation. A warning is
    /// logged for each duplicate.
    #[default]
    Sum,
    /// Fail validation on the first duplicate.
    Reject,
}

/// Summary of a successful validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowReport {
    /// Number of rows checked.
    pub rows: usize,
    /// Keys (`area/quarter/age_group/sex`) seen more than once.
    pub duplicates: Vec<String>,
}

/// Checks every row against `index`.
///
/// # Errors
///
/// * [`ObservationError::UnknownArea`] if a row's area is not in the tree.
/// * [`ObservationError::AreaLevelMismatch`] if a row's `area_level`
///   disagrees with the tree.
/// * [`ObservationError::DuplicateRow`] on a repeated key under
///   [`DuplicateRowPolicy::Reject`].
pub fn validate_rows(
    index: &AreaHierarchyIndex<'_>,
    rows: &[ObservationRow],
    policy: DuplicateRowPolicy,
) -> Result<RowReport, ObservationError> {
    let mut seen = BTreeSet::new();
    let mut report = RowReport {
        rows: rows.len(),
        duplicates: Vec::new(),
    };

    for row in rows {
        let Some(tree_level) = index.level_of(&row.area_id) else {
            return Err(ObservationError::UnknownArea {
                area_id: row.area_id.clone(),
            });
        };

        if tree_level != row.area_level {
            return Err(ObservationError::AreaLevelMismatch {
                area_id: row.area_id.clone(),
                row_level: row.area_level,
                tree_level,
            });
        }

        let key = row.key();
        if !seen.insert(key) {
            match policy {
                DuplicateRowPolicy::Reject => {
                    return Err(ObservationError::DuplicateRow {
                        key: key.to_string(),
                    });
                }
                DuplicateRowPolicy::Sum => {
                    log::warn!("Duplicate observation for {key}; values will be summed");
                    report.duplicates.push(key.to_string());
                }
            }
        }
    }

    log::debug!(
        "Validated {} observation rows ({} duplicates)",
        report.rows,
        report.duplicates.len()
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use naomi_area_models::AreaNode;

    use super::*;

    fn tree() -> AreaNode {
        AreaNode::with_children(
            "MWI",
            0,
            vec![AreaNode::with_children(
                "MWI_1",
                1,
                vec![AreaNode::leaf("MWI_1_1", 2), AreaNode::leaf("MWI_1_2", 2)],
            )],
        )
    }

    fn row(area_id: &str, level: u32, sex: &str) -> ObservationRow {
        ObservationRow::new(area_id, level, "CY2022Q1", "Y015_999", sex)
            .with_measure("art_current", 1.0)
    }

    #[test]
    fn accepts_consistent_rows() {
        let tree = tree();
        let rows = vec![row("MWI_1_1", 2, "female"), row("MWI_1_1", 2, "male")];
        let index = AreaHierarchyIndex::build(&tree, rows.iter().map(|r| r.area_level));
        let report = validate_rows(&index, &rows, DuplicateRowPolicy::Reject).unwrap();
        assert_eq!(report.rows, 2);
        assert!(report.duplicates.is_empty());
    }

    #[test]
    fn rejects_unknown_area() {
        let tree = tree();
        let rows = vec![row("ZMB_1", 2, "female")];
        let index = AreaHierarchyIndex::build(&tree, [2]);
        let err = validate_rows(&index, &rows, DuplicateRowPolicy::Sum).unwrap_err();
        assert!(matches!(err, ObservationError::UnknownArea { ref area_id } if area_id == "ZMB_1"));
    }

    #[test]
    fn rejects_level_mismatch() {
        let tree = tree();
        let rows = vec![row("MWI_1", 2, "female")];
        let index = AreaHierarchyIndex::build(&tree, [2]);
        let err = validate_rows(&index, &rows, DuplicateRowPolicy::Sum).unwrap_err();
        assert!(matches!(
            err,
            ObservationError::AreaLevelMismatch {
                row_level: 2,
                tree_level: 1,
                ..
            }
        ));
    }

    #[test]
    fn sum_policy_reports_duplicates() {
        let tree = tree();
        let rows = vec![row("MWI_1_1", 2, "female"), row("MWI_1_1", 2, "female")];
        let index = AreaHierarchyIndex::build(&tree, [2]);
        let report = validate_rows(&index, &rows, DuplicateRowPolicy::Sum).unwrap();
        assert_eq!(report.duplicates, vec!["MWI_1_1/CY2022Q1/Y015_999/female"]);
    }

    #[test]
    fn reject_policy_fails_on_duplicates() {
        let tree = tree();
        let rows = vec![row("MWI_1_1", 2, "female"), row("MWI_1_1", 2, "female")];
        let index = AreaHierarchyIndex::build(&tree, [2]);
        let err = validate_rows(&index, &rows, DuplicateRowPolicy::Reject).unwrap_err();
        assert!(matches!(err, ObservationError::DuplicateRow { .. }));
    }

    #[test]
    fn policy_parses_from_str() {
        assert_eq!(
            "reject".parse::<DuplicateRowPolicy>().unwrap(),
            DuplicateRowPolicy::Reject
        );
        assert_eq!(DuplicateRowPolicy::Sum.to_string(), "sum");
    }
}
