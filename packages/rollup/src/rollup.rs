//! Rolling finest-level totals up to a coarser administrative level.

use std::collections::BTreeSet;

use naomi_area::LeafDescendants;
use naomi_rollup_models::{
    AggregatedTable, AreaPeriod, RollupResult, RollupTotals, StratifiedTotals, Stratum,
};

/// Sums the full stratified totals of `measure` over each selected area's
/// finest-level descendants, for every period in `periods`.
///
/// Only areas present in `leaf_descendants` appear in the output; an area
/// with no finest-level descendants has no entry at all, while one whose
/// descendants observed zero gets an explicit zero.
#[must_use]
pub fn rollup_totals(
    aggregated: &AggregatedTable,
    leaf_descendants: &LeafDescendants,
    periods: &BTreeSet<String>,
    measure: &str,
) -> RollupTotals {
    let mut result = RollupTotals::new();

    for (area_id, leaves) in leaf_descendants {
        for period in periods {
            let mut sum = StratifiedTotals::default();
            for leaf in leaves {
                if let Some(totals) = aggregated.get(leaf, period, measure) {
                    sum += totals;
                }
            }
            result.insert(AreaPeriod::new(area_id, period), sum);
        }
    }

    log::debug!(
        "Rolled '{measure}' up into {} areas x {} periods",
        leaf_descendants.len(),
        periods.len()
    );

    result
}

/// Like [`rollup_totals`] but keeps only `stratum`.
#[must_use]
pub fn rollup(
    aggregated: &AggregatedTable,
    leaf_descendants: &LeafDescendants,
    periods: &BTreeSet<String>,
    measure: &str,
    stratum: Stratum,
) -> RollupResult {
    rollup_totals(aggregated, leaf_descendants, periods, measure)
        .into_iter()
        .map(|(key, totals)| (key, totals.get(stratum)))
        .collect()
}

#[cfg(test)]
mod tests {
    use naomi_area::leaf_descendants_of;
    use naomi_area_models::AreaNode;
    use naomi_observation_models::ObservationRow;

    use super::*;
    use crate::aggregate::{AggregateParams, aggregate};

    /// National -> 2 regions -> 4 districts, plus a region that stops at
    /// level 1.
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

    fn row(area: &str, quarter: &str, sex: &str, art: f64) -> ObservationRow {
        ObservationRow::new(area, 2, quarter, "Y015_999", sex).with_measure("art_current", art)
    }

    fn district_rows() -> Vec<ObservationRow> {
        vec![
            row("MWI_1_1", "CY2022Q1", "female", 1.0),
            row("MWI_1_2", "CY2022Q1", "male", 2.0),
            row("MWI_2_1", "CY2022Q1", "female", 4.0),
            row("MWI_2_2", "CY2022Q1", "male", 8.0),
            row("MWI_1_1", "CY2022Q2", "female", 16.0),
            row("MWI_2_2", "CY2022Q2", "female", 32.0),
        ]
    }

    fn aggregated(rows: &[ObservationRow], tree: &AreaNode) -> AggregatedTable {
        let finest: BTreeSet<String> = tree
            .iter()
            .filter(|n| n.level == 2)
            .map(|n| n.id.clone())
            .collect();
        let params = AggregateParams::new(["art_current"], 2, ["1", "2"]).unwrap();
        aggregate(rows, &params, &finest)
    }

    #[test]
    fn conserves_district_values_at_region_level() {
        let tree = tree();
        let rows = district_rows();
        let table = aggregated(&rows, &tree);
        let leaves = leaf_descendants_of(&tree, 1, 2);

        let result = rollup(&table, &leaves, &table.periods, "art_current", Stratum::Total);

        assert_eq!(result.len(), 4);
        assert!((result[&AreaPeriod::new("MWI_1", "CY2022Q1")] - 3.0).abs() < f64::EPSILON);
        assert!((result[&AreaPeriod::new("MWI_2", "CY2022Q1")] - 12.0).abs() < f64::EPSILON);
        assert!((result[&AreaPeriod::new("MWI_1", "CY2022Q2")] - 16.0).abs() < f64::EPSILON);
        assert!((result[&AreaPeriod::new("MWI_2", "CY2022Q2")] - 32.0).abs() < f64::EPSILON);
    }

    #[test]
    fn excluded_areas_have_no_entries() {
        let tree = tree();
        let rows = district_rows();
        let table = aggregated(&rows, &tree);
        let leaves = leaf_descendants_of(&tree, 1, 2);

        let result = rollup(&table, &leaves, &table.periods, "art_current", Stratum::Total);

        assert!(result.keys().all(|key| key.area_id != "MWI_3"));
    }

    #[test]
    fn observed_zero_is_kept_as_zero() {
        let tree = tree();
        let rows = vec![row("MWI_1_1", "CY2022Q1", "female", 1.0)];
        let table = aggregated(&rows, &tree);
        let leaves = leaf_descendants_of(&tree, 1, 2);

        let result = rollup(&table, &leaves, &table.periods, "art_current", Stratum::Total);

        assert!(result[&AreaPeriod::new("MWI_2", "CY2022Q1")].abs() < f64::EPSILON);
    }

    #[test]
    fn rolls_up_every_stratum() {
        let tree = tree();
        let rows = district_rows();
        let table = aggregated(&rows, &tree);
        let leaves = leaf_descendants_of(&tree, 0, 2);

        let totals = rollup_totals(&table, &leaves, &table.periods, "art_current");
        let q1 = totals[&AreaPeriod::new("MWI", "CY2022Q1")];

        assert!((q1.total - 15.0).abs() < f64::EPSILON);
        assert!((q1.adult_f - 5.0).abs() < f64::EPSILON);
        assert!((q1.adult_m - 10.0).abs() < f64::EPSILON);
        assert!(q1.child.abs() < f64::EPSILON);
    }

    #[test]
    fn identical_inputs_give_identical_output() {
        let tree = tree();
        let rows = district_rows();
        let leaves = leaf_descendants_of(&tree, 1, 2);

        let first_table = aggregated(&rows, &tree);
        let second_table = aggregated(&rows, &tree);
        assert_eq!(first_table, second_table);

        let periods = &first_table.periods;
        let first = rollup(&first_table, &leaves, periods, "art_current", Stratum::Total);
        let second = rollup(&second_table, &leaves, periods, "art_current", Stratum::Total);
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_measure_rolls_up_to_zero() {
        let tree = tree();
        let rows = district_rows();
        let table = aggregated(&rows, &tree);
        let leaves = leaf_descendants_of(&tree, 1, 2);

        let result = rollup(&table, &leaves, &table.periods, "art_new", Stratum::Total);
        assert_eq!(result.len(), 4);
        assert!(result.values().all(|v| v.abs() < f64::EPSILON));
    }
}
