//! Detection of areas with no observations at all.
//!
//! "Missing" means no filtered row references the area, which is distinct
//! from rows that were observed with a value of zero.

use std::collections::BTreeSet;

use naomi_area::LeafDescendants;
use naomi_observation_models::ObservationRow;
use naomi_rollup_models::MissingAreaSet;

use crate::aggregate::AggregateParams;

/// Ids of areas referenced by rows that pass the aggregation filters.
#[must_use]
pub fn present_area_ids(rows: &[ObservationRow], params: &AggregateParams) -> BTreeSet<String> {
    rows.iter()
        .filter(|row| params.accepts(row))
        .map(|row| row.area_id.clone())
        .collect()
}

/// Returns every id in `all_area_ids_at_level` that never appears in
/// `area_ids_present`.
///
/// Presence is checked directly: when the selected level is coarser than
/// the finest observed level and `area_ids_present` holds finest-level ids,
/// use [`detect_missing_descendants`] instead.
#[must_use]
pub fn detect_missing<A, P>(all_area_ids_at_level: A, area_ids_present: P) -> MissingAreaSet
where
    A: IntoIterator,
    A::Item: AsRef<str>,
    P: IntoIterator,
    P::Item: AsRef<str>,
{
    let present: BTreeSet<String> = area_ids_present
        .into_iter()
        .map(|id| id.as_ref().to_string())
        .collect();

    all_area_ids_at_level
        .into_iter()
        .filter_map(|id| {
            let id = id.as_ref();
            (!present.contains(id)).then(|| id.to_string())
        })
        .collect()
}

/// Like [`detect_missing`], but an area counts as present when any of its
/// finest-level descendants in `leaf_descendants` is present.
///
/// Areas with no entry in `leaf_descendants` have nothing beneath them that
/// could carry data and are always reported missing.
#[must_use]
pub fn detect_missing_descendants<A>(
    all_area_ids_at_level: A,
    leaf_descendants: &LeafDescendants,
    area_ids_present: &BTreeSet<String>,
) -> MissingAreaSet
where
    A: IntoIterator,
    A::Item: AsRef<str>,
{
    all_area_ids_at_level
        .into_iter()
        .filter_map(|id| {
            let id = id.as_ref();
            leaf_descendants
                .get(id)
                .is_none_or(|leaves| leaves.is_disjoint(area_ids_present))
                .then(|| id.to_string())
        })
        .collect()
}
