//! Evaluates an [`Indicator`] over rolled-up totals.

use std::collections::BTreeMap;

use naomi_area::LeafDescendants;
use naomi_rollup_models::{AggregatedTable, AreaPeriod, Indicator};

use crate::rollup::rollup;

/// Indicator value per (selected-level area, period).
pub type IndicatorValues = BTreeMap<AreaPeriod, Option<f64>>;

/// Rolls up the measures `indicator` needs and combines them.
///
/// Ratios are taken after rollup, so a regional suppression rate is the
/// regional suppressed count over the regional tested count rather than an
/// average of district rates. A zero denominator yields `None`.
#[must_use]
pub fn evaluate(
    indicator: &Indicator,
    aggregated: &AggregatedTable,
    leaf_descendants: &LeafDescendants,
) -> IndicatorValues {
    let periods = &aggregated.periods;

    match indicator {
        Indicator::Measure { measure, stratum } => {
            rollup(aggregated, leaf_descendants, periods, measure, *stratum)
                .into_iter()
                .map(|(key, value)| (key, Some(value)))
                .collect()
        }
        Indicator::Ratio {
            numerator,
            denominator,
            stratum,
        } => {
            let denominators = rollup(aggregated, leaf_descendants, periods, denominator, *stratum);
            rollup(aggregated, leaf_descendants, periods, numerator, *stratum)
                .into_iter()
                .map(|(key, num)| {
                    let value = denominators
                        .get(&key)
                        .copied()
                        .filter(|den| den.abs() > 0.0)
                        .map(|den| num / den);
                    (key, value)
                })
                .collect()
        }
    }
}
