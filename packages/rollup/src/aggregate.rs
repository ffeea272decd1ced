//! Stratified aggregation at the finest observed level.
//!
//! Every (finest-level area, observed period) pair gets a zeroed bucket per
//! measure before any row is folded in, so an area present in the geometry
//! but absent from the data still has an explicit zero cell.

use std::collections::BTreeSet;

use naomi_area_models::AreaLevel;
use naomi_observation_models::{AgeGroup, ObservationRow, Sex, normalize_quarter};
use naomi_rollup_models::{AggregatedTable, AreaPeriod, MeasureBuckets, StratifiedTotals};

use crate::RollupError;

/// Filters and measures for one aggregation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateParams {
    /// Source columns to sum.
    pub measures: Vec<String>,
    /// Only rows at this level are aggregated.
    pub max_observed_level: AreaLevel,
    /// Quarter digits (`"1"`-`"4"`) a row's period must end in.
    pub selected_quarters: BTreeSet<String>,
}

impl AggregateParams {
    /// Builds params, normalizing `Q`-prefixed quarter selections.
    ///
    /// # Errors
    ///
    /// Returns [`RollupError::InvalidQuarter`] for a selection that is not a
    /// quarter of the year.
    pub fn new<M, Q>(
        measures: M,
        max_observed_level: AreaLevel,
        selected_quarters: Q,
    ) -> Result<Self, RollupError>
    where
        M: IntoIterator,
        M::Item: Into<String>,
        Q: IntoIterator,
        Q::Item: AsRef<str>,
    {
        let selected_quarters = selected_quarters
            .into_iter()
            .map(|q| {
                let q = q.as_ref();
                normalize_quarter(q).ok_or_else(|| RollupError::InvalidQuarter {
                    selection: q.to_string(),
                })
            })
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(Self {
            measures: measures.into_iter().map(Into::into).collect(),
            max_observed_level,
            selected_quarters,
        })
    }

    /// Returns `true` if `row` is at the finest level and in a selected
    /// quarter.
    #[must_use]
    pub fn accepts(&self, row: &ObservationRow) -> bool {
        row.area_level == self.max_observed_level
            && row
                .quarter()
                .is_some_and(|q| self.selected_quarters.contains(q))
    }

    fn zero_buckets(&self) -> MeasureBuckets {
        self.measures
            .iter()
            .map(|m| (m.clone(), StratifiedTotals::default()))
            .collect()
    }
}

/// Sums `rows` into stratified totals per finest-level area and period.
///
/// `finest_areas` is every area id at `params.max_observed_level` in the
/// hierarchy; each is crossed with the periods that survive filtering. The
/// period axis is only the periods actually observed, not every selectable
/// one.
#[must_use]
pub fn aggregate(
    rows: &[ObservationRow],
    params: &AggregateParams,
    finest_areas: &BTreeSet<String>,
) -> AggregatedTable {
    let filtered: Vec<&ObservationRow> = rows.iter().filter(|row| params.accepts(row)).collect();

    let periods: BTreeSet<String> = filtered
        .iter()
        .map(|row| row.calendar_quarter.clone())
        .collect();

    let zero = params.zero_buckets();
    let mut table = AggregatedTable {
        periods,
        ..AggregatedTable::default()
    };

    for area_id in finest_areas {
        for period in &table.periods {
            table
                .buckets
                .insert(AreaPeriod::new(area_id, period), zero.clone());
        }
    }

    for row in &filtered {
        let key = AreaPeriod::new(&row.area_id, &row.calendar_quarter);
        let cell = table.buckets.entry(key).or_insert_with(|| {
            log::debug!(
                "Area '{}' is not in the finest-level geometry, adding bucket",
                row.area_id
            );
            zero.clone()
        });

        for measure in &params.measures {
            let totals = cell.entry(measure.clone()).or_default();
            fold(totals, row, row.measure(measure));
        }
    }

    log::debug!(
        "Aggregated {} of {} rows into {} cells over {} periods",
        filtered.len(),
        rows.len(),
        table.buckets.len(),
        table.periods.len()
    );

    table
}

/// Adds `value` to `total` and to at most one of adult/child and one of
/// adult female/adult male.
fn fold(totals: &mut StratifiedTotals, row: &ObservationRow, value: f64) {
    totals.total += value;

    match row.age_group {
        AgeGroup::Adult => {
            totals.adult += value;
            match row.sex {
                Sex::Female => totals.adult_f += value,
                Sex::Male => totals.adult_m += value,
                Sex::Other(_) => {}
            }
        }
        AgeGroup::Child => totals.child += value,
        AgeGroup::Other(_) => {}
    }
}
