//! End-to-end time-series builder.
//!
//! Runs validation, aggregation, rollup, indicator evaluation, and missing
//! detection for one selection and shapes the result for charting. A
//! [`TimeSeriesPipeline`] is tied to one tree and keeps its descendant
//! lookups between runs, so changing periods or indicators does not re-walk
//! the hierarchy.

use std::collections::BTreeMap;

use naomi_area::{AreaHierarchyIndex, DescendantsCache, validate_tree};
use naomi_area_models::{AreaLevel, AreaNode};
use naomi_observation::validate_rows;
use naomi_observation_models::ObservationRow;
use naomi_rollup_models::{
    AreaPeriod, AreaSeries, MissingScope, SeriesPoint, StratifiedRow, TimeSeriesOutput,
    TimeSeriesRequest,
};

use crate::RollupError;
use crate::aggregate::{AggregateParams, aggregate};
use crate::config::RollupConfig;
use crate::indicator::evaluate;
use crate::missing::{detect_missing, detect_missing_descendants, present_area_ids};
use crate::rollup::rollup_totals;

/// Builds time series for one area tree.
#[derive(Debug)]
pub struct TimeSeriesPipeline<'a> {
    tree: &'a AreaNode,
    config: RollupConfig,
    cache: DescendantsCache<'a>,
}

impl<'a> TimeSeriesPipeline<'a> {
    /// Creates a pipeline for `tree`, validating it first when
    /// `config.validate` is set.
    ///
    /// # Errors
    ///
    /// Returns [`RollupError::Area`] if the tree is malformed.
    pub fn new(tree: &'a AreaNode, config: RollupConfig) -> Result<Self, RollupError> {
        if config.validate {
            validate_tree(tree)?;
        }

        Ok(Self {
            tree,
            config,
            cache: DescendantsCache::new(tree),
        })
    }

    /// The configuration this pipeline runs with.
    #[must_use]
    pub const fn config(&self) -> &RollupConfig {
        &self.config
    }

    /// `(hits, misses)` of the descendant cache.
    #[must_use]
    pub const fn cache_stats(&self) -> (u64, u64) {
        self.cache.stats()
    }

    /// A request for `target_level` using the configured indicator and
    /// quarters.
    #[must_use]
    pub fn default_request(&self, target_level: AreaLevel) -> TimeSeriesRequest {
        TimeSeriesRequest {
            target_level,
            selected_quarters: self.config.quarters.clone(),
            indicator: self.config.indicator.clone(),
        }
    }

    /// Builds the time series for `request` from `rows`.
    ///
    /// With no rows at all, every area at the target level is reported
    /// missing and there are no series.
    ///
    /// # Errors
    ///
    /// * [`RollupError::Observation`] if validation is enabled and a row is
    ///   malformed.
    /// * [`RollupError::InvalidQuarter`] for a bad quarter selection.
    pub fn run(
        &mut self,
        rows: &[ObservationRow],
        request: &TimeSeriesRequest,
    ) -> Result<TimeSeriesOutput, RollupError> {
        let index = AreaHierarchyIndex::build(self.tree, rows.iter().map(|row| row.area_level));

        if self.config.validate {
            validate_rows(&index, rows, self.config.duplicate_rows)?;
        }

        let areas_at_level = index.areas_at_level(request.target_level);

        let Some(max_observed_level) = index.max_observed_level() else {
            log::debug!(
                "No observations; all {} areas at level {} are missing",
                areas_at_level.len(),
                request.target_level
            );
            return Ok(TimeSeriesOutput {
                level: request.target_level,
                missing: areas_at_level.into_iter().collect(),
                ..TimeSeriesOutput::default()
            });
        };

        let measures = self.config.tracked_measures(&request.indicator);
        let params =
            AggregateParams::new(measures, max_observed_level, &request.selected_quarters)?;
        let aggregated = aggregate(rows, &params, &index.finest_areas());

        let leaves = self.cache.get(request.target_level, max_observed_level);
        let values = evaluate(&request.indicator, &aggregated, leaves);

        let present = present_area_ids(rows, &params);
        let missing = match self.config.missing_scope {
            MissingScope::Direct => detect_missing(&areas_at_level, &present),
            MissingScope::Descendants => {
                detect_missing_descendants(&areas_at_level, leaves, &present)
            }
        };

        let series: Vec<AreaSeries> = leaves
            .keys()
            .map(|area_id| AreaSeries {
                area_id: area_id.clone(),
                points: aggregated
                    .periods
                    .iter()
                    .map(|period| SeriesPoint {
                        period: period.clone(),
                        value: values
                            .get(&AreaPeriod::new(area_id, period))
                            .copied()
                            .flatten(),
                    })
                    .collect(),
            })
            .collect();

        log::info!(
            "Built {} series over {} periods at level {} ({} areas missing)",
            series.len(),
            aggregated.periods.len(),
            request.target_level,
            missing.len()
        );

        Ok(TimeSeriesOutput {
            level: request.target_level,
            finest_level: Some(max_observed_level),
            periods: aggregated.periods.into_iter().collect(),
            series,
            missing: missing.into_iter().collect(),
        })
    }

    /// Rolls every configured measure up to `target_level` and returns one
    /// row per (area, period) with a `{label}_{stratum}` column for each
    /// measure and stratum.
    ///
    /// With no rows the table is empty.
    ///
    /// # Errors
    ///
    /// * [`RollupError::Observation`] if validation is enabled and a row is
    ///   malformed.
    /// * [`RollupError::InvalidQuarter`] for a bad quarter selection.
    pub fn stratified_table(
        &mut self,
        rows: &[ObservationRow],
        target_level: AreaLevel,
        selected_quarters: &[String],
    ) -> Result<Vec<StratifiedRow>, RollupError> {
        let index = AreaHierarchyIndex::build(self.tree, rows.iter().map(|row| row.area_level));

        if self.config.validate {
            validate_rows(&index, rows, self.config.duplicate_rows)?;
        }

        let Some(max_observed_level) = index.max_observed_level() else {
            log::debug!("No observations; stratified table at level {target_level} is empty");
            return Ok(Vec::new());
        };

        let sources = self.config.measures.iter().map(|spec| spec.source.clone());
        let params = AggregateParams::new(sources, max_observed_level, selected_quarters)?;
        let aggregated = aggregate(rows, &params, &index.finest_areas());
        let leaves = self.cache.get(target_level, max_observed_level);

        let mut table: BTreeMap<AreaPeriod, BTreeMap<String, f64>> = BTreeMap::new();
        for spec in &self.config.measures {
            let totals = rollup_totals(&aggregated, leaves, &aggregated.periods, &spec.source);
            for (key, cell) in totals {
                table.entry(key).or_default().extend(spec.columns(&cell));
            }
        }

        log::info!(
            "Built stratified table of {} rows for {} measures at level {target_level}",
            table.len(),
            self.config.measures.len()
        );

        Ok(table
            .into_iter()
            .map(|(key, columns)| StratifiedRow {
                area_id: key.area_id,
                period: key.period,
                columns,
            })
            .collect())
    }
}

/// One-shot convenience: builds a pipeline for `tree` and runs `request`.
///
/// # Errors
///
/// See [`TimeSeriesPipeline::new`] and [`TimeSeriesPipeline::run`].
pub fn build_time_series(
    tree: &AreaNode,
    rows: &[ObservationRow],
    config: RollupConfig,
    request: &TimeSeriesRequest,
) -> Result<TimeSeriesOutput, RollupError> {
    TimeSeriesPipeline::new(tree, config)?.run(rows, request)
}
