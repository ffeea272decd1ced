#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation, rollup, and time-series output types.
//!
//! The aggregator produces an [`AggregatedTable`] of [`StratifiedTotals`] per
//! finest-level area and period. The rollup engine sums those into a
//! [`RollupResult`] for the level a user selected, and the pipeline turns
//! that into a [`TimeSeriesOutput`] for charting.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::AddAssign;

use naomi_area_models::AreaLevel;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// A sub-population a measure can be reported for.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Stratum {
    /// Every row.
    #[default]
    Total,
    /// Age group `Y015_999`.
    Adult,
    /// Adult females.
    AdultF,
    /// Adult males.
    AdultM,
    /// Age group `Y000_014`.
    Child,
}

/// Running sums of one measure for one (area, period) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StratifiedTotals {
    /// Sum over every row.
    pub total: f64,
    /// Sum over adult rows.
    pub adult: f64,
    /// Sum over adult female rows.
    pub adult_f: f64,
    /// Sum over adult male rows.
    pub adult_m: f64,
    /// Sum over child rows.
    pub child: f64,
}

impl StratifiedTotals {
    /// Returns the sum for `stratum`.
    #[must_use]
    pub const fn get(&self, stratum: Stratum) -> f64 {
        match stratum {
            Stratum::Total => self.total,
            Stratum::Adult => self.adult,
            Stratum::AdultF => self.adult_f,
            Stratum::AdultM => self.adult_m,
            Stratum::Child => self.child,
        }
    }

    /// Returns `true` if every stratum is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

impl AddAssign<&Self> for StratifiedTotals {
    fn add_assign(&mut self, other: &Self) {
        self.total += other.total;
        self.adult += other.adult;
        self.adult_f += other.adult_f;
        self.adult_m += other.adult_m;
        self.child += other.child;
    }
}

/// A tracked measure: the row column to read and the label its output
/// columns are named after.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeasureSpec {
    /// Row column (e.g. `"art_current"`).
    pub source: String,
    /// Output prefix (e.g. `"art"`). Defaults to `source`.
    #[serde(default)]
    pub label: Option<String>,
}

impl MeasureSpec {
    /// A measure whose output prefix is its own column name.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            label: None,
        }
    }

    /// A measure with a separate output prefix.
    #[must_use]
    pub fn labelled(source: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            label: Some(label.into()),
        }
    }

    /// Output prefix.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.source)
    }

    /// Output column name for `stratum`, e.g. `art_adult_f`.
    #[must_use]
    pub fn column(&self, stratum: Stratum) -> String {
        format!("{}_{}", self.label(), stratum.as_ref())
    }

    /// Names every stratum of `totals` after this measure (`art_total`,
    /// `art_adult`, ...).
    #[must_use]
    pub fn columns(&self, totals: &StratifiedTotals) -> Vec<(String, f64)> {
        Stratum::iter()
            .map(|stratum| (self.column(stratum), totals.get(stratum)))
            .collect()
    }
}

/// Key of one (area, period) cell.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaPeriod {
    /// Area id.
    pub area_id: String,
    /// Full calendar quarter code (e.g. `"CY2022Q1"`).
    pub period: String,
}

impl AreaPeriod {
    /// Creates a key.
    #[must_use]
    pub fn new(area_id: impl Into<String>, period: impl Into<String>) -> Self {
        Self {
            area_id: area_id.into(),
            period: period.into(),
        }
    }
}

impl std::fmt::Display for AreaPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.area_id, self.period)
    }
}

/// Per-measure totals for one (area, period) cell, keyed by measure source
/// column.
pub type MeasureBuckets = BTreeMap<String, StratifiedTotals>;

/// Output of aggregation at the finest observed level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedTable {
    /// Distinct calendar quarters that survived filtering.
    pub periods: BTreeSet<String>,
    /// Totals per finest-level (area, period).
    pub buckets: BTreeMap<AreaPeriod, MeasureBuckets>,
}

impl AggregatedTable {
    /// Totals for `measure` at `area_id` in `period`, if that cell exists.
    #[must_use]
    pub fn get(&self, area_id: &str, period: &str, measure: &str) -> Option<&StratifiedTotals> {
        self.buckets
            .get(&AreaPeriod::new(area_id, period))
            .and_then(|buckets| buckets.get(measure))
    }

    /// Number of (area, period) cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Returns `true` if there are no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// One value per (selected-level area, period).
pub type RollupResult = BTreeMap<AreaPeriod, f64>;

/// Full stratified totals per (selected-level area, period).
pub type RollupTotals = BTreeMap<AreaPeriod, StratifiedTotals>;

/// Selected-level areas with no observations.
pub type MissingAreaSet = BTreeSet<String>;

/// What to plot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Indicator {
    /// A single measure's stratum.
    Measure {
        /// Measure source column.
        measure: String,
        /// Stratum to report.
        #[serde(default)]
        stratum: Stratum,
    },
    /// `numerator / denominator`, computed after rollup.
    Ratio {
        /// Numerator source column.
        numerator: String,
        /// Denominator source column.
        denominator: String,
        /// Stratum both sides are read from.
        #[serde(default)]
        stratum: Stratum,
    },
}

impl Indicator {
    /// Plots `measure` for `stratum`.
    #[must_use]
    pub fn measure(measure: impl Into<String>, stratum: Stratum) -> Self {
        Self::Measure {
            measure: measure.into(),
            stratum,
        }
    }

    /// Measure columns this indicator reads.
    #[must_use]
    pub fn measures(&self) -> Vec<&str> {
        match self {
            Self::Measure { measure, .. } => vec![measure.as_str()],
            Self::Ratio {
                numerator,
                denominator,
                ..
            } => vec![numerator.as_str(), denominator.as_str()],
        }
    }

    /// Stratum this indicator reads.
    #[must_use]
    pub const fn stratum(&self) -> Stratum {
        match self {
            Self::Measure { stratum, .. } | Self::Ratio { stratum, .. } => *stratum,
        }
    }
}

/// How the missing-data detector decides an area has data.
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
pub enum MissingScope {
    /// The area id itself must appear among the filtered finest-level
    /// rows.
    #[default]
    Direct,
    /// Any finest-level descendant of the area appearing among the
    /// filtered rows counts.
    Descendants,
}

/// User selections driving one time-series run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesRequest {
    /// Administrative level to view.
    pub target_level: AreaLevel,
    /// Quarter-of-year selections (`"1"` or `"Q1"`).
    pub selected_quarters: Vec<String>,
    /// What to plot.
    pub indicator: Indicator,
}

/// One point of an area's series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    /// Calendar quarter code.
    pub period: String,
    /// Indicator value. `None` when a ratio's denominator is zero.
    pub value: Option<f64>,
}

/// Time series for one selected-level area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaSeries {
    /// Area id.
    pub area_id: String,
    /// Points in period order.
    pub points: Vec<SeriesPoint>,
}

/// Everything the charting layer needs for one selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesOutput {
    /// Level the series are reported at.
    pub level: AreaLevel,
    /// Finest level observations were aggregated at, if any rows exist.
    pub finest_level: Option<AreaLevel>,
    /// Observed periods in order.
    pub periods: Vec<String>,
    /// One series per selected-level area with finest-level descendants,
    /// ordered by area id.
    pub series: Vec<AreaSeries>,
    /// Selected-level areas without observations, ordered by id.
    pub missing: Vec<String>,
}

/// Rolled-up stratified columns of every configured measure for one
/// (selected-level area, period).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StratifiedRow {
    /// Area id.
    pub area_id: String,
    /// Calendar quarter code.
    pub period: String,
    /// `{label}_{stratum}` columns.
    #[serde(flatten)]
    pub columns: BTreeMap<String, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stratum_names_match_column_suffixes() {
        assert_eq!(Stratum::AdultF.as_ref(), "adult_f");
        assert_eq!("adult_m".parse::<Stratum>().unwrap(), Stratum::AdultM);
        assert_eq!(Stratum::default(), Stratum::Total);
    }

    #[test]
    fn adds_totals_field_by_field() {
        let mut a = StratifiedTotals {
            total: 3.0,
            adult: 2.0,
            adult_f: 1.0,
            adult_m: 1.0,
            child: 1.0,
        };
        let copy = a;
        a += &copy;
        assert!((a.get(Stratum::Total) - 6.0).abs() < f64::EPSILON);
        assert!((a.get(Stratum::Child) - 2.0).abs() < f64::EPSILON);
        assert!(!a.is_zero());
        assert!(StratifiedTotals::default().is_zero());
    }

    #[test]
    fn labels_default_to_source() {
        assert_eq!(MeasureSpec::new("art_new").column(Stratum::Total), "art_new_total");
        assert_eq!(
            MeasureSpec::labelled("art_current", "art").column(Stratum::AdultF),
            "art_adult_f"
        );
    }

    #[test]
    fn names_every_stratum_after_label() {
        let totals = StratifiedTotals {
            total: 10.0,
            adult: 10.0,
            adult_f: 10.0,
            ..StratifiedTotals::default()
        };
        let columns: BTreeMap<String, f64> = MeasureSpec::labelled("art_current", "art")
            .columns(&totals)
            .into_iter()
            .collect();

        assert_eq!(
            columns.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["art_adult", "art_adult_f", "art_adult_m", "art_child", "art_total"]
        );
        assert!((columns["art_adult_f"] - 10.0).abs() < f64::EPSILON);
        assert!(columns["art_child"].abs() < f64::EPSILON);
    }

    #[test]
    fn aggregated_table_lookup() {
        let mut table = AggregatedTable::default();
        table.buckets.insert(
            AreaPeriod::new("MWI_1_1", "CY2022Q1"),
            BTreeMap::from([("art_current".to_string(), StratifiedTotals::default())]),
        );
        assert!(table.get("MWI_1_1", "CY2022Q1", "art_current").is_some());
        assert!(table.get("MWI_1_1", "CY2022Q2", "art_current").is_none());
    }

    #[test]
    fn stratified_row_flattens_columns() {
        let row = StratifiedRow {
            area_id: "MWI_1".to_string(),
            period: "CY2022Q1".to_string(),
            columns: BTreeMap::from([("art_total".to_string(), 15.0)]),
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["areaId"], "MWI_1");
        assert_eq!(value["art_total"], 15.0);
    }

    #[test]
    fn indicator_deserializes_with_default_stratum() {
        let indicator: Indicator = serde_json::from_value(serde_json::json!({
            "type": "ratio",
            "numerator": "vl_suppressed_12mos",
            "denominator": "vl_tested_12mos"
        }))
        .unwrap();
        assert_eq!(indicator.stratum(), Stratum::Total);
        assert_eq!(
            indicator.measures(),
            vec!["vl_suppressed_12mos", "vl_tested_12mos"]
        );
    }

    #[test]
    fn output_serializes_camel_case() {
        let output = TimeSeriesOutput {
            level: 1,
            finest_level: Some(2),
            periods: vec!["CY2022Q1".to_string()],
            series: vec![AreaSeries {
                area_id: "MWI_1".to_string(),
                points: vec![SeriesPoint {
                    period: "CY2022Q1".to_string(),
                    value: Some(15.0),
                }],
            }],
            missing: Vec::new(),
        };
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["finestLevel"], 2);
        assert_eq!(value["series"][0]["areaId"], "MWI_1");
        assert_eq!(value["series"][0]["points"][0]["value"], 15.0);
    }
}
