#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Observation row types for programme data.
//!
//! One [`ObservationRow`] is one reported measurement set for a single
//! (area, calendar quarter, age group, sex) combination. The age group and
//! sex codes are classified into the strata used for adult/child and
//! female/male reporting; every other column is a named numeric measure.

pub mod quarter;

use std::collections::BTreeMap;

use naomi_area_models::AreaLevel;
use serde::{Deserialize, Serialize};

pub use quarter::{normalize_quarter, quarter_of};

/// Age group code for adults aged 15 and over.
pub const ADULT_AGE_GROUP: &str = "Y015_999";

/// Age group code for children aged 0 to 14.
pub const CHILD_AGE_GROUP: &str = "Y000_014";

/// Age bucket of an observation, classified from its age group code.
///
/// Only [`ADULT_AGE_GROUP`] and [`CHILD_AGE_GROUP`] are recognized for
/// adult/child splitting; anything else is kept verbatim and counts only
/// toward totals.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AgeGroup {
    /// `Y015_999`
    Adult,
    /// `Y000_014`
    Child,
    /// Any other code (e.g. five-year bands).
    Other(String),
}

impl AgeGroup {
    /// Returns the age group code as it appears in the data.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Adult => ADULT_AGE_GROUP,
            Self::Child => CHILD_AGE_GROUP,
            Self::Other(code) => code,
        }
    }
}

impl From<String> for AgeGroup {
    fn from(code: String) -> Self {
        match code.as_str() {
            ADULT_AGE_GROUP => Self::Adult,
            CHILD_AGE_GROUP => Self::Child,
            _ => Self::Other(code),
        }
    }
}

impl From<&str> for AgeGroup {
    fn from(code: &str) -> Self {
        Self::from(code.to_string())
    }
}

impl From<AgeGroup> for String {
    fn from(value: AgeGroup) -> Self {
        match value {
            AgeGroup::Other(code) => code,
            known => known.code().to_string(),
        }
    }
}

impl std::fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Sex of an observation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Sex {
    /// `female`
    Female,
    /// `male`
    Male,
    /// `both` or any other value.
    Other(String),
}

impl Sex {
    /// Returns the sex value as it appears in the data.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Female => "female",
            Self::Male => "male",
            Self::Other(code) => code,
        }
    }
}

impl From<String> for Sex {
    fn from(code: String) -> Self {
        match code.as_str() {
            "female" => Self::Female,
            "male" => Self::Male,
            _ => Self::Other(code),
        }
    }
}

impl From<&str> for Sex {
    fn from(code: &str) -> Self {
        Self::from(code.to_string())
    }
}

impl From<Sex> for String {
    fn from(value: Sex) -> Self {
        match value {
            Sex::Other(code) => code,
            known => known.code().to_string(),
        }
    }
}

impl std::fmt::Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// One reported measurement set.
///
/// Any column besides the five keys is collected into [`measures`]. Values
/// that are missing, `null`, or non-numeric count as zero when summed.
///
/// [`measures`]: ObservationRow::measures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRow {
    /// Area this row reports for.
    pub area_id: String,
    /// Administrative level of `area_id`, denormalized for filtering.
    pub area_level: AreaLevel,
    /// Period code whose last two characters are the quarter
    /// (e.g. `"CY2022Q1"`).
    pub calendar_quarter: String,
    /// Age group bucket.
    pub age_group: AgeGroup,
    /// Sex.
    pub sex: Sex,
    /// Named measures (e.g. `art_current`, `vl_tested_12mos`).
    #[serde(flatten)]
    pub measures: BTreeMap<String, serde_json::Value>,
}

impl ObservationRow {
    /// Creates a row with no measures.
    #[must_use]
    pub fn new(
        area_id: impl Into<String>,
        area_level: AreaLevel,
        calendar_quarter: impl Into<String>,
        age_group: impl Into<AgeGroup>,
        sex: impl Into<Sex>,
    ) -> Self {
        Self {
            area_id: area_id.into(),
            area_level,
            calendar_quarter: calendar_quarter.into(),
            age_group: age_group.into(),
            sex: sex.into(),
            measures: BTreeMap::new(),
        }
    }

    /// Adds or replaces a numeric measure.
    #[must_use]
    pub fn with_measure(mut self, name: impl Into<String>, value: f64) -> Self {
        self.measures.insert(name.into(), serde_json::Value::from(value));
        self
    }

    /// Returns the value of `name`, treating missing, `null`, and
    /// non-numeric values as zero. Numeric strings are parsed; `NaN` and
    /// infinities count as zero.
    #[must_use]
    pub fn measure(&self, name: &str) -> f64 {
        let value = match self.measures.get(name) {
            Some(serde_json::Value::Number(n)) => n.as_f64(),
            Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        value.filter(|v| v.is_finite()).unwrap_or(0.0)
    }

    /// Quarter-of-year digit of [`calendar_quarter`](Self::calendar_quarter).
    #[must_use]
    pub fn quarter(&self) -> Option<&str> {
        quarter_of(&self.calendar_quarter)
    }

    /// Key that a well-formed dataset holds exactly one row for.
    #[must_use]
    pub fn key(&self) -> RowKey<'_> {
        RowKey {
            area_id: &self.area_id,
            calendar_quarter: &self.calendar_quarter,
            age_group: self.age_group.code(),
            sex: self.sex.code(),
        }
    }
}

/// Identity of an observation: `(area_id, calendar_quarter, age_group,
/// sex)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowKey<'a> {
    /// Area id.
    pub area_id: &'a str,
    /// Period code.
    pub calendar_quarter: &'a str,
    /// Age group code.
    pub age_group: &'a str,
    /// Sex code.
    pub sex: &'a str,
}

impl std::fmt::Display for RowKey<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.area_id, self.calendar_quarter, self.age_group, self.sex
        )
    }
}
