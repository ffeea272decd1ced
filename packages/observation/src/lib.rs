#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Observation loading and boundary validation.
//!
//! Reads observation rows from CSV or JSON and checks them once against the
//! area hierarchy before any aggregation runs, so malformed input fails
//! fast with a descriptive error instead of producing a partial rollup.

pub mod load;
pub mod validate;

pub use load::{read_csv, read_json};
pub use validate::{DuplicateRowPolicy, RowReport, validate_rows};

use naomi_area_models::AreaLevel;
use thiserror::Error;

/// Errors that can occur while loading or validating observations.
#[derive(Debug, Error)]
pub enum ObservationError {
    /// I/O error while reading input.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required column is absent from the CSV header.
    #[error("Missing required column '{column}'")]
    MissingColumn {
        /// Column name.
        column: &'static str,
    },

    /// A cell could not be converted to the expected type.
    #[error("Invalid value '{value}' for column '{column}' on line {line}")]
    InvalidValue {
        /// Column name.
        column: &'static str,
        /// Raw cell contents.
        value: String,
        /// One-based line number in the input.
        line: u64,
    },

    /// A row references an area that is not in the hierarchy.
    #[error("Row references unknown area '{area_id}'")]
    UnknownArea {
        /// Area id from the row.
        area_id: String,
    },

    /// A row's `area_level` disagrees with the hierarchy.
    #[error("Row for area '{area_id}' has level {row_level}, hierarchy says {tree_level}")]
    AreaLevelMismatch {
        /// Area id from the row.
        area_id: String,
        /// Level carried on the row.
        row_level: AreaLevel,
        /// Level in the hierarchy.
        tree_level: AreaLevel,
    },

    /// The same `(area_id, calendar_quarter, age_group, sex)` appears twice.
    #[error("Duplicate observation for {key}")]
    DuplicateRow {
        /// `area/quarter/age_group/sex`
        key: String,
    },
}
