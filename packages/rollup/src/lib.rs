#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Stratified aggregation and area-hierarchy rollup of programme data.
//!
//! Observation rows are summed into adult/child and female/male strata at
//! the finest level that carries data ([`aggregate`]), then rolled up
//! through the area hierarchy to the level a user chose to view
//! ([`rollup`]). [`missing`] flags areas with no observations at all so
//! that "no data" can be told apart from "observed zero".
//!
//! Every operation is a pure function of its inputs; nothing is cached
//! across calls except the descendant lookups held by a
//! [`TimeSeriesPipeline`].

pub mod aggregate;
pub mod config;
pub mod indicator;
pub mod missing;
pub mod pipeline;
pub mod rollup;

pub use aggregate::{AggregateParams, aggregate};
pub use config::RollupConfig;
pub use missing::{detect_missing, detect_missing_descendants, present_area_ids};
pub use pipeline::{TimeSeriesPipeline, build_time_series};
pub use rollup::{rollup, rollup_totals};

use naomi_area::AreaError;
use naomi_observation::ObservationError;
use thiserror::Error;

/// Errors that can occur while building a rollup.
#[derive(Debug, Error)]
pub enum RollupError {
    /// The area hierarchy is malformed.
    #[error("Area hierarchy error: {0}")]
    Area(#[from] AreaError),

    /// The observation rows are malformed.
    #[error("Observation error: {0}")]
    Observation(#[from] ObservationError),

    /// The TOML configuration could not be parsed.
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O error while reading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A quarter selection is not one of `1`-`4` (optionally `Q`-prefixed).
    #[error("Invalid quarter selection '{selection}'")]
    InvalidQuarter {
        /// The rejected selection.
        selection: String,
    },
}
