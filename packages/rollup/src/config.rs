//! TOML configuration for time-series runs.
//!
//! A default Naomi configuration is embedded at compile time; callers can
//! load their own from a file to track different measures or change how
//! duplicates and missing areas are treated.

use std::path::Path;

use naomi_observation::DuplicateRowPolicy;
use naomi_rollup_models::{Indicator, MeasureSpec, MissingScope};
use serde::Deserialize;

use crate::RollupError;

/// Embedded default configuration.
const NAOMI_DEFAULT_TOML: &str = include_str!("../config/naomi.toml");

const fn default_true() -> bool {
    true
}

/// Settings shared by every time-series run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RollupConfig {
    /// Measures to aggregate.
    pub measures: Vec<MeasureSpec>,
    /// Indicator plotted when a request does not name one.
    pub indicator: Indicator,
    /// How repeated `(area, quarter, age_group, sex)` rows are handled.
    #[serde(default)]
    pub duplicate_rows: DuplicateRowPolicy,
    /// How missing areas are detected.
    #[serde(default)]
    pub missing_scope: MissingScope,
    /// Whether to validate the tree and rows before aggregating.
    #[serde(default = "default_true")]
    pub validate: bool,
    /// Quarter selection used when a request does not name one.
    #[serde(default)]
    pub quarters: Vec<String>,
}

impl RollupConfig {
    /// Parses a configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`RollupError::Config`] if the TOML is malformed.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, RollupError> {
        Ok(toml::de::from_str(toml_str)?)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`RollupError::Io`] if the file cannot be read or
    /// [`RollupError::Config`] if it is malformed.
    pub fn load(path: &Path) -> Result<Self, RollupError> {
        let contents = std::fs::read_to_string(path)?;
        log::debug!("Loading rollup config from {}", path.display());
        Self::from_toml_str(&contents)
    }

    /// The embedded default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RollupError::Config`] if the embedded TOML is malformed.
    pub fn naomi_default() -> Result<Self, RollupError> {
        Self::from_toml_str(NAOMI_DEFAULT_TOML)
    }

    /// Source columns to aggregate: every configured measure plus any the
    /// indicator reads that were not configured, without repeats.
    #[must_use]
    pub fn tracked_measures(&self, indicator: &Indicator) -> Vec<String> {
        let mut measures: Vec<String> = Vec::new();
        let configured = self.measures.iter().map(|spec| spec.source.as_str());

        for measure in configured.chain(indicator.measures()) {
            if !measures.iter().any(|m| m == measure) {
                measures.push(measure.to_string());
            }
        }

        measures
    }
}
