#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Input loading and argument handling for the `naomi_rollup_cli` binary.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

use naomi_area_models::AreaNode;
use naomi_observation::{ObservationError, read_csv, read_json};
use naomi_observation_models::ObservationRow;
use naomi_rollup::{RollupConfig, RollupError};
use naomi_rollup_models::{Indicator, Stratum};
use thiserror::Error;

/// Errors surfaced by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// I/O error while reading an input file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The area tree file is not valid JSON.
    #[error("Invalid area tree: {0}")]
    Tree(#[from] serde_json::Error),

    /// The observation file could not be read.
    #[error(transparent)]
    Observation(#[from] ObservationError),

    /// The rollup itself failed.
    #[error(transparent)]
    Rollup(#[from] RollupError),

    /// Observation files must end in `.csv` or `.json`.
    #[error("Unsupported observation file '{path}' (expected .csv or .json)")]
    UnsupportedFormat {
        /// The rejected path.
        path: String,
    },

    /// `--numerator` and `--denominator` must be given together.
    #[error("--numerator and --denominator must be given together")]
    IncompleteRatio,
}

/// Reads an area tree from a JSON file.
///
/// # Errors
///
/// Returns [`CliError::Io`] if the file cannot be opened or
/// [`CliError::Tree`] if it is not a valid tree.
pub fn load_tree(path: &Path) -> Result<AreaNode, CliError> {
    let file = File::open(path)?;
    let tree: AreaNode = serde_json::from_reader(BufReader::new(file))?;
    log::debug!("Loaded area tree '{}' from {}", tree.id, path.display());
    Ok(tree)
}

/// Reads observation rows, picking the format from the file extension.
///
/// # Errors
///
/// * [`CliError::UnsupportedFormat`] for anything but `.csv` or `.json`.
/// * [`CliError::Io`] if the file cannot be opened.
/// * [`CliError::Observation`] if the contents are malformed.
pub fn load_rows(path: &Path) -> Result<Vec<ObservationRow>, CliError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let rows = match extension.as_deref() {
        Some("csv") => read_csv(BufReader::new(File::open(path)?))?,
        Some("json") => read_json(BufReader::new(File::open(path)?))?,
        _ => {
            return Err(CliError::UnsupportedFormat {
                path: path.display().to_string(),
            });
        }
    };

    log::info!("Loaded {} observation rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Loads the configuration at `path`, or the embedded default.
///
/// # Errors
///
/// Returns [`CliError::Rollup`] if the configuration cannot be read.
pub fn load_config(path: Option<&Path>) -> Result<RollupConfig, CliError> {
    Ok(match path {
        Some(path) => RollupConfig::load(path)?,
        None => RollupConfig::naomi_default()?,
    })
}

/// Splits a comma-separated quarter list, dropping blanks.
#[must_use]
pub fn parse_quarters(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Parses a `snake_case` setting name such as `adult_f` or `descendants`.
///
/// # Errors
///
/// Returns a message naming the rejected value.
pub fn parse_name<T: FromStr>(value: &str) -> Result<T, String> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| format!("unknown value '{value}'"))
}

/// Builds the indicator requested on the command line, if any.
///
/// A ratio takes precedence over a single measure. With neither, `None`
/// is returned and the configured indicator is used.
///
/// # Errors
///
/// Returns [`CliError::IncompleteRatio`] if only one side of a ratio is
/// given.
pub fn indicator_override(
    measure: Option<String>,
    numerator: Option<String>,
    denominator: Option<String>,
    stratum: Stratum,
) -> Result<Option<Indicator>, CliError> {
    match (numerator, denominator) {
        (Some(numerator), Some(denominator)) => Ok(Some(Indicator::Ratio {
            numerator,
            denominator,
            stratum,
        })),
        (None, None) => Ok(measure.map(|measure| Indicator::measure(measure, stratum))),
        _ => Err(CliError::IncompleteRatio),
    }
}

#[cfg(test)]
mod tests {
    use naomi_observation::DuplicateRowPolicy;
    use naomi_rollup_models::MissingScope;

    use super::*;

    #[test]
    fn quarters_are_split_and_trimmed() {
        assert_eq!(parse_quarters("1, Q2,,4 "), vec!["1", "Q2", "4"]);
        assert!(parse_quarters("").is_empty());
    }

    #[test]
    fn parses_settings() {
        assert_eq!(
            parse_name::<MissingScope>("descendants").unwrap(),
            MissingScope::Descendants
        );
        assert_eq!(
            parse_name::<DuplicateRowPolicy>("reject").unwrap(),
            DuplicateRowPolicy::Reject
        );
    }

    #[test]
    fn parses_strata() {
        assert_eq!(parse_name::<Stratum>("adult_f").unwrap(), Stratum::AdultF);
        assert_eq!(parse_name::<Stratum>(" child ").unwrap(), Stratum::Child);
        assert!(parse_name::<Stratum>("elderly").is_err());
    }

    #[test]
    fn ratio_wins_over_measure() {
        let indicator = indicator_override(
            Some("art_current".to_string()),
            Some("vl_suppressed_12mos".to_string()),
            Some("vl_tested_12mos".to_string()),
            Stratum::Adult,
        )
        .unwrap();

        assert_eq!(
            indicator,
            Some(Indicator::Ratio {
                numerator: "vl_suppressed_12mos".to_string(),
                denominator: "vl_tested_12mos".to_string(),
                stratum: Stratum::Adult,
            })
        );
    }

    #[test]
    fn measure_override() {
        let indicator =
            indicator_override(Some("art_new".to_string()), None, None, Stratum::Child).unwrap();
        assert_eq!(indicator, Some(Indicator::measure("art_new", Stratum::Child)));
    }

    #[test]
    fn no_override_without_arguments() {
        assert_eq!(indicator_override(None, None, None, Stratum::Total).unwrap(), None);
    }

    #[test]
    fn half_a_ratio_is_rejected() {
        let numerator = Some("vl_suppressed_12mos".to_string());
        let err = indicator_override(None, numerator, None, Stratum::Total).unwrap_err();
        assert!(matches!(err, CliError::IncompleteRatio));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_rows(Path::new("rows.parquet")).unwrap_err();
        assert!(matches!(err, CliError::UnsupportedFormat { .. }));
    }

    #[test]
    fn default_config_loads() {
        let config = load_config(None).unwrap();
        assert!(!config.measures.is_empty());
    }
}
