#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI for rolling Naomi programme data up an area hierarchy.
//!
//! ```text
//! naomi_rollup_cli --tree areas.json --rows art.csv rollup --level 1 --quarters 1,2
//! naomi_rollup_cli --tree areas.json --rows art.csv table --level 1
//! naomi_rollup_cli --tree areas.json --rows art.csv levels
//! naomi_rollup_cli --tree areas.json --rows art.csv missing --level 1
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use naomi_area::AreaHierarchyIndex;
use naomi_area_models::AreaLevel;
use naomi_observation::DuplicateRowPolicy;
use naomi_rollup::TimeSeriesPipeline;
use naomi_rollup_cli::{
    indicator_override, load_config, load_rows, load_tree, parse_name, parse_quarters,
};
use naomi_rollup_models::{MissingScope, Stratum};

#[derive(Parser)]
#[command(
    name = "naomi_rollup_cli",
    about = "Aggregate programme data and roll it up an area hierarchy"
)]
struct Cli {
    /// Area hierarchy as nested JSON (`id`, `level`, `children`)
    #[arg(long)]
    tree: PathBuf,
    /// Observation rows (`.csv` or `.json`)
    #[arg(long)]
    rows: PathBuf,
    /// Rollup configuration TOML. Defaults to the built-in Naomi config.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override how missing areas are detected (`direct` or `descendants`)
    #[arg(long, value_parser = parse_name::<MissingScope>)]
    missing_scope: Option<MissingScope>,
    /// Override how duplicate rows are handled (`sum` or `reject`)
    #[arg(long, value_parser = parse_name::<DuplicateRowPolicy>)]
    duplicate_rows: Option<DuplicateRowPolicy>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the time series for one administrative level as JSON
    Rollup {
        /// Administrative level to view (0 = national)
        #[arg(long)]
        level: AreaLevel,
        /// Comma-separated quarters (e.g. "1,2" or "Q1,Q2"). Defaults to the
        /// configured quarters.
        #[arg(long)]
        quarters: Option<String>,
        /// Plot this measure instead of the configured indicator
        #[arg(long)]
        measure: Option<String>,
        /// Ratio numerator (requires `--denominator`)
        #[arg(long)]
        numerator: Option<String>,
        /// Ratio denominator (requires `--numerator`)
        #[arg(long)]
        denominator: Option<String>,
        /// Stratum for `--measure` or the ratio
        #[arg(long, default_value = "total", value_parser = parse_name::<Stratum>)]
        stratum: Stratum,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Stratified columns of every configured measure at one level as JSON
    Table {
        /// Administrative level to view (0 = national)
        #[arg(long)]
        level: AreaLevel,
        /// Comma-separated quarters. Defaults to the configured quarters.
        #[arg(long)]
        quarters: Option<String>,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Show how many areas sit at each level and the finest observed level
    Levels,
    /// List areas at a level with no observations
    Missing {
        /// Administrative level to check
        #[arg(long)]
        level: AreaLevel,
        /// Comma-separated quarters. Defaults to the configured quarters.
        #[arg(long)]
        quarters: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let tree = load_tree(&cli.tree)?;
    let rows = load_rows(&cli.rows)?;
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(scope) = cli.missing_scope {
        config.missing_scope = scope;
    }
    if let Some(policy) = cli.duplicate_rows {
        config.duplicate_rows = policy;
    }

    match cli.command {
        Commands::Rollup {
            level,
            quarters,
            measure,
            numerator,
            denominator,
            stratum,
            pretty,
        } => {
            let indicator = indicator_override(measure, numerator, denominator, stratum)?;
            let mut pipeline = TimeSeriesPipeline::new(&tree, config)?;

            let mut request = pipeline.default_request(level);
            if let Some(quarters) = quarters {
                request.selected_quarters = parse_quarters(&quarters);
            }
            if let Some(indicator) = indicator {
                request.indicator = indicator;
            }

            let output = pipeline.run(&rows, &request)?;
            let json = if pretty {
                serde_json::to_string_pretty(&output)?
            } else {
                serde_json::to_string(&output)?
            };
            println!("{json}");
        }
        Commands::Table {
            level,
            quarters,
            pretty,
        } => {
            let mut pipeline = TimeSeriesPipeline::new(&tree, config)?;
            let quarters = quarters.map_or_else(
                || pipeline.config().quarters.clone(),
                |quarters| parse_quarters(&quarters),
            );

            let table = pipeline.stratified_table(&rows, level, &quarters)?;
            let json = if pretty {
                serde_json::to_string_pretty(&table)?
            } else {
                serde_json::to_string(&table)?
            };
            println!("{json}");
        }
        Commands::Levels => {
            let index = AreaHierarchyIndex::build(&tree, rows.iter().map(|row| row.area_level));

            println!("{:<8} AREAS", "LEVEL");
            println!("{}", "-".repeat(20));
            for (level, count) in index.level_counts() {
                println!("{level:<8} {count}");
            }

            match index.max_observed_level() {
                Some(level) => println!("\nFinest observed level: {level}"),
                None => println!("\nNo observations."),
            }
        }
        Commands::Missing { level, quarters } => {
            let mut pipeline = TimeSeriesPipeline::new(&tree, config)?;

            let mut request = pipeline.default_request(level);
            if let Some(quarters) = quarters {
                request.selected_quarters = parse_quarters(&quarters);
            }

            let output = pipeline.run(&rows, &request)?;
            if output.missing.is_empty() {
                println!("No missing areas at level {level}.");
                return Ok(());
            }

            for area_id in &output.missing {
                println!("{area_id}");
            }
            println!("\n{} area(s) missing at level {level}", output.missing.len());
        }
    }

    Ok(())
}
