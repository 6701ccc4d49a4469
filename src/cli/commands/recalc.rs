//! `dst recalc` command - batch strike/dip recalculation over a CSV dataset

use clap::ArgGroup;
use console::style;
use miette::{bail, miette, Result};
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::helpers::{open_dataset, precision, stored_resolver, truncate_str};
use crate::cli::output::{format_value, print_list, print_record};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::azimuth::CalculationDirection;
use crate::core::batch::{BatchConfig, BatchRecalculator, BatchSummary, OutputTarget};
use crate::core::config::Config;
use crate::core::roles::Role;

#[derive(clap::Args, Debug)]
#[command(group(ArgGroup::new("target").args(["output", "create_column"])))]
pub struct RecalcArgs {
    /// CSV dataset with a saved field mapping
    pub file: PathBuf,

    /// Conversion to apply (strike-to-dip, dip-to-strike)
    #[arg(long, short = 'D')]
    pub direction: CalculationDirection,

    /// Role to read from (default: strike azimuth for strike-to-dip, dip azimuth otherwise)
    #[arg(long)]
    pub input_role: Option<Role>,

    /// Existing column to write to (default: the column mapped to the other azimuth)
    #[arg(long, short = 'o')]
    pub output: Option<String>,

    /// Create a new numeric column and write to it
    #[arg(long)]
    pub create_column: Option<String>,

    /// Decimal places (0-10, default from config)
    #[arg(long, short = 'd')]
    pub decimals: Option<u32>,

    /// Compute azimuths outside 0-360 instead of reporting them as errors
    #[arg(long)]
    pub continue_on_range_warning: bool,

    /// Compute and report without writing the file
    #[arg(long)]
    pub dry_run: bool,

    /// List every feature, not only problems
    #[arg(long)]
    pub all: bool,
}

const FEATURE_HEADERS: [&str; 4] = ["feature", "status", "value", "reason"];

const REASON_WIDTH: usize = 60;

#[derive(Serialize)]
struct FeatureRow {
    feature_id: u64,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

#[derive(Serialize)]
struct Report {
    file: String,
    direction: String,
    input_column: String,
    output_column: String,
    processed: usize,
    skipped: usize,
    errored: usize,
    range_warnings: usize,
    errored_ids: Vec<u64>,
    cancelled: bool,
    dry_run: bool,
    features: Vec<FeatureRow>,
}

/// Run the recalc command
pub fn run(args: RecalcArgs, global: &GlobalOpts, config: &Config) -> Result<()> {
    let mut dataset = open_dataset(&args.file)?;
    let mut resolver = stored_resolver(config, &dataset)?;
    resolver.validate()?;
    let mapping = resolver.mapping().clone();

    let output = match (&args.output, &args.create_column) {
        (_, Some(name)) => OutputTarget::Create(name.clone()),
        (Some(column), None) => OutputTarget::Existing(column.clone()),
        (None, None) => {
            let role = args.direction.default_output_role();
            let Some(column) = mapping.get(role) else {
                bail!("{} is not mapped; pass --output or --create-column", role);
            };
            OutputTarget::Existing(column.to_string())
        }
    };

    let mut batch_config = BatchConfig::new(args.direction, output)
        .with_precision(precision(args.decimals, config)?)
        .continue_on_range_warning(
            args.continue_on_range_warning || config.continue_on_range_warning,
        )
        .dry_run(args.dry_run);
    if let Some(role) = args.input_role {
        batch_config.input_role = role;
    }

    let input_column = mapping
        .get(batch_config.input_role)
        .unwrap_or_default()
        .to_string();
    let output_column = batch_config.output.column().to_string();
    let places = batch_config.precision.places();

    let recalculator = BatchRecalculator::new(&mapping, batch_config);
    let summary = recalculator.run(&mut dataset)?;

    if !args.dry_run {
        dataset.save().map_err(|e| miette!("{}", e))?;
    }

    let report = Report {
        file: args.file.display().to_string(),
        direction: args.direction.to_string(),
        input_column,
        output_column,
        processed: summary.processed,
        skipped: summary.skipped,
        errored: summary.errored,
        range_warnings: summary.range_warnings(),
        errored_ids: summary.errored_ids.clone(),
        cancelled: summary.cancelled,
        dry_run: args.dry_run,
        features: feature_rows(&summary, args.all),
    };

    match global.format {
        OutputFormat::Auto => print_human(&report, places, global),
        OutputFormat::Json | OutputFormat::Yaml => print_record(global.format, &report),
        format => print_list(
            format,
            &FEATURE_HEADERS,
            &table_rows(&report.features, places),
            &report.features,
        ),
    }
}

fn feature_rows(summary: &BatchSummary, all: bool) -> Vec<FeatureRow> {
    summary
        .outcomes
        .iter()
        .filter(|o| all || o.outcome.reason().is_some())
        .map(|o| FeatureRow {
            feature_id: o.feature_id,
            status: o.outcome.status(),
            value: o.outcome.value(),
            reason: o.outcome.reason(),
        })
        .collect()
}

fn table_rows(features: &[FeatureRow], places: u32) -> Vec<Vec<String>> {
    features
        .iter()
        .map(|f| {
            vec![
                f.feature_id.to_string(),
                f.status.to_string(),
                f.value.map(|v| format_value(v, places)).unwrap_or_default(),
                f.reason.clone().unwrap_or_default(),
            ]
        })
        .collect()
}

fn print_human(report: &Report, places: u32, global: &GlobalOpts) -> Result<()> {
    println!(
        "{} {} '{}' -> '{}'{}",
        style("Recalculated").bold(),
        report.direction,
        report.input_column,
        report.output_column,
        if report.dry_run { " (dry run)" } else { "" }
    );
    println!(
        "  {} processed, {} skipped, {} errored",
        style(report.processed).green(),
        style(report.skipped).yellow(),
        style(report.errored).red()
    );
    if report.range_warnings > 0 {
        println!(
            "  {} computed despite out-of-range input",
            style(report.range_warnings).yellow()
        );
    }

    if !report.features.is_empty() && !global.quiet {
        let mut rows = table_rows(&report.features, places);
        for row in &mut rows {
            row[3] = truncate_str(&row[3], REASON_WIDTH);
        }
        println!();
        print_list(OutputFormat::Tsv, &FEATURE_HEADERS, &rows, &report.features)?;
    }
    Ok(())
}
