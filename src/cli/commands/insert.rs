//! `dst insert` command - record a single measurement
//!
//! Values come from flags; with `--interactive` anything missing is prompted for.
//! An out-of-range reading is refused unless the range warning is acknowledged,
//! either up front with `--continue-on-range-warning` / config, or at the prompt.

use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use miette::{bail, miette, IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::helpers::{is_interactive, load_registry, open_dataset, precision, stored_resolver};
use crate::cli::output::{format_value, print_record};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::azimuth::{AzimuthMode, Precision};
use crate::core::config::Config;
use crate::core::dataset::FeatureId;
use crate::core::geo_types::GeologicalTypeRegistry;
use crate::core::measurement::{Measurement, MeasurementError, MeasurementInput};

#[derive(clap::Args, Debug)]
pub struct InsertArgs {
    /// CSV dataset with a saved field mapping
    pub file: PathBuf,

    /// Measured azimuth in degrees
    #[arg(long, short = 'a', allow_negative_numbers = true)]
    pub azimuth: Option<f64>,

    /// What the azimuth represents (strike, dip-direction)
    #[arg(long, short = 'm', default_value = "strike")]
    pub mode: AzimuthMode,

    /// Dip angle in degrees (0-90)
    #[arg(long, allow_negative_numbers = true)]
    pub dip: Option<f64>,

    /// Signed true-north correction in degrees
    #[arg(long, short = 'c', allow_negative_numbers = true)]
    pub correction: Option<f64>,

    /// Geological type code or description
    #[arg(long, short = 't')]
    pub geo_type: Option<String>,

    #[arg(long)]
    pub age: Option<String>,

    #[arg(long)]
    pub lithology: Option<String>,

    #[arg(long, short = 'n')]
    pub notes: Option<String>,

    /// Update this feature instead of appending a new one
    #[arg(long, short = 'u', value_name = "FEATURE_ID")]
    pub update: Option<FeatureId>,

    /// Decimal places (0-10, default from config)
    #[arg(long, short = 'd')]
    pub decimals: Option<u32>,

    /// Store readings outside their usual range
    #[arg(long)]
    pub continue_on_range_warning: bool,

    /// Prompt for missing values
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

/// Run the insert command
pub fn run(args: InsertArgs, global: &GlobalOpts, config: &Config) -> Result<()> {
    let mut dataset = open_dataset(&args.file)?;
    let resolver = stored_resolver(config, &dataset)?;
    let (_, registry) = load_registry(config)?;
    let precision = precision(args.decimals, config)?;
    let interactive = args.interactive && is_interactive();

    let input = gather_input(&args, &registry, interactive)?;
    let continue_flag = args.continue_on_range_warning || config.continue_on_range_warning;
    let measurement = build_measurement(&input, precision, continue_flag, interactive)?;

    for warning in &measurement.warnings {
        eprintln!("{} {}", style("Warning:").yellow().bold(), warning);
    }

    let mapping = resolver.mapping();
    let storage_mode = config.geo_type_storage_mode;
    let feature_id = match args.update {
        Some(id) => {
            measurement.update(&mut dataset, id, mapping, &registry, storage_mode)?;
            id
        }
        None => measurement.insert(&mut dataset, mapping, &registry, storage_mode)?,
    };
    dataset.save().map_err(|e| miette!("{}", e))?;

    match global.format {
        OutputFormat::Json | OutputFormat::Yaml => print_record(global.format, &measurement),
        _ => {
            let places = precision.places();
            println!(
                "{} {} feature {} in {}",
                style("✓").green(),
                if args.update.is_some() { "Updated" } else { "Created" },
                style(feature_id).cyan(),
                style(args.file.display()).yellow()
            );
            if !global.quiet {
                println!(
                    "   Strike: {}°  Dip azimuth: {}°  Dip: {}°",
                    format_value(measurement.strike_azimuth, places),
                    format_value(measurement.dip_azimuth, places),
                    format_value(measurement.dip_value, places)
                );
            }
            Ok(())
        }
    }
}

fn gather_input(
    args: &InsertArgs,
    registry: &GeologicalTypeRegistry,
    interactive: bool,
) -> Result<MeasurementInput> {
    let theme = ColorfulTheme::default();

    let azimuth = match (args.azimuth, interactive) {
        (Some(a), _) => a,
        (None, true) => Input::<f64>::with_theme(&theme)
            .with_prompt(format!("Azimuth ({})", args.mode))
            .interact_text()
            .into_diagnostic()?,
        (None, false) => bail!("--azimuth is required (or use --interactive)"),
    };
    let dip = match (args.dip, interactive) {
        (Some(d), _) => d,
        (None, true) => Input::<f64>::with_theme(&theme)
            .with_prompt("Dip value")
            .interact_text()
            .into_diagnostic()?,
        (None, false) => bail!("--dip is required (or use --interactive)"),
    };

    let geo_type = match (&args.geo_type, interactive) {
        (Some(t), _) => Some(t.clone()),
        (None, true) => {
            let mut items: Vec<String> = vec!["(none)".to_string()];
            items.extend(
                registry
                    .list()
                    .iter()
                    .map(|e| format!("{} - {}", e.code, e.description)),
            );
            let selection = Select::with_theme(&theme)
                .with_prompt("Geological type")
                .items(&items)
                .default(0)
                .interact()
                .into_diagnostic()?;
            selection
                .checked_sub(1)
                .and_then(|i| registry.list().get(i))
                .map(|e| e.code.clone())
        }
        (None, false) => None,
    };

    let text = |value: &Option<String>, prompt: &str| -> Result<Option<String>> {
        match (value, interactive) {
            (Some(v), _) => Ok(Some(v.clone())),
            (None, true) => Input::<String>::with_theme(&theme)
                .with_prompt(prompt)
                .allow_empty(true)
                .interact_text()
                .map(Some)
                .into_diagnostic(),
            (None, false) => Ok(None),
        }
    };

    Ok(MeasurementInput {
        azimuth,
        mode: args.mode,
        dip,
        correction: args.correction,
        geo_type,
        age: text(&args.age, "Age")?,
        lithology: text(&args.lithology, "Lithology")?,
        notes: text(&args.notes, "Notes")?,
    })
}

/// Build, letting an interactive user acknowledge a range warning
fn build_measurement(
    input: &MeasurementInput,
    precision: Precision,
    continue_flag: bool,
    interactive: bool,
) -> Result<Measurement> {
    match Measurement::build(input, precision, continue_flag) {
        Ok(m) => Ok(m),
        Err(MeasurementError::OutOfRange(e)) if interactive => {
            let proceed = Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt(format!("{}. Store it anyway?", e))
                .default(false)
                .interact()
                .into_diagnostic()?;
            if !proceed {
                bail!("Measurement not stored");
            }
            Ok(Measurement::build(input, precision, true)?)
        }
        Err(e) => Err(e.into()),
    }
}
