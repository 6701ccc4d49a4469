//! `dst calc` command - azimuth arithmetic from the shell

use clap::Subcommand;
use console::style;
use miette::{miette, Result};
use serde::Serialize;

use crate::cli::helpers::precision;
use crate::cli::output::{effective_format, format_value, print_record};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::azimuth::{
    apply_correction, check_finite, dip_to_strike, normalize, strike_and_dip, strike_to_dip,
    validate_azimuth_range, AzimuthMode, Precision,
};
use crate::core::config::Config;

#[derive(Subcommand, Debug)]
pub enum CalcCommands {
    /// Map any angle into [0, 360)
    Normalize(AngleArgs),

    /// Dip azimuth from a strike azimuth (strike + 90)
    StrikeToDip(AngleArgs),

    /// Strike azimuth from a dip azimuth (dip - 90)
    DipToStrike(AngleArgs),

    /// Apply a true-north correction to an azimuth
    Correct(CorrectArgs),

    /// Strike and dip azimuth from one measured azimuth
    Pair(PairArgs),
}

#[derive(clap::Args, Debug)]
pub struct AngleArgs {
    /// Angle in degrees
    #[arg(allow_negative_numbers = true)]
    pub angle: f64,

    /// Decimal places (0-10, default from config)
    #[arg(long, short = 'd')]
    pub decimals: Option<u32>,
}

#[derive(clap::Args, Debug)]
pub struct CorrectArgs {
    /// Raw azimuth in degrees
    #[arg(allow_negative_numbers = true)]
    pub azimuth: f64,

    /// Signed correction in degrees
    #[arg(allow_negative_numbers = true)]
    pub correction: f64,

    /// Decimal places (0-10, default from config)
    #[arg(long, short = 'd')]
    pub decimals: Option<u32>,
}

#[derive(clap::Args, Debug)]
pub struct PairArgs {
    /// Measured azimuth in degrees
    #[arg(allow_negative_numbers = true)]
    pub azimuth: f64,

    /// What the azimuth represents (strike, dip-direction)
    #[arg(long, short = 'm', default_value = "strike")]
    pub mode: AzimuthMode,

    /// Signed true-north correction in degrees
    #[arg(long, short = 'c', allow_negative_numbers = true)]
    pub correction: Option<f64>,

    /// Decimal places (0-10, default from config)
    #[arg(long, short = 'd')]
    pub decimals: Option<u32>,
}

#[derive(Serialize)]
struct CalcResult {
    operation: &'static str,
    input: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    correction: Option<f64>,
    result: f64,
    range_warning: bool,
}

#[derive(Serialize)]
struct PairResult {
    input: f64,
    mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    correction: Option<f64>,
    strike_azimuth: f64,
    dip_azimuth: f64,
    range_warning: bool,
}

/// Run the calc command
pub fn run(cmd: CalcCommands, global: &GlobalOpts, config: &Config) -> Result<()> {
    match cmd {
        CalcCommands::Normalize(args) => run_single("normalize", args, normalize, global, config),
        CalcCommands::StrikeToDip(args) => {
            run_single("strike-to-dip", args, strike_to_dip, global, config)
        }
        CalcCommands::DipToStrike(args) => {
            run_single("dip-to-strike", args, dip_to_strike, global, config)
        }
        CalcCommands::Correct(args) => run_correct(args, global, config),
        CalcCommands::Pair(args) => run_pair(args, global, config),
    }
}

fn run_single(
    operation: &'static str,
    args: AngleArgs,
    op: fn(f64) -> f64,
    global: &GlobalOpts,
    config: &Config,
) -> Result<()> {
    let precision = precision(args.decimals, config)?;
    finite(args.angle)?;
    // normalize exists to fold such values, so only the conversions warn
    let range_warning = operation != "normalize" && !validate_azimuth_range(args.angle);
    let result = CalcResult {
        operation,
        input: args.angle,
        correction: None,
        result: precision.round_azimuth(op(args.angle)),
        range_warning,
    };
    emit(global, precision, &result)
}

fn run_correct(args: CorrectArgs, global: &GlobalOpts, config: &Config) -> Result<()> {
    let precision = precision(args.decimals, config)?;
    finite(args.azimuth)?;
    finite(args.correction)?;
    let result = CalcResult {
        operation: "correct",
        input: args.azimuth,
        correction: Some(args.correction),
        result: precision.round_azimuth(apply_correction(args.azimuth, args.correction)),
        range_warning: !validate_azimuth_range(args.azimuth),
    };
    emit(global, precision, &result)
}

fn run_pair(args: PairArgs, global: &GlobalOpts, config: &Config) -> Result<()> {
    let precision = precision(args.decimals, config)?;
    finite(args.azimuth)?;
    if let Some(correction) = args.correction {
        finite(correction)?;
    }
    let (strike, dip) = strike_and_dip(args.azimuth, args.mode, args.correction);
    let result = PairResult {
        input: args.azimuth,
        mode: args.mode.to_string(),
        correction: args.correction,
        strike_azimuth: precision.round_azimuth(strike),
        dip_azimuth: precision.round_azimuth(dip),
        range_warning: !validate_azimuth_range(args.azimuth),
    };

    if result.range_warning {
        warn_range(args.azimuth);
    }
    match global.format {
        OutputFormat::Auto | OutputFormat::Tsv => {
            println!(
                "{}\t{}",
                format_value(result.strike_azimuth, precision.places()),
                format_value(result.dip_azimuth, precision.places())
            );
        }
        OutputFormat::Csv => {
            println!("strike_azimuth,dip_azimuth");
            println!(
                "{},{}",
                format_value(result.strike_azimuth, precision.places()),
                format_value(result.dip_azimuth, precision.places())
            );
        }
        format => print_record(format, &result)?,
    }
    Ok(())
}

fn emit(global: &GlobalOpts, precision: Precision, result: &CalcResult) -> Result<()> {
    if result.range_warning {
        warn_range(result.input);
    }
    match effective_format(global.format, true) {
        OutputFormat::Tsv | OutputFormat::Csv | OutputFormat::Md => {
            println!("{}", format_value(result.result, precision.places()));
        }
        format => print_record(format, result)?,
    }
    Ok(())
}

fn finite(value: f64) -> Result<f64> {
    check_finite(value).map_err(|e| miette!("{}", e))
}

fn warn_range(value: f64) {
    eprintln!(
        "{} input {} is outside 0-360; this usually indicates a data error",
        style("Warning:").yellow().bold(),
        value
    );
}
