//! Command-line argument model

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::calc::CalcCommands;
use crate::cli::commands::completions::CompletionsArgs;
use crate::cli::commands::config::ConfigCommands;
use crate::cli::commands::fields::FieldsCommands;
use crate::cli::commands::insert::InsertArgs;
use crate::cli::commands::layer::LayerCommands;
use crate::cli::commands::recalc::RecalcArgs;
use crate::cli::commands::types::TypesCommands;

#[derive(Parser, Debug)]
#[command(
    name = "dst",
    version,
    about = "Dip/strike toolkit - azimuth conversion, field mapping and batch recalculation for geological measurements",
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options accepted by every subcommand
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, value_enum, default_value_t = OutputFormat::Auto)]
    pub format: OutputFormat,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "DST_CONFIG")]
    pub config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only print results, no hints
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table for lists, YAML for single records
    #[default]
    Auto,
    Tsv,
    Json,
    Yaml,
    Csv,
    /// Markdown table
    Md,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Azimuth arithmetic: normalize, convert and correct bearings
    #[command(subcommand)]
    Calc(CalcCommands),

    /// Manage the geological type list
    #[command(subcommand)]
    Types(TypesCommands),

    /// Detect, configure and show the field mapping of a dataset
    #[command(subcommand)]
    Fields(FieldsCommands),

    /// Recalculate strike or dip azimuths for every feature of a dataset
    Recalc(RecalcArgs),

    /// Record one measurement as a new or existing feature
    Insert(InsertArgs),

    /// Create datasets with the standard measurement columns
    #[command(subcommand)]
    Layer(LayerCommands),

    /// Show or initialise the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}
