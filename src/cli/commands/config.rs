//! `dst config` command - inspect and initialise user configuration

use clap::Subcommand;
use console::style;
use miette::{bail, miette, Result};
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::output::print_record;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration (file plus environment overrides)
    Show,

    /// Print where the config file and stores live
    Path,

    /// Write a config file with the default values
    Init(InitArgs),
}

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Serialize)]
struct Paths {
    config: Option<PathBuf>,
    config_exists: bool,
    mapping_store: PathBuf,
    type_store: PathBuf,
}

/// Run the config command
pub fn run(cmd: ConfigCommands, global: &GlobalOpts, config: &Config) -> Result<()> {
    match cmd {
        ConfigCommands::Show => {
            let format = match global.format {
                OutputFormat::Json => OutputFormat::Json,
                _ => OutputFormat::Yaml,
            };
            print_record(format, config)
        }
        ConfigCommands::Path => {
            let path = config_file(global);
            let paths = Paths {
                config_exists: path.as_ref().is_some_and(|p| p.exists()),
                config: path,
                mapping_store: config.mapping_store_path(),
                type_store: config.type_store_path(),
            };
            match global.format {
                OutputFormat::Json | OutputFormat::Yaml => print_record(global.format, &paths),
                _ => {
                    let config_line = match &paths.config {
                        Some(p) if paths.config_exists => p.display().to_string(),
                        Some(p) => format!("{} {}", p.display(), style("(not created)").dim()),
                        None => style("(no config directory)").dim().to_string(),
                    };
                    println!("config         {}", config_line);
                    println!("mapping store  {}", paths.mapping_store.display());
                    println!("type store     {}", paths.type_store.display());
                    Ok(())
                }
            }
        }
        ConfigCommands::Init(args) => {
            let Some(path) = config_file(global) else {
                bail!("Could not determine a config directory. Pass --config <PATH>.");
            };
            if path.exists() && !args.force {
                bail!(
                    "{} already exists. Use --force to overwrite.",
                    path.display()
                );
            }
            Config::default()
                .save_to(&path)
                .map_err(|e| miette!("{}", e))?;
            println!(
                "{} Wrote default configuration to {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
            Ok(())
        }
    }
}

fn config_file(global: &GlobalOpts) -> Option<PathBuf> {
    global.config.clone().or_else(Config::config_path)
}
