//! `dst layer` command - standard measurement layers

use clap::Subcommand;
use console::style;
use miette::{bail, miette, Result};
use std::path::PathBuf;

use crate::cli::helpers::mapping_store;
use crate::cli::output::print_list;
use crate::cli::GlobalOpts;
use crate::core::config::Config;
use crate::core::dataset::{CsvDataset, Dataset};
use crate::core::layer_schema::{standard_columns, standard_fields, standard_mapping, LayerFormat};
use crate::core::resolver::FieldRoleResolver;

#[derive(Subcommand, Debug)]
pub enum LayerCommands {
    /// Create an empty CSV layer with the standard columns and save its field mapping
    New(NewArgs),

    /// Show the standard column layout
    Schema(SchemaArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Path of the CSV file to create
    pub path: PathBuf,

    /// Column naming (standard, shapefile)
    #[arg(long, default_value = "standard")]
    pub naming: LayerFormat,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(clap::Args, Debug)]
pub struct SchemaArgs {
    /// Column naming (standard, shapefile)
    #[arg(long, default_value = "standard")]
    pub naming: LayerFormat,
}

/// Run the layer command
pub fn run(cmd: LayerCommands, global: &GlobalOpts, config: &Config) -> Result<()> {
    match cmd {
        LayerCommands::New(args) => run_new(args, global, config),
        LayerCommands::Schema(args) => run_schema(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts, config: &Config) -> Result<()> {
    if args.path.exists() && !args.force {
        bail!(
            "{} already exists. Use --force to overwrite.",
            args.path.display()
        );
    }

    let dataset =
        CsvDataset::create(&args.path, &standard_columns(args.naming)).map_err(|e| miette!("{}", e))?;

    // Same path as `fields configure`, so the saved record is indistinguishable
    let mut resolver = FieldRoleResolver::new(dataset.id(), dataset.columns().to_vec());
    for (role, column) in standard_mapping(args.naming).iter() {
        resolver.set_role(role, Some(column))?;
    }
    resolver.validate()?;
    resolver.save(&mut mapping_store(config))?;

    if !global.quiet {
        println!(
            "{} Created {} layer {}",
            style("✓").green(),
            args.naming,
            style(args.path.display()).cyan()
        );
        println!(
            "   Record measurements with: {}",
            style(format!("dst insert {} --azimuth <AZ> --dip <DIP>", args.path.display())).yellow()
        );
    }
    Ok(())
}

fn run_schema(args: SchemaArgs, global: &GlobalOpts) -> Result<()> {
    let fields = standard_fields(args.naming);
    let rows: Vec<Vec<String>> = fields
        .iter()
        .map(|f| {
            vec![
                f.name.to_string(),
                f.role.label().to_string(),
                f.column_type.to_string(),
                f.length.to_string(),
                f.precision.map(|p| p.to_string()).unwrap_or_default(),
            ]
        })
        .collect();
    print_list(
        global.format,
        &["name", "role", "type", "length", "precision"],
        &rows,
        &fields,
    )
}
