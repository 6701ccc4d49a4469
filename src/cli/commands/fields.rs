//! `dst fields` command - field-role mapping of a dataset
//!
//! `detect` only proposes; `configure` is the one place a mapping gets validated and
//! saved. Saved mappings are keyed by the dataset's canonical path.

use clap::Subcommand;
use console::style;
use miette::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::helpers::{mapping_store, open_dataset, parse_assignment, stored_resolver};
use crate::cli::output::print_list;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::Config;
use crate::core::dataset::Dataset;
use crate::core::resolver::{score_columns, FieldRoleResolver, ValidationError};
use crate::core::roles::{Role, RoleMapping};

#[derive(Subcommand, Debug)]
pub enum FieldsCommands {
    /// Propose a mapping from the dataset's column names and types (nothing is saved)
    Detect(DetectArgs),

    /// Build, validate and save the mapping for a dataset
    Configure(ConfigureArgs),

    /// Show the saved mapping for a dataset
    Show(ShowArgs),
}

#[derive(clap::Args, Debug)]
pub struct DetectArgs {
    /// CSV dataset
    pub file: PathBuf,

    /// Show the candidate scores behind each decision
    #[arg(long)]
    pub explain: bool,
}

#[derive(clap::Args, Debug)]
pub struct ConfigureArgs {
    /// CSV dataset
    pub file: PathBuf,

    /// Assign a column to a role (repeatable), e.g. --set strike=Bearing
    #[arg(long = "set", value_name = "ROLE=COLUMN", value_parser = parse_assignment)]
    pub assignments: Vec<(Role, String)>,

    /// Leave a role unmapped (repeatable)
    #[arg(long = "unset", value_name = "ROLE")]
    pub unset: Vec<Role>,

    /// Ignore any saved mapping and start from auto-detection
    #[arg(long)]
    pub redetect: bool,

    /// Validate and print the result without saving
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// CSV dataset
    pub file: PathBuf,
}

#[derive(Serialize)]
struct MappingRow<'a> {
    role: &'a str,
    label: &'a str,
    required: bool,
    column: Option<&'a str>,
}

#[derive(Serialize)]
struct ScoreRow {
    role: String,
    column: String,
    name_score: f64,
    type_factor: f64,
    total: f64,
    candidate: bool,
}

/// Run the fields command
pub fn run(cmd: FieldsCommands, global: &GlobalOpts, config: &Config) -> Result<()> {
    match cmd {
        FieldsCommands::Detect(args) => run_detect(args, global),
        FieldsCommands::Configure(args) => run_configure(args, global, config),
        FieldsCommands::Show(args) => run_show(args, global, config),
    }
}

fn run_detect(args: DetectArgs, global: &GlobalOpts) -> Result<()> {
    let dataset = open_dataset(&args.file)?;
    let mut resolver = FieldRoleResolver::new(dataset.id(), dataset.columns().to_vec());
    resolver.auto_detect();

    if args.explain {
        return print_scores(&resolver, global);
    }

    print_mapping(resolver.mapping(), global)?;
    if !global.quiet && matches!(global.format, OutputFormat::Auto) {
        println!();
        match resolver.validate() {
            Ok(()) => println!(
                "{} Proposal is complete. Save it with: {}",
                style("✓").green(),
                style(format!("dst fields configure {}", args.file.display())).yellow()
            ),
            Err(e) => print_validation_items(&e),
        }
    }
    Ok(())
}

fn run_configure(args: ConfigureArgs, global: &GlobalOpts, config: &Config) -> Result<()> {
    let dataset = open_dataset(&args.file)?;
    let mut store = mapping_store(config);
    let mut resolver = FieldRoleResolver::new(dataset.id(), dataset.columns().to_vec());

    let loaded = !args.redetect && resolver.load(&store)?;
    if loaded {
        log::info!("Starting from saved mapping for {}", dataset.id());
    } else {
        resolver.auto_detect();
    }

    for (role, column) in &args.assignments {
        resolver.set_role(*role, Some(column))?;
    }
    for role in &args.unset {
        resolver.set_role(*role, None)?;
    }

    if let Err(e) = resolver.validate() {
        if !global.quiet {
            print_mapping(resolver.mapping(), global)?;
            eprintln!();
        }
        print_validation_items(&e);
        return Err(e.into());
    }

    if args.dry_run {
        print_mapping(resolver.mapping(), global)?;
        if !global.quiet {
            println!("\nMapping is valid. No changes made (dry run).");
        }
        return Ok(());
    }

    resolver.save(&mut store)?;
    print_mapping(resolver.mapping(), global)?;
    if !global.quiet {
        println!(
            "\n{} Saved field mapping for {}",
            style("✓").green(),
            style(args.file.display()).cyan()
        );
    }
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts, config: &Config) -> Result<()> {
    let dataset = open_dataset(&args.file)?;
    let store = mapping_store(config);
    let record = store
        .load_record(dataset.id())
        .map_err(|e| miette::miette!("{}", e))?;
    // Goes through the resolver so stale columns are reported, not shown
    let resolver = stored_resolver(config, &dataset)?;

    print_mapping(resolver.mapping(), global)?;
    if global.quiet || !matches!(global.format, OutputFormat::Auto) {
        return Ok(());
    }
    if let Some(record) = record {
        println!(
            "\nConfigured {}",
            record.configured_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    Ok(())
}

fn print_mapping(mapping: &RoleMapping, global: &GlobalOpts) -> Result<()> {
    let records: Vec<MappingRow> = Role::ALL
        .iter()
        .map(|role| MappingRow {
            role: role.key(),
            label: role.label(),
            required: role.is_required(),
            column: mapping.get(*role),
        })
        .collect();
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            vec![
                r.label.to_string(),
                r.column.unwrap_or("-").to_string(),
                if r.required { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    print_list(global.format, &["role", "column", "required"], &rows, &records)
}

fn print_scores(resolver: &FieldRoleResolver, global: &GlobalOpts) -> Result<()> {
    let mut records = Vec::new();
    for role in Role::ALL {
        for score in score_columns(role, resolver.columns()) {
            if score.name_score == 0.0 {
                continue;
            }
            records.push(ScoreRow {
                role: role.label().to_string(),
                column: score.column.clone(),
                name_score: score.name_score,
                type_factor: score.type_factor,
                total: score.total(),
                candidate: score.is_candidate(),
            });
        }
    }
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            vec![
                r.role.clone(),
                r.column.clone(),
                format!("{:.2}", r.name_score),
                format!("{:.1}", r.type_factor),
                format!("{:.3}", r.total),
                if r.candidate { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    print_list(
        global.format,
        &["role", "column", "name", "type", "score", "candidate"],
        &rows,
        &records,
    )?;

    if !global.quiet && matches!(global.format, OutputFormat::Auto) {
        let mapped: Vec<String> = resolver
            .mapping()
            .iter()
            .map(|(role, column)| format!("{} -> {}", role.key(), column))
            .collect();
        println!("\nProposed: {}", mapped.join(", "));
    }
    Ok(())
}

fn print_validation_items(error: &ValidationError) {
    match error {
        ValidationError::DuplicateMapping { duplicates } => {
            eprintln!("{} Duplicate field mappings:", style("✗").red());
            for dup in duplicates {
                eprintln!("  • {}", dup);
            }
        }
        ValidationError::MissingRequiredField { roles } => {
            eprintln!("{} Missing required fields:", style("✗").red());
            for role in roles {
                eprintln!("  • {}", role.label());
            }
        }
    }
}
