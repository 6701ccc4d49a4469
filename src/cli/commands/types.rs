//! `dst types` command - manage the geological type list
//!
//! Every change is written straight back to the type store.

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{confirm, load_registry, save_registry};
use crate::cli::output::print_list;
use crate::cli::GlobalOpts;
use crate::core::config::Config;
use crate::core::geo_types::{GeologicalTypeRegistry, RegistryError};

#[derive(Subcommand, Debug)]
pub enum TypesCommands {
    /// List geological types in their current order
    List(ListArgs),

    /// Add a geological type
    Add(AddArgs),

    /// Change the code and/or description of a geological type
    Edit(EditArgs),

    /// Remove a geological type
    Remove(RemoveArgs),

    /// Restore the five default types, discarding all changes
    Reset(ResetArgs),

    /// Reorder by code
    Sort,

    /// Replace the list from a compact "code:description,..." string
    Import(ImportArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Print the compact "code:description,..." form
    #[arg(long)]
    pub legacy: bool,
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Short code (e.g. 6)
    pub code: String,

    /// Description (e.g. Vein)
    pub description: String,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Code of the entry to edit
    pub code: String,

    /// New code
    #[arg(long)]
    pub new_code: Option<String>,

    /// New description
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Code of the entry to remove
    pub code: String,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct ResetArgs {
    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Types as "1:Strata,2:Foliation"
    pub value: String,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Run the types command
pub fn run(cmd: TypesCommands, global: &GlobalOpts, config: &Config) -> Result<()> {
    let (mut store, mut registry) = load_registry(config)?;

    match cmd {
        TypesCommands::List(args) => {
            if args.legacy {
                println!("{}", registry.to_legacy());
                return Ok(());
            }
            return list(&registry, global);
        }
        TypesCommands::Add(args) => {
            registry.add(&args.code, &args.description)?;
            save_registry(&mut store, &registry)?;
            println!(
                "{} Added geological type {} ({})",
                style("✓").green(),
                style(args.code.trim()).cyan(),
                args.description.trim()
            );
        }
        TypesCommands::Edit(args) => {
            if args.new_code.is_none() && args.description.is_none() {
                miette::bail!("Nothing to change. Pass --new-code and/or --description");
            }
            registry.edit(
                &args.code,
                args.new_code.as_deref(),
                args.description.as_deref(),
            )?;
            save_registry(&mut store, &registry)?;
            println!(
                "{} Updated geological type {}",
                style("✓").green(),
                style(&args.code).cyan()
            );
        }
        TypesCommands::Remove(args) => {
            let entry = registry
                .get(&args.code)
                .cloned()
                .ok_or_else(|| RegistryError::NotFound {
                    code: args.code.clone(),
                })?;
            println!(
                "{} Features that already store code '{}' ({}) are not updated and will keep the old value.",
                style("Caution:").yellow().bold(),
                entry.code,
                entry.description
            );
            let prompt = format!("Remove geological type {} ({})?", entry.code, entry.description);
            if !confirm(&prompt, args.yes)? {
                println!("Aborted.");
                return Ok(());
            }
            registry.remove(&args.code)?;
            save_registry(&mut store, &registry)?;
            println!(
                "{} Removed geological type {}",
                style("✓").green(),
                style(&entry.code).cyan()
            );
        }
        TypesCommands::Reset(args) => {
            println!(
                "{} This discards every custom geological type and cannot be undone.",
                style("Caution:").yellow().bold()
            );
            if !confirm("Reset geological types to the defaults?", args.yes)? {
                println!("Aborted.");
                return Ok(());
            }
            registry.reset_to_defaults();
            save_registry(&mut store, &registry)?;
            println!(
                "{} Restored {} default geological types",
                style("✓").green(),
                registry.len()
            );
        }
        TypesCommands::Sort => {
            registry.sort_by_code();
            save_registry(&mut store, &registry)?;
            if !global.quiet {
                println!("{} Sorted geological types by code", style("✓").green());
            }
        }
        TypesCommands::Import(args) => {
            let imported = GeologicalTypeRegistry::parse_legacy(&args.value)?;
            let prompt = format!(
                "Replace {} geological types with {} imported ones?",
                registry.len(),
                imported.len()
            );
            if !confirm(&prompt, args.yes)? {
                println!("Aborted.");
                return Ok(());
            }
            save_registry(&mut store, &imported)?;
            println!(
                "{} Imported {} geological types",
                style("✓").green(),
                imported.len()
            );
        }
    }

    Ok(())
}

fn list(registry: &GeologicalTypeRegistry, global: &GlobalOpts) -> Result<()> {
    let rows: Vec<Vec<String>> = registry
        .list()
        .iter()
        .map(|e| vec![e.code.clone(), e.description.clone()])
        .collect();
    print_list(global.format, &["code", "description"], &rows, registry.list())
}
