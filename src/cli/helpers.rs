//! Shared helper functions for CLI commands
//!
//! Loading of the stores and datasets every command works against, plus small
//! parsing and formatting utilities.

use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{bail, miette, IntoDiagnostic, Result};
use std::io::{self, IsTerminal};
use std::path::Path;

use crate::core::azimuth::Precision;
use crate::core::config::Config;
use crate::core::dataset::{CsvDataset, Dataset};
use crate::core::geo_types::GeologicalTypeRegistry;
use crate::core::resolver::FieldRoleResolver;
use crate::core::roles::Role;
use crate::core::store::{FileMappingStore, FileTypeStore, TypeStore};

/// Truncate a string to max_len, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Parse a `role=column` override
pub fn parse_assignment(value: &str) -> Result<(Role, String), String> {
    let (role, column) = value
        .split_once('=')
        .ok_or_else(|| format!("Invalid assignment: {}. Use role=column", value))?;
    let role: Role = role.parse()?;
    let column = column.trim();
    if column.is_empty() {
        return Err(format!("Invalid assignment: {}. Column name is empty", value));
    }
    Ok((role, column.to_string()))
}

/// Precision from `--decimals`, falling back to the configured default
pub fn precision(decimals: Option<u32>, config: &Config) -> Result<Precision> {
    match decimals {
        Some(places) => Precision::new(places).map_err(|e| miette!("{}", e)),
        None => Ok(config.decimal_places),
    }
}

pub fn open_dataset(path: &Path) -> Result<CsvDataset> {
    if !path.exists() {
        bail!("Dataset not found: {}", path.display());
    }
    CsvDataset::open(path).map_err(|e| miette!("{}", e))
}

pub fn mapping_store(config: &Config) -> FileMappingStore {
    FileMappingStore::new(config.mapping_store_path())
}

/// Type store and the registry it holds (defaults when nothing is stored yet)
pub fn load_registry(config: &Config) -> Result<(FileTypeStore, GeologicalTypeRegistry)> {
    let store = FileTypeStore::new(config.type_store_path());
    let registry = match store.load_types().map_err(|e| miette!("{}", e))? {
        Some(entries) => GeologicalTypeRegistry::from_entries(entries)?,
        None => GeologicalTypeRegistry::new(),
    };
    Ok((store, registry))
}

pub fn save_registry(store: &mut FileTypeStore, registry: &GeologicalTypeRegistry) -> Result<()> {
    store
        .save_types(registry.list())
        .map_err(|e| miette!("{}", e))
}

/// Resolver session with the stored mapping adopted.
///
/// Fails when nothing is stored for the dataset.
pub fn stored_resolver(config: &Config, dataset: &CsvDataset) -> Result<FieldRoleResolver> {
    let store = mapping_store(config);
    let mut resolver = FieldRoleResolver::new(dataset.id(), dataset.columns().to_vec());
    if !resolver.load(&store)? {
        bail!(
            "No field mapping stored for {}.\nRun '{}' first.",
            dataset.path().display(),
            style(format!("dst fields configure {}", dataset.path().display())).yellow()
        );
    }
    Ok(resolver)
}

/// Ask for confirmation; `--yes` skips the prompt.
///
/// Without a terminal there is nobody to ask, so the answer is no.
pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        eprintln!(
            "{} {} (pass --yes to confirm non-interactively)",
            style("!").yellow(),
            prompt
        );
        return Ok(false);
    }
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .into_diagnostic()
}

pub fn is_interactive() -> bool {
    io::stdin().is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("düsseldorf schist", 6), "düs...");
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(escape_csv("with\nnewline"), "\"with\nnewline\"");
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("strike=Bearing").unwrap(),
            (Role::StrikeAzimuth, "Bearing".to_string())
        );
        assert_eq!(
            parse_assignment("dip_value= dip angle ").unwrap(),
            (Role::DipValue, "dip angle".to_string())
        );
        assert!(parse_assignment("strike").is_err());
        assert!(parse_assignment("strike=").is_err());
        assert!(parse_assignment("colour=x").is_err());
    }
}
