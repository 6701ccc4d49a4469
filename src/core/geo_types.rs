//! Geological type registry - ordered code -> description list with defaults
//!
//! The registry is an explicit value: constructing one seeds the five default types,
//! so tests and hosts can hold isolated registries without shared state.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

/// Default entries, in their seeded order
pub const DEFAULT_GEOLOGICAL_TYPES: [(&str, &str); 5] = [
    ("1", "Strata"),
    ("2", "Foliation"),
    ("3", "Fault"),
    ("4", "Joint"),
    ("5", "Cleavage"),
];

/// One geological type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoTypeEntry {
    pub code: String,
    pub description: String,
}

impl GeoTypeEntry {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
        }
    }
}

/// Errors from registry edits
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum RegistryError {
    #[error("geological type code '{code}' already exists")]
    #[diagnostic(
        code(dst::types::duplicate_code),
        help("choose a different code or edit the existing entry")
    )]
    DuplicateCode { code: String },

    #[error("geological type code '{code}' not found")]
    #[diagnostic(code(dst::types::not_found), help("run `dst types list` to see known codes"))]
    NotFound { code: String },

    #[error("invalid geological type code '{code}': {reason}")]
    #[diagnostic(code(dst::types::invalid_code))]
    InvalidCode { code: String, reason: String },
}

/// What gets written for the geological type role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    #[default]
    Code,
    Description,
}

impl StorageMode {
    pub fn value_for<'a>(&self, entry: &'a GeoTypeEntry) -> &'a str {
        match self {
            StorageMode::Code => &entry.code,
            StorageMode::Description => &entry.description,
        }
    }
}

impl std::fmt::Display for StorageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageMode::Code => write!(f, "code"),
            StorageMode::Description => write!(f, "description"),
        }
    }
}

impl std::str::FromStr for StorageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "code" => Ok(StorageMode::Code),
            "description" => Ok(StorageMode::Description),
            _ => Err(format!("Invalid storage mode: {}. Use code or description", s)),
        }
    }
}

/// Ordered, code-unique list of geological types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeologicalTypeRegistry {
    entries: Vec<GeoTypeEntry>,
}

impl GeologicalTypeRegistry {
    /// A registry holding the default entries
    pub fn new() -> Self {
        Self {
            entries: default_entries(),
        }
    }

    /// Build from stored entries, rejecting invalid or duplicate codes
    pub fn from_entries(entries: Vec<GeoTypeEntry>) -> Result<Self, RegistryError> {
        let mut registry = Self {
            entries: Vec::with_capacity(entries.len()),
        };
        for entry in entries {
            registry.add(&entry.code, &entry.description)?;
        }
        Ok(registry)
    }

    /// Parse the compact `code:description,code:description` form
    ///
    /// Items without a `:` are ignored.
    pub fn parse_legacy(value: &str) -> Result<Self, RegistryError> {
        let entries = value
            .split(',')
            .filter_map(|item| item.split_once(':'))
            .map(|(code, desc)| GeoTypeEntry::new(code.trim(), desc.trim()))
            .collect();
        Self::from_entries(entries)
    }

    /// Render the compact `code:description,...` form
    pub fn to_legacy(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{}:{}", e.code, e.description))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn list(&self) -> &[GeoTypeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, code: &str) -> Option<&GeoTypeEntry> {
        self.entries.iter().find(|e| e.code == code)
    }

    /// Find an entry by code, or failing that by case-insensitive description
    pub fn lookup(&self, code_or_description: &str) -> Option<&GeoTypeEntry> {
        self.get(code_or_description).or_else(|| {
            self.entries
                .iter()
                .find(|e| e.description.eq_ignore_ascii_case(code_or_description))
        })
    }

    pub fn add(&mut self, code: &str, description: &str) -> Result<(), RegistryError> {
        let code = validate_code(code)?;
        if self.get(&code).is_some() {
            return Err(RegistryError::DuplicateCode { code });
        }
        self.entries.push(GeoTypeEntry::new(code, description.trim()));
        Ok(())
    }

    /// Change an entry's code and/or description in place (order is kept)
    pub fn edit(
        &mut self,
        code: &str,
        new_code: Option<&str>,
        new_description: Option<&str>,
    ) -> Result<(), RegistryError> {
        let idx = self.position(code)?;

        let new_code = new_code.map(validate_code).transpose()?;
        if let Some(new_code) = &new_code {
            let collides = self
                .entries
                .iter()
                .enumerate()
                .any(|(i, e)| i != idx && &e.code == new_code);
            if collides {
                return Err(RegistryError::DuplicateCode {
                    code: new_code.clone(),
                });
            }
        }

        let entry = &mut self.entries[idx];
        if let Some(new_code) = new_code {
            entry.code = new_code;
        }
        if let Some(desc) = new_description {
            entry.description = desc.trim().to_string();
        }
        Ok(())
    }

    /// Remove an entry; stored feature data that uses the code is left untouched
    pub fn remove(&mut self, code: &str) -> Result<GeoTypeEntry, RegistryError> {
        let idx = self.position(code)?;
        Ok(self.entries.remove(idx))
    }

    /// Discard every entry and reinstate the defaults
    pub fn reset_to_defaults(&mut self) {
        self.entries = default_entries();
    }

    /// Reorder by ascending code: integer codes first, numerically, then the rest lexicographically
    pub fn sort_by_code(&mut self) {
        self.entries.sort_by(|a, b| compare_codes(&a.code, &b.code));
    }

    fn position(&self, code: &str) -> Result<usize, RegistryError> {
        self.entries
            .iter()
            .position(|e| e.code == code)
            .ok_or_else(|| RegistryError::NotFound {
                code: code.to_string(),
            })
    }
}

impl Default for GeologicalTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn default_entries() -> Vec<GeoTypeEntry> {
    DEFAULT_GEOLOGICAL_TYPES
        .iter()
        .map(|(code, desc)| GeoTypeEntry::new(*code, *desc))
        .collect()
}

fn validate_code(code: &str) -> Result<String, RegistryError> {
    let trimmed = code.trim();
    let invalid = |reason: &str| RegistryError::InvalidCode {
        code: code.to_string(),
        reason: reason.to_string(),
    };
    if trimmed.is_empty() {
        return Err(invalid("code must not be empty"));
    }
    if trimmed.contains([',', ':']) {
        return Err(invalid("code must not contain ',' or ':'"));
    }
    Ok(trimmed.to_string())
}

fn compare_codes(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(registry: &GeologicalTypeRegistry) -> Vec<&str> {
        registry.list().iter().map(|e| e.code.as_str()).collect()
    }

    #[test]
    fn test_seeded_defaults() {
        let registry = GeologicalTypeRegistry::new();
        assert_eq!(codes(&registry), vec!["1", "2", "3", "4", "5"]);
        assert_eq!(registry.get("3").unwrap().description, "Fault");
    }

    #[test]
    fn test_add_duplicate_code_fails() {
        let mut registry = GeologicalTypeRegistry::new();
        registry.reset_to_defaults();
        registry.add("6", "Vein").unwrap();
        let err = registry.add("6", "Other").unwrap_err();
        assert_eq!(err, RegistryError::DuplicateCode { code: "6".into() });
    }

    #[test]
    fn test_add_on_empty_registry() {
        let mut registry = GeologicalTypeRegistry::from_entries(Vec::new()).unwrap();
        registry.add("1", "Strata").unwrap();
        assert!(matches!(
            registry.add("1", "Other"),
            Err(RegistryError::DuplicateCode { .. })
        ));
    }

    #[test]
    fn test_edit() {
        let mut registry = GeologicalTypeRegistry::new();
        registry.edit("4", None, Some("Joint set")).unwrap();
        assert_eq!(registry.get("4").unwrap().description, "Joint set");

        registry.edit("4", Some("J"), None).unwrap();
        assert!(registry.get("4").is_none());
        assert_eq!(codes(&registry)[3], "J");

        assert!(matches!(
            registry.edit("1", Some("2"), None),
            Err(RegistryError::DuplicateCode { .. })
        ));
        // renaming to its own code is not a collision
        registry.edit("1", Some("1"), Some("Bedding")).unwrap();
        assert!(matches!(
            registry.edit("missing", None, Some("x")),
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_remove() {
        let mut registry = GeologicalTypeRegistry::new();
        let removed = registry.remove("2").unwrap();
        assert_eq!(removed.description, "Foliation");
        assert_eq!(codes(&registry), vec!["1", "3", "4", "5"]);
        assert!(matches!(
            registry.remove("2"),
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_reset_restores_defaults_in_order() {
        let mut registry = GeologicalTypeRegistry::new();
        registry.remove("1").unwrap();
        registry.add("9", "Vein").unwrap();
        registry.edit("3", Some("30"), Some("Thrust")).unwrap();
        registry.sort_by_code();

        registry.reset_to_defaults();
        assert_eq!(registry, GeologicalTypeRegistry::new());
    }

    #[test]
    fn test_sort_by_code_numeric_aware() {
        let mut registry = GeologicalTypeRegistry::new();
        registry.add("10", "Vein").unwrap();
        registry.add("A", "Axial plane").unwrap();
        registry.edit("1", Some("7"), None).unwrap();
        registry.sort_by_code();
        assert_eq!(codes(&registry), vec!["2", "3", "4", "5", "7", "10", "A"]);
    }

    #[test]
    fn test_invalid_codes() {
        let mut registry = GeologicalTypeRegistry::new();
        assert!(matches!(
            registry.add("  ", "Blank"),
            Err(RegistryError::InvalidCode { .. })
        ));
        assert!(matches!(
            registry.add("a:b", "Colon"),
            Err(RegistryError::InvalidCode { .. })
        ));
    }

    #[test]
    fn test_legacy_format() {
        let registry = GeologicalTypeRegistry::new();
        let legacy = registry.to_legacy();
        assert_eq!(legacy, "1:Strata,2:Foliation,3:Fault,4:Joint,5:Cleavage");

        let parsed = GeologicalTypeRegistry::parse_legacy("7: Vein , 8:Dyke,junk").unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.get("7").unwrap().description, "Vein");
        assert!(GeologicalTypeRegistry::parse_legacy("1:a,1:b").is_err());
    }

    #[test]
    fn test_storage_mode_and_lookup() {
        let registry = GeologicalTypeRegistry::new();
        let fault = registry.lookup("fault").unwrap();
        assert_eq!(StorageMode::Code.value_for(fault), "3");
        assert_eq!(StorageMode::Description.value_for(fault), "Fault");
        assert_eq!("Description".parse::<StorageMode>().unwrap(), StorageMode::Description);
    }
}
