//! User configuration
//!
//! Loaded from `config.yaml` in the platform config directory (or the path given by
//! `DST_CONFIG`), then overridden key by key from `DST_<KEY>` environment variables.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::azimuth::Precision;
use crate::core::geo_types::StorageMode;
use crate::yaml::{parse_yaml_file, write_yaml_file, YamlError};

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "DST_";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "DST_CONFIG";

const CONFIG_FILE: &str = "config.yaml";
const MAPPING_STORE_FILE: &str = "mappings.yaml";
const TYPE_STORE_FILE: &str = "geological_types.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rounding used when a command does not pass `--decimals`
    pub decimal_places: Precision,

    /// Compute out-of-range azimuths instead of rejecting them
    pub continue_on_range_warning: bool,

    /// Store geological type as code or description
    pub geo_type_storage_mode: StorageMode,

    /// Enable debug logging
    pub debug_mode: bool,

    /// Role mapping store location (defaults to the data directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping_store: Option<PathBuf>,

    /// Geological type store location (defaults to the data directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_store: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            decimal_places: Precision::default(),
            continue_on_range_warning: false,
            geo_type_storage_mode: StorageMode::Code,
            debug_mode: false,
            mapping_store: None,
            type_store: None,
        }
    }
}

impl Config {
    /// Load `explicit` (or the default file) and apply environment overrides.
    ///
    /// A missing or invalid file yields defaults. Loading runs before logging is set up,
    /// so problems are returned as warnings for the caller to report.
    pub fn load_with(explicit: Option<&Path>) -> (Self, Vec<String>) {
        let mut warnings = Vec::new();
        let path = explicit.map(Path::to_path_buf).or_else(Self::config_path);
        let mut config = match path.as_deref() {
            Some(p) if p.exists() => match Self::load_from(p) {
                Ok(c) => c,
                Err(e) => {
                    warnings.push(format!("Ignoring invalid config {}: {}", p.display(), e));
                    Self::default()
                }
            },
            _ => Self::default(),
        };
        warnings.extend(config.apply_env(|key| std::env::var(key).ok()));
        (config, warnings)
    }

    pub fn load_from(path: &Path) -> Result<Self, YamlError> {
        parse_yaml_file(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), YamlError> {
        write_yaml_file(path, self)
    }

    /// Config file path: `DST_CONFIG` if set, else the platform config dir
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(p) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(p));
        }
        project_dirs().map(|d| d.config_dir().join(CONFIG_FILE))
    }

    pub fn mapping_store_path(&self) -> PathBuf {
        self.mapping_store
            .clone()
            .unwrap_or_else(|| data_dir().join(MAPPING_STORE_FILE))
    }

    pub fn type_store_path(&self) -> PathBuf {
        self.type_store
            .clone()
            .unwrap_or_else(|| data_dir().join(TYPE_STORE_FILE))
    }

    /// Apply `DST_<KEY>` overrides; unparsable values are skipped and reported.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Vec<String> {
        let mut warnings = Vec::new();
        let var = |key: &str| {
            let name = format!("{}{}", ENV_PREFIX, key.to_uppercase());
            lookup(&name).map(|v| (name, v))
        };

        if let Some((name, v)) = var("decimal_places") {
            match v.trim().parse::<u32>().ok().and_then(|p| Precision::new(p).ok()) {
                Some(p) => self.decimal_places = p,
                None => warnings.push(format!("Ignoring {}={}: expected 0..=10", name, v)),
            }
        }
        if let Some((name, v)) = var("continue_on_range_warning") {
            match parse_bool(&v) {
                Some(b) => self.continue_on_range_warning = b,
                None => warnings.push(format!("Ignoring {}={}: expected a boolean", name, v)),
            }
        }
        if let Some((name, v)) = var("geo_type_storage_mode") {
            match v.parse::<StorageMode>() {
                Ok(m) => self.geo_type_storage_mode = m,
                Err(e) => warnings.push(format!("Ignoring {}: {}", name, e)),
            }
        }
        if let Some((name, v)) = var("debug_mode") {
            match parse_bool(&v) {
                Some(b) => self.debug_mode = b,
                None => warnings.push(format!("Ignoring {}={}: expected a boolean", name, v)),
            }
        }
        if let Some((_, v)) = var("mapping_store") {
            self.mapping_store = Some(PathBuf::from(v));
        }
        if let Some((_, v)) = var("type_store") {
            self.type_store = Some(PathBuf::from(v));
        }
        warnings
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "dst")
}

fn data_dir() -> PathBuf {
    project_dirs()
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".dst"))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
