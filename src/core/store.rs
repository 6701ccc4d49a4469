//! Persistence for role mappings and the geological type list
//!
//! Both stores are traits so a host can back them with its own storage (layer
//! properties, settings). The crate ships YAML-file stores used by the CLI and
//! in-memory stores used by tests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::geo_types::GeoTypeEntry;
use crate::core::roles::RoleMapping;
use crate::yaml::{parse_yaml_file, write_yaml_file, YamlError};

/// Marker stored with every saved mapping
pub const LAYER_ROLE: &str = "dip_strike_feature_layer";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access store {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: YamlError,
    },

    #[error("store rejected the write: {message}")]
    Rejected { message: String },
}

/// Persistence collaborator for role mappings, keyed by dataset identity
pub trait MappingStore {
    fn save(&mut self, dataset_id: &str, mapping: &RoleMapping) -> Result<(), StoreError>;

    fn load(&self, dataset_id: &str) -> Result<Option<RoleMapping>, StoreError>;
}

/// Persistence collaborator for the geological type list
pub trait TypeStore {
    fn save_types(&mut self, entries: &[GeoTypeEntry]) -> Result<(), StoreError>;

    fn load_types(&self) -> Result<Option<Vec<GeoTypeEntry>>, StoreError>;
}

/// A mapping as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMapping {
    pub layer_role: String,
    pub configured_at: DateTime<Utc>,
    pub fields: RoleMapping,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct MappingDocument {
    #[serde(default)]
    datasets: BTreeMap<String, StoredMapping>,
}

/// All mappings in one YAML file
#[derive(Debug, Clone)]
pub struct FileMappingStore {
    path: PathBuf,
}

impl FileMappingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full stored record (with metadata) for a dataset
    pub fn load_record(&self, dataset_id: &str) -> Result<Option<StoredMapping>, StoreError> {
        Ok(self.read()?.datasets.remove(dataset_id))
    }

    fn read(&self) -> Result<MappingDocument, StoreError> {
        if !self.path.exists() {
            return Ok(MappingDocument::default());
        }
        parse_yaml_file(&self.path).map_err(|source| StoreError::Yaml {
            path: self.path.clone(),
            source,
        })
    }
}

impl MappingStore for FileMappingStore {
    fn save(&mut self, dataset_id: &str, mapping: &RoleMapping) -> Result<(), StoreError> {
        let mut doc = self.read()?;
        doc.datasets.insert(
            dataset_id.to_string(),
            StoredMapping {
                layer_role: LAYER_ROLE.to_string(),
                configured_at: Utc::now(),
                fields: mapping.clone(),
            },
        );
        write_yaml_file(&self.path, &doc).map_err(|source| StoreError::Yaml {
            path: self.path.clone(),
            source,
        })?;
        log::info!("Saved field mapping for {} to {}", dataset_id, self.path.display());
        Ok(())
    }

    fn load(&self, dataset_id: &str) -> Result<Option<RoleMapping>, StoreError> {
        Ok(self.load_record(dataset_id)?.map(|record| record.fields))
    }
}

/// Mappings held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryMappingStore {
    mappings: HashMap<String, RoleMapping>,
    fail_writes: bool,
}

impl MemoryMappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `save` fail, to exercise collaborator failures
    pub fn failing() -> Self {
        Self {
            mappings: HashMap::new(),
            fail_writes: true,
        }
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl MappingStore for MemoryMappingStore {
    fn save(&mut self, dataset_id: &str, mapping: &RoleMapping) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Rejected {
                message: format!("memory store is read-only ({})", dataset_id),
            });
        }
        self.mappings.insert(dataset_id.to_string(), mapping.clone());
        Ok(())
    }

    fn load(&self, dataset_id: &str) -> Result<Option<RoleMapping>, StoreError> {
        Ok(self.mappings.get(dataset_id).cloned())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TypeDocument {
    geological_types: Vec<GeoTypeEntry>,
}

/// Geological types in a YAML file
#[derive(Debug, Clone)]
pub struct FileTypeStore {
    path: PathBuf,
}

impl FileTypeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TypeStore for FileTypeStore {
    fn save_types(&mut self, entries: &[GeoTypeEntry]) -> Result<(), StoreError> {
        let doc = TypeDocument {
            geological_types: entries.to_vec(),
        };
        write_yaml_file(&self.path, &doc).map_err(|source| StoreError::Yaml {
            path: self.path.clone(),
            source,
        })?;
        log::info!(
            "Saved {} geological types to {}",
            entries.len(),
            self.path.display()
        );
        Ok(())
    }

    fn load_types(&self) -> Result<Option<Vec<GeoTypeEntry>>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let doc: TypeDocument = parse_yaml_file(&self.path).map_err(|source| StoreError::Yaml {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(doc.geological_types))
    }
}
