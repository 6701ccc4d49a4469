//! Dataset access - column descriptors, feature iteration and attribute writes
//!
//! The core only talks to datasets through the [`Dataset`] trait. Two implementations
//! ship with the crate: [`MemoryDataset`] for hosts and tests, and [`CsvDataset`] which
//! the CLI uses for delimited files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::roles::{ColumnDescriptor, ColumnType};

/// Identifier of a feature (row) within a dataset
pub type FeatureId = u64;

/// A single attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Number(f64),
    Text(String),
}

impl AttributeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Parse a raw cell: empty -> Null, finite number -> Number, anything else -> Text
    pub fn from_cell(cell: &str) -> Self {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return AttributeValue::Null;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => AttributeValue::Number(n),
            _ => AttributeValue::Text(cell.to_string()),
        }
    }

    /// Render as a raw cell (Null -> empty string)
    pub fn to_cell(&self) -> String {
        match self {
            AttributeValue::Null => String::new(),
            AttributeValue::Number(n) => n.to_string(),
            AttributeValue::Text(t) => t.clone(),
        }
    }
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::Null => write!(f, "NULL"),
            other => write!(f, "{}", other.to_cell()),
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

/// Failures reported by a dataset
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("column '{column}' not found")]
    ColumnNotFound { column: String },

    #[error("column '{column}' already exists")]
    ColumnExists { column: String },

    #[error("feature {feature_id} not found")]
    FeatureNotFound { feature_id: FeatureId },

    #[error("dataset is read-only; cannot write '{column}' of feature {feature_id}")]
    ReadOnly {
        feature_id: FeatureId,
        column: String,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("{path} has no header row")]
    MissingHeader { path: PathBuf },
}

/// Tabular feature collection the core reads from and writes to
pub trait Dataset {
    /// Identity used as the key for stored role mappings
    fn id(&self) -> &str;

    fn columns(&self) -> &[ColumnDescriptor];

    /// Feature ids in iteration order
    fn feature_ids(&self) -> Vec<FeatureId>;

    fn value(&self, feature_id: FeatureId, column: &str) -> Result<AttributeValue, DatasetError>;

    fn write_value(
        &mut self,
        feature_id: FeatureId,
        column: &str,
        value: AttributeValue,
    ) -> Result<(), DatasetError>;

    fn add_column(&mut self, column: ColumnDescriptor) -> Result<(), DatasetError>;

    /// Append a feature; unspecified columns are null
    fn append_feature(
        &mut self,
        values: Vec<(String, AttributeValue)>,
    ) -> Result<FeatureId, DatasetError>;

    fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns().iter().find(|c| c.name == name)
    }

    fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

/// In-memory dataset
#[derive(Debug, Clone)]
pub struct MemoryDataset {
    id: String,
    columns: Vec<ColumnDescriptor>,
    rows: Vec<(FeatureId, Vec<AttributeValue>)>,
    next_id: FeatureId,
    read_only: bool,
}

impl MemoryDataset {
    pub fn new(id: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            id: id.into(),
            columns,
            rows: Vec::new(),
            next_id: 1,
            read_only: false,
        }
    }

    /// Builder-style row append; values are in column order
    pub fn with_row(mut self, values: Vec<AttributeValue>) -> Self {
        self.push_row(values);
        self
    }

    /// Append a row in column order, padding or truncating to the column count
    pub fn push_row(&mut self, mut values: Vec<AttributeValue>) -> FeatureId {
        values.resize(self.columns.len(), AttributeValue::Null);
        let id = self.next_id;
        self.next_id += 1;
        self.rows.push((id, values));
        id
    }

    /// Reject all writes, like a delimited-text layer that cannot be edited
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_index(&self, column: &str) -> Result<usize, DatasetError> {
        self.columns
            .iter()
            .position(|c| c.name == column)
            .ok_or_else(|| DatasetError::ColumnNotFound {
                column: column.to_string(),
            })
    }

    fn row(&self, feature_id: FeatureId) -> Result<&Vec<AttributeValue>, DatasetError> {
        self.rows
            .iter()
            .find(|(id, _)| *id == feature_id)
            .map(|(_, values)| values)
            .ok_or(DatasetError::FeatureNotFound { feature_id })
    }

    fn row_mut(&mut self, feature_id: FeatureId) -> Result<&mut Vec<AttributeValue>, DatasetError> {
        self.rows
            .iter_mut()
            .find(|(id, _)| *id == feature_id)
            .map(|(_, values)| values)
            .ok_or(DatasetError::FeatureNotFound { feature_id })
    }
}

impl Dataset for MemoryDataset {
    fn id(&self) -> &str {
        &self.id
    }

    fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    fn feature_ids(&self) -> Vec<FeatureId> {
        self.rows.iter().map(|(id, _)| *id).collect()
    }

    fn value(&self, feature_id: FeatureId, column: &str) -> Result<AttributeValue, DatasetError> {
        let idx = self.column_index(column)?;
        Ok(self.row(feature_id)?[idx].clone())
    }

    fn write_value(
        &mut self,
        feature_id: FeatureId,
        column: &str,
        value: AttributeValue,
    ) -> Result<(), DatasetError> {
        if self.read_only {
            return Err(DatasetError::ReadOnly {
                feature_id,
                column: column.to_string(),
            });
        }
        let idx = self.column_index(column)?;
        self.row_mut(feature_id)?[idx] = value;
        Ok(())
    }

    fn add_column(&mut self, column: ColumnDescriptor) -> Result<(), DatasetError> {
        if self.has_column(&column.name) {
            return Err(DatasetError::ColumnExists {
                column: column.name,
            });
        }
        self.columns.push(column);
        for (_, values) in &mut self.rows {
            values.push(AttributeValue::Null);
        }
        Ok(())
    }

    fn append_feature(
        &mut self,
        values: Vec<(String, AttributeValue)>,
    ) -> Result<FeatureId, DatasetError> {
        let mut row = vec![AttributeValue::Null; self.columns.len()];
        for (column, value) in values {
            let idx = self.column_index(&column)?;
            row[idx] = value;
        }
        Ok(self.push_row(row))
    }
}

/// A CSV file loaded into memory
///
/// Feature ids are 1-based row numbers. Column types are inferred: a column is numeric
/// when it is entirely empty or when most of its non-empty cells parse as numbers, so a
/// few bad entries in a measurement column do not turn it into text.
///
/// Cells keep their original text until they are written, so saving never reformats
/// values the caller did not touch (`01`, `10.50` and `1e3` survive as-is).
#[derive(Debug, Clone)]
pub struct CsvDataset {
    path: PathBuf,
    inner: MemoryDataset,
    /// Original cell text per row; `None` once a cell has been written
    raw: Vec<Vec<Option<String>>>,
}

impl CsvDataset {
    pub fn open(path: &Path) -> Result<Self, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|source| DatasetError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|source| DatasetError::Read {
                path: path.to_path_buf(),
                source,
            })?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(DatasetError::MissingHeader {
                path: path.to_path_buf(),
            });
        }

        let mut raw_rows: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|source| DatasetError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            raw_rows.push(record.iter().map(|s| s.to_string()).collect());
        }

        let columns = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let cells = raw_rows.iter().filter_map(|r| r.get(idx)).map(|s| s.as_str());
                ColumnDescriptor::new(name.clone(), infer_column_type(cells))
            })
            .collect();

        let mut inner = MemoryDataset::new(dataset_id_for(path), columns);
        let mut raw = Vec::with_capacity(raw_rows.len());
        for cells in raw_rows {
            inner.push_row(cells.iter().map(|cell| AttributeValue::from_cell(cell)).collect());
            let mut kept: Vec<Option<String>> = cells.into_iter().map(Some).collect();
            kept.resize(headers.len(), None);
            raw.push(kept);
        }

        log::debug!("Loaded {} rows from {}", inner.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            inner,
            raw,
        })
    }

    /// Write a header-only file
    pub fn create(path: &Path, columns: &[ColumnDescriptor]) -> Result<Self, DatasetError> {
        let mut dataset = Self {
            path: path.to_path_buf(),
            inner: MemoryDataset::new(dataset_id_for(path), columns.to_vec()),
            raw: Vec::new(),
        };
        dataset.save()?;
        // Canonical only once the file exists; must match what `open` produces
        dataset.inner.id = dataset_id_for(path);
        Ok(dataset)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Write all rows back to the file (via a temporary file and rename)
    pub fn save(&self) -> Result<(), DatasetError> {
        let write_err = |message: String| DatasetError::Write {
            path: self.path.clone(),
            message,
        };

        let tmp_path = self.path.with_extension("csv.tmp");
        {
            let mut writer =
                csv::Writer::from_path(&tmp_path).map_err(|e| write_err(e.to_string()))?;
            writer
                .write_record(self.inner.columns.iter().map(|c| c.name.as_str()))
                .map_err(|e| write_err(e.to_string()))?;
            for (row, (_, values)) in self.inner.rows.iter().enumerate() {
                let cells = values.iter().enumerate().map(|(col, value)| {
                    match self.raw.get(row).and_then(|r| r.get(col)) {
                        Some(Some(original)) => original.clone(),
                        _ => value.to_cell(),
                    }
                });
                writer
                    .write_record(cells)
                    .map_err(|e| write_err(e.to_string()))?;
            }
            writer.flush().map_err(|e| write_err(e.to_string()))?;
        }
        std::fs::rename(&tmp_path, &self.path).map_err(|e| write_err(e.to_string()))?;

        log::debug!("Saved {} rows to {}", self.inner.len(), self.path.display());
        Ok(())
    }
}

impl Dataset for CsvDataset {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn columns(&self) -> &[ColumnDescriptor] {
        self.inner.columns()
    }

    fn feature_ids(&self) -> Vec<FeatureId> {
        self.inner.feature_ids()
    }

    fn value(&self, feature_id: FeatureId, column: &str) -> Result<AttributeValue, DatasetError> {
        self.inner.value(feature_id, column)
    }

    fn write_value(
        &mut self,
        feature_id: FeatureId,
        column: &str,
        value: AttributeValue,
    ) -> Result<(), DatasetError> {
        self.inner.write_value(feature_id, column, value)?;
        let col = self.inner.column_index(column)?;
        if let Some(cell) = (feature_id as usize)
            .checked_sub(1)
            .and_then(|row| self.raw.get_mut(row))
            .and_then(|r| r.get_mut(col))
        {
            *cell = None;
        }
        Ok(())
    }

    fn add_column(&mut self, column: ColumnDescriptor) -> Result<(), DatasetError> {
        self.inner.add_column(column)?;
        for row in &mut self.raw {
            row.push(None);
        }
        Ok(())
    }

    fn append_feature(
        &mut self,
        values: Vec<(String, AttributeValue)>,
    ) -> Result<FeatureId, DatasetError> {
        let id = self.inner.append_feature(values)?;
        self.raw.push(vec![None; self.inner.columns.len()]);
        Ok(id)
    }
}

/// Stable dataset identity for a file: its canonical path when it exists
pub fn dataset_id_for(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

fn infer_column_type<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut non_empty = 0usize;
    let mut numeric = 0usize;
    for cell in cells {
        match AttributeValue::from_cell(cell) {
            AttributeValue::Null => {}
            AttributeValue::Number(_) => {
                non_empty += 1;
                numeric += 1;
            }
            AttributeValue::Text(_) => non_empty += 1,
        }
    }
    if non_empty == 0 || numeric * 2 > non_empty {
        ColumnType::Numeric
    } else {
        ColumnType::Text
    }
}
