//! Core module - azimuth math, field roles and the operations built on them

pub mod azimuth;
pub mod batch;
pub mod config;
pub mod dataset;
pub mod geo_types;
pub mod layer_schema;
pub mod measurement;
pub mod resolver;
pub mod roles;
pub mod store;

pub use azimuth::{
    apply_correction, dip_to_strike, normalize, strike_and_dip, strike_to_dip, AzimuthMode,
    CalculationDirection, CalculationInputError, Precision,
};
pub use batch::{BatchConfig, BatchRecalculator, BatchSummary, Outcome, OutputTarget};
pub use config::Config;
pub use dataset::{AttributeValue, CsvDataset, Dataset, DatasetError, FeatureId, MemoryDataset};
pub use geo_types::{GeoTypeEntry, GeologicalTypeRegistry, RegistryError, StorageMode};
pub use measurement::{Measurement, MeasurementInput};
pub use resolver::{FieldRoleResolver, ResolverState, ValidationError};
pub use roles::{ColumnDescriptor, ColumnType, Role, RoleMapping};
pub use store::{MappingStore, StoreError, TypeStore};
