//! Single-measurement entry: one azimuth and a dip turned into the field values
//! an external writer stores

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::core::azimuth::{
    check_azimuth_range, check_dip_range, check_finite, strike_and_dip, AzimuthMode, CalculationInputError,
    Precision,
};
use crate::core::dataset::{AttributeValue, Dataset, DatasetError, FeatureId};
use crate::core::geo_types::{GeologicalTypeRegistry, RegistryError, StorageMode};
use crate::core::resolver::{validate_mapping, ValidationError};
use crate::core::roles::{Role, RoleMapping};

/// Raw user input for one measurement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementInput {
    pub azimuth: f64,
    pub mode: AzimuthMode,
    pub dip: f64,
    /// True-north correction from the host, if any
    pub correction: Option<f64>,
    /// Geological type code or description
    pub geo_type: Option<String>,
    pub age: Option<String>,
    pub lithology: Option<String>,
    pub notes: Option<String>,
}

/// An input outside its usual range that the caller chose to keep
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum RangeWarning {
    Azimuth { value: f64 },
    Dip { value: f64 },
}

impl std::fmt::Display for RangeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RangeWarning::Azimuth { value } => {
                write!(f, "azimuth {} is outside 0-360", value)
            }
            RangeWarning::Dip { value } => write!(f, "dip {} is outside 0-90", value),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum MeasurementError {
    #[error("{0}")]
    #[diagnostic(
        code(dst::insert::non_numeric),
        help("azimuth, dip and correction must be finite numbers")
    )]
    NonNumeric(CalculationInputError),

    #[error("{0}")]
    #[diagnostic(
        code(dst::insert::out_of_range),
        help("check the reading, or pass --continue-on-range-warning to store it anyway")
    )]
    OutOfRange(CalculationInputError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Mapping(#[from] ValidationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    GeoType(#[from] RegistryError),

    #[error("failed to write measurement: {0}")]
    #[diagnostic(code(dst::insert::dataset))]
    Dataset(#[from] DatasetError),
}

/// A measurement ready to be written, values already corrected and rounded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub strike_azimuth: f64,
    pub dip_azimuth: f64,
    pub dip_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lithology: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<RangeWarning>,
}

impl Measurement {
    /// Validate ranges, derive both azimuths and round for storage.
    ///
    /// Out-of-range readings fail unless `continue_on_range_warning` is set, in which
    /// case they are kept and listed in `warnings`. NaN and infinities always fail.
    pub fn build(
        input: &MeasurementInput,
        precision: Precision,
        continue_on_range_warning: bool,
    ) -> Result<Self, MeasurementError> {
        for value in [Some(input.azimuth), Some(input.dip), input.correction]
            .into_iter()
            .flatten()
        {
            check_finite(value).map_err(MeasurementError::NonNumeric)?;
        }

        let mut warnings = Vec::new();
        let checks = [
            (
                check_azimuth_range(input.azimuth),
                RangeWarning::Azimuth {
                    value: input.azimuth,
                },
            ),
            (
                check_dip_range(input.dip),
                RangeWarning::Dip { value: input.dip },
            ),
        ];
        for (result, warning) in checks {
            if let Err(e) = result {
                if !continue_on_range_warning {
                    return Err(MeasurementError::OutOfRange(e));
                }
                log::warn!("Storing measurement despite range warning: {}", warning);
                warnings.push(warning);
            }
        }

        let (strike, dip_azimuth) = strike_and_dip(input.azimuth, input.mode, input.correction);
        Ok(Self {
            strike_azimuth: precision.round_azimuth(strike),
            dip_azimuth: precision.round_azimuth(dip_azimuth),
            dip_value: precision.apply(input.dip),
            geo_type: non_empty(&input.geo_type),
            age: non_empty(&input.age),
            lithology: non_empty(&input.lithology),
            notes: non_empty(&input.notes),
            warnings,
        })
    }

    /// Column/value pairs for `mapping`.
    ///
    /// Required roles are always written; optional roles only when mapped and non-empty.
    /// The geological type is resolved through the registry and stored per `storage_mode`.
    pub fn field_values(
        &self,
        mapping: &RoleMapping,
        registry: &GeologicalTypeRegistry,
        storage_mode: StorageMode,
    ) -> Result<Vec<(String, AttributeValue)>, MeasurementError> {
        validate_mapping(mapping)?;

        let mut values = Vec::new();
        for role in Role::ALL {
            let Some(column) = mapping.get(role) else {
                continue;
            };
            let value = match role {
                Role::StrikeAzimuth => AttributeValue::Number(self.strike_azimuth),
                Role::DipAzimuth => AttributeValue::Number(self.dip_azimuth),
                Role::DipValue => AttributeValue::Number(self.dip_value),
                Role::GeologicalType => match &self.geo_type {
                    Some(wanted) => {
                        let entry = registry.lookup(wanted).ok_or_else(|| {
                            RegistryError::NotFound {
                                code: wanted.clone(),
                            }
                        })?;
                        AttributeValue::from(storage_mode.value_for(entry))
                    }
                    None => continue,
                },
                Role::Age => match &self.age {
                    Some(v) => AttributeValue::from(v.as_str()),
                    None => continue,
                },
                Role::Lithology => match &self.lithology {
                    Some(v) => AttributeValue::from(v.as_str()),
                    None => continue,
                },
                Role::Notes => match &self.notes {
                    Some(v) => AttributeValue::from(v.as_str()),
                    None => continue,
                },
            };
            values.push((column.to_string(), value));
        }
        Ok(values)
    }

    /// Append as a new feature
    pub fn insert(
        &self,
        dataset: &mut dyn Dataset,
        mapping: &RoleMapping,
        registry: &GeologicalTypeRegistry,
        storage_mode: StorageMode,
    ) -> Result<FeatureId, MeasurementError> {
        let values = self.field_values(mapping, registry, storage_mode)?;
        let id = dataset.append_feature(values)?;
        log::info!("Created feature {} in {}", id, dataset.id());
        Ok(id)
    }

    /// Overwrite the mapped fields of an existing feature
    pub fn update(
        &self,
        dataset: &mut dyn Dataset,
        feature_id: FeatureId,
        mapping: &RoleMapping,
        registry: &GeologicalTypeRegistry,
        storage_mode: StorageMode,
    ) -> Result<usize, MeasurementError> {
        let values = self.field_values(mapping, registry, storage_mode)?;
        // Fail before any write if the feature is gone
        let first = values
            .first()
            .map(|(c, _)| c.clone())
            .unwrap_or_default();
        dataset.value(feature_id, &first)?;

        let count = values.len();
        for (column, value) in values {
            dataset.write_value(feature_id, &column, value)?;
        }
        log::info!(
            "Updated feature {} with {} field changes",
            feature_id,
            count
        );
        Ok(count)
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dataset::MemoryDataset;
    use crate::core::roles::ColumnDescriptor;
    use approx::assert_abs_diff_eq;

    fn input(azimuth: f64, dip: f64) -> MeasurementInput {
        MeasurementInput {
            azimuth,
            dip,
            ..Default::default()
        }
    }

    fn mapping() -> RoleMapping {
        RoleMapping::new()
            .with(Role::StrikeAzimuth, "str")
            .with(Role::DipAzimuth, "dd")
            .with(Role::DipValue, "dip")
            .with(Role::GeologicalType, "kind")
            .with(Role::Notes, "notes")
    }

    fn dataset() -> MemoryDataset {
        MemoryDataset::new(
            "mem",
            vec![
                ColumnDescriptor::numeric("str"),
                ColumnDescriptor::numeric("dd"),
                ColumnDescriptor::numeric("dip"),
                ColumnDescriptor::text("kind"),
                ColumnDescriptor::text("notes"),
                ColumnDescriptor::text("age"),
            ],
        )
    }

    #[test]
    fn test_build_from_strike() {
        let m = Measurement::build(&input(30.0, 45.0), Precision::default(), false).unwrap();
        assert_abs_diff_eq!(m.strike_azimuth, 30.0);
        assert_abs_diff_eq!(m.dip_azimuth, 120.0);
        assert_abs_diff_eq!(m.dip_value, 45.0);
        assert!(m.warnings.is_empty());
    }

    #[test]
    fn test_build_from_dip_direction_with_correction() {
        let mut i = input(10.0, 20.0);
        i.mode = AzimuthMode::DipDirection;
        i.correction = Some(-15.123);
        let m = Measurement::build(&i, Precision::new(1).unwrap(), false).unwrap();
        // strike 280, dip azimuth 10, both shifted by the correction
        assert_abs_diff_eq!(m.strike_azimuth, 264.9);
        assert_abs_diff_eq!(m.dip_azimuth, 354.9);
    }

    #[test]
    fn test_out_of_range_dip_refused_or_warned() {
        let err = Measurement::build(&input(10.0, 95.0), Precision::default(), false).unwrap_err();
        assert!(matches!(
            err,
            MeasurementError::OutOfRange(CalculationInputError::OutOfRange { .. })
        ));

        let m = Measurement::build(&input(-10.0, 95.0), Precision::default(), true).unwrap();
        assert_eq!(
            m.warnings,
            vec![
                RangeWarning::Azimuth { value: -10.0 },
                RangeWarning::Dip { value: 95.0 }
            ]
        );
        assert_abs_diff_eq!(m.strike_azimuth, 350.0);
        assert_abs_diff_eq!(m.dip_value, 95.0);
    }

    #[test]
    fn test_non_finite_refused_even_when_continuing() {
        for (azimuth, dip) in [(f64::NAN, 10.0), (f64::INFINITY, 10.0), (10.0, f64::NAN)] {
            let err = Measurement::build(&input(azimuth, dip), Precision::default(), true)
                .unwrap_err();
            assert!(matches!(
                err,
                MeasurementError::NonNumeric(CalculationInputError::NonNumeric { .. })
            ));
        }

        let mut i = input(10.0, 10.0);
        i.correction = Some(f64::NEG_INFINITY);
        assert!(matches!(
            Measurement::build(&i, Precision::default(), true),
            Err(MeasurementError::NonNumeric(_))
        ));
    }

    #[test]
    fn test_field_values_skip_unmapped_and_empty() {
        let mut i = input(0.0, 10.0);
        i.geo_type = Some("fault".into());
        i.notes = Some("   ".into());
        i.age = Some("Jurassic".into());
        let m = Measurement::build(&i, Precision::default(), false).unwrap();

        let values = m
            .field_values(&mapping(), &GeologicalTypeRegistry::new(), StorageMode::Code)
            .unwrap();
        assert_eq!(
            values,
            vec![
                ("str".to_string(), AttributeValue::Number(0.0)),
                ("dd".to_string(), AttributeValue::Number(90.0)),
                ("dip".to_string(), AttributeValue::Number(10.0)),
                ("kind".to_string(), AttributeValue::Text("3".into())),
            ]
        );

        let values = m
            .field_values(
                &mapping(),
                &GeologicalTypeRegistry::new(),
                StorageMode::Description,
            )
            .unwrap();
        assert_eq!(values[3].1, AttributeValue::Text("Fault".into()));
    }

    #[test]
    fn test_unknown_geo_type() {
        let mut i = input(0.0, 10.0);
        i.geo_type = Some("42".into());
        let m = Measurement::build(&i, Precision::default(), false).unwrap();
        let err = m
            .field_values(&mapping(), &GeologicalTypeRegistry::new(), StorageMode::Code)
            .unwrap_err();
        assert!(matches!(err, MeasurementError::GeoType(RegistryError::NotFound { .. })));
    }

    #[test]
    fn test_incomplete_mapping_rejected() {
        let m = Measurement::build(&input(0.0, 10.0), Precision::default(), false).unwrap();
        let mapping = RoleMapping::new().with(Role::StrikeAzimuth, "str");
        assert!(matches!(
            m.field_values(&mapping, &GeologicalTypeRegistry::new(), StorageMode::Code),
            Err(MeasurementError::Mapping(_))
        ));
    }

    #[test]
    fn test_insert_then_update() {
        let mut ds = dataset();
        let registry = GeologicalTypeRegistry::new();
        let mut i = input(100.0, 30.0);
        i.notes = Some("first".into());
        let m = Measurement::build(&i, Precision::default(), false).unwrap();

        let id = m.insert(&mut ds, &mapping(), &registry, StorageMode::Code).unwrap();
        assert_eq!(ds.value(id, "dd").unwrap(), AttributeValue::Number(190.0));
        assert_eq!(ds.value(id, "notes").unwrap(), AttributeValue::Text("first".into()));
        assert_eq!(ds.value(id, "age").unwrap(), AttributeValue::Null);

        let m2 = Measurement::build(&input(200.0, 12.0), Precision::default(), false).unwrap();
        let changed = m2
            .update(&mut ds, id, &mapping(), &registry, StorageMode::Code)
            .unwrap();
        assert_eq!(changed, 3);
        assert_eq!(ds.value(id, "str").unwrap(), AttributeValue::Number(200.0));
        // unmapped in this measurement, so left as it was
        assert_eq!(ds.value(id, "notes").unwrap(), AttributeValue::Text("first".into()));

        assert!(matches!(
            m2.update(&mut ds, 99, &mapping(), &registry, StorageMode::Code),
            Err(MeasurementError::Dataset(DatasetError::FeatureNotFound { feature_id: 99 }))
        ));
    }
}
