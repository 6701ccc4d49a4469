//! Standard column layout for new measurement layers

use serde::Serialize;

use crate::core::roles::{ColumnDescriptor, ColumnType, Role, RoleMapping};

/// Column naming convention of the target format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerFormat {
    #[default]
    Standard,
    /// Field names limited to 10 characters
    Shapefile,
}

impl std::fmt::Display for LayerFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerFormat::Standard => write!(f, "standard"),
            LayerFormat::Shapefile => write!(f, "shapefile"),
        }
    }
}

impl std::str::FromStr for LayerFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" | "full" | "csv" | "gpkg" => Ok(LayerFormat::Standard),
            "shapefile" | "shp" => Ok(LayerFormat::Shapefile),
            _ => Err(format!(
                "Invalid layer format: {}. Use standard or shapefile",
                s
            )),
        }
    }
}

/// One standard field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub role: Role,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub length: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
}

/// Column name for `role` in `format`
pub fn column_name(role: Role, format: LayerFormat) -> &'static str {
    match (format, role) {
        (LayerFormat::Shapefile, Role::StrikeAzimuth) => "strike_az",
        (LayerFormat::Shapefile, Role::DipAzimuth) => "dip_az",
        (LayerFormat::Shapefile, Role::DipValue) => "dip_val",
        _ => role.key(),
    }
}

/// Every standard field in role order
pub fn standard_fields(format: LayerFormat) -> Vec<FieldSpec> {
    Role::ALL
        .iter()
        .map(|&role| {
            let (length, precision) = match role {
                Role::StrikeAzimuth | Role::DipAzimuth | Role::DipValue => (10, Some(2)),
                Role::GeologicalType | Role::Age => (50, None),
                Role::Lithology => (100, None),
                Role::Notes => (255, None),
            };
            FieldSpec {
                role,
                name: column_name(role, format),
                column_type: role.column_type(),
                length,
                precision,
            }
        })
        .collect()
}

pub fn standard_columns(format: LayerFormat) -> Vec<ColumnDescriptor> {
    standard_fields(format)
        .into_iter()
        .map(|f| ColumnDescriptor::new(f.name, f.column_type))
        .collect()
}

/// The complete mapping for a freshly created layer
pub fn standard_mapping(format: LayerFormat) -> RoleMapping {
    standard_fields(format)
        .into_iter()
        .fold(RoleMapping::new(), |m, f| m.with(f.role, f.name))
}
