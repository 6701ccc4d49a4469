//! Semantic field roles and the role -> column mapping

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Semantic purpose of a dataset column
///
/// Declaration order is significant: it is the tie-break order used by auto-detection
/// and the order in which roles are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "strike_azimuth")]
    StrikeAzimuth,
    #[serde(rename = "dip_azimuth")]
    DipAzimuth,
    #[serde(rename = "dip_value")]
    DipValue,
    #[serde(rename = "geo_type")]
    GeologicalType,
    #[serde(rename = "age")]
    Age,
    #[serde(rename = "lithology")]
    Lithology,
    #[serde(rename = "notes")]
    Notes,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::StrikeAzimuth,
        Role::DipAzimuth,
        Role::DipValue,
        Role::GeologicalType,
        Role::Age,
        Role::Lithology,
        Role::Notes,
    ];

    pub const REQUIRED: [Role; 3] = [Role::StrikeAzimuth, Role::DipAzimuth, Role::DipValue];

    pub const OPTIONAL: [Role; 4] = [Role::GeologicalType, Role::Age, Role::Lithology, Role::Notes];

    pub fn is_required(self) -> bool {
        Self::REQUIRED.contains(&self)
    }

    /// Stable storage key (also the standard column name)
    pub fn key(self) -> &'static str {
        match self {
            Role::StrikeAzimuth => "strike_azimuth",
            Role::DipAzimuth => "dip_azimuth",
            Role::DipValue => "dip_value",
            Role::GeologicalType => "geo_type",
            Role::Age => "age",
            Role::Lithology => "lithology",
            Role::Notes => "notes",
        }
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            Role::StrikeAzimuth => "Strike Azimuth",
            Role::DipAzimuth => "Dip Azimuth",
            Role::DipValue => "Dip Value",
            Role::GeologicalType => "Geological Type",
            Role::Age => "Age",
            Role::Lithology => "Lithology",
            Role::Notes => "Notes",
        }
    }

    /// Column type this role is meant to hold
    pub fn column_type(self) -> ColumnType {
        if self.is_required() {
            ColumnType::Numeric
        } else {
            ColumnType::Text
        }
    }

    /// Whether a column of `column_type` may hold this role.
    ///
    /// Numeric roles reject text columns. Text roles accept numeric columns too,
    /// since geological type codes are often stored as integers.
    pub fn accepts(self, column_type: ColumnType) -> bool {
        match self.column_type() {
            ColumnType::Numeric => column_type == ColumnType::Numeric,
            ColumnType::Text => true,
        }
    }

    /// Position of this role in [`Role::ALL`]
    pub fn ordinal(self) -> usize {
        Self::ALL.iter().position(|r| *r == self).unwrap_or(0)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['-', ' '], "_");
        let alias = match wanted.as_str() {
            "strike" => "strike_azimuth",
            "dip_az" | "dip_direction" => "dip_azimuth",
            "dip" => "dip_value",
            "geological_type" | "type" => "geo_type",
            other => other,
        };
        Role::ALL
            .iter()
            .find(|r| r.key() == alias)
            .copied()
            .ok_or_else(|| {
                let keys: Vec<&str> = Role::ALL.iter().map(|r| r.key()).collect();
                format!("Invalid role: {}. Use one of: {}", s, keys.join(", "))
            })
    }
}

/// Declared column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Text,
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::Numeric => write!(f, "numeric"),
            ColumnType::Text => write!(f, "text"),
        }
    }
}

/// A dataset column as reported by the dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }

    pub fn numeric(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Numeric)
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Text)
    }
}

/// A column claimed by more than one role
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateColumn {
    pub column: String,
    pub roles: Vec<Role>,
}

impl std::fmt::Display for DuplicateColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let labels: Vec<&str> = self.roles.iter().map(|r| r.label()).collect();
        write!(f, "'{}' -> {}", self.column, labels.join(" & "))
    }
}

/// Role -> column assignment; unmapped roles are absent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleMapping {
    assignments: BTreeMap<Role, String>,
}

impl RoleMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, role: Role) -> Option<&str> {
        self.assignments.get(&role).map(|s| s.as_str())
    }

    /// Assign (or with `None`, unassign) a role. Returns the previous column.
    pub fn set(&mut self, role: Role, column: Option<String>) -> Option<String> {
        match column {
            Some(c) => self.assignments.insert(role, c),
            None => self.assignments.remove(&role),
        }
    }

    pub fn with(mut self, role: Role, column: impl Into<String>) -> Self {
        self.assignments.insert(role, column.into());
        self
    }

    pub fn is_mapped(&self, role: Role) -> bool {
        self.assignments.contains_key(&role)
    }

    /// Assigned roles in role order
    pub fn iter(&self) -> impl Iterator<Item = (Role, &str)> {
        self.assignments.iter().map(|(r, c)| (*r, c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Roles assigned to `column`
    pub fn roles_for(&self, column: &str) -> Vec<Role> {
        self.iter()
            .filter(|(_, c)| *c == column)
            .map(|(r, _)| r)
            .collect()
    }

    /// Columns used by more than one role, in first-use order
    pub fn duplicates(&self) -> Vec<DuplicateColumn> {
        let mut groups: Vec<DuplicateColumn> = Vec::new();
        for (role, column) in self.iter() {
            match groups.iter_mut().find(|g| g.column == column) {
                Some(group) => group.roles.push(role),
                None => groups.push(DuplicateColumn {
                    column: column.to_string(),
                    roles: vec![role],
                }),
            }
        }
        groups.retain(|g| g.roles.len() > 1);
        groups
    }

    /// Required roles without a column
    pub fn missing_required(&self) -> Vec<Role> {
        Role::REQUIRED
            .iter()
            .copied()
            .filter(|r| !self.is_mapped(*r))
            .collect()
    }

    /// All required roles mapped and no column used twice
    pub fn is_complete(&self) -> bool {
        self.missing_required().is_empty() && self.duplicates().is_empty()
    }
}
