//! Field-role resolver - maps semantic roles onto the columns of an arbitrary dataset
//!
//! A resolver session walks a small state machine:
//!
//! ```text
//! Unresolved --auto_detect--> AutoProposed --validate--> Validated --save--> Persisted
//!      \                          |                 \
//!       `--set_role--> UserEdited <--set_role-- Invalid
//! ```
//!
//! Auto-detection is a deterministic scoring pass: every (role, column) pair gets a
//! composite score from name aliases, type compatibility and a small positional prior,
//! then pairs are granted greedily from the highest score down, ties going to the role
//! declared first. Validation checks injectivity before required-role coverage.

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::core::roles::{ColumnDescriptor, ColumnType, DuplicateColumn, Role, RoleMapping};
use crate::core::store::{MappingStore, StoreError};

/// Minimum name-and-type score for a column to be proposed
pub const MIN_SCORE: f64 = 0.25;

/// Score of an exact alias match
const EXACT_MATCH: f64 = 1.0;

/// Keyword hits add up but never reach an exact match
const KEYWORD_CAP: f64 = 0.9;

/// Text roles may sit in numeric columns (integer type codes), at a discount
const CROSS_TYPE_FACTOR: f64 = 0.5;

/// Weight of the positional prior; only ever decides otherwise-equal scores
const POSITION_WEIGHT: f64 = 0.01;

/// Identifier columns never proposed by auto-detection
const ID_COLUMNS: &[&str] = &[
    "id", "fid", "objectid", "gid", "uid", "oid", "pk", "key", "rowid", "geom_id", "feat_id",
];

const ID_AFFIXES: &[&str] = &["id", "fid", "objectid", "gid"];

struct RolePatterns {
    exact: &'static [&'static str],
    keywords: &'static [(&'static str, f64)],
}

fn patterns(role: Role) -> RolePatterns {
    match role {
        Role::StrikeAzimuth => RolePatterns {
            exact: &[
                "strike_azimuth", "strike_az", "strike", "az_strike", "strikeaz", "str_az",
                "strike_azi",
            ],
            keywords: &[("strike", 0.6), ("azimuth", 0.3), ("bearing", 0.3), ("direction", 0.2)],
        },
        Role::DipAzimuth => RolePatterns {
            exact: &[
                "dip_azimuth", "dip_az", "dipaz", "dip_dir", "dip_direction", "dipdir", "az_dip",
                "dip_azi", "dipazimuth",
            ],
            keywords: &[
                ("dip_az", 0.6),
                ("dip_dir", 0.6),
                ("azimuth", 0.3),
                ("bearing", 0.3),
                ("direction", 0.2),
                ("dip", 0.2),
            ],
        },
        Role::DipValue => RolePatterns {
            exact: &[
                "dip_value", "dip_val", "dip", "dip_angle", "dipval", "inclination", "dip_deg",
            ],
            keywords: &[
                ("dip", 0.4),
                ("angle", 0.4),
                ("inclin", 0.4),
                ("plunge", 0.3),
                ("value", 0.2),
                ("degree", 0.2),
            ],
        },
        Role::GeologicalType => RolePatterns {
            exact: &[
                "geo_type", "geological_type", "geotype", "type", "structure", "struct_type",
                "feature_type",
            ],
            keywords: &[("geo", 0.4), ("type", 0.4), ("struct", 0.3)],
        },
        Role::Age => RolePatterns {
            exact: &["age", "geo_age", "period", "epoch", "era"],
            keywords: &[("age", 0.5), ("period", 0.4), ("epoch", 0.4)],
        },
        Role::Lithology => RolePatterns {
            exact: &["lithology", "litho", "rock_type", "rock", "lith"],
            keywords: &[("lith", 0.6), ("rock", 0.5)],
        },
        Role::Notes => RolePatterns {
            exact: &["notes", "note", "comment", "comments", "remarks", "description", "desc"],
            keywords: &[("note", 0.5), ("comment", 0.5), ("remark", 0.4), ("desc", 0.3)],
        },
    }
}

/// Canonical column order of the standard layer, used by the positional prior
fn canonical_position(role: Role) -> usize {
    role.ordinal()
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase().replace(['-', ' ', '.'], "_")
}

/// Whether a column name looks like a feature identifier
pub fn is_id_column(name: &str) -> bool {
    let name = normalize_name(name);
    if name.is_empty() {
        return false;
    }
    ID_COLUMNS.contains(&name.as_str())
        || ID_AFFIXES.iter().any(|p| {
            name.starts_with(&format!("{}_", p)) || name.ends_with(&format!("_{}", p))
        })
}

/// Name signal for `role` on a column name, in `[0, 1]`
pub fn name_score(role: Role, column_name: &str) -> f64 {
    let name = normalize_name(column_name);
    let p = patterns(role);
    if p.exact.contains(&name.as_str()) {
        return EXACT_MATCH;
    }
    let hits: f64 = p
        .keywords
        .iter()
        .filter(|(kw, _)| name.contains(kw))
        .map(|(_, w)| w)
        .sum();
    hits.min(KEYWORD_CAP)
}

/// Type signal: 0 rejects the column outright
pub fn type_factor(role: Role, column_type: ColumnType) -> f64 {
    if !role.accepts(column_type) {
        0.0
    } else if role.column_type() == column_type {
        1.0
    } else {
        CROSS_TYPE_FACTOR
    }
}

/// Score breakdown of one column for one role
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnScore {
    pub role: Role,
    pub column: String,
    pub column_index: usize,
    pub name_score: f64,
    pub type_factor: f64,
    pub position_prior: f64,
}

impl ColumnScore {
    /// Name and type combined; compared against [`MIN_SCORE`]
    pub fn base(&self) -> f64 {
        self.name_score * self.type_factor
    }

    pub fn total(&self) -> f64 {
        self.base() + self.position_prior
    }

    pub fn is_candidate(&self) -> bool {
        self.base() >= MIN_SCORE
    }
}

/// Score every non-identifier column for `role`, best first.
pub fn score_columns(role: Role, columns: &[ColumnDescriptor]) -> Vec<ColumnScore> {
    let eligible: Vec<(usize, &ColumnDescriptor)> = columns
        .iter()
        .enumerate()
        .filter(|(_, c)| !is_id_column(&c.name))
        .collect();

    let mut scores: Vec<ColumnScore> = eligible
        .iter()
        .enumerate()
        .map(|(rank, (index, column))| {
            let name = name_score(role, &column.name);
            let distance = rank.abs_diff(canonical_position(role)) as f64;
            ColumnScore {
                role,
                column: column.name.clone(),
                column_index: *index,
                name_score: name,
                type_factor: type_factor(role, column.column_type),
                position_prior: if name > 0.0 {
                    POSITION_WEIGHT / (1.0 + distance)
                } else {
                    0.0
                },
            }
        })
        .collect();

    scores.sort_by(|a, b| {
        b.total()
            .total_cmp(&a.total())
            .then(a.column_index.cmp(&b.column_index))
    });
    scores
}

/// Propose a mapping for `columns`.
///
/// Candidate pairs are granted from the highest score down; a column already granted
/// to another role is skipped, and equal scores go to the role declared first.
pub fn propose_mapping(columns: &[ColumnDescriptor]) -> RoleMapping {
    let mut candidates: Vec<ColumnScore> = Role::ALL
        .iter()
        .flat_map(|role| score_columns(*role, columns))
        .filter(|s| s.is_candidate())
        .collect();

    candidates.sort_by(|a, b| {
        b.total()
            .total_cmp(&a.total())
            .then(a.role.cmp(&b.role))
            .then(a.column_index.cmp(&b.column_index))
    });

    let mut mapping = RoleMapping::new();
    let mut claimed: Vec<&str> = Vec::new();
    for candidate in &candidates {
        if mapping.is_mapped(candidate.role) || claimed.contains(&candidate.column.as_str()) {
            continue;
        }
        log::debug!(
            "Auto-detected '{}' for {} (score {:.3})",
            candidate.column,
            candidate.role,
            candidate.total()
        );
        mapping.set(candidate.role, Some(candidate.column.clone()));
        claimed.push(&candidate.column);
    }
    mapping
}

/// Mapping validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ValidationError {
    #[error("Duplicate field mappings: {}", format_duplicates(.duplicates))]
    #[diagnostic(
        code(dst::fields::duplicate_mapping),
        help("each column can only be mapped once; select different columns for these roles")
    )]
    DuplicateMapping { duplicates: Vec<DuplicateColumn> },

    #[error("Missing required fields: {}", format_roles(.roles))]
    #[diagnostic(
        code(dst::fields::missing_required),
        help("map every required role to a numeric column")
    )]
    MissingRequiredField { roles: Vec<Role> },
}

fn format_duplicates(duplicates: &[DuplicateColumn]) -> String {
    duplicates
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_roles(roles: &[Role]) -> String {
    roles.iter().map(|r| r.label()).collect::<Vec<_>>().join(", ")
}

/// Check injectivity, then required-role coverage.
pub fn validate_mapping(mapping: &RoleMapping) -> Result<(), ValidationError> {
    let duplicates = mapping.duplicates();
    if !duplicates.is_empty() {
        return Err(ValidationError::DuplicateMapping { duplicates });
    }
    let roles = mapping.missing_required();
    if !roles.is_empty() {
        return Err(ValidationError::MissingRequiredField { roles });
    }
    Ok(())
}

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverState {
    Unresolved,
    AutoProposed,
    UserEdited,
    Validated,
    Invalid,
    Persisted,
}

impl std::fmt::Display for ResolverState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResolverState::Unresolved => "unresolved",
            ResolverState::AutoProposed => "auto-proposed",
            ResolverState::UserEdited => "user-edited",
            ResolverState::Validated => "validated",
            ResolverState::Invalid => "invalid",
            ResolverState::Persisted => "persisted",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum ResolverError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    #[error("Cannot save a mapping in state '{state}'; validate it first")]
    #[diagnostic(code(dst::fields::not_validated))]
    NotValidated { state: ResolverState },

    #[error("Column '{column}' does not exist in this dataset")]
    #[diagnostic(code(dst::fields::unknown_column))]
    UnknownColumn { column: String },

    #[error("{role} needs a {expected} column, but '{column}' is {actual}")]
    #[diagnostic(code(dst::fields::incompatible_column))]
    IncompatibleColumn {
        role: Role,
        column: String,
        expected: ColumnType,
        actual: ColumnType,
    },

    #[error("Failed to persist mapping for {dataset_id}: {source}")]
    #[diagnostic(code(dst::fields::store))]
    Store {
        dataset_id: String,
        #[source]
        source: StoreError,
    },
}

/// A resolution session over one dataset's columns
///
/// Not thread-safe by contract: callers serialize access to a session.
#[derive(Debug, Clone)]
pub struct FieldRoleResolver {
    dataset_id: String,
    columns: Vec<ColumnDescriptor>,
    mapping: RoleMapping,
    state: ResolverState,
    last_error: Option<ValidationError>,
}

impl FieldRoleResolver {
    pub fn new(dataset_id: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            columns,
            mapping: RoleMapping::new(),
            state: ResolverState::Unresolved,
            last_error: None,
        }
    }

    pub fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn mapping(&self) -> &RoleMapping {
        &self.mapping
    }

    pub fn state(&self) -> ResolverState {
        self.state
    }

    /// Error from the most recent failed validation
    pub fn last_error(&self) -> Option<&ValidationError> {
        self.last_error.as_ref()
    }

    /// Replace the mapping with an algorithmic proposal
    pub fn auto_detect(&mut self) -> &RoleMapping {
        self.mapping = propose_mapping(&self.columns);
        self.state = ResolverState::AutoProposed;
        self.last_error = None;
        log::info!(
            "Auto-detected {} of {} roles for {}",
            self.mapping.len(),
            Role::ALL.len(),
            self.dataset_id
        );
        &self.mapping
    }

    /// Adopt a previously stored mapping, if any.
    ///
    /// Entries pointing at missing or type-incompatible columns are dropped. Returns
    /// whether a stored mapping was found.
    pub fn load(&mut self, store: &dyn MappingStore) -> Result<bool, ResolverError> {
        let stored = store
            .load(&self.dataset_id)
            .map_err(|source| ResolverError::Store {
                dataset_id: self.dataset_id.clone(),
                source,
            })?;
        let Some(stored) = stored else {
            return Ok(false);
        };

        let mut mapping = RoleMapping::new();
        for (role, column) in stored.iter() {
            match self.check_assignment(role, column) {
                Ok(()) => {
                    mapping.set(role, Some(column.to_string()));
                }
                Err(e) => log::warn!("Dropping stored mapping for {}: {}", role, e),
            }
        }
        self.mapping = mapping;
        self.state = ResolverState::UserEdited;
        self.last_error = None;
        Ok(true)
    }

    /// Override one role (`None` unmaps it)
    pub fn set_role(&mut self, role: Role, column: Option<&str>) -> Result<(), ResolverError> {
        if let Some(column) = column {
            self.check_assignment(role, column)?;
        }
        self.mapping.set(role, column.map(str::to_string));
        self.state = ResolverState::UserEdited;
        Ok(())
    }

    /// Run duplicate and required-role checks, moving to Validated or Invalid
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        match validate_mapping(&self.mapping) {
            Ok(()) => {
                if self.state != ResolverState::Persisted {
                    self.state = ResolverState::Validated;
                }
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                self.state = ResolverState::Invalid;
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Persist a validated mapping
    pub fn save(&mut self, store: &mut dyn MappingStore) -> Result<(), ResolverError> {
        if self.state != ResolverState::Validated {
            return Err(ResolverError::NotValidated { state: self.state });
        }
        store
            .save(&self.dataset_id, &self.mapping)
            .map_err(|source| ResolverError::Store {
                dataset_id: self.dataset_id.clone(),
                source,
            })?;
        self.state = ResolverState::Persisted;
        Ok(())
    }

    /// Columns a role may be set to, best auto-detection candidates first
    pub fn candidate_columns(&self, role: Role) -> Vec<&ColumnDescriptor> {
        let mut ranked: Vec<&ColumnDescriptor> = score_columns(role, &self.columns)
            .into_iter()
            .filter(|s| s.type_factor > 0.0)
            .filter_map(|s| self.columns.get(s.column_index))
            .collect();
        ranked.dedup_by(|a, b| a.name == b.name);
        ranked
    }

    fn check_assignment(&self, role: Role, column: &str) -> Result<(), ResolverError> {
        let descriptor = self
            .columns
            .iter()
            .find(|c| c.name == column)
            .ok_or_else(|| ResolverError::UnknownColumn {
                column: column.to_string(),
            })?;
        if !role.accepts(descriptor.column_type) {
            return Err(ResolverError::IncompatibleColumn {
                role,
                column: column.to_string(),
                expected: role.column_type(),
                actual: descriptor.column_type,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::MemoryMappingStore;

    fn cols(spec: &[(&str, ColumnType)]) -> Vec<ColumnDescriptor> {
        spec.iter()
            .map(|(n, t)| ColumnDescriptor::new(*n, *t))
            .collect()
    }

    fn standard() -> Vec<ColumnDescriptor> {
        cols(&[
            ("fid", ColumnType::Numeric),
            ("strike_azimuth", ColumnType::Numeric),
            ("dip_azimuth", ColumnType::Numeric),
            ("dip_value", ColumnType::Numeric),
            ("geo_type", ColumnType::Text),
            ("age", ColumnType::Text),
            ("lithology", ColumnType::Text),
            ("notes", ColumnType::Text),
        ])
    }

    #[test]
    fn test_detect_partial_schema_leaves_dip_azimuth_unmapped() {
        let columns = cols(&[
            ("strike_az", ColumnType::Numeric),
            ("dip_val", ColumnType::Numeric),
            ("notes", ColumnType::Text),
        ]);
        let mut resolver = FieldRoleResolver::new("ds", columns);
        let mapping = resolver.auto_detect().clone();

        assert_eq!(mapping.get(Role::StrikeAzimuth), Some("strike_az"));
        assert_eq!(mapping.get(Role::DipValue), Some("dip_val"));
        assert_eq!(mapping.get(Role::DipAzimuth), None);
        assert_eq!(mapping.get(Role::Notes), Some("notes"));
        assert_eq!(resolver.state(), ResolverState::AutoProposed);

        let err = resolver.validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingRequiredField {
                roles: vec![Role::DipAzimuth]
            }
        );
        assert_eq!(resolver.state(), ResolverState::Invalid);
    }

    #[test]
    fn test_detect_standard_schema_skips_id_column() {
        let mapping = propose_mapping(&standard());
        for role in Role::ALL {
            assert_eq!(mapping.get(role), Some(role.key()), "{}", role);
        }
        assert!(mapping.roles_for("fid").is_empty());
    }

    #[test]
    fn test_detect_shapefile_names() {
        let columns = cols(&[
            ("strike_az", ColumnType::Numeric),
            ("dip_az", ColumnType::Numeric),
            ("dip_val", ColumnType::Numeric),
            ("geo_type", ColumnType::Text),
        ]);
        let mapping = propose_mapping(&columns);
        assert_eq!(mapping.get(Role::StrikeAzimuth), Some("strike_az"));
        assert_eq!(mapping.get(Role::DipAzimuth), Some("dip_az"));
        assert_eq!(mapping.get(Role::DipValue), Some("dip_val"));
        assert_eq!(mapping.get(Role::GeologicalType), Some("geo_type"));
        assert!(mapping.is_complete());
    }

    #[test]
    fn test_detect_is_deterministic() {
        let columns = cols(&[
            ("Bearing", ColumnType::Numeric),
            ("Dip Direction", ColumnType::Numeric),
            ("Angle", ColumnType::Numeric),
            ("Rock", ColumnType::Text),
            ("Comment", ColumnType::Text),
        ]);
        let first = propose_mapping(&columns);
        for _ in 0..10 {
            assert_eq!(propose_mapping(&columns), first);
        }
        assert_eq!(first.get(Role::DipAzimuth), Some("Dip Direction"));
        assert_eq!(first.get(Role::DipValue), Some("Angle"));
        assert_eq!(first.get(Role::StrikeAzimuth), Some("Bearing"));
        assert_eq!(first.get(Role::Lithology), Some("Rock"));
        assert_eq!(first.get(Role::Notes), Some("Comment"));
    }

    #[test]
    fn test_numeric_role_rejects_text_column() {
        let columns = cols(&[("strike", ColumnType::Text)]);
        let mapping = propose_mapping(&columns);
        assert_eq!(mapping.get(Role::StrikeAzimuth), None);

        let mut resolver = FieldRoleResolver::new("ds", columns);
        let err = resolver
            .set_role(Role::StrikeAzimuth, Some("strike"))
            .unwrap_err();
        assert!(matches!(err, ResolverError::IncompatibleColumn { .. }));
        assert_eq!(resolver.state(), ResolverState::Unresolved);
    }

    #[test]
    fn test_text_role_accepts_numeric_code_column() {
        let columns = cols(&[("geo_type", ColumnType::Numeric)]);
        let mapping = propose_mapping(&columns);
        assert_eq!(mapping.get(Role::GeologicalType), Some("geo_type"));
    }

    #[test]
    fn test_higher_score_wins_contested_column() {
        // "dip" is an exact alias for DipValue and only a weak keyword for DipAzimuth
        let columns = cols(&[("dip", ColumnType::Numeric)]);
        let mapping = propose_mapping(&columns);
        assert_eq!(mapping.get(Role::DipValue), Some("dip"));
        assert_eq!(mapping.get(Role::DipAzimuth), None);
    }

    #[test]
    fn test_equal_scores_go_to_earlier_role() {
        // "azimuth" scores the same for both azimuth roles
        let columns = cols(&[("azimuth", ColumnType::Numeric)]);
        let mapping = propose_mapping(&columns);
        assert_eq!(mapping.get(Role::StrikeAzimuth), Some("azimuth"));
        assert_eq!(mapping.get(Role::DipAzimuth), None);
    }

    #[test]
    fn test_id_column_detection() {
        assert!(is_id_column("FID"));
        assert!(is_id_column("objectid"));
        assert!(is_id_column("site_id"));
        assert!(is_id_column("gid_2"));
        assert!(!is_id_column("strike"));
        assert!(!is_id_column("idea"));
        assert!(!is_id_column(""));
    }

    #[test]
    fn test_duplicate_mapping_detected() {
        let columns = cols(&[
            ("az", ColumnType::Numeric),
            ("dip", ColumnType::Numeric),
        ]);
        let mut resolver = FieldRoleResolver::new("ds", columns);
        resolver.set_role(Role::StrikeAzimuth, Some("az")).unwrap();
        resolver.set_role(Role::DipAzimuth, Some("az")).unwrap();
        resolver.set_role(Role::DipValue, Some("dip")).unwrap();
        assert_eq!(resolver.state(), ResolverState::UserEdited);

        match resolver.validate() {
            Err(ValidationError::DuplicateMapping { duplicates }) => {
                assert_eq!(duplicates.len(), 1);
                assert_eq!(duplicates[0].column, "az");
                assert_eq!(
                    duplicates[0].roles,
                    vec![Role::StrikeAzimuth, Role::DipAzimuth]
                );
            }
            other => panic!("expected duplicate mapping, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicates_reported_before_missing() {
        let columns = cols(&[("az", ColumnType::Numeric)]);
        let mut resolver = FieldRoleResolver::new("ds", columns);
        resolver.set_role(Role::StrikeAzimuth, Some("az")).unwrap();
        resolver.set_role(Role::DipAzimuth, Some("az")).unwrap();
        assert!(matches!(
            resolver.validate(),
            Err(ValidationError::DuplicateMapping { .. })
        ));
    }

    #[test]
    fn test_unknown_column_rejected() {
        let mut resolver = FieldRoleResolver::new("ds", standard());
        assert!(matches!(
            resolver.set_role(Role::Notes, Some("nope")),
            Err(ResolverError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_save_requires_validation() {
        let mut store = MemoryMappingStore::new();
        let mut resolver = FieldRoleResolver::new("ds", standard());
        resolver.auto_detect();

        let err = resolver.save(&mut store).unwrap_err();
        assert!(matches!(
            err,
            ResolverError::NotValidated {
                state: ResolverState::AutoProposed
            }
        ));
        assert!(store.is_empty());

        resolver.validate().unwrap();
        resolver.save(&mut store).unwrap();
        assert_eq!(resolver.state(), ResolverState::Persisted);
        assert_eq!(store.load("ds").unwrap().as_ref(), Some(resolver.mapping()));
    }

    #[test]
    fn test_save_refused_when_invalid() {
        let mut store = MemoryMappingStore::new();
        let mut resolver = FieldRoleResolver::new("ds", standard());
        resolver.auto_detect();
        resolver.set_role(Role::DipValue, None).unwrap();
        assert!(resolver.validate().is_err());
        assert!(matches!(
            resolver.save(&mut store),
            Err(ResolverError::NotValidated {
                state: ResolverState::Invalid
            })
        ));
    }

    #[test]
    fn test_edit_after_invalid_returns_to_user_edited() {
        let mut resolver = FieldRoleResolver::new("ds", standard());
        resolver.auto_detect();
        resolver.set_role(Role::DipValue, None).unwrap();
        resolver.validate().unwrap_err();
        assert!(resolver.last_error().is_some());

        resolver.set_role(Role::DipValue, Some("dip_value")).unwrap();
        assert_eq!(resolver.state(), ResolverState::UserEdited);
        resolver.validate().unwrap();
        assert_eq!(resolver.state(), ResolverState::Validated);
        assert!(resolver.last_error().is_none());
    }

    #[test]
    fn test_store_failure_keeps_validated_state() {
        let mut store = MemoryMappingStore::failing();
        let mut resolver = FieldRoleResolver::new("ds", standard());
        resolver.auto_detect();
        resolver.validate().unwrap();
        assert!(matches!(
            resolver.save(&mut store),
            Err(ResolverError::Store { .. })
        ));
        assert_eq!(resolver.state(), ResolverState::Validated);
    }

    #[test]
    fn test_load_drops_stale_columns() {
        let mut store = MemoryMappingStore::new();
        store
            .save(
                "ds",
                &RoleMapping::new()
                    .with(Role::StrikeAzimuth, "strike_azimuth")
                    .with(Role::DipAzimuth, "renamed_column")
                    .with(Role::DipValue, "notes"),
            )
            .unwrap();

        let mut resolver = FieldRoleResolver::new("ds", standard());
        assert!(resolver.load(&store).unwrap());
        assert_eq!(resolver.state(), ResolverState::UserEdited);
        assert_eq!(resolver.mapping().len(), 1);
        assert_eq!(
            resolver.mapping().get(Role::StrikeAzimuth),
            Some("strike_azimuth")
        );

        let mut empty = FieldRoleResolver::new("other", standard());
        assert!(!empty.load(&store).unwrap());
        assert_eq!(empty.state(), ResolverState::Unresolved);
    }

    #[test]
    fn test_candidate_columns_exclude_text_for_numeric_roles() {
        let resolver = FieldRoleResolver::new("ds", standard());
        let names: Vec<&str> = resolver
            .candidate_columns(Role::DipValue)
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names[0], "dip_value");
        assert!(!names.contains(&"notes"));
        assert!(!names.contains(&"fid"));
    }

    #[test]
    fn test_validation_error_messages_are_itemized() {
        let err = ValidationError::DuplicateMapping {
            duplicates: vec![DuplicateColumn {
                column: "az".into(),
                roles: vec![Role::StrikeAzimuth, Role::DipAzimuth],
            }],
        };
        assert_eq!(
            err.to_string(),
            "Duplicate field mappings: 'az' -> Strike Azimuth & Dip Azimuth"
        );
        let err = ValidationError::MissingRequiredField {
            roles: vec![Role::DipAzimuth, Role::DipValue],
        };
        assert_eq!(
            err.to_string(),
            "Missing required fields: Dip Azimuth, Dip Value"
        );
    }
}
