//! Batch recalculation of strike or dip azimuths over a whole dataset
//!
//! A pass never stops on a single feature: every feature gets an [`Outcome`] and the
//! pass ends with a [`BatchSummary`]. Only setup problems (an invalid mapping, a missing
//! output column) abort before the first feature is touched.

use miette::Diagnostic;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

use crate::core::azimuth::{
    coerce_number, validate_azimuth_range, CalculationDirection, CalculationInputError,
    Precision, AZIMUTH_RANGE,
};
use crate::core::dataset::{AttributeValue, Dataset, DatasetError, FeatureId};
use crate::core::resolver::{validate_mapping, ValidationError};
use crate::core::roles::{ColumnDescriptor, ColumnType, Role, RoleMapping};

/// Where computed values go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// An existing column
    Existing(String),
    /// A new numeric column, added before the pass
    Create(String),
}

impl OutputTarget {
    pub fn column(&self) -> &str {
        match self {
            OutputTarget::Existing(c) | OutputTarget::Create(c) => c,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    pub direction: CalculationDirection,
    pub input_role: Role,
    pub output: OutputTarget,
    pub precision: Precision,
    pub continue_on_range_warning: bool,
    pub dry_run: bool,
}

impl BatchConfig {
    /// Read the direction's usual input role and write to `output`
    pub fn new(direction: CalculationDirection, output: OutputTarget) -> Self {
        Self {
            direction,
            input_role: direction.default_input_role(),
            output,
            precision: Precision::default(),
            continue_on_range_warning: false,
            dry_run: false,
        }
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    pub fn continue_on_range_warning(mut self, yes: bool) -> Self {
        self.continue_on_range_warning = yes;
        self
    }

    pub fn dry_run(mut self, yes: bool) -> Self {
        self.dry_run = yes;
        self
    }
}

/// Why a feature was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NullInput,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NullInput => write!(f, "null input"),
        }
    }
}

/// Why a feature errored
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error(transparent)]
    Input(#[from] CalculationInputError),

    #[error("failed to read input: {message}")]
    ReadFailed { message: String },

    #[error("failed to update feature: {message}")]
    WriteFailed { message: String },
}

impl FeatureError {
    pub fn reason(&self) -> &'static str {
        match self {
            FeatureError::Input(e) => e.reason(),
            FeatureError::ReadFailed { .. } => "read-failed",
            FeatureError::WriteFailed { .. } => "write-failed",
        }
    }
}

/// Result for one feature
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Computed { value: f64, range_warning: bool },
    Skipped(SkipReason),
    Errored(FeatureError),
}

impl Outcome {
    pub fn is_computed(&self) -> bool {
        matches!(self, Outcome::Computed { .. })
    }

    /// Short status word for reports
    pub fn status(&self) -> &'static str {
        match self {
            Outcome::Computed {
                range_warning: true,
                ..
            } => "warning",
            Outcome::Computed { .. } => "computed",
            Outcome::Skipped(_) => "skipped",
            Outcome::Errored(_) => "errored",
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Outcome::Computed { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Skip or error reason, if any
    pub fn reason(&self) -> Option<String> {
        match self {
            Outcome::Computed {
                range_warning: true,
                ..
            } => Some("out-of-range input computed anyway".to_string()),
            Outcome::Computed { .. } => None,
            Outcome::Skipped(r) => Some(r.to_string()),
            Outcome::Errored(e) => Some(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureOutcome {
    pub feature_id: FeatureId,
    pub outcome: Outcome,
}

/// Aggregate result of a pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    pub errored: usize,
    pub errored_ids: Vec<FeatureId>,
    /// The host stopped the pass early; only visited features are reported
    pub cancelled: bool,
    pub outcomes: Vec<FeatureOutcome>,
}

impl BatchSummary {
    /// Features computed despite an out-of-range input
    pub fn range_warnings(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| {
                matches!(
                    o.outcome,
                    Outcome::Computed {
                        range_warning: true,
                        ..
                    }
                )
            })
            .count()
    }

    fn record(&mut self, feature_id: FeatureId, outcome: Outcome) {
        match &outcome {
            Outcome::Computed { .. } => self.processed += 1,
            Outcome::Skipped(_) => self.skipped += 1,
            Outcome::Errored(_) => {
                self.errored += 1;
                self.errored_ids.push(feature_id);
            }
        }
        self.outcomes.push(FeatureOutcome {
            feature_id,
            outcome,
        });
    }
}

/// Setup failures that abort a pass before any feature is processed
#[derive(Debug, Error, Diagnostic)]
pub enum BatchError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    #[error("{role} is not mapped to a column")]
    #[diagnostic(
        code(dst::recalc::unmapped_role),
        help("run `dst fields configure` to map it")
    )]
    UnmappedRole { role: Role },

    #[error("{role} is not a numeric role and cannot be recalculated")]
    #[diagnostic(code(dst::recalc::not_numeric_role))]
    NotNumericRole { role: Role },

    #[error("input column '{column}' for {role} is not numeric")]
    #[diagnostic(code(dst::recalc::input_not_numeric))]
    InputNotNumeric { role: Role, column: String },

    #[error("column '{column}' not found")]
    #[diagnostic(
        code(dst::recalc::column_not_found),
        help("use --create-column to add a new output column")
    )]
    ColumnNotFound { column: String },

    #[error("column '{column}' already exists")]
    #[diagnostic(
        code(dst::recalc::column_exists),
        help("write to the existing column with --output instead")
    )]
    ColumnExists { column: String },

    #[error("dataset error: {0}")]
    #[diagnostic(code(dst::recalc::dataset))]
    Dataset(#[from] DatasetError),
}

/// Recalculates one azimuth from the other across every feature of a dataset
pub struct BatchRecalculator<'a> {
    mapping: &'a RoleMapping,
    config: BatchConfig,
}

impl<'a> BatchRecalculator<'a> {
    pub fn new(mapping: &'a RoleMapping, config: BatchConfig) -> Self {
        Self { mapping, config }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Compute the outcome for a single input value, without touching any dataset
    pub fn evaluate(&self, input: &AttributeValue) -> Outcome {
        let value = match coerce_number(input) {
            Ok(Some(v)) => v,
            Ok(None) => return Outcome::Skipped(SkipReason::NullInput),
            Err(e) => return Outcome::Errored(e.into()),
        };

        let range_warning = !validate_azimuth_range(value);
        if range_warning && !self.config.continue_on_range_warning {
            return Outcome::Errored(
                CalculationInputError::OutOfRange {
                    value,
                    min: AZIMUTH_RANGE.0,
                    max: AZIMUTH_RANGE.1,
                }
                .into(),
            );
        }

        let computed = self.config.direction.apply(value);
        Outcome::Computed {
            value: self.config.precision.round_azimuth(computed),
            range_warning,
        }
    }

    pub fn run(&self, dataset: &mut dyn Dataset) -> Result<BatchSummary, BatchError> {
        let never = AtomicBool::new(false);
        self.run_with_cancel(dataset, &never)
    }

    /// Run the pass, checking `cancel` between features.
    ///
    /// Each feature's write is independent, so a cancelled pass leaves every visited
    /// feature fully written and every other feature untouched.
    pub fn run_with_cancel(
        &self,
        dataset: &mut dyn Dataset,
        cancel: &AtomicBool,
    ) -> Result<BatchSummary, BatchError> {
        let input_column = self.prepare(dataset)?;
        let output_column = self.config.output.column().to_string();

        log::info!(
            "Recalculating {} over {} ('{}' -> '{}')",
            self.config.direction,
            dataset.id(),
            input_column,
            output_column
        );

        let mut summary = BatchSummary::default();
        for feature_id in dataset.feature_ids() {
            if cancel.load(Ordering::Relaxed) {
                log::info!("Batch cancelled after {} features", summary.outcomes.len());
                summary.cancelled = true;
                break;
            }

            let outcome = match dataset.value(feature_id, &input_column) {
                Ok(input) => self.evaluate(&input),
                Err(e) => Outcome::Errored(FeatureError::ReadFailed {
                    message: e.to_string(),
                }),
            };

            let outcome = match outcome {
                Outcome::Computed {
                    value,
                    range_warning,
                } => {
                    if range_warning {
                        log::warn!(
                            "Feature {}: input outside 0..360, computed {} anyway",
                            feature_id,
                            value
                        );
                    }
                    self.write(dataset, feature_id, &output_column, value, range_warning)
                }
                other => other,
            };

            log::debug!("Feature {}: {:?}", feature_id, outcome);
            summary.record(feature_id, outcome);
        }

        log::info!(
            "Batch complete: {} processed, {} skipped, {} errored",
            summary.processed,
            summary.skipped,
            summary.errored
        );
        Ok(summary)
    }

    fn write(
        &self,
        dataset: &mut dyn Dataset,
        feature_id: FeatureId,
        column: &str,
        value: f64,
        range_warning: bool,
    ) -> Outcome {
        if self.config.dry_run {
            return Outcome::Computed {
                value,
                range_warning,
            };
        }
        match dataset.write_value(feature_id, column, AttributeValue::Number(value)) {
            Ok(()) => Outcome::Computed {
                value,
                range_warning,
            },
            Err(e) => {
                log::warn!("Failed to update feature {}: {}", feature_id, e);
                Outcome::Errored(FeatureError::WriteFailed {
                    message: e.to_string(),
                })
            }
        }
    }

    /// Check the mapping and columns, creating the output column if requested.
    /// Returns the input column name.
    fn prepare(&self, dataset: &mut dyn Dataset) -> Result<String, BatchError> {
        validate_mapping(self.mapping)?;

        let role = self.config.input_role;
        if role.column_type() != ColumnType::Numeric {
            return Err(BatchError::NotNumericRole { role });
        }
        let input_column = self
            .mapping
            .get(role)
            .ok_or(BatchError::UnmappedRole { role })?
            .to_string();
        match dataset.column(&input_column) {
            None => {
                return Err(BatchError::ColumnNotFound {
                    column: input_column,
                })
            }
            Some(c) if c.column_type != ColumnType::Numeric => {
                return Err(BatchError::InputNotNumeric {
                    role,
                    column: input_column,
                })
            }
            Some(_) => {}
        }

        match &self.config.output {
            OutputTarget::Existing(column) => {
                if !dataset.has_column(column) {
                    return Err(BatchError::ColumnNotFound {
                        column: column.clone(),
                    });
                }
            }
            OutputTarget::Create(column) => {
                if dataset.has_column(column) {
                    return Err(BatchError::ColumnExists {
                        column: column.clone(),
                    });
                }
                if !self.config.dry_run {
                    dataset.add_column(ColumnDescriptor::numeric(column.clone()))?;
                    log::info!("Created output column '{}'", column);
                }
            }
        }
        Ok(input_column)
    }
}
