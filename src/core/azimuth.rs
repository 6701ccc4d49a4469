//! Azimuth engine - normalization, strike/dip conversion and direction correction
//!
//! All angles are degrees, clockwise from a reference north. Functions here never
//! round; rounding happens once, at presentation or storage time, through [`Precision`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::dataset::AttributeValue;
use crate::core::roles::Role;

/// One full turn in degrees
pub const FULL_CIRCLE: f64 = 360.0;

/// Angle between strike and dip azimuth
pub const QUARTER_TURN: f64 = 90.0;

/// Largest number of decimal places accepted by [`Precision`]
pub const MAX_DECIMAL_PLACES: u32 = 10;

/// Valid dip inclination range (inclusive)
pub const DIP_RANGE: (f64, f64) = (0.0, 90.0);

/// Valid raw azimuth range (inclusive, pre-normalization)
pub const AZIMUTH_RANGE: (f64, f64) = (0.0, 360.0);

/// Per-value input errors
///
/// Non-numeric input and out-of-range input are distinct kinds: the first can never be
/// computed, the second can when the caller accepts the range warning.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalculationInputError {
    #[error("non-numeric input '{value}'")]
    NonNumeric { value: String },

    #[error("value {value} is outside the range {min}..={max}")]
    OutOfRange { value: f64, min: f64, max: f64 },
}

impl CalculationInputError {
    /// Short machine-friendly reason ("non-numeric" / "out-of-range")
    pub fn reason(&self) -> &'static str {
        match self {
            CalculationInputError::NonNumeric { .. } => "non-numeric",
            CalculationInputError::OutOfRange { .. } => "out-of-range",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("decimal places must be between 0 and {MAX_DECIMAL_PLACES}, got {0}")]
pub struct PrecisionError(pub u32);

/// Map any angle into `[0, 360)`.
pub fn normalize(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(FULL_CIRCLE);
    // rem_euclid rounds tiny negative inputs up to exactly 360.0
    if wrapped >= FULL_CIRCLE {
        0.0
    } else {
        // folds -0.0 into 0.0
        wrapped + 0.0
    }
}

/// Dip azimuth for a strike azimuth (right-hand rule: strike + 90).
pub fn strike_to_dip(strike: f64) -> f64 {
    normalize(strike + QUARTER_TURN)
}

/// Strike azimuth for a dip azimuth (dip - 90).
pub fn dip_to_strike(dip_azimuth: f64) -> f64 {
    normalize(dip_azimuth - QUARTER_TURN)
}

/// Apply a signed correction angle (grid convergence / true-north offset).
pub fn apply_correction(raw_azimuth: f64, correction: f64) -> f64 {
    normalize(raw_azimuth + correction)
}

/// True iff `0 <= value <= 90`.
pub fn validate_dip(value: f64) -> bool {
    value >= DIP_RANGE.0 && value <= DIP_RANGE.1
}

/// True iff `0 <= value <= 360`, checked before normalization.
///
/// `-10` and `720` normalize cleanly but usually indicate a data-entry error.
pub fn validate_azimuth_range(value: f64) -> bool {
    value >= AZIMUTH_RANGE.0 && value <= AZIMUTH_RANGE.1
}

/// Reject NaN and infinities; they are not readings, whatever the range policy.
pub fn check_finite(value: f64) -> Result<f64, CalculationInputError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalculationInputError::NonNumeric {
            value: value.to_string(),
        })
    }
}

/// Range-check a raw azimuth, returning it unchanged when valid.
///
/// Non-finite values are `NonNumeric`, never `OutOfRange`.
pub fn check_azimuth_range(value: f64) -> Result<f64, CalculationInputError> {
    check_finite(value)?;
    if validate_azimuth_range(value) {
        Ok(value)
    } else {
        Err(CalculationInputError::OutOfRange {
            value,
            min: AZIMUTH_RANGE.0,
            max: AZIMUTH_RANGE.1,
        })
    }
}

/// Range-check a dip inclination, returning it unchanged when valid.
pub fn check_dip_range(value: f64) -> Result<f64, CalculationInputError> {
    check_finite(value)?;
    if validate_dip(value) {
        Ok(value)
    } else {
        Err(CalculationInputError::OutOfRange {
            value,
            min: DIP_RANGE.0,
            max: DIP_RANGE.1,
        })
    }
}

/// Interpret an attribute value as a number.
///
/// Null and blank text are `Ok(None)`; numeric text is parsed after trimming.
/// NaN and infinities count as non-numeric.
pub fn coerce_number(value: &AttributeValue) -> Result<Option<f64>, CalculationInputError> {
    match value {
        AttributeValue::Null => Ok(None),
        AttributeValue::Number(n) if n.is_finite() => Ok(Some(*n)),
        AttributeValue::Number(n) => Err(CalculationInputError::NonNumeric {
            value: n.to_string(),
        }),
        AttributeValue::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            match trimmed.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(Some(n)),
                _ => Err(CalculationInputError::NonNumeric {
                    value: text.clone(),
                }),
            }
        }
    }
}

/// Number of decimal places applied when a value is presented or stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Precision(u32);

impl Precision {
    pub fn new(places: u32) -> Result<Self, PrecisionError> {
        if places > MAX_DECIMAL_PLACES {
            Err(PrecisionError(places))
        } else {
            Ok(Self(places))
        }
    }

    pub fn places(self) -> u32 {
        self.0
    }

    /// Round half away from zero to this many decimal places.
    pub fn apply(self, value: f64) -> f64 {
        let factor = 10f64.powi(self.0 as i32);
        (value * factor).round() / factor
    }

    /// Round an azimuth and keep it inside `[0, 360)`.
    ///
    /// 359.999 at two places rounds to 360.00, which is stored as 0.
    pub fn round_azimuth(self, azimuth: f64) -> f64 {
        normalize(self.apply(normalize(azimuth)))
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self(2)
    }
}

impl TryFrom<u32> for Precision {
    type Error = PrecisionError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Precision> for u32 {
    fn from(value: Precision) -> Self {
        value.0
    }
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which way a batch conversion goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationDirection {
    StrikeToDip,
    DipToStrike,
}

impl CalculationDirection {
    pub fn apply(self, azimuth: f64) -> f64 {
        match self {
            CalculationDirection::StrikeToDip => strike_to_dip(azimuth),
            CalculationDirection::DipToStrike => dip_to_strike(azimuth),
        }
    }

    /// Role normally read by this direction
    pub fn default_input_role(self) -> Role {
        match self {
            CalculationDirection::StrikeToDip => Role::StrikeAzimuth,
            CalculationDirection::DipToStrike => Role::DipAzimuth,
        }
    }

    /// Role normally written by this direction
    pub fn default_output_role(self) -> Role {
        match self {
            CalculationDirection::StrikeToDip => Role::DipAzimuth,
            CalculationDirection::DipToStrike => Role::StrikeAzimuth,
        }
    }
}

impl std::fmt::Display for CalculationDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalculationDirection::StrikeToDip => write!(f, "strike-to-dip"),
            CalculationDirection::DipToStrike => write!(f, "dip-to-strike"),
        }
    }
}

impl std::str::FromStr for CalculationDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "strike-to-dip" | "dip-from-strike" => Ok(CalculationDirection::StrikeToDip),
            "dip-to-strike" | "strike-from-dip" => Ok(CalculationDirection::DipToStrike),
            _ => Err(format!(
                "Invalid direction: {}. Use strike-to-dip or dip-to-strike",
                s
            )),
        }
    }
}

/// What a single measured azimuth represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AzimuthMode {
    #[default]
    Strike,
    DipDirection,
}

impl std::fmt::Display for AzimuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AzimuthMode::Strike => write!(f, "strike"),
            AzimuthMode::DipDirection => write!(f, "dip-direction"),
        }
    }
}

impl std::str::FromStr for AzimuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "strike" => Ok(AzimuthMode::Strike),
            "dip-direction" | "dip-azimuth" | "dip" => Ok(AzimuthMode::DipDirection),
            _ => Err(format!(
                "Invalid azimuth mode: {}. Use strike or dip-direction",
                s
            )),
        }
    }
}

/// Derive `(strike, dip_azimuth)` from one measured azimuth.
///
/// The correction, when given, is applied to both outputs after the conversion.
pub fn strike_and_dip(azimuth: f64, mode: AzimuthMode, correction: Option<f64>) -> (f64, f64) {
    let strike = match mode {
        AzimuthMode::Strike => normalize(azimuth),
        AzimuthMode::DipDirection => dip_to_strike(azimuth),
    };
    let dip_azimuth = strike_to_dip(strike);

    match correction {
        Some(c) => (apply_correction(strike, c), apply_correction(dip_azimuth, c)),
        None => (strike, dip_azimuth),
    }
}
