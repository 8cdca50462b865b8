//! Bounded confidence value
//!
//! Confidence is a newtype wrapper around f64 that enforces bounds [0.0, 1.0]
//! and rejects NaN values. Raw readings from the confidence feed may arrive
//! either as fractions or as percentages; [`ConfidenceScale`] decides how a
//! reading is interpreted before it becomes a `Confidence`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bounded confidence value [0.0, 1.0]
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Confidence(f64);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfidenceError {
    #[error("Confidence value cannot be NaN")]
    NaN,

    #[error("Confidence out of bounds: {value} (must be {min} to {max})")]
    OutOfBounds { value: f64, min: f64, max: f64 },
}

impl Confidence {
    const MIN: f64 = 0.0;
    const MAX: f64 = 1.0;

    /// No belief at all. Unlinked tasks derive their priority from this.
    pub const ZERO: Confidence = Confidence(0.0);

    /// Level at which a hypothesis counts as established for graduation
    pub const ESTABLISHED: Confidence = Confidence(0.75);

    /// Create a new confidence value from a fraction
    ///
    /// # Errors
    /// - Returns `ConfidenceError::NaN` if value is NaN
    /// - Returns `ConfidenceError::OutOfBounds` if value < 0.0 or > 1.0
    pub fn new(value: f64) -> Result<Self, ConfidenceError> {
        check_range(value, Self::MIN, Self::MAX)?;
        Ok(Self(value))
    }

    /// Create a confidence value from a percentage in [0, 100]
    pub fn from_percent(percent: f64) -> Result<Self, ConfidenceError> {
        check_range(percent, 0.0, 100.0)?;
        Ok(Self(percent / 100.0))
    }

    /// Get the underlying fraction
    pub const fn get(self) -> f64 {
        self.0
    }

    /// The confidence expressed as a percentage
    pub fn percent(self) -> f64 {
        self.0 * 100.0
    }
}

impl TryFrom<f64> for Confidence {
    type Error = ConfidenceError;
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(confidence: Confidence) -> Self {
        confidence.0
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::ZERO
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0}%", self.percent())
    }
}

fn check_range(value: f64, min: f64, max: f64) -> Result<(), ConfidenceError> {
    if value.is_nan() {
        return Err(ConfidenceError::NaN);
    }
    if value < min || value > max {
        return Err(ConfidenceError::OutOfBounds { value, min, max });
    }
    Ok(())
}

/// How raw confidence readings are interpreted
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceScale {
    /// Readings above 1 are percentages, everything else is a fraction.
    ///
    /// A reading of exactly `1` is therefore 100%, never 1%.
    #[default]
    Auto,
    /// Readings must be fractions in [0, 1]
    Fraction,
    /// Readings must be percentages in [0, 100]
    Percent,
}

impl ConfidenceScale {
    /// Normalize a raw reading into a `Confidence`
    pub fn normalize(self, raw: f64) -> Result<Confidence, ConfidenceError> {
        match self {
            ConfidenceScale::Auto if raw > 1.0 => Confidence::from_percent(raw),
            ConfidenceScale::Auto | ConfidenceScale::Fraction => Confidence::new(raw),
            ConfidenceScale::Percent => Confidence::from_percent(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_valid() {
        assert!(Confidence::new(0.0).is_ok());
        assert!(Confidence::new(0.5).is_ok());
        assert!(Confidence::new(1.0).is_ok());
    }

    #[test]
    fn test_confidence_rejects_nan() {
        assert!(matches!(Confidence::new(f64::NAN), Err(ConfidenceError::NaN)));
    }

    #[test]
    fn test_confidence_rejects_out_of_bounds() {
        assert!(Confidence::new(-0.1).is_err());
        assert!(Confidence::new(1.1).is_err());
        assert!(Confidence::from_percent(100.5).is_err());
        assert!(Confidence::from_percent(-1.0).is_err());
    }

    #[test]
    fn test_from_percent() {
        let c = Confidence::from_percent(80.0).unwrap();
        assert_eq!(c.get(), 0.8);
        assert_eq!(c.to_string(), "80%");
    }

    #[test]
    fn test_auto_scale_treats_one_as_full_confidence() {
        let c = ConfidenceScale::Auto.normalize(1.0).unwrap();
        assert_eq!(c.percent(), 100.0);
    }

    #[test]
    fn test_auto_scale_detects_percentages() {
        assert_eq!(ConfidenceScale::Auto.normalize(40.0).unwrap().get(), 0.4);
        assert_eq!(ConfidenceScale::Auto.normalize(0.4).unwrap().get(), 0.4);
        assert!(ConfidenceScale::Auto.normalize(140.0).is_err());
        assert!(ConfidenceScale::Auto.normalize(-0.2).is_err());
    }

    #[test]
    fn test_explicit_scales_reject_the_other_convention() {
        assert!(ConfidenceScale::Fraction.normalize(40.0).is_err());
        assert_eq!(ConfidenceScale::Percent.normalize(1.0).unwrap().get(), 0.01);
    }

    #[test]
    fn test_deserialize_validates_bounds() {
        let ok: Confidence = serde_json::from_str("0.25").unwrap();
        assert_eq!(ok.get(), 0.25);
        assert!(serde_json::from_str::<Confidence>("1.5").is_err());
    }

    #[test]
    fn test_scale_deserializes_lowercase() {
        let scale: ConfidenceScale = serde_json::from_str("\"percent\"").unwrap();
        assert_eq!(scale, ConfidenceScale::Percent);
    }
}
