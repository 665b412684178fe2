//! Swept instrument parameters: bounds, increments and read-back comparison.
//!
//! The sweep never trusts a write. Every commanded value is read back from
//! the instrument and compared with the value that was written, using the
//! [`Tolerance`] configured for that parameter.

use serde::{Deserialize, Serialize};

/// Inclusive value range `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    /// Inclusive lower bound
    pub min: f64,
    /// Inclusive upper bound
    pub max: f64,
}

impl ValueRange {
    /// Create a new range.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Returns true if `value` lies in `[min, max]`. NaN is never contained.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// How a read-back value is compared against the value that was written.
///
/// Instruments report set-points with their own resolution, so exact float
/// equality is not always appropriate. The comparison is an explicit
/// per-parameter setting rather than an implicit convention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tolerance {
    /// Bit-exact equality
    #[default]
    Exact,
    /// `|read_back - expected| <= epsilon`
    Absolute(f64),
    /// The read-back truncated toward zero must equal the expected value.
    ///
    /// Legacy integer comparison. Only targets with no fractional part can
    /// ever verify under this mode.
    Truncated,
}

impl Tolerance {
    /// Returns true if `read_back` is an acceptable echo of `expected`.
    pub fn matches(&self, expected: f64, read_back: f64) -> bool {
        match *self {
            Tolerance::Exact => read_back == expected,
            Tolerance::Absolute(epsilon) => (read_back - expected).abs() <= epsilon,
            Tolerance::Truncated => read_back.trunc() == expected,
        }
    }
}

/// Bounds, increment and comparison rule for one swept parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisLimits {
    /// Inclusive lower bound (also the sweep start)
    pub min: f64,
    /// Inclusive upper bound
    pub max: f64,
    /// Step applied by each relative "step up" command
    pub increment: f64,
    /// Read-back comparison used when setting the value or the increment
    #[serde(default)]
    pub tolerance: Tolerance,
}

impl AxisLimits {
    /// Frequency axis: 15.5 GHz to 16.5 GHz in 200 MHz steps, exact read-back.
    pub fn frequency() -> Self {
        Self {
            min: 15_500_000_000.0,
            max: 16_500_000_000.0,
            increment: 200_000_000.0,
            tolerance: Tolerance::Exact,
        }
    }

    /// Power axis: -20 dBm to -14.5 dBm in 0.5 dB steps, 5 mdB read-back tolerance.
    pub fn power() -> Self {
        Self {
            min: -20.0,
            max: -14.5,
            increment: 0.5,
            tolerance: Tolerance::Absolute(0.005),
        }
    }

    /// Inclusive value range of the axis.
    pub fn range(&self) -> ValueRange {
        ValueRange::new(self.min, self.max)
    }

    /// Number of distinct points visited when stepping from `min` by
    /// `increment` until the value leaves the range.
    ///
    /// Saturates at `usize::MAX` when the increment is too small for the span.
    pub fn point_count(&self) -> usize {
        let span = (self.max - self.min) / self.increment;
        // Absorb float noise so an exact multiple does not gain a point.
        ((span + 1e-9).floor() as usize).saturating_add(1)
    }

    /// Check bounds and increment for semantic validity.
    pub fn validate(&self, name: &str) -> Result<(), String> {
        if !self.min.is_finite() || !self.max.is_finite() || !self.increment.is_finite() {
            return Err(format!("{name}: bounds and increment must be finite"));
        }
        if self.min > self.max {
            return Err(format!(
                "{name}: min {} is greater than max {}",
                self.min, self.max
            ));
        }
        if self.increment <= 0.0 {
            return Err(format!(
                "{name}: increment must be positive, got {}",
                self.increment
            ));
        }
        if let Tolerance::Absolute(epsilon) = self.tolerance {
            if !(epsilon >= 0.0 && epsilon.is_finite()) {
                return Err(format!(
                    "{name}: tolerance must be a finite non-negative number, got {epsilon}"
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_is_inclusive() {
        let range = ValueRange::new(-20.0, -14.5);
        assert!(range.contains(-20.0));
        assert!(range.contains(-14.5));
        assert!(range.contains(-17.0));
        assert!(!range.contains(-14.0));
        assert!(!range.contains(-20.5));
        assert!(!range.contains(f64::NAN));
    }

    #[test]
    fn test_tolerance_modes() {
        assert!(Tolerance::Exact.matches(15.5e9, 15.5e9));
        assert!(!Tolerance::Exact.matches(15.5e9, 15.5e9 + 1.0));

        assert!(Tolerance::Absolute(0.005).matches(-19.5, -19.501));
        assert!(!Tolerance::Absolute(0.005).matches(-19.5, -19.4));

        assert!(Tolerance::Truncated.matches(-20.0, -20.0));
        assert!(Tolerance::Truncated.matches(-20.0, -20.4));
        // A half-dB target can never verify with integer truncation
        assert!(!Tolerance::Truncated.matches(-19.5, -19.5));
    }

    #[test]
    fn test_default_point_counts() {
        assert_eq!(AxisLimits::frequency().point_count(), 6);
        assert_eq!(AxisLimits::power().point_count(), 12);
    }

    #[test]
    fn test_point_count_saturates_on_tiny_increment() {
        let limits = AxisLimits {
            increment: 1e-300,
            ..AxisLimits::frequency()
        };
        assert!(limits.validate("frequency").is_ok());
        assert_eq!(limits.point_count(), usize::MAX);
    }

    #[test]
    fn test_point_count_non_multiple_span() {
        let limits = AxisLimits {
            min: 0.0,
            max: 1.0,
            increment: 0.3,
            tolerance: Tolerance::Exact,
        };
        // 0.0, 0.3, 0.6, 0.9
        assert_eq!(limits.point_count(), 4);
    }

    #[test]
    fn test_validate_rejects_bad_limits() {
        assert!(AxisLimits::frequency().validate("frequency").is_ok());

        let inverted = AxisLimits {
            min: 2.0,
            max: 1.0,
            ..AxisLimits::power()
        };
        assert!(inverted.validate("power").is_err());

        let zero_step = AxisLimits {
            increment: 0.0,
            ..AxisLimits::power()
        };
        assert!(zero_step.validate("power").is_err());

        let negative_tolerance = AxisLimits {
            tolerance: Tolerance::Absolute(-1.0),
            ..AxisLimits::power()
        };
        assert!(negative_tolerance.validate("power").is_err());
    }
}
