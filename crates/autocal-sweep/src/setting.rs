//! Set-and-verify primitive for bounded instrument parameters.

use autocal_core::{Advisory, InstrumentLink, SweepError, SweepResult, Tolerance, ValueRange};
use autocal_driver_anritsu::ScpiSetting;

/// Result of a single set-and-verify attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingOutcome {
    /// The instrument echoed the target within tolerance.
    Verified(f64),
    /// The target was refused or did not verify. The instrument keeps
    /// whatever value it ended up with.
    Rejected(Advisory),
}

impl SettingOutcome {
    /// True if the value verified.
    pub fn is_verified(&self) -> bool {
        matches!(self, SettingOutcome::Verified(_))
    }

    /// The advisory, if the setting was rejected.
    pub fn advisory(&self) -> Option<&Advisory> {
        match self {
            SettingOutcome::Verified(_) => None,
            SettingOutcome::Rejected(advisory) => Some(advisory),
        }
    }
}

/// A scalar instrument setting with an inclusive valid range.
///
/// One attempt per call: no retries. A target outside the range is refused
/// without touching the instrument; otherwise exactly one write and one
/// read-back query are issued.
#[derive(Debug, Clone, Copy)]
pub struct BoundedSetting {
    setting: ScpiSetting,
    range: ValueRange,
    tolerance: Tolerance,
}

impl BoundedSetting {
    /// Create a bounded setting.
    pub fn new(setting: ScpiSetting, range: ValueRange, tolerance: Tolerance) -> Self {
        Self {
            setting,
            range,
            tolerance,
        }
    }

    /// Valid range of the setting.
    pub fn range(&self) -> ValueRange {
        self.range
    }

    /// Write `target` and confirm the instrument reads it back.
    ///
    /// Transport failures are fatal. An out-of-range target, an unparsable
    /// read-back or a mismatching read-back is returned as
    /// [`SettingOutcome::Rejected`].
    pub async fn initialize(
        &self,
        link: &dyn InstrumentLink,
        target: f64,
    ) -> SweepResult<SettingOutcome> {
        if !self.range.contains(target) {
            return Ok(SettingOutcome::Rejected(Advisory::OutOfRange {
                parameter: self.setting.label.to_string(),
                requested: target,
                min: self.range.min,
                max: self.range.max,
            }));
        }

        link.write(&self.setting.write_command(target))
            .await
            .map_err(SweepError::instrument)?;
        let raw = link
            .query(&self.setting.query())
            .await
            .map_err(SweepError::instrument)?;

        let verified = raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|read_back| self.tolerance.matches(target, *read_back));

        match verified {
            Some(read_back) => {
                tracing::debug!(parameter = self.setting.label, target, read_back, "Setting verified");
                Ok(SettingOutcome::Verified(read_back))
            }
            None => Ok(SettingOutcome::Rejected(Advisory::Verification {
                parameter: self.setting.label.to_string(),
                expected: target,
                read_back: raw,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autocal_driver_anritsu::{MockSignalGenerator, SourceAxis};

    fn power_setting() -> BoundedSetting {
        BoundedSetting::new(
            SourceAxis::Power.level(),
            ValueRange::new(-20.0, -14.5),
            Tolerance::Absolute(0.005),
        )
    }

    #[tokio::test]
    async fn test_out_of_range_issues_no_write() {
        let generator = MockSignalGenerator::new();
        let setting = power_setting();

        for target in [-20.5, -14.0, 0.0, f64::NAN] {
            let outcome = setting.initialize(&generator, target).await.unwrap();
            assert_eq!(outcome.advisory().map(Advisory::kind), Some("out_of_range"));
        }
        assert!(generator.writes().await.is_empty());
    }

    #[tokio::test]
    async fn test_valid_target_is_one_write_one_read() {
        // Fault on the second query: a second read would fail the call.
        let generator = MockSignalGenerator::new().with_query_fault_after(1);
        let outcome = power_setting().initialize(&generator, -17.5).await.unwrap();

        assert_eq!(outcome, SettingOutcome::Verified(-17.5));
        assert_eq!(generator.writes().await, vec![":POW -17.5dBm"]);
    }

    #[tokio::test]
    async fn test_bounds_are_inclusive() {
        let generator = MockSignalGenerator::new();
        let setting = power_setting();
        assert!(setting.initialize(&generator, -20.0).await.unwrap().is_verified());
        assert!(setting.initialize(&generator, -14.5).await.unwrap().is_verified());
    }

    #[tokio::test]
    async fn test_mismatch_surfaces_raw_read_back() {
        let generator = MockSignalGenerator::new().with_readback_offset(SourceAxis::Power, 0.25);
        let outcome = power_setting().initialize(&generator, -20.0).await.unwrap();

        assert_eq!(
            outcome,
            SettingOutcome::Rejected(Advisory::Verification {
                parameter: "power".into(),
                expected: -20.0,
                read_back: "-19.75".into(),
            })
        );
    }

    #[tokio::test]
    async fn test_truncated_tolerance_rejects_half_steps() {
        let generator = MockSignalGenerator::new();
        let legacy = BoundedSetting::new(
            SourceAxis::Power.level(),
            ValueRange::new(-20.0, -14.5),
            Tolerance::Truncated,
        );
        assert!(legacy.initialize(&generator, -20.0).await.unwrap().is_verified());
        assert!(!legacy.initialize(&generator, -19.5).await.unwrap().is_verified());
    }

    #[tokio::test]
    async fn test_transport_failure_is_fatal() {
        let generator = MockSignalGenerator::new().with_query_fault_after(0);
        let err = power_setting().initialize(&generator, -18.0).await.unwrap_err();
        assert!(matches!(err, SweepError::Instrument(_)));
    }

    #[tokio::test]
    async fn test_reinitialize_is_idempotent() {
        let generator = MockSignalGenerator::new();
        let setting = power_setting();
        let first = setting.initialize(&generator, -20.0).await.unwrap();
        let second = setting.initialize(&generator, -20.0).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(generator.power().await, -20.0);
    }
}
