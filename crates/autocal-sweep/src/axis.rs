//! Step-and-check-bounds traversal of one source parameter.

use autocal_core::{AxisLimits, InstrumentLink, SweepError, SweepResult, ValueRange};
use autocal_driver_anritsu::SourceAxis;

use crate::setting::{BoundedSetting, SettingOutcome};

/// Outcome of a relative step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisStep {
    /// The new read-back lies in `[min, max]`; keep sweeping.
    Advanced(f64),
    /// The new read-back left the range; the axis is exhausted.
    Exhausted(f64),
}

impl AxisStep {
    /// True while the axis should keep advancing.
    pub fn in_range(&self) -> bool {
        matches!(self, AxisStep::Advanced(_))
    }

    /// Value read back after the step.
    pub fn value(&self) -> f64 {
        match *self {
            AxisStep::Advanced(v) | AxisStep::Exhausted(v) => v,
        }
    }
}

/// A source parameter swept from `min` upward by a fixed increment.
#[derive(Debug, Clone, Copy)]
pub struct SweepAxis {
    axis: SourceAxis,
    limits: AxisLimits,
}

impl SweepAxis {
    /// Create an axis.
    pub fn new(axis: SourceAxis, limits: AxisLimits) -> Self {
        Self { axis, limits }
    }

    /// Which source parameter this axis drives.
    pub fn axis(&self) -> SourceAxis {
        self.axis
    }

    /// Bounds, increment and tolerance.
    pub fn limits(&self) -> &AxisLimits {
        &self.limits
    }

    /// Set the parameter to the axis minimum and verify it.
    pub async fn initialize(&self, link: &dyn InstrumentLink) -> SweepResult<SettingOutcome> {
        BoundedSetting::new(self.axis.level(), self.limits.range(), self.limits.tolerance)
            .initialize(link, self.limits.min)
            .await
    }

    /// Program the instrument step size and verify it echoes back.
    pub async fn configure_increment(
        &self,
        link: &dyn InstrumentLink,
    ) -> SweepResult<SettingOutcome> {
        // Any positive increment is acceptable to the sweep itself.
        let range = ValueRange::new(f64::MIN_POSITIVE, f64::INFINITY);
        BoundedSetting::new(self.axis.step_size(), range, self.limits.tolerance)
            .initialize(link, self.limits.increment)
            .await
    }

    /// Advance by the configured increment and report whether the new value
    /// is still in `[min, max]`. Both bounds are inclusive.
    ///
    /// An unreadable position after the step is fatal.
    pub async fn step(&self, link: &dyn InstrumentLink) -> SweepResult<AxisStep> {
        link.write(self.axis.step_up())
            .await
            .map_err(SweepError::instrument)?;
        let value = self.read(link).await?;

        if self.limits.range().contains(value) {
            Ok(AxisStep::Advanced(value))
        } else {
            tracing::debug!(axis = self.axis.label(), value, "Axis left its range");
            Ok(AxisStep::Exhausted(value))
        }
    }

    /// Query the current value.
    pub async fn read(&self, link: &dyn InstrumentLink) -> SweepResult<f64> {
        link.query_f64(&self.axis.level().query())
            .await
            .map_err(SweepError::instrument)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autocal_core::Tolerance;
    use autocal_driver_anritsu::MockSignalGenerator;

    fn power_axis() -> SweepAxis {
        SweepAxis::new(SourceAxis::Power, AxisLimits::power())
    }

    #[tokio::test]
    async fn test_step_walks_to_max_inclusive() {
        let generator = MockSignalGenerator::new();
        let axis = power_axis();
        assert!(axis.initialize(&generator).await.unwrap().is_verified());
        assert!(axis.configure_increment(&generator).await.unwrap().is_verified());

        let mut visited = vec![axis.read(&generator).await.unwrap()];
        loop {
            let step = axis.step(&generator).await.unwrap();
            if !step.in_range() {
                assert_eq!(step, AxisStep::Exhausted(-14.0));
                break;
            }
            visited.push(step.value());
        }

        assert_eq!(visited.len(), 12);
        assert_eq!(visited.first(), Some(&-20.0));
        assert_eq!(visited.last(), Some(&-14.5));
    }

    #[tokio::test]
    async fn test_step_below_min_is_exhausted() {
        let generator = MockSignalGenerator::new();
        generator.write(":POW -25dBm").await.unwrap();
        generator.write(":POW:STEP 0.5 dBm").await.unwrap();
        assert_eq!(
            power_axis().step(&generator).await.unwrap(),
            AxisStep::Exhausted(-24.5)
        );
    }

    #[tokio::test]
    async fn test_frequency_increment_verifies_exactly() {
        let generator = MockSignalGenerator::new();
        let axis = SweepAxis::new(SourceAxis::Frequency, AxisLimits::frequency());
        let outcome = axis.configure_increment(&generator).await.unwrap();

        assert_eq!(outcome, SettingOutcome::Verified(2.0e8));
        assert_eq!(generator.writes().await, vec![":FREQ:STEP 200000000"]);
    }

    #[tokio::test]
    async fn test_initialize_twice_gives_same_value() {
        let generator = MockSignalGenerator::new();
        let axis = SweepAxis::new(
            SourceAxis::Frequency,
            AxisLimits {
                tolerance: Tolerance::Exact,
                ..AxisLimits::frequency()
            },
        );
        let first = axis.initialize(&generator).await.unwrap();
        let second = axis.initialize(&generator).await.unwrap();
        assert_eq!(first, SettingOutcome::Verified(15.5e9));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unreadable_position_is_fatal() {
        // Allow nothing: the read after the step fails.
        let generator = MockSignalGenerator::new().with_query_fault_after(0);
        assert!(matches!(
            power_axis().step(&generator).await,
            Err(SweepError::Instrument(_))
        ));
    }
}
