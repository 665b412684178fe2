//! Attenuation ladder run at every (frequency, power) point.

use autocal_core::{
    InstrumentLink, LogEntry, ResultSink, SampleRecord, SweepError, SweepResult,
};
use autocal_driver_red_pitaya::AttenuatorRig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::status::StatusReport;

/// Number of attenuation set-points per pass.
pub const LADDER_STEPS: u32 = 12;
/// Attenuation change between consecutive set-points.
pub const LADDER_STRIDE: u32 = 2;

/// The fixed attenuation ladder: `0, 2, 4, ..., 22`.
pub fn attenuation_ladder() -> impl Iterator<Item = u32> {
    (0..LADDER_STEPS).map(|i| i * LADDER_STRIDE)
}

/// Settle delays around each acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleTiming {
    /// Wait after commanding a new attenuation, before sampling
    #[serde(with = "humantime_serde")]
    pub attenuation_settle: Duration,
    /// Wait after sampling, before reducing and logging
    #[serde(with = "humantime_serde")]
    pub acquisition_settle: Duration,
}

impl Default for SettleTiming {
    fn default() -> Self {
        Self {
            attenuation_settle: Duration::from_millis(1500),
            acquisition_settle: Duration::from_millis(1500),
        }
    }
}

impl SettleTiming {
    /// No settling at all, for simulated hardware.
    pub fn none() -> Self {
        Self {
            attenuation_settle: Duration::ZERO,
            acquisition_settle: Duration::ZERO,
        }
    }

    /// Total settle time spent per attenuation step.
    pub fn per_step(&self) -> Duration {
        self.attenuation_settle + self.acquisition_settle
    }
}

/// One sweep of the attenuation ladder at the current source point.
pub struct AttenuationPass<'a> {
    link: &'a dyn InstrumentLink,
    rig: &'a AttenuatorRig,
    timing: SettleTiming,
}

impl<'a> AttenuationPass<'a> {
    /// Bind a pass to the hardware it drives.
    pub fn new(link: &'a dyn InstrumentLink, rig: &'a AttenuatorRig, timing: SettleTiming) -> Self {
        Self { link, rig, timing }
    }

    /// Step the ladder, sampling and logging one record per set-point.
    ///
    /// Acquisitions are not validated. A stale or empty waveform is recorded
    /// like any other; an empty one reduces to NaN.
    pub async fn run(&self, sink: &mut dyn ResultSink) -> SweepResult<Vec<SampleRecord>> {
        let mut records = Vec::with_capacity(LADDER_STEPS as usize);

        for attenuation in attenuation_ladder() {
            self.rig
                .set_attenuation(attenuation)
                .await
                .map_err(SweepError::control_variable)?;
            tokio::time::sleep(self.timing.attenuation_settle).await;

            let waveform = self
                .rig
                .sample_waveform()
                .await
                .map_err(SweepError::control_variable)?;
            tokio::time::sleep(self.timing.acquisition_settle).await;

            let voltage = waveform.mean();
            if voltage.is_nan() {
                tracing::warn!(attenuation, "Acquisition returned no usable samples");
            }

            StatusReport::gather(self.link, self.rig, voltage)
                .await?
                .log();

            let record = SampleRecord {
                attenuation,
                voltage,
            };
            sink.append(&LogEntry::Sample(record))
                .await
                .map_err(SweepError::sink)?;
            records.push(record);
        }

        Ok(records)
    }
}
