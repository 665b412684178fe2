//! Calibration sweep orchestration.
//!
//! # State machine
//!
//! ```text
//! Init -> OutputEnableCheck -> AttenuationPass -> FrequencyStep
//!              ^                                      |  in range
//!              +--------------------------------------+
//!                                                     |  exhausted
//!                                                  PowerStep --> Done
//!              ^                                      |  in range
//!              +-------- (frequency reset) -----------+
//! ```
//!
//! Power is the outer axis and frequency the inner one. Every power level
//! sweeps the full frequency row starting at the minimum frequency, so the
//! minimum (frequency, power) point is sampled exactly once and the first
//! stepped power level is `min + increment`.
//!
//! Setting and enable-check problems are advisories: they are logged,
//! collected in the [`SweepReport`], and the sweep carries on with whatever
//! state the hardware retained. Transport failures are fatal. Either way the
//! shutdown sequence (output off, link close, acquisition stop, transcript
//! close) runs before `run` returns.

use autocal_core::{
    Advisory, AxisLimits, InstrumentLink, LogEntry, ResultSink, SweepError, SweepResult,
};
use autocal_driver_anritsu::commands::OUTPUT_OFF;
use autocal_driver_anritsu::{verify_identity, SourceAxis, EXPECTED_IDENTITY};
use autocal_driver_red_pitaya::{AttenuatorRig, SwitchPosition};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::attenuation::{AttenuationPass, SettleTiming};
use crate::axis::SweepAxis;
use crate::output::{OutputGuard, OutputState};
use crate::setting::SettingOutcome;

/// Sweep parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Inner axis
    pub frequency: AxisLimits,
    /// Outer axis
    pub power: AxisLimits,
    /// Settle delays around each acquisition
    #[serde(default)]
    pub timing: SettleTiming,
    /// Exact `*IDN?` response required before anything is written
    pub identity: String,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            frequency: AxisLimits::frequency(),
            power: AxisLimits::power(),
            timing: SettleTiming::default(),
            identity: EXPECTED_IDENTITY.to_string(),
        }
    }
}

impl SweepConfig {
    /// Validate bounds, increments and identity.
    pub fn validate(&self) -> SweepResult<()> {
        self.frequency
            .validate("frequency")
            .and_then(|_| self.power.validate("power"))
            .map_err(SweepError::Configuration)?;
        if self.identity.trim().is_empty() {
            return Err(SweepError::Configuration(
                "identity must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of (frequency, power) points the sweep will visit.
    pub fn point_count(&self) -> usize {
        self.frequency
            .point_count()
            .saturating_mul(self.power.point_count())
    }
}

/// Hardware and sink used for the duration of one sweep.
pub struct SweepContext {
    /// Signal generator
    pub link: Arc<dyn InstrumentLink>,
    /// Attenuator, switch and detector
    pub rig: AttenuatorRig,
    /// Result transcript
    pub sink: Box<dyn ResultSink>,
}

/// Phase of the sweep state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPhase {
    /// Rig setup and axis initialization
    Init,
    /// Bounds re-check and RF output enable
    OutputEnableCheck,
    /// Attenuation ladder at the current point
    AttenuationPass,
    /// Advance the inner (frequency) axis
    FrequencyStep,
    /// Advance the outer (power) axis
    PowerStep,
    /// Shutdown
    Done,
}

impl fmt::Display for SweepPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SweepPhase::Init => "init",
            SweepPhase::OutputEnableCheck => "output_enable_check",
            SweepPhase::AttenuationPass => "attenuation_pass",
            SweepPhase::FrequencyStep => "frequency_step",
            SweepPhase::PowerStep => "power_step",
            SweepPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Summary of a completed sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepReport {
    /// Distinct power levels swept
    pub power_levels: usize,
    /// (frequency, power) points at which a pass ran
    pub frequency_points: usize,
    /// Sample records written
    pub samples: usize,
    /// Non-fatal conditions, in the order they occurred
    pub advisories: Vec<Advisory>,
    /// Full transcript read back after closing the sink
    pub transcript: String,
}

/// The frequency x power x attenuation calibration sweep.
pub struct CalibrationSweep {
    config: SweepConfig,
    ctx: SweepContext,
    frequency: SweepAxis,
    power: SweepAxis,
    phase: SweepPhase,
    advisories: Vec<Advisory>,
    power_levels: usize,
    points: usize,
    samples: usize,
}

impl CalibrationSweep {
    /// Prepare a sweep. Nothing is sent to the hardware until [`run`](Self::run).
    pub fn new(config: SweepConfig, ctx: SweepContext) -> Self {
        let frequency = SweepAxis::new(SourceAxis::Frequency, config.frequency);
        let power = SweepAxis::new(SourceAxis::Power, config.power);
        Self {
            config,
            ctx,
            frequency,
            power,
            phase: SweepPhase::Init,
            advisories: Vec::new(),
            power_levels: 0,
            points: 0,
            samples: 0,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> SweepPhase {
        self.phase
    }

    /// Run the sweep to completion.
    ///
    /// The instrument identity is verified before any generator or control
    /// variable write; on mismatch nothing is touched and
    /// [`SweepError::ConnectionIdentity`] is returned.
    pub async fn run(mut self) -> SweepResult<SweepReport> {
        self.config.validate()?;

        if let Err(e) = verify_identity(self.ctx.link.as_ref(), &self.config.identity).await {
            if let Err(close) = self.ctx.link.close().await {
                tracing::warn!("Error closing instrument link: {:#}", close);
            }
            return Err(e);
        }

        let outcome = self.execute().await;
        let shutdown = self.shutdown().await;

        let transcript = match (outcome, shutdown) {
            (Ok(()), Ok(transcript)) => transcript,
            (Ok(()), Err(e)) => return Err(e),
            (Err(e), shutdown) => {
                if let Err(secondary) = shutdown {
                    tracing::error!("Shutdown after failed sweep also failed: {}", secondary);
                }
                return Err(e);
            }
        };

        tracing::info!(
            power_levels = self.power_levels,
            points = self.points,
            samples = self.samples,
            advisories = self.advisories.len(),
            "Calibration sweep complete"
        );

        Ok(SweepReport {
            power_levels: self.power_levels,
            frequency_points: self.points,
            samples: self.samples,
            advisories: self.advisories,
            transcript,
        })
    }

    fn enter(&mut self, phase: SweepPhase) {
        tracing::trace!(from = %self.phase, to = %phase, "Sweep phase");
        self.phase = phase;
    }

    fn note(&mut self, outcome: SettingOutcome) {
        if let SettingOutcome::Rejected(advisory) = outcome {
            self.advise(advisory);
        }
    }

    fn advise(&mut self, advisory: Advisory) {
        tracing::warn!(kind = advisory.kind(), "{}", advisory);
        self.advisories.push(advisory);
    }

    async fn append(&mut self, entry: LogEntry) -> SweepResult<()> {
        self.ctx
            .sink
            .append(&entry)
            .await
            .map_err(SweepError::sink)
    }

    async fn execute(&mut self) -> SweepResult<()> {
        self.enter(SweepPhase::Init);
        self.initialize().await?;

        loop {
            self.power_levels += 1;
            let power = self.power.read(self.ctx.link.as_ref()).await?;
            tracing::info!(power, level = self.power_levels, "Sweeping power level");
            self.append(LogEntry::Power(power)).await?;

            self.frequency_row().await?;

            let outcome = self.frequency.initialize(self.ctx.link.as_ref()).await?;
            self.note(outcome);

            self.enter(SweepPhase::PowerStep);
            if !self.power.step(self.ctx.link.as_ref()).await?.in_range() {
                break;
            }
        }
        Ok(())
    }

    async fn initialize(&mut self) -> SweepResult<()> {
        let rig = self.ctx.rig.clone();
        let link = self.ctx.link.clone();

        rig.configure_analog_input()
            .await
            .map_err(SweepError::control_variable)?;
        rig.configure_digital_lines()
            .await
            .map_err(SweepError::control_variable)?;
        rig.select_switch(SwitchPosition::Primary)
            .await
            .map_err(SweepError::control_variable)?;
        rig.set_attenuation(0)
            .await
            .map_err(SweepError::control_variable)?;

        for axis in [self.frequency, self.power] {
            let outcome = axis.initialize(link.as_ref()).await?;
            self.note(outcome);
        }
        for axis in [self.frequency, self.power] {
            let outcome = axis.configure_increment(link.as_ref()).await?;
            self.note(outcome);
        }

        rig.start_acquisition()
            .await
            .map_err(SweepError::control_variable)?;
        tracing::info!(
            points = self.config.point_count(),
            "Rig configured, acquisition started"
        );
        Ok(())
    }

    /// Run passes at every frequency of the current power level.
    async fn frequency_row(&mut self) -> SweepResult<()> {
        loop {
            let frequency = self.frequency.read(self.ctx.link.as_ref()).await?;
            self.append(LogEntry::Frequency(frequency)).await?;
            self.append(LogEntry::ColumnHeader).await?;

            self.bracketed_pass().await?;

            self.enter(SweepPhase::FrequencyStep);
            if !self.frequency.step(self.ctx.link.as_ref()).await?.in_range() {
                return Ok(());
            }
        }
    }

    async fn bracketed_pass(&mut self) -> SweepResult<()> {
        self.enter(SweepPhase::OutputEnableCheck);
        let guard =
            OutputGuard::acquire(self.ctx.link.clone(), &self.frequency, &self.power).await?;
        if let OutputState::Inhibited(advisory) = guard.state() {
            self.advise(advisory.clone());
        }

        self.enter(SweepPhase::AttenuationPass);
        let pass = AttenuationPass::new(self.ctx.link.as_ref(), &self.ctx.rig, self.config.timing)
            .run(self.ctx.sink.as_mut())
            .await;
        let released = guard.release().await;

        let records = pass?;
        released?;
        self.points += 1;
        self.samples += records.len();
        Ok(())
    }

    /// Best-effort shutdown. Every step is attempted; the first failure is
    /// returned, otherwise the transcript.
    async fn shutdown(&mut self) -> SweepResult<String> {
        self.enter(SweepPhase::Done);
        let mut first_error: Option<SweepError> = None;
        let mut record = |result: SweepResult<()>| {
            if let Err(e) = result {
                tracing::error!("Shutdown step failed: {}", e);
                first_error.get_or_insert(e);
            }
        };

        record(
            self.ctx
                .link
                .write(OUTPUT_OFF)
                .await
                .map_err(SweepError::instrument),
        );
        record(self.ctx.link.close().await.map_err(SweepError::instrument));
        record(
            self.ctx
                .rig
                .stop_acquisition()
                .await
                .map_err(SweepError::control_variable),
        );
        record(self.ctx.sink.close().await.map_err(SweepError::sink));

        if let Some(e) = first_error {
            return Err(e);
        }
        self.ctx.sink.transcript().await.map_err(SweepError::sink)
    }
}
