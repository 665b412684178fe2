//! Attenuator and analog-input rig operations.
//!
//! The step attenuator and the RF switch hang off the Red Pitaya's N-side
//! digital lines; the detector voltage is read through fast analog input 1.
//! Every operation here is a single blocking round trip per variable.

use anyhow::{Context, Result};
use autocal_core::{ControlVariableStore, PvValue};
use std::sync::Arc;

use crate::pvs::{RedPitayaPvs, DIGITAL_LINES, LATCH_ENABLE_LINE, SWITCH_SELECT_LINE};

/// Position of the RF switch in front of the attenuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchPosition {
    /// Select line low
    Primary,
    /// Select line high
    Secondary,
}

impl SwitchPosition {
    fn line_state(self) -> &'static str {
        match self {
            SwitchPosition::Primary => "Low",
            SwitchPosition::Secondary => "High",
        }
    }
}

/// Handle to the attenuator rig.
#[derive(Clone)]
pub struct AttenuatorRig {
    store: Arc<dyn ControlVariableStore>,
    pvs: RedPitayaPvs,
}

impl AttenuatorRig {
    /// Create a rig handle over `store`.
    pub fn new(store: Arc<dyn ControlVariableStore>, pvs: RedPitayaPvs) -> Self {
        Self { store, pvs }
    }

    /// Variable names in use.
    pub fn pvs(&self) -> &RedPitayaPvs {
        &self.pvs
    }

    async fn put(&self, name: &str, value: impl Into<PvValue>) -> Result<()> {
        let value = value.into();
        tracing::debug!(pv = name, %value, "caput");
        self.store
            .put(name, value)
            .await
            .with_context(|| format!("Failed to write {}", name))
    }

    /// Low gain on the fast input, software-free trigger.
    pub async fn configure_analog_input(&self) -> Result<()> {
        self.put(&self.pvs.input_gain(), "Low").await?;
        self.put(&self.pvs.trigger_source(), "DISABLED").await
    }

    /// Drive all attenuator/switch lines as outputs and raise the latch enable.
    pub async fn configure_digital_lines(&self) -> Result<()> {
        for line in 0..DIGITAL_LINES {
            self.put(&self.pvs.digital_direction(line), "Output").await?;
        }
        self.put(&self.pvs.digital_state(LATCH_ENABLE_LINE), "High")
            .await
    }

    /// Route the RF path through `position`.
    pub async fn select_switch(&self, position: SwitchPosition) -> Result<()> {
        self.put(
            &self.pvs.digital_state(SWITCH_SELECT_LINE),
            position.line_state(),
        )
        .await
    }

    /// Command the attenuation set-point.
    pub async fn set_attenuation(&self, value: u32) -> Result<()> {
        self.put(self.pvs.attenuation(), value).await
    }

    /// Read the attenuation set-point back.
    pub async fn attenuation(&self) -> Result<PvValue> {
        let name = self.pvs.attenuation();
        self.store
            .get(name)
            .await
            .with_context(|| format!("Failed to read {}", name))
    }

    /// Start continuous acquisition on the fast input.
    pub async fn start_acquisition(&self) -> Result<()> {
        self.put(&self.pvs.start_acquisition(), 1u32).await
    }

    /// Stop acquisition.
    pub async fn stop_acquisition(&self) -> Result<()> {
        self.put(&self.pvs.stop_acquisition(), 1u32).await
    }

    /// Fetch the latest monitored waveform. Not validated: a stale buffer is
    /// indistinguishable from a fresh one.
    pub async fn sample_waveform(&self) -> Result<PvValue> {
        let name = self.pvs.input_monitor();
        self.store
            .get(&name)
            .await
            .with_context(|| format!("Failed to read {}", name))
    }
}
