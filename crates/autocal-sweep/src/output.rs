//! RF output enable bracket.
//!
//! Output power must never stay on across a frequency or power transition.
//! [`OutputGuard`] is acquired before an attenuation pass and released after
//! it on every path. If a guard is dropped without being released (panic or
//! cancelled future) it schedules `:OUTP OFF` on the current runtime.

use autocal_core::{Advisory, InstrumentLink, SweepError, SweepResult};
use autocal_driver_anritsu::commands::{OUTPUT_OFF, OUTPUT_ON};
use std::sync::Arc;

use crate::axis::SweepAxis;

/// What the enable check decided.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputState {
    /// Both parameters were in bounds and `:OUTP ON` was sent.
    Enabled,
    /// A parameter was out of bounds; output was left off.
    Inhibited(Advisory),
}

/// Scoped RF output enable.
pub struct OutputGuard {
    link: Option<Arc<dyn InstrumentLink>>,
    state: OutputState,
}

impl OutputGuard {
    /// Re-check both source parameters against their bounds and enable the
    /// output if they are in range.
    pub async fn acquire(
        link: Arc<dyn InstrumentLink>,
        frequency: &SweepAxis,
        power: &SweepAxis,
    ) -> SweepResult<Self> {
        let f = frequency.read(link.as_ref()).await?;
        let p = power.read(link.as_ref()).await?;

        if !(frequency.limits().range().contains(f) && power.limits().range().contains(p)) {
            return Ok(Self {
                link: Some(link),
                state: OutputState::Inhibited(Advisory::OutputInhibited {
                    frequency: f,
                    power: p,
                }),
            });
        }

        // Armed before the write: if it fails midway the drop still turns
        // the output off.
        let guard = Self {
            link: Some(link.clone()),
            state: OutputState::Enabled,
        };
        link.write(OUTPUT_ON).await.map_err(SweepError::instrument)?;
        tracing::debug!(frequency = f, power = p, "RF output enabled");
        Ok(guard)
    }

    /// Decision taken at acquire time.
    pub fn state(&self) -> &OutputState {
        &self.state
    }

    /// Turn the output off and disarm the guard.
    pub async fn release(mut self) -> SweepResult<()> {
        match self.link.take() {
            Some(link) => {
                link.write(OUTPUT_OFF)
                    .await
                    .map_err(SweepError::instrument)?;
                tracing::debug!("RF output disabled");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for OutputGuard {
    fn drop(&mut self) {
        let Some(link) = self.link.take() else {
            return;
        };
        tracing::warn!("Output guard dropped without release, disabling RF output");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = link.write(OUTPUT_OFF).await {
                        tracing::error!("Error disabling RF output on drop: {:#}", e);
                    }
                });
            }
            Err(_) => tracing::error!("No runtime available to disable RF output"),
        }
    }
}
