//! Red Pitaya attenuator rig driver.
//!
//! The rig (step attenuator, RF switch and detector on fast analog input 1)
//! is controlled through process variables served by the Red Pitaya's EPICS
//! IOC.
//!
//! - [`ChannelAccessCli`] - real transport via `caget`/`caput`
//! - [`MockRedPitaya`] - simulated front end for tests and dry runs
//! - [`AttenuatorRig`] - typed rig operations over either store
//!
//! # Mock Mode
//!
//! Set `backend = "mock"` in the `[control]` configuration section to run
//! against the simulated front end.

mod ca_tools;
mod config;
mod mock;
pub mod pvs;
mod rig;

pub use ca_tools::{parse_caget_reply, ChannelAccessCli};
pub use config::{ControlBackend, ControlConfig};
pub use mock::MockRedPitaya;
pub use pvs::RedPitayaPvs;
pub use rig::{AttenuatorRig, SwitchPosition};

use autocal_core::ControlVariableStore;
use std::sync::Arc;

/// Build the control-variable store selected by `config`.
pub fn open_store(config: &ControlConfig) -> Arc<dyn ControlVariableStore> {
    match config.backend {
        ControlBackend::CaTools => {
            tracing::info!(prefix = %config.prefix, "Using EPICS Channel Access tools");
            Arc::new(ChannelAccessCli::new(config.ca_timeout))
        }
        ControlBackend::Mock => {
            tracing::info!(prefix = %config.prefix, "Using simulated Red Pitaya front end");
            Arc::new(MockRedPitaya::new(pvs_for(config), config.mock_seed))
        }
    }
}

/// Variable names described by `config`.
pub fn pvs_for(config: &ControlConfig) -> RedPitayaPvs {
    RedPitayaPvs::new(config.prefix.clone(), config.attenuation_pv.clone())
}
