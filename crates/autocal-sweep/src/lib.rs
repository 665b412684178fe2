//! Frequency x power x attenuation calibration sweep.
//!
//! Building blocks, leaves first:
//!
//! - [`BoundedSetting`] - write a value, read it back, compare
//! - [`SweepAxis`] - relative step plus inclusive bounds check
//! - [`AttenuationPass`] - the fixed 12-step attenuation ladder
//! - [`OutputGuard`] - RF output enable bracket around each pass
//! - [`CalibrationSweep`] - the nested traversal and its shutdown
//!
//! # Example
//!
//! ```rust,ignore
//! use autocal_sweep::{CalibrationSweep, SweepConfig, SweepContext};
//!
//! let ctx = SweepContext { link, rig, sink: Box::new(sink) };
//! let report = CalibrationSweep::new(SweepConfig::default(), ctx).run().await?;
//! println!("{}", report.transcript);
//! ```

mod attenuation;
mod axis;
mod output;
mod setting;
mod status;
mod sweep;

pub use attenuation::{attenuation_ladder, AttenuationPass, SettleTiming, LADDER_STEPS, LADDER_STRIDE};
pub use axis::{AxisStep, SweepAxis};
pub use output::{OutputGuard, OutputState};
pub use setting::{BoundedSetting, SettingOutcome};
pub use status::StatusReport;
pub use sweep::{CalibrationSweep, SweepConfig, SweepContext, SweepPhase, SweepReport};
