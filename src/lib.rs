//! Microwave attenuator calibration sweep.
//!
//! Drives an Anritsu MG3692C signal generator and a Red Pitaya attenuator rig
//! through a frequency x power x attenuation sweep and records the detector
//! voltage at every point to a plain-text transcript.
//!
//! The workspace crates carry the domain:
//!
//! - `autocal-core` - shared traits, values and error types
//! - `autocal-driver-anritsu` - SCPI link and simulated generator
//! - `autocal-driver-red-pitaya` - Channel Access store, simulated front end, rig
//! - `autocal-storage` - transcript sinks
//! - `autocal-sweep` - the sweep state machine
//!
//! This crate adds configuration, logging and the wiring used by the
//! `autocal` binary.

pub mod app;
pub mod config;
pub mod logging;

pub use autocal_sweep::SweepReport;
