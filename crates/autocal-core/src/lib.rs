//! Core types and traits for the attenuator calibration sweep.
//!
//! The sweep talks to three external collaborators, each modeled here as a
//! trait so drivers and simulations can be swapped freely:
//!
//! - [`InstrumentLink`](link::InstrumentLink) - request/response channel to the
//!   microwave signal generator (SCPI).
//! - [`ControlVariableStore`](pv::ControlVariableStore) - get/put access to the
//!   named process variables of the attenuator and analog-input rig.
//! - [`ResultSink`](record::ResultSink) - append-only transcript writer.
//!
//! Fatal conditions are reported as [`SweepError`](error::SweepError); conditions
//! the sweep logs and continues past are [`Advisory`](error::Advisory) values.

pub mod error;
pub mod link;
pub mod parameter;
pub mod pv;
pub mod record;

pub use error::{Advisory, SweepError, SweepResult};
pub use link::InstrumentLink;
pub use parameter::{AxisLimits, Tolerance, ValueRange};
pub use pv::{ControlVariableStore, PvValue};
pub use record::{format_reading, LogEntry, ResultSink, SampleRecord};
