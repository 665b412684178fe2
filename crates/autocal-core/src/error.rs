//! Error and advisory types for the calibration sweep.
//!
//! The sweep distinguishes two outcome kinds:
//!
//! - **`SweepError`**: fatal. The sweep stops, performs its best-effort shutdown
//!   and hands the error back to the caller. The only fatal condition that can
//!   occur before any hardware state is touched is `ConnectionIdentity`.
//! - **`Advisory`**: non-fatal. A setting that could not be applied or verified,
//!   or an output enable that was withheld. The sweep logs it, records it in the
//!   report, and continues with whatever state the hardware retained.
//!
//! Driver-level code works with `anyhow::Result`; the helpers on `SweepError`
//! fold those errors into the category of the collaborator they came from.

use thiserror::Error;

/// Convenience alias for results carrying a fatal sweep error.
pub type SweepResult<T> = std::result::Result<T, SweepError>;

/// Fatal sweep conditions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SweepError {
    /// The signal generator answered `*IDN?` with something other than the
    /// expected model/firmware string.
    ///
    /// Raised before any write to the generator or the control variables.
    #[error("unexpected instrument identity: expected {expected:?}, received {received:?}")]
    ConnectionIdentity {
        /// Identity string the sweep was configured for
        expected: String,
        /// Identity string the instrument returned (trimmed)
        received: String,
    },

    /// Transport or protocol failure on the instrument link.
    #[error("instrument link error: {0}")]
    Instrument(String),

    /// Failure reading or writing a process control variable.
    #[error("control variable error: {0}")]
    ControlVariable(String),

    /// Failure appending to, closing, or reading back the result transcript.
    #[error("result sink error: {0}")]
    Sink(String),

    /// Configuration values that fail semantic validation.
    #[error("configuration validation error: {0}")]
    Configuration(String),
}

impl SweepError {
    /// Wrap an instrument link error, keeping the full context chain.
    pub fn instrument(err: anyhow::Error) -> Self {
        Self::Instrument(format!("{err:#}"))
    }

    /// Wrap a control variable store error.
    pub fn control_variable(err: anyhow::Error) -> Self {
        Self::ControlVariable(format!("{err:#}"))
    }

    /// Wrap a result sink error.
    pub fn sink(err: anyhow::Error) -> Self {
        Self::Sink(format!("{err:#}"))
    }
}

/// Non-fatal conditions recorded during a sweep.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Advisory {
    /// A requested value lies outside the inclusive bounds; nothing was written.
    #[error("invalid {parameter} range: {requested} outside [{min}, {max}]")]
    OutOfRange {
        /// Parameter label (e.g. "frequency")
        parameter: String,
        /// Value that was requested
        requested: f64,
        /// Inclusive lower bound
        min: f64,
        /// Inclusive upper bound
        max: f64,
    },

    /// The instrument did not read back the value that was written.
    #[error("failed to set correct {parameter}: wrote {expected}, read back {read_back:?}")]
    Verification {
        /// Parameter label
        parameter: String,
        /// Value that was written
        expected: f64,
        /// Raw read-back text, for diagnostics
        read_back: String,
    },

    /// Output enable was withheld because the current point lies outside the
    /// sweep bounds. The attenuation pass still runs with output off.
    #[error("output not enabled: frequency {frequency} / power {power} outside sweep bounds")]
    OutputInhibited {
        /// Frequency read back at the time of the check
        frequency: f64,
        /// Power read back at the time of the check
        power: f64,
    },
}

impl Advisory {
    /// Short machine-friendly label for the advisory kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Advisory::OutOfRange { .. } => "out_of_range",
            Advisory::Verification { .. } => "verification",
            Advisory::OutputInhibited { .. } => "output_inhibited",
        }
    }
}
