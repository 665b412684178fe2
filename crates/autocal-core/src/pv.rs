//! Named process control variables.
//!
//! The attenuator, RF switch and fast analog input of the rig are driven
//! through named process variables (EPICS PVs on the real hardware). Values
//! are loosely typed: enum-like commands travel as text, set-points as
//! numbers, and the analog monitor returns a waveform.

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

/// Value carried by a process variable.
#[derive(Debug, Clone, PartialEq)]
pub enum PvValue {
    /// Scalar numeric value
    Number(f64),
    /// Enum or string value (e.g. "Low", "Output")
    Text(String),
    /// Waveform value
    Array(Vec<f64>),
}

impl PvValue {
    /// Arithmetic mean of the value.
    ///
    /// A waveform reduces to the mean of its samples, a number to itself and
    /// numeric text to its parsed value. Empty waveforms and non-numeric text
    /// yield NaN.
    pub fn mean(&self) -> f64 {
        match self {
            PvValue::Number(v) => *v,
            PvValue::Text(s) => s.trim().parse().unwrap_or(f64::NAN),
            PvValue::Array(samples) if samples.is_empty() => f64::NAN,
            PvValue::Array(samples) => samples.iter().sum::<f64>() / samples.len() as f64,
        }
    }

    /// Numeric view of a scalar value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PvValue::Number(v) => Some(*v),
            PvValue::Text(s) => s.trim().parse().ok(),
            PvValue::Array(_) => None,
        }
    }
}

impl fmt::Display for PvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PvValue::Number(v) => write!(f, "{}", v),
            PvValue::Text(s) => f.write_str(s),
            PvValue::Array(samples) => {
                for (i, v) in samples.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", v)?;
                }
                Ok(())
            }
        }
    }
}

impl From<f64> for PvValue {
    fn from(value: f64) -> Self {
        PvValue::Number(value)
    }
}

impl From<u32> for PvValue {
    fn from(value: u32) -> Self {
        PvValue::Number(f64::from(value))
    }
}

impl From<&str> for PvValue {
    fn from(value: &str) -> Self {
        PvValue::Text(value.to_string())
    }
}

impl From<Vec<f64>> for PvValue {
    fn from(value: Vec<f64>) -> Self {
        PvValue::Array(value)
    }
}

/// Get/put channel to named process variables.
#[async_trait]
pub trait ControlVariableStore: Send + Sync {
    /// Read the current value of a variable.
    async fn get(&self, name: &str) -> Result<PvValue>;

    /// Write a value to a variable.
    async fn put(&self, name: &str, value: PvValue) -> Result<()>;
}
