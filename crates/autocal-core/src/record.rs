//! Result transcript entries and the sink they are streamed to.
//!
//! The transcript is a human-readable, line-oriented log:
//!
//! ```text
//! Power = -20.0
//! Frequency = 15500000000.0
//! attenuation, voltage
//! 0,   0.9981
//! 2,   0.7943
//! ...
//! ```
//!
//! Each `Power =` / `Frequency =` line opens a new group. There is no
//! escaping and no header or footer.

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

/// Column header line preceding each block of samples.
pub const COLUMN_HEADER: &str = "attenuation, voltage";

/// One attenuation step and the mean monitored voltage measured there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRecord {
    /// Attenuation set-point (engineering units)
    pub attenuation: u32,
    /// Mean of the acquired waveform
    pub voltage: f64,
}

/// A single transcript line.
#[derive(Debug, Clone, PartialEq)]
pub enum LogEntry {
    /// Power group header
    Power(f64),
    /// Frequency group header
    Frequency(f64),
    /// `attenuation, voltage`
    ColumnHeader,
    /// One sample line
    Sample(SampleRecord),
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogEntry::Power(p) => write!(f, "Power = {}", format_reading(*p)),
            LogEntry::Frequency(hz) => write!(f, "Frequency = {}", format_reading(*hz)),
            LogEntry::ColumnHeader => f.write_str(COLUMN_HEADER),
            LogEntry::Sample(s) => write!(f, "{},   {}", s.attenuation, format_reading(s.voltage)),
        }
    }
}

/// Render a reading for the transcript.
///
/// Integral values keep one decimal place (`-20.0`, `15500000000.0`), all
/// others use the shortest representation that round-trips (`-19.5`).
/// Magnitudes below `1e-4` or from `1e16` up switch to exponent form with
/// a signed, two-digit exponent (`5e-05`, `1.5e+16`).
pub fn format_reading(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    let magnitude = value.abs();
    if value.is_finite() && value != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        return format_exponent(value);
    }
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

fn format_exponent(value: f64) -> String {
    let rendered = format!("{:e}", value);
    match rendered.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => rendered,
    }
}

/// Append-only writer for the result transcript.
#[async_trait]
pub trait ResultSink: Send {
    /// Append one line.
    async fn append(&mut self, entry: &LogEntry) -> Result<()>;

    /// Flush and close. Appending after close is an error.
    async fn close(&mut self) -> Result<()>;

    /// Full transcript written so far.
    async fn transcript(&self) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_reading() {
        assert_eq!(format_reading(15_500_000_000.0), "15500000000.0");
        assert_eq!(format_reading(-20.0), "-20.0");
        assert_eq!(format_reading(-19.5), "-19.5");
        assert_eq!(format_reading(0.0123), "0.0123");
        assert_eq!(format_reading(f64::NAN), "nan");
        assert_eq!(format_reading(0.0), "0.0");
    }

    #[test]
    fn test_format_reading_exponent_form() {
        assert_eq!(format_reading(0.00005), "5e-05");
        assert_eq!(format_reading(-0.000012), "-1.2e-05");
        assert_eq!(format_reading(0.0001), "0.0001");
        assert_eq!(format_reading(1e16), "1e+16");
        assert_eq!(format_reading(1.5e16), "1.5e+16");
        assert_eq!(format_reading(1e-123), "1e-123");
        assert_eq!(format_reading(9_999_999_999_999_998.0), "9999999999999998.0");
    }

    #[test]
    fn test_entry_lines() {
        assert_eq!(LogEntry::Power(-14.5).to_string(), "Power = -14.5");
        assert_eq!(
            LogEntry::Frequency(16_100_000_000.0).to_string(),
            "Frequency = 16100000000.0"
        );
        assert_eq!(LogEntry::ColumnHeader.to_string(), "attenuation, voltage");
        let sample = LogEntry::Sample(SampleRecord {
            attenuation: 22,
            voltage: 0.25,
        });
        assert_eq!(sample.to_string(), "22,   0.25");
    }
}
