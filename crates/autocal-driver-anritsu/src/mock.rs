//! Simulated MG369xC signal generator.
//!
//! Echoes exactly what is written: a set-point reads back as the value that
//! was commanded (clamped to the hardware range), and `UP` adds the current
//! step size. Writes are journaled so tests can assert on command order.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use autocal_core::InstrumentLink;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::commands::SourceAxis;
use crate::config::EXPECTED_IDENTITY;

/// Synthesizer frequency range of the MG3692C (Hz).
const HARDWARE_FREQUENCY: (f64, f64) = (2.0e9, 20.0e9);
/// Leveled output power range (dBm).
const HARDWARE_POWER: (f64, f64) = (-130.0, 25.0);

#[derive(Debug)]
struct GeneratorState {
    identity: String,
    frequency: f64,
    power: f64,
    frequency_step: f64,
    power_step: f64,
    output: bool,
    closed: bool,
    readback_offsets: HashMap<SourceAxis, f64>,
    queries_until_fault: Option<usize>,
    journal: Vec<String>,
}

/// Mock signal generator for testing without hardware.
pub struct MockSignalGenerator {
    state: Mutex<GeneratorState>,
}

impl Default for MockSignalGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSignalGenerator {
    /// Create a generator at 10 GHz / -10 dBm with output off.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GeneratorState {
                identity: EXPECTED_IDENTITY.to_string(),
                frequency: 10.0e9,
                power: -10.0,
                frequency_step: 1.0e6,
                power_step: 1.0,
                output: false,
                closed: false,
                readback_offsets: HashMap::new(),
                queries_until_fault: None,
                journal: Vec::new(),
            }),
        }
    }

    /// Report a different `*IDN?` string.
    pub fn with_identity(mut self, identity: &str) -> Self {
        self.state.get_mut().identity = identity.to_string();
        self
    }

    /// Add a fixed offset to every level read-back of `axis`, so set-and-verify
    /// on that axis fails.
    pub fn with_readback_offset(mut self, axis: SourceAxis, offset: f64) -> Self {
        self.state.get_mut().readback_offsets.insert(axis, offset);
        self
    }

    /// Let `count` queries succeed, then fail every later query as a
    /// transport fault. Writes keep working.
    pub fn with_query_fault_after(mut self, count: usize) -> Self {
        self.state.get_mut().queries_until_fault = Some(count);
        self
    }

    /// Every write received so far, in order.
    pub async fn writes(&self) -> Vec<String> {
        self.state.lock().await.journal.clone()
    }

    /// Current RF output state.
    pub async fn output_enabled(&self) -> bool {
        self.state.lock().await.output
    }

    /// Current CW frequency in Hz.
    pub async fn frequency(&self) -> f64 {
        self.state.lock().await.frequency
    }

    /// Current output power in dBm.
    pub async fn power(&self) -> f64 {
        self.state.lock().await.power
    }

    /// Whether `close()` has been called.
    pub async fn is_closed(&self) -> bool {
        self.state.lock().await.closed
    }
}

/// Parse a numeric argument, tolerating a trailing `dBm` unit.
fn parse_argument(argument: &str, command: &str) -> Result<f64> {
    let trimmed = argument.trim();
    let numeric = trimmed
        .strip_suffix("dBm")
        .or_else(|| trimmed.strip_suffix("DBM"))
        .or_else(|| trimmed.strip_suffix("dbm"))
        .unwrap_or(trimmed)
        .trim();
    numeric
        .parse::<f64>()
        .with_context(|| format!("Invalid numeric argument in mock command: {}", command))
}

fn clamp(value: f64, (lo, hi): (f64, f64)) -> f64 {
    value.clamp(lo, hi)
}

impl GeneratorState {
    fn apply(&mut self, command: &str) -> Result<()> {
        let (header, argument) = match command.trim().split_once(char::is_whitespace) {
            Some((h, a)) => (h.to_uppercase(), a.trim().to_string()),
            None => (command.trim().to_uppercase(), String::new()),
        };

        match (header.as_str(), argument.to_uppercase().as_str()) {
            (":FREQ", "UP") => {
                self.frequency = clamp(self.frequency + self.frequency_step, HARDWARE_FREQUENCY);
            }
            (":POW", "UP") => {
                self.power = clamp(self.power + self.power_step, HARDWARE_POWER);
            }
            (":FREQ", _) => {
                self.frequency = clamp(parse_argument(&argument, command)?, HARDWARE_FREQUENCY);
            }
            (":POW", _) => {
                self.power = clamp(parse_argument(&argument, command)?, HARDWARE_POWER);
            }
            (":FREQ:STEP", _) => self.frequency_step = parse_argument(&argument, command)?,
            (":POW:STEP", _) => self.power_step = parse_argument(&argument, command)?,
            (":OUTP", "ON" | "1") => self.output = true,
            (":OUTP", "OFF" | "0") => self.output = false,
            _ => bail!("Unknown mock command: {}", command),
        }
        Ok(())
    }

    fn answer(&self, query: &str) -> Result<String> {
        let offset = |axis: SourceAxis| self.readback_offsets.get(&axis).copied().unwrap_or(0.0);
        match query.trim().to_uppercase().as_str() {
            "*IDN?" => Ok(self.identity.clone()),
            ":FREQ?" => Ok(format!("{}", self.frequency + offset(SourceAxis::Frequency))),
            ":POW?" => Ok(format!("{}", self.power + offset(SourceAxis::Power))),
            ":FREQ:STEP?" => Ok(format!("{}", self.frequency_step)),
            ":POW:STEP?" => Ok(format!("{}", self.power_step)),
            ":OUTP?" => Ok(if self.output { "1" } else { "0" }.to_string()),
            _ => bail!("Unknown mock query: {}", query),
        }
    }
}

#[async_trait]
impl InstrumentLink for MockSignalGenerator {
    async fn write(&self, command: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.closed {
            bail!("Mock generator connection is closed");
        }
        tracing::debug!("Mock SCPI write: {}", command);
        state.journal.push(command.to_string());
        state.apply(command)
    }

    async fn query(&self, command: &str) -> Result<String> {
        let mut state = self.state.lock().await;
        if state.closed {
            bail!("Mock generator connection is closed");
        }
        if let Some(remaining) = state.queries_until_fault.as_mut() {
            if *remaining == 0 {
                return Err(anyhow!("Injected transport fault on query: {}", command));
            }
            *remaining -= 1;
        }
        tracing::debug!("Mock SCPI query: {}", command);
        state.answer(command)
    }

    async fn close(&self) -> Result<()> {
        self.state.lock().await.closed = true;
        Ok(())
    }
}
