//! Process variable names served by the Red Pitaya IOC.

/// Number of N-side digital lines driven as outputs.
pub const DIGITAL_LINES: u8 = 6;
/// Digital line wired to the attenuator latch enable.
pub const LATCH_ENABLE_LINE: u8 = 4;
/// Digital line wired to the RF switch select.
pub const SWITCH_SELECT_LINE: u8 = 5;

/// Name builder for the rig's process variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedPitayaPvs {
    prefix: String,
    attenuation: String,
}

impl RedPitayaPvs {
    /// Names under `prefix`, with the attenuation set-point at `attenuation`.
    pub fn new(prefix: impl Into<String>, attenuation: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            attenuation: attenuation.into(),
        }
    }

    fn record(&self, suffix: &str) -> String {
        format!("{}:{}", self.prefix, suffix)
    }

    /// Fast analog input 1 gain mode.
    pub fn input_gain(&self) -> String {
        self.record("IN1_GAIN_CMD")
    }

    /// Acquisition trigger source.
    pub fn trigger_source(&self) -> String {
        self.record("ACQ_TRIGGER_SRC_CMD")
    }

    /// Direction of N-side digital line `line`.
    pub fn digital_direction(&self, line: u8) -> String {
        self.record(&format!("DIGITAL_N{}_DIR_CMD", line))
    }

    /// State of N-side digital line `line`.
    pub fn digital_state(&self, line: u8) -> String {
        self.record(&format!("DIGITAL_N{}_STATE_CMD", line))
    }

    /// Start continuous acquisition.
    pub fn start_acquisition(&self) -> String {
        self.record("START_CONT_ACQ_CMD")
    }

    /// Stop acquisition.
    pub fn stop_acquisition(&self) -> String {
        self.record("STOP_ACQ_CMD")
    }

    /// Monitored waveform of fast analog input 1.
    pub fn input_monitor(&self) -> String {
        self.record("IN1_DATA_MONITOR")
    }

    /// Attenuation set-point.
    pub fn attenuation(&self) -> &str {
        &self.attenuation
    }
}

impl Default for RedPitayaPvs {
    fn default() -> Self {
        Self::new("SR00RPA01", "car")
    }
}
