//! Connection settings for the signal generator.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw-socket SCPI port of the MG369xC family.
pub const DEFAULT_PORT: u16 = 5025;

/// Default per-query response timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Identity string of the calibrated generator (model, serial, firmware).
pub const EXPECTED_IDENTITY: &str = "ANRITSU,MG3692C,211201,3.62";

/// Configuration for the signal generator link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    /// Hostname or IP address of the generator
    #[serde(default = "default_host")]
    pub host: String,

    /// SCPI socket port (default: 5025)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Response timeout for each query
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Use the simulated generator instead of a network connection
    #[serde(default)]
    pub mock: bool,
}

fn default_host() -> String {
    "192.168.0.254".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout: default_timeout(),
            mock: false,
        }
    }
}

impl InstrumentConfig {
    /// Validate connection settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("instrument.host must not be empty".to_string());
        }
        if self.port == 0 {
            return Err("instrument.port must be non-zero".to_string());
        }
        if self.timeout.is_zero() {
            return Err("instrument.timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}
