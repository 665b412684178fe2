//! Layered configuration using Figment.
//!
//! Sources, lowest to highest precedence:
//! 1. Built-in defaults (the bench constants)
//! 2. `autocal.toml` (or the file passed with `--config`); a missing file is
//!    not an error
//! 3. Environment variables prefixed with `AUTOCAL_`, `__` separating
//!    sections, e.g. `AUTOCAL_SWEEP__POWER__MAX=-15`
//!
//! CLI flags are applied on top by the binary.
//!
//! # Example
//! ```toml
//! [instrument]
//! host = "192.168.0.254"
//! timeout = "2s"
//!
//! [control]
//! backend = "ca_tools"
//! prefix = "SR00RPA01"
//!
//! [sweep.frequency]
//! min = 15.5e9
//! max = 16.5e9
//! increment = 2e8
//! tolerance = "exact"
//!
//! [sweep.power]
//! min = -20.0
//! max = -14.5
//! increment = 0.5
//! tolerance = { absolute = 0.005 }
//!
//! [sweep.timing]
//! attenuation_settle = "1500ms"
//! acquisition_settle = "1500ms"
//! ```

use autocal_driver_anritsu::InstrumentConfig;
use autocal_driver_red_pitaya::ControlConfig;
use autocal_sweep::SweepConfig;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "autocal.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "AUTOCAL_";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AutocalConfig {
    /// Signal generator link
    #[serde(default)]
    pub instrument: InstrumentConfig,
    /// Red Pitaya control variables
    #[serde(default)]
    pub control: ControlConfig,
    /// Sweep bounds, increments and settle delays
    #[serde(default)]
    pub sweep: SweepConfig,
    /// Result transcript
    #[serde(default)]
    pub output: OutputConfig,
    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Result transcript settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Transcript path, overwritten each run
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
    /// Print the transcript to stdout after the sweep
    #[serde(default = "default_echo")]
    pub echo: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Multi-line, colored (development)
    #[default]
    Pretty,
    /// Single-line, no colors
    Compact,
    /// Newline-delimited JSON
    Json,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level (trace, debug, info, warn, error); `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

fn default_output_path() -> PathBuf {
    PathBuf::from("autoconfig.txt")
}

fn default_echo() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            echo: default_echo(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl AutocalConfig {
    /// Load from `autocal.toml` and the environment.
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load from a specific file and the environment.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }

    /// The layered provider stack, for callers that want to merge more.
    pub fn figment<P: AsRef<Path>>(path: P) -> Figment {
        Figment::from(Serialized::defaults(AutocalConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Switch both the generator and the rig to their simulations.
    pub fn use_mock_hardware(&mut self) {
        self.instrument.mock = true;
        self.control.backend = autocal_driver_red_pitaya::ControlBackend::Mock;
    }

    /// True if neither the generator nor the rig is real hardware.
    pub fn is_fully_simulated(&self) -> bool {
        self.instrument.mock && self.control.backend == autocal_driver_red_pitaya::ControlBackend::Mock
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            ));
        }

        self.instrument.validate()?;
        self.control.validate()?;
        self.sweep.validate().map_err(|e| e.to_string())?;

        if self.output.path.as_os_str().is_empty() {
            return Err("output.path must not be empty".to_string());
        }

        Ok(())
    }
}
