//! Configuration for the attenuator/analog-input rig.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How process variables are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ControlBackend {
    /// EPICS Channel Access through the `caget`/`caput` tools
    #[default]
    CaTools,
    /// In-process simulated front end
    Mock,
}

/// Configuration for the rig's control variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Transport used for process variables
    #[serde(default)]
    pub backend: ControlBackend,

    /// IOC record prefix of the Red Pitaya (e.g. `SR00RPA01`)
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Full name of the attenuation set-point variable
    #[serde(default = "default_attenuation_pv")]
    pub attenuation_pv: String,

    /// Channel Access wait time passed to `caget -w` / `caput -w`
    #[serde(default = "default_ca_timeout", with = "humantime_serde")]
    pub ca_timeout: Duration,

    /// Seed for the simulated front end's noise (mock backend only)
    #[serde(default)]
    pub mock_seed: Option<u64>,
}

fn default_prefix() -> String {
    "SR00RPA01".to_string()
}

fn default_attenuation_pv() -> String {
    "car".to_string()
}

fn default_ca_timeout() -> Duration {
    Duration::from_secs(1)
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            backend: ControlBackend::default(),
            prefix: default_prefix(),
            attenuation_pv: default_attenuation_pv(),
            ca_timeout: default_ca_timeout(),
            mock_seed: None,
        }
    }
}

impl ControlConfig {
    /// Validate PV naming and timeouts.
    pub fn validate(&self) -> Result<(), String> {
        if self.prefix.trim().is_empty() {
            return Err("control.prefix must not be empty".to_string());
        }
        if self.attenuation_pv.trim().is_empty() {
            return Err("control.attenuation_pv must not be empty".to_string());
        }
        if self.ca_timeout.is_zero() {
            return Err("control.ca_timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_rig() {
        let config = ControlConfig::default();
        assert_eq!(config.backend, ControlBackend::CaTools);
        assert_eq!(config.prefix, "SR00RPA01");
        assert_eq!(config.attenuation_pv, "car");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_names() {
        let config = ControlConfig {
            attenuation_pv: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
