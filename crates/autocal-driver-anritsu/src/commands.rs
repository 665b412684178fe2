//! SCPI vocabulary for the MG369xC source.
//!
//! Only the subset the calibration sweep needs: CW frequency, output power,
//! their step sizes, relative stepping, RF output and identification.

/// Identification query.
pub const IDENTITY_QUERY: &str = "*IDN?";
/// Enable RF output.
pub const OUTPUT_ON: &str = ":OUTP ON";
/// Disable RF output.
pub const OUTPUT_OFF: &str = ":OUTP OFF";
/// Query RF output state.
pub const OUTPUT_QUERY: &str = ":OUTP?";

/// A settable scalar with a matching read-back query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScpiSetting {
    /// Human-readable label used in diagnostics
    pub label: &'static str,
    /// Command header, e.g. `:FREQ`
    pub header: &'static str,
    /// Unit suffix appended to the value, e.g. `dBm`
    pub suffix: &'static str,
}

impl ScpiSetting {
    /// Command that sets the value.
    pub fn write_command(&self, value: f64) -> String {
        format!("{} {}{}", self.header, value, self.suffix)
    }

    /// Query that reads the value back.
    pub fn query(&self) -> String {
        format!("{}?", self.header)
    }
}

/// The two swept source parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceAxis {
    /// CW frequency in Hz
    Frequency,
    /// Output power in dBm
    Power,
}

impl SourceAxis {
    /// Axis label for logs and advisories.
    pub fn label(self) -> &'static str {
        match self {
            SourceAxis::Frequency => "frequency",
            SourceAxis::Power => "power",
        }
    }

    /// The absolute set-point of the axis.
    pub fn level(self) -> ScpiSetting {
        match self {
            SourceAxis::Frequency => ScpiSetting {
                label: "frequency",
                header: ":FREQ",
                suffix: "",
            },
            SourceAxis::Power => ScpiSetting {
                label: "power",
                header: ":POW",
                suffix: "dBm",
            },
        }
    }

    /// The step size used by [`step_up`](Self::step_up).
    pub fn step_size(self) -> ScpiSetting {
        match self {
            SourceAxis::Frequency => ScpiSetting {
                label: "frequency increment",
                header: ":FREQ:STEP",
                suffix: "",
            },
            SourceAxis::Power => ScpiSetting {
                label: "power increment",
                header: ":POW:STEP",
                suffix: " dBm",
            },
        }
    }

    /// Relative command that advances the axis by its configured step size.
    pub fn step_up(self) -> &'static str {
        match self {
            SourceAxis::Frequency => ":FREQ UP",
            SourceAxis::Power => ":POW UP",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_commands() {
        let level = SourceAxis::Frequency.level();
        assert_eq!(level.write_command(15_500_000_000.0), ":FREQ 15500000000");
        assert_eq!(level.query(), ":FREQ?");

        let step = SourceAxis::Frequency.step_size();
        assert_eq!(step.write_command(200_000_000.0), ":FREQ:STEP 200000000");
        assert_eq!(step.query(), ":FREQ:STEP?");
        assert_eq!(SourceAxis::Frequency.step_up(), ":FREQ UP");
    }

    #[test]
    fn test_power_commands() {
        let level = SourceAxis::Power.level();
        assert_eq!(level.write_command(-20.0), ":POW -20dBm");
        assert_eq!(level.query(), ":POW?");

        let step = SourceAxis::Power.step_size();
        assert_eq!(step.write_command(0.5), ":POW:STEP 0.5 dBm");
        assert_eq!(SourceAxis::Power.step_up(), ":POW UP");
    }
}
