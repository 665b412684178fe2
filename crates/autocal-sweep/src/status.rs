//! Operator status snapshot taken after every attenuation step.

use autocal_core::{format_reading, InstrumentLink, PvValue, SweepError, SweepResult};
use autocal_driver_anritsu::SourceAxis;
use autocal_driver_red_pitaya::AttenuatorRig;
use std::fmt;

/// Live readings at one attenuation step.
///
/// Frequency and power are queried from the generator and the attenuation is
/// read back from its control variable, so the snapshot reflects hardware
/// state rather than what the sweep believes it commanded.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    /// Generator frequency (Hz)
    pub frequency: f64,
    /// Generator power (dBm)
    pub power: f64,
    /// Attenuation set-point as reported by the rig
    pub attenuation: PvValue,
    /// Mean detector voltage
    pub voltage: f64,
}

impl StatusReport {
    /// Gather a snapshot around an already reduced `voltage`.
    pub async fn gather(
        link: &dyn InstrumentLink,
        rig: &AttenuatorRig,
        voltage: f64,
    ) -> SweepResult<Self> {
        let frequency = link
            .query_f64(&SourceAxis::Frequency.level().query())
            .await
            .map_err(SweepError::instrument)?;
        let power = link
            .query_f64(&SourceAxis::Power.level().query())
            .await
            .map_err(SweepError::instrument)?;
        let attenuation = rig
            .attenuation()
            .await
            .map_err(SweepError::control_variable)?;

        Ok(Self {
            frequency,
            power,
            attenuation,
            voltage,
        })
    }

    /// Emit the snapshot as an `info` event.
    pub fn log(&self) {
        tracing::info!(
            frequency = self.frequency,
            power = self.power,
            attenuation = %self.attenuation,
            voltage = self.voltage,
            "{}",
            self
        );
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Power = {}   Frequency = {}    Attenuation = {}     Voltage = {}",
            format_reading(self.power),
            format_reading(self.frequency),
            self.attenuation,
            format_reading(self.voltage)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autocal_driver_anritsu::MockSignalGenerator;
    use autocal_driver_red_pitaya::{MockRedPitaya, RedPitayaPvs};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_gather_reads_live_state() {
        let generator = MockSignalGenerator::new();
        generator.write(":FREQ 15700000000").await.unwrap();
        generator.write(":POW -19.5dBm").await.unwrap();
        let pvs = RedPitayaPvs::default();
        let rig = AttenuatorRig::new(Arc::new(MockRedPitaya::new(pvs.clone(), Some(1))), pvs);
        rig.set_attenuation(6).await.unwrap();

        let status = StatusReport::gather(&generator, &rig, 0.25).await.unwrap();

        assert_eq!(status.frequency, 15.7e9);
        assert_eq!(status.power, -19.5);
        assert_eq!(status.attenuation, PvValue::Number(6.0));
        assert_eq!(
            status.to_string(),
            "Power = -19.5   Frequency = 15700000000.0    Attenuation = 6     Voltage = 0.25"
        );
    }

    #[tokio::test]
    async fn test_missing_attenuation_is_a_control_variable_error() {
        let generator = MockSignalGenerator::new();
        let pvs = RedPitayaPvs::default();
        let rig = AttenuatorRig::new(Arc::new(MockRedPitaya::new(pvs.clone(), Some(1))), pvs);

        let err = StatusReport::gather(&generator, &rig, 0.0).await.unwrap_err();
        assert!(matches!(err, SweepError::ControlVariable(_)));
    }
}
