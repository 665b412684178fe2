//! Wiring from configuration to a running sweep.

use anyhow::{Context, Result};
use autocal_core::InstrumentLink;
use autocal_driver_anritsu::{InstrumentConfig, MockSignalGenerator, ScpiClient};
use autocal_driver_red_pitaya::{open_store, pvs_for, AttenuatorRig};
use autocal_storage::FileSink;
use autocal_sweep::{CalibrationSweep, SettleTiming, SweepContext, SweepReport};
use std::sync::Arc;

use crate::config::AutocalConfig;

/// Open the generator link selected by `config`.
pub async fn connect_instrument(config: &InstrumentConfig) -> Result<Arc<dyn InstrumentLink>> {
    if config.mock {
        tracing::info!("Using simulated signal generator");
        return Ok(Arc::new(MockSignalGenerator::new()));
    }
    Ok(Arc::new(ScpiClient::connect(config).await?))
}

/// Run one calibration sweep end to end.
///
/// With both the generator and the rig simulated, settle delays are skipped.
pub async fn run(config: &AutocalConfig) -> Result<SweepReport> {
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid configuration")?;

    let mut sweep_config = config.sweep.clone();
    if config.is_fully_simulated() {
        sweep_config.timing = SettleTiming::none();
    }

    let link = connect_instrument(&config.instrument).await?;
    let rig = AttenuatorRig::new(open_store(&config.control), pvs_for(&config.control));
    let sink = FileSink::create(&config.output.path).await?;

    let ctx = SweepContext {
        link,
        rig,
        sink: Box::new(sink),
    };

    tracing::info!(
        output = %config.output.path.display(),
        points = sweep_config.point_count(),
        "Starting calibration sweep"
    );
    let report = CalibrationSweep::new(sweep_config, ctx)
        .run()
        .await
        .context("Calibration sweep failed")?;
    Ok(report)
}

/// One-line summary of a finished sweep.
pub fn summary(report: &SweepReport) -> String {
    format!(
        "{} power levels, {} points, {} samples, {} advisories",
        report.power_levels,
        report.frequency_points,
        report.samples,
        report.advisories.len()
    )
}
