//! Binary-level wiring against simulated hardware.

use autocal_core::AxisLimits;
use rf_autocal::{app, config::AutocalConfig};

fn mock_config(dir: &tempfile::TempDir) -> AutocalConfig {
    let mut config = AutocalConfig::default();
    config.use_mock_hardware();
    config.control.mock_seed = Some(2024);
    config.output.path = dir.path().join("autoconfig.txt");
    config
}

#[tokio::test]
async fn test_mock_run_writes_full_transcript() {
    let dir = tempfile::tempdir().unwrap();
    let config = mock_config(&dir);

    let report = app::run(&config).await.unwrap();

    assert_eq!(report.samples, 864);
    assert_eq!(
        app::summary(&report),
        "12 power levels, 72 points, 864 samples, 0 advisories"
    );

    let on_disk = std::fs::read_to_string(&config.output.path).unwrap();
    assert_eq!(on_disk, report.transcript);

    let lines: Vec<&str> = on_disk.lines().collect();
    // 12 power headers, 72 x (frequency header + column header + 12 samples)
    assert_eq!(lines.len(), 12 + 72 * 14);
    assert_eq!(&lines[..3], &["Power = -20.0", "Frequency = 15500000000.0", "attenuation, voltage"]);
    let sample_lines = lines
        .iter()
        .filter(|l| l.chars().next().is_some_and(|c| c.is_ascii_digit()))
        .count();
    assert_eq!(sample_lines, 864);
    for line in lines.iter().filter(|l| l.starts_with("22,")) {
        let voltage: f64 = line.split(",   ").nth(1).unwrap().parse().unwrap();
        assert!((voltage - 0.8 * 10f64.powf(-22.0 / 20.0)).abs() < 0.002, "{line}");
    }
}

#[tokio::test]
async fn test_mock_run_overwrites_previous_transcript() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = mock_config(&dir);
    config.sweep.frequency = AxisLimits {
        max: 15.5e9,
        ..AxisLimits::frequency()
    };
    config.sweep.power = AxisLimits {
        max: -20.0,
        ..AxisLimits::power()
    };
    std::fs::write(&config.output.path, "left over from an earlier run\n").unwrap();

    let report = app::run(&config).await.unwrap();

    let on_disk = std::fs::read_to_string(&config.output.path).unwrap();
    assert!(!on_disk.contains("left over"));
    assert_eq!(report.samples, 12);
    assert_eq!(on_disk.lines().count(), 3 + 12);
}

#[tokio::test]
async fn test_invalid_config_fails_before_creating_transcript() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = mock_config(&dir);
    config.sweep.power.increment = -0.5;

    let err = app::run(&config).await.unwrap_err();

    assert!(format!("{err:#}").contains("increment"), "{err:#}");
    assert!(!config.output.path.exists());
}

#[tokio::test]
async fn test_unreachable_generator_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = mock_config(&dir);
    config.instrument.mock = false;
    config.instrument.host = "127.0.0.1".into();
    // Reserved port, nothing listens there
    config.instrument.port = 9;

    assert!(app::run(&config).await.is_err());
    assert!(!config.output.path.exists());
}
