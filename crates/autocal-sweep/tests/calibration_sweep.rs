//! End-to-end sweeps against the simulated generator and Red Pitaya.

use autocal_core::{Advisory, AxisLimits, PvValue, SweepError};
use autocal_driver_anritsu::{MockSignalGenerator, SourceAxis};
use autocal_driver_red_pitaya::{AttenuatorRig, MockRedPitaya, RedPitayaPvs};
use autocal_storage::MemorySink;
use autocal_sweep::{
    attenuation_ladder, CalibrationSweep, SettleTiming, SweepConfig, SweepContext, LADDER_STEPS,
};
use std::sync::Arc;

struct Bench {
    generator: Arc<MockSignalGenerator>,
    front_end: Arc<MockRedPitaya>,
    sink: MemorySink,
}

impl Bench {
    fn new(generator: MockSignalGenerator) -> Self {
        Self {
            generator: Arc::new(generator),
            front_end: Arc::new(MockRedPitaya::new(RedPitayaPvs::default(), Some(11))),
            sink: MemorySink::new(),
        }
    }

    fn context(&self) -> SweepContext {
        SweepContext {
            link: self.generator.clone(),
            rig: AttenuatorRig::new(self.front_end.clone(), RedPitayaPvs::default()),
            sink: Box::new(self.sink.clone()),
        }
    }
}

fn fast_config() -> SweepConfig {
    SweepConfig {
        timing: SettleTiming::none(),
        ..SweepConfig::default()
    }
}

#[tokio::test]
async fn test_full_sweep_produces_864_samples() {
    let bench = Bench::new(MockSignalGenerator::new());

    let report = CalibrationSweep::new(fast_config(), bench.context())
        .run()
        .await
        .unwrap();

    assert_eq!(report.power_levels, 12);
    assert_eq!(report.frequency_points, 72);
    assert_eq!(report.samples, 864);
    assert!(report.advisories.is_empty(), "{:?}", report.advisories);

    // Every group carries the full ladder in order
    let samples = bench.sink.samples();
    assert_eq!(samples.len(), 864);
    let ladder: Vec<u32> = attenuation_ladder().collect();
    for group in samples.chunks(LADDER_STEPS as usize) {
        let attenuations: Vec<u32> = group.iter().map(|s| s.attenuation).collect();
        assert_eq!(attenuations, ladder);
    }

    // Transcript grammar
    let lines: Vec<&str> = report.transcript.lines().collect();
    assert_eq!(lines[0], "Power = -20.0");
    assert_eq!(lines[1], "Frequency = 15500000000.0");
    assert_eq!(lines[2], "attenuation, voltage");
    assert!(lines[3].starts_with("0,   0."));
    assert_eq!(lines.iter().filter(|l| l.starts_with("Power = ")).count(), 12);
    assert_eq!(
        lines.iter().filter(|l| l.starts_with("Frequency = ")).count(),
        72
    );
    assert_eq!(
        lines.iter().filter(|l| l.starts_with("Power = ")).last(),
        Some(&"Power = -14.5")
    );
    assert!(lines.contains(&"Frequency = 16500000000.0"));
    assert!(!lines.contains(&"Frequency = 16700000000.0"));
    assert!(!lines.contains(&"Power = -14.0"));
    assert!(bench.sink.is_closed());
}

#[tokio::test]
async fn test_full_sweep_leaves_hardware_safe() {
    let bench = Bench::new(MockSignalGenerator::new());
    CalibrationSweep::new(fast_config(), bench.context())
        .run()
        .await
        .unwrap();

    let writes = bench.generator.writes().await;
    assert_eq!(writes.first().map(String::as_str), Some(":FREQ 15500000000"));
    assert_eq!(writes.iter().filter(|w| *w == ":OUTP ON").count(), 72);
    assert_eq!(writes.last().map(String::as_str), Some(":OUTP OFF"));
    assert!(!bench.generator.output_enabled().await);
    assert!(bench.generator.is_closed().await);

    let puts = bench.front_end.puts();
    assert_eq!(puts[0].0, "SR00RPA01:IN1_GAIN_CMD");
    assert_eq!(puts[1].0, "SR00RPA01:ACQ_TRIGGER_SRC_CMD");
    // 11 setup writes, start, 864 attenuation commands, stop
    assert_eq!(puts.len(), 11 + 1 + 864 + 1);
    assert_eq!(
        puts.last(),
        Some(&("SR00RPA01:STOP_ACQ_CMD".to_string(), PvValue::from(1u32)))
    );
    assert!(!bench.front_end.is_acquiring());
}

#[tokio::test]
async fn test_identity_mismatch_touches_nothing() {
    let bench = Bench::new(MockSignalGenerator::new().with_identity("ANRITSU,MG3694C,000001,3.10"));

    let err = CalibrationSweep::new(fast_config(), bench.context())
        .run()
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SweepError::ConnectionIdentity {
            expected: "ANRITSU,MG3692C,211201,3.62".into(),
            received: "ANRITSU,MG3694C,000001,3.10".into(),
        }
    );
    assert_eq!(bench.front_end.put_count(), 0);
    assert!(bench.generator.writes().await.is_empty());
    assert!(bench.sink.entries().is_empty());
}

#[tokio::test]
async fn test_fault_mid_pass_turns_output_off() {
    // identity + 4 setting read-backs + power + frequency + 2 enable checks,
    // then 3 status snapshots (2 queries each) before the fault.
    let bench = Bench::new(MockSignalGenerator::new().with_query_fault_after(15));

    let err = CalibrationSweep::new(fast_config(), bench.context())
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, SweepError::Instrument(_)), "{err}");
    let writes = bench.generator.writes().await;
    assert!(writes.iter().any(|w| w == ":OUTP ON"));
    assert_eq!(writes.last().map(String::as_str), Some(":OUTP OFF"));
    assert!(!bench.generator.output_enabled().await);
    assert!(bench.generator.is_closed().await);
    assert!(!bench.front_end.is_acquiring());
    assert!(bench.sink.is_closed());
    assert_eq!(bench.sink.samples().len(), 3);
}

#[tokio::test]
async fn test_out_of_bounds_point_runs_pass_with_output_off() {
    // Power reads back 10 dB high: verification fails and every enable check
    // sees a point above the power bound.
    let bench = Bench::new(MockSignalGenerator::new().with_readback_offset(SourceAxis::Power, 10.0));

    let report = CalibrationSweep::new(fast_config(), bench.context())
        .run()
        .await
        .unwrap();

    // The first power step already reads above max
    assert_eq!(report.power_levels, 1);
    assert_eq!(report.frequency_points, 6);
    assert_eq!(report.samples, 72);

    let kinds: Vec<&str> = report.advisories.iter().map(Advisory::kind).collect();
    assert_eq!(kinds[0], "verification");
    assert_eq!(kinds.iter().filter(|k| **k == "output_inhibited").count(), 6);
    assert!(!bench
        .generator
        .writes()
        .await
        .iter()
        .any(|w| w == ":OUTP ON"));
}

#[tokio::test]
async fn test_rejected_minimum_is_not_fatal() {
    let bench = Bench::new(MockSignalGenerator::new());
    let config = SweepConfig {
        // Below the generator's synthesis range: it clamps and reads back 2 GHz
        frequency: AxisLimits {
            min: 1.0e9,
            max: 2.0e9,
            increment: 5.0e8,
            ..AxisLimits::frequency()
        },
        ..fast_config()
    };

    let report = CalibrationSweep::new(config, bench.context())
        .run()
        .await
        .unwrap();

    assert!(report
        .advisories
        .iter()
        .any(|a| matches!(a, Advisory::Verification { parameter, .. } if parameter == "frequency")));
    assert!(report.samples > 0);
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_connecting() {
    let bench = Bench::new(MockSignalGenerator::new());
    let config = SweepConfig {
        power: AxisLimits {
            increment: 0.0,
            ..AxisLimits::power()
        },
        ..fast_config()
    };

    let err = CalibrationSweep::new(config, bench.context())
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, SweepError::Configuration(_)));
    assert!(!bench.generator.is_closed().await);
}

#[tokio::test(start_paused = true)]
async fn test_single_point_sweep_settles_per_step() {
    let bench = Bench::new(MockSignalGenerator::new());
    let config = SweepConfig {
        frequency: AxisLimits {
            max: 15.5e9,
            ..AxisLimits::frequency()
        },
        power: AxisLimits {
            max: -20.0,
            ..AxisLimits::power()
        },
        ..SweepConfig::default()
    };
    let timing = config.timing;

    let start = tokio::time::Instant::now();
    let report = CalibrationSweep::new(config, bench.context())
        .run()
        .await
        .unwrap();

    assert_eq!(report.samples, 12);
    assert_eq!(start.elapsed(), timing.per_step() * LADDER_STEPS);
}
