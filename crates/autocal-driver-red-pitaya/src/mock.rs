//! Simulated Red Pitaya front end.
//!
//! Holds an in-memory table of process variables and synthesizes the
//! monitored detector waveform from the commanded attenuation:
//!
//! `v = full_scale * 10^(-attenuation / 20)` plus uniform noise of
//! `noise` volts peak, drawn from a seeded ChaCha8 generator so runs are
//! reproducible.
//!
//! While acquisition is stopped the monitor keeps returning the last captured
//! waveform, as the real IOC does.

use anyhow::{bail, Result};
use async_trait::async_trait;
use autocal_core::{ControlVariableStore, PvValue};
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::{HashMap, HashSet};

use crate::pvs::RedPitayaPvs;

/// Samples per monitored waveform.
const WAVEFORM_LEN: usize = 256;
/// Detector voltage at zero attenuation.
const FULL_SCALE_VOLTS: f64 = 0.8;
/// Peak noise amplitude.
const NOISE_VOLTS: f64 = 0.002;

struct FrontEnd {
    values: HashMap<String, PvValue>,
    journal: Vec<(String, PvValue)>,
    acquiring: bool,
    last_waveform: Vec<f64>,
    failing: HashSet<String>,
    rng: ChaCha8Rng,
}

/// Mock process-variable store standing in for the Red Pitaya IOC.
pub struct MockRedPitaya {
    pvs: RedPitayaPvs,
    inner: Mutex<FrontEnd>,
}

impl MockRedPitaya {
    /// Create a simulated front end. `seed` fixes the noise sequence; `None`
    /// seeds from the OS.
    pub fn new(pvs: RedPitayaPvs, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            pvs,
            inner: Mutex::new(FrontEnd {
                values: HashMap::new(),
                journal: Vec::new(),
                acquiring: false,
                last_waveform: Vec::new(),
                failing: HashSet::new(),
                rng,
            }),
        }
    }

    /// Make every access to `name` fail.
    pub fn with_failing_variable(self, name: impl Into<String>) -> Self {
        self.inner.lock().failing.insert(name.into());
        self
    }

    /// Every put received so far, in order.
    pub fn puts(&self) -> Vec<(String, PvValue)> {
        self.inner.lock().journal.clone()
    }

    /// Number of puts received so far.
    pub fn put_count(&self) -> usize {
        self.inner.lock().journal.len()
    }

    /// Last value written to `name`.
    pub fn value(&self, name: &str) -> Option<PvValue> {
        self.inner.lock().values.get(name).cloned()
    }

    /// Whether continuous acquisition is running.
    pub fn is_acquiring(&self) -> bool {
        self.inner.lock().acquiring
    }

    /// Expected mean detector voltage for an attenuation set-point.
    pub fn ideal_voltage(attenuation: f64) -> f64 {
        FULL_SCALE_VOLTS * 10f64.powf(-attenuation / 20.0)
    }

    fn capture(front: &mut FrontEnd, attenuation: f64) -> Vec<f64> {
        let level = Self::ideal_voltage(attenuation);
        (0..WAVEFORM_LEN)
            .map(|_| level + NOISE_VOLTS * (2.0 * front.rng.gen::<f64>() - 1.0))
            .collect()
    }
}

#[async_trait]
impl ControlVariableStore for MockRedPitaya {
    async fn get(&self, name: &str) -> Result<PvValue> {
        let mut front = self.inner.lock();
        if front.failing.contains(name) {
            bail!("Injected channel access fault reading {}", name);
        }

        if name == self.pvs.input_monitor() {
            if front.acquiring {
                let attenuation = front
                    .values
                    .get(self.pvs.attenuation())
                    .and_then(PvValue::as_f64)
                    .unwrap_or(0.0);
                let waveform = Self::capture(&mut front, attenuation);
                front.last_waveform = waveform;
            }
            return Ok(PvValue::Array(front.last_waveform.clone()));
        }

        match front.values.get(name) {
            Some(value) => Ok(value.clone()),
            None => bail!("Channel connect timed out: '{}' not found", name),
        }
    }

    async fn put(&self, name: &str, value: PvValue) -> Result<()> {
        let mut front = self.inner.lock();
        if front.failing.contains(name) {
            bail!("Injected channel access fault writing {}", name);
        }
        tracing::debug!("Mock caput {} {}", name, value);

        if name == self.pvs.start_acquisition() {
            front.acquiring = true;
        } else if name == self.pvs.stop_acquisition() {
            front.acquiring = false;
        }

        front.journal.push((name.to_string(), value.clone()));
        front.values.insert(name.to_string(), value);
        Ok(())
    }
}
