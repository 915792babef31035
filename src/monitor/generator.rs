//! Synthetic reading generator.
//!
//! Each call advances a tick counter shared by every machine the generator
//! serves. The tick drives a slow sinusoidal drift, a uniform noise term is
//! drawn per reading, and most readings get one metric forced far outside
//! its range so there is always something to look at.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{MachineData, MetricValues};
use crate::registry::{Machine, Metric, Range};

/// Probability that a reading carries an injected anomaly.
pub const ANOMALY_PROBABILITY: f64 = 0.8;

const DRIFT_FREQUENCY: f64 = 0.1;
const DRIFT_AMPLITUDE: f64 = 0.1;
const NOISE_AMPLITUDE: f64 = 0.05;

/// Extreme values an injected anomaly may take for `metric`.
///
/// Vibration only fails high.
fn anomaly_candidates(metric: Metric, range: &Range) -> Vec<f64> {
    match metric {
        Metric::Temperature => vec![range.min * 0.5, range.max * 1.6],
        Metric::Pressure => vec![range.min * 0.3, range.max * 2.0],
        Metric::Vibration => vec![range.max * 3.0],
        Metric::Rpm => vec![range.min * 0.2, range.max * 2.0],
        Metric::PowerConsumption => vec![range.min * 0.1, range.max * 2.5],
    }
}

pub struct DataGenerator<R = StdRng> {
    rng: R,
    tick: u64,
}

impl DataGenerator<StdRng> {
    /// Deterministic generator for a given seed.
    pub fn new(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl<R: Rng> DataGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng, tick: 0 }
    }

    /// Resume the drift from a given tick.
    pub fn starting_at(mut self, tick: u64) -> Self {
        self.tick = tick;
        self
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Produce one unscored reading for `machine`.
    pub fn generate(&mut self, machine: &Machine) -> MachineData {
        self.tick += 1;
        let time_factor = (self.tick as f64 * DRIFT_FREQUENCY).sin() * DRIFT_AMPLITUDE;
        let noise_factor = self.rng.gen_range(-NOISE_AMPLITUDE..=NOISE_AMPLITUDE);

        let ranges = &machine.normal_ranges;
        let mut values = MetricValues::default();
        for metric in Metric::ALL {
            let base = ranges.get(metric).center();
            let value =
                base + base * time_factor * metric.drift_weight() + base * noise_factor;
            values.set(metric, value);
        }

        if self.rng.gen_bool(ANOMALY_PROBABILITY) {
            let metric = Metric::ALL[self.rng.gen_range(0..Metric::ALL.len())];
            let candidates = anomaly_candidates(metric, ranges.get(metric));
            let value = candidates[self.rng.gen_range(0..candidates.len())];
            values.set(metric, value);
        }

        MachineData::new(machine, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::{scorer, MachineStatus};
    use crate::testutil::machine;

    /// Deterministic source that always reports the lowest possible draw.
    struct Floor;

    impl rand::RngCore for Floor {
        fn next_u32(&mut self) -> u32 {
            0
        }
        fn next_u64(&mut self) -> u64 {
            0
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }
        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            dest.fill(0);
            Ok(())
        }
    }

    #[test]
    fn test_same_seed_same_stream() {
        let m = machine("m");
        let mut a = DataGenerator::new(42);
        let mut b = DataGenerator::new(42);
        for _ in 0..20 {
            assert_eq!(a.generate(&m).values, b.generate(&m).values);
        }
    }

    #[test]
    fn test_tick_is_shared_across_machines() {
        let mut generator = DataGenerator::new(1);
        generator.generate(&machine("a"));
        generator.generate(&machine("b"));
        assert_eq!(generator.tick(), 2);
        assert_eq!(DataGenerator::new(1).starting_at(10).tick(), 10);
    }

    #[test]
    fn test_lowest_draw_injects_low_temperature() {
        // Lowest draws: noise -0.05, anomaly injected, first metric, low side.
        let m = machine("m");
        let mut generator = DataGenerator::with_rng(Floor);
        let data = generator.generate(&m);
        assert_eq!(data.values.temperature, 30.0);
        assert_eq!(data.status, MachineStatus::Critical);

        let tf = (0.1f64).sin() * 0.1;
        let base = m.normal_ranges.rpm.center();
        let expected = base + base * tf * 0.2 + base * -0.05;
        assert!((data.values.rpm - expected).abs() < 1e-9);
        assert!(data.anomaly_score.is_none());
    }

    #[test]
    fn test_most_readings_are_anomalous() {
        let m = machine("m");
        let mut generator = DataGenerator::new(2024);
        let n = 2000;
        let critical = (0..n)
            .filter(|_| generator.generate(&m).status == MachineStatus::Critical)
            .count();
        let share = critical as f64 / n as f64;
        assert!((0.7..0.9).contains(&share), "critical share {share}");
    }

    #[test]
    fn test_scores_stay_bounded() {
        let m = machine("m");
        for seed in 0..50 {
            let mut generator = DataGenerator::new(seed);
            for _ in 0..50 {
                let data = generator.generate(&m);
                let score = scorer::anomaly_score(&m, &data);
                assert!((0.0..=1.0).contains(&score));
            }
        }
    }

    #[test]
    fn test_injection_candidates_leave_range() {
        let m = machine("m");
        for metric in Metric::ALL {
            let range = m.normal_ranges.get(metric);
            for v in anomaly_candidates(metric, range) {
                assert!(!range.contains(v), "{metric} candidate {v} is in range");
            }
        }
    }
}
