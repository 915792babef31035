//! Continuous anomaly score in `[0, 1]`.
//!
//! In-range values contribute at most 0.3 (linear in distance from center).
//! Out-of-range values contribute at least 0.5, growing by one per range
//! width of excess and saturating at 1.0. The machine score is the mean of
//! the five per-metric scores.

use super::MachineData;
use crate::registry::{Machine, Metric, Range};

/// Largest contribution of a value that is still inside its range.
pub const IN_RANGE_WEIGHT: f64 = 0.3;

/// Smallest contribution of a value outside its range.
pub const OUT_OF_RANGE_FLOOR: f64 = 0.5;

pub fn metric_score(value: f64, range: &Range) -> f64 {
    let size = range.size();
    if range.contains(value) {
        (value - range.center()).abs() / (size / 2.0) * IN_RANGE_WEIGHT
    } else {
        (OUT_OF_RANGE_FLOOR + range.excess(value) / size).min(1.0)
    }
}

pub fn anomaly_score(machine: &Machine, data: &MachineData) -> f64 {
    let total: f64 = Metric::ALL
        .iter()
        .map(|&m| metric_score(data.values.get(m), machine.normal_ranges.get(m)))
        .sum();
    (total / Metric::ALL.len() as f64).clamp(0.0, 1.0)
}
