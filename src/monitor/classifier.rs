//! Threshold-based status classification.
//!
//! Each metric has a band derived from its normal range by scaling the lower
//! bound and upper bound. Critical bands are checked for every metric before
//! any warning band is considered.

use super::{MachineStatus, MetricValues};
use crate::registry::{Metric, NormalRanges};

/// Multipliers applied to `[min, max]`. `low: None` means no lower bound.
#[derive(Debug, Clone, Copy)]
struct Band {
    low: Option<f64>,
    high: f64,
}

impl Band {
    const fn new(low: f64, high: f64) -> Self {
        Self { low: Some(low), high }
    }

    const fn upper(high: f64) -> Self {
        Self { low: None, high }
    }

    fn violated(&self, value: f64, min: f64, max: f64) -> bool {
        let below = self.low.is_some_and(|low| value < min * low);
        below || value > max * self.high
    }
}

fn critical_band(metric: Metric) -> Band {
    match metric {
        Metric::Temperature => Band::new(0.9, 1.1),
        Metric::Pressure => Band::new(0.8, 1.2),
        Metric::Vibration => Band::upper(1.3),
        Metric::Rpm => Band::new(0.8, 1.2),
        Metric::PowerConsumption => Band::new(0.7, 1.3),
    }
}

fn warning_band(metric: Metric) -> Band {
    match metric {
        Metric::Temperature => Band::new(0.95, 1.05),
        Metric::Pressure => Band::new(0.9, 1.1),
        Metric::Vibration => Band::upper(1.1),
        Metric::Rpm => Band::new(0.9, 1.1),
        Metric::PowerConsumption => Band::new(0.85, 1.15),
    }
}

fn any_violated(ranges: &NormalRanges, values: &MetricValues, band: fn(Metric) -> Band) -> bool {
    Metric::ALL.iter().any(|&metric| {
        let range = ranges.get(metric);
        band(metric).violated(values.get(metric), range.min, range.max)
    })
}

/// Classify a set of readings against a machine's normal ranges.
///
/// Never returns [`MachineStatus::Offline`].
pub fn classify(ranges: &NormalRanges, values: &MetricValues) -> MachineStatus {
    if any_violated(ranges, values, critical_band) {
        MachineStatus::Critical
    } else if any_violated(ranges, values, warning_band) {
        MachineStatus::Warning
    } else {
        MachineStatus::Normal
    }
}
