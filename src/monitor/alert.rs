//! Alert construction for readings at or above the alert threshold.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::MachineData;
use crate::registry::{Machine, Metric, Range};

/// Scores below this never produce an alert.
pub const ALERT_THRESHOLD: f64 = 0.3;

const MEDIUM_THRESHOLD: f64 = 0.6;
const HIGH_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn from_score(score: f64) -> Self {
        if score >= HIGH_THRESHOLD {
            Severity::High
        } else if score >= MEDIUM_THRESHOLD {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// A detected anomaly, attributed to the single worst metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub machine_id: String,
    pub severity: Severity,
    pub message: String,
    pub metric: Metric,
    pub value: f64,
    pub expected_range: String,
    pub timestamp: DateTime<Utc>,
    pub resolved: bool,
    pub ai_analysis: Option<String>,
}

/// How far outside its range a value lies, in range widths. Unbounded.
///
/// Unlike [`super::scorer::metric_score`] this does not saturate, so it can
/// still rank two metrics that both score 1.0.
pub fn deviation(value: f64, range: &Range) -> f64 {
    range.excess(value) / range.size()
}

/// The metric with the largest deviation; ties go to the earlier metric.
pub fn worst_metric(machine: &Machine, data: &MachineData) -> (Metric, f64) {
    let mut worst = (Metric::ALL[0], f64::NEG_INFINITY);
    for metric in Metric::ALL {
        let d = deviation(data.values.get(metric), machine.normal_ranges.get(metric));
        if d > worst.1 {
            worst = (metric, d);
        }
    }
    worst
}

/// Build an alert for `data`, or `None` when `score` is below the threshold.
pub fn build_alert(
    machine: &Machine,
    data: &MachineData,
    score: f64,
    narrative: Option<String>,
) -> Option<Alert> {
    if score < ALERT_THRESHOLD {
        return None;
    }

    let (metric, _) = worst_metric(machine, data);
    let range = machine.normal_ranges.get(metric);
    let value = data.values.get(metric);

    Some(Alert {
        id: Uuid::new_v4(),
        machine_id: machine.id.clone(),
        severity: Severity::from_score(score),
        message: format!(
            "{} anomaly detected: {:.2} (normal: {})",
            metric.title(),
            value,
            range
        ),
        metric,
        value,
        expected_range: range.to_string(),
        timestamp: Utc::now(),
        resolved: false,
        ai_analysis: narrative,
    })
}
