//! Machine definitions and their configured normal operating ranges.

use serde::{Deserialize, Serialize};

use super::RegistryError;

/// Kind of equipment on the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineType {
    InjectionMolding,
    CncMill,
    Conveyor,
}

impl MachineType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MachineType::InjectionMolding => "injection_molding",
            MachineType::CncMill => "cnc_mill",
            MachineType::Conveyor => "conveyor",
        }
    }
}

impl std::fmt::Display for MachineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the five monitored sensor channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Temperature,
    Pressure,
    Vibration,
    Rpm,
    PowerConsumption,
}

impl Metric {
    /// Fixed iteration order. Root-cause ties resolve to the earliest entry.
    pub const ALL: [Metric; 5] = [
        Metric::Temperature,
        Metric::Pressure,
        Metric::Vibration,
        Metric::Rpm,
        Metric::PowerConsumption,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Pressure => "pressure",
            Metric::Vibration => "vibration",
            Metric::Rpm => "rpm",
            Metric::PowerConsumption => "power_consumption",
        }
    }

    /// Human label used in alert messages ("Power Consumption").
    pub fn title(&self) -> &'static str {
        match self {
            Metric::Temperature => "Temperature",
            Metric::Pressure => "Pressure",
            Metric::Vibration => "Vibration",
            Metric::Rpm => "Rpm",
            Metric::PowerConsumption => "Power Consumption",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Temperature => "°C",
            Metric::Pressure => "PSI",
            Metric::Vibration => "mm/s",
            Metric::Rpm => "RPM",
            Metric::PowerConsumption => "kW",
        }
    }

    /// Sensitivity of this metric to the shared slow drift.
    pub fn drift_weight(&self) -> f64 {
        match self {
            Metric::Temperature => 1.0,
            Metric::Pressure => 0.5,
            Metric::Vibration => 0.3,
            Metric::Rpm => 0.2,
            Metric::PowerConsumption => 0.4,
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    pub fn center(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn size(&self) -> f64 {
        self.max - self.min
    }

    /// Distance past the nearest bound; zero inside the range.
    pub fn excess(&self, value: f64) -> f64 {
        if value < self.min {
            self.min - value
        } else if value > self.max {
            value - self.max
        } else {
            0.0
        }
    }

    pub fn validate(&self, metric: Metric) -> Result<(), RegistryError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min >= self.max {
            return Err(RegistryError::InvalidRange {
                metric,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalRanges {
    pub temperature: Range,
    pub pressure: Range,
    pub vibration: Range,
    pub rpm: Range,
    pub power_consumption: Range,
}

impl NormalRanges {
    pub fn get(&self, metric: Metric) -> &Range {
        match metric {
            Metric::Temperature => &self.temperature,
            Metric::Pressure => &self.pressure,
            Metric::Vibration => &self.vibration,
            Metric::Rpm => &self.rpm,
            Metric::PowerConsumption => &self.power_consumption,
        }
    }

    pub fn validate(&self) -> Result<(), RegistryError> {
        Metric::ALL
            .iter()
            .try_for_each(|&metric| self.get(metric).validate(metric))
    }
}

/// A configured machine. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub machine_type: MachineType,
    pub normal_ranges: NormalRanges,
}
