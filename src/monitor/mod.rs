//! Synthetic readings, status classification, anomaly scoring and alerting.

pub mod alert;
pub mod classifier;
pub mod generator;
pub mod scorer;
pub mod store;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::registry::{Machine, Metric};
use self::generator::DataGenerator;
use self::store::LatestStore;

/// Discrete machine condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineStatus {
    Normal,
    Warning,
    Critical,
    /// No reading has been stored for the machine.
    Offline,
}

impl std::fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MachineStatus::Normal => write!(f, "normal"),
            MachineStatus::Warning => write!(f, "warning"),
            MachineStatus::Critical => write!(f, "critical"),
            MachineStatus::Offline => write!(f, "offline"),
        }
    }
}

/// The five sensor values of one reading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricValues {
    pub temperature: f64,
    pub pressure: f64,
    pub vibration: f64,
    pub rpm: f64,
    pub power_consumption: f64,
}

impl MetricValues {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Temperature => self.temperature,
            Metric::Pressure => self.pressure,
            Metric::Vibration => self.vibration,
            Metric::Rpm => self.rpm,
            Metric::PowerConsumption => self.power_consumption,
        }
    }

    pub fn set(&mut self, metric: Metric, value: f64) {
        match metric {
            Metric::Temperature => self.temperature = value,
            Metric::Pressure => self.pressure = value,
            Metric::Vibration => self.vibration = value,
            Metric::Rpm => self.rpm = value,
            Metric::PowerConsumption => self.power_consumption = value,
        }
    }

    /// Every metric at the center of its normal range.
    pub fn centered(machine: &Machine) -> Self {
        let mut values = Self::default();
        for metric in Metric::ALL {
            values.set(metric, machine.normal_ranges.get(metric).center());
        }
        values
    }
}

/// One reading for one machine. Replaced wholesale by the next reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineData {
    pub machine_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub values: MetricValues,
    pub status: MachineStatus,
    pub anomaly_score: Option<f64>,
}

impl MachineData {
    /// Build a reading from explicit values, classifying its status.
    pub fn new(machine: &Machine, values: MetricValues) -> Self {
        Self {
            machine_id: machine.id.clone(),
            timestamp: Utc::now(),
            values,
            status: classifier::classify(&machine.normal_ranges, &values),
            anomaly_score: None,
        }
    }
}

/// Runs generate -> score -> store cycles against a shared generator.
#[derive(Clone)]
pub struct Monitor {
    generator: Arc<Mutex<DataGenerator>>,
    store: LatestStore,
}

impl Monitor {
    pub fn new(generator: DataGenerator, store: LatestStore) -> Self {
        Self {
            generator: Arc::new(Mutex::new(generator)),
            store,
        }
    }

    pub fn store(&self) -> &LatestStore {
        &self.store
    }

    /// Produce, score and store a fresh reading for `machine`.
    ///
    /// The generator guard is held until the store write lands, so the stored
    /// reading is always the most recently generated one.
    pub async fn sample(&self, machine: &Machine) -> MachineData {
        let mut generator = self.generator.lock().await;
        let mut data = generator.generate(machine);
        let score = scorer::anomaly_score(machine, &data);
        data.anomaly_score = Some(score);
        self.store.update(data.clone()).await;
        drop(generator);

        debug!(machine_id = %machine.id, status = %data.status, score, "sampled machine");
        data
    }
}
