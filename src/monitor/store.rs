//! Latest-value store: at most one reading per machine, no history.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::{MachineData, MachineStatus};

/// Cloneable handle to the shared latest readings, keyed by machine id.
#[derive(Debug, Clone, Default)]
pub struct LatestStore {
    readings: Arc<RwLock<HashMap<String, MachineData>>>,
}

impl LatestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored reading for the reading's machine.
    pub async fn update(&self, data: MachineData) {
        self.readings
            .write()
            .await
            .insert(data.machine_id.clone(), data);
    }

    pub async fn get(&self, machine_id: &str) -> Option<MachineData> {
        self.readings.read().await.get(machine_id).cloned()
    }

    /// Status of the latest reading, or `Offline` if there is none.
    pub async fn status(&self, machine_id: &str) -> MachineStatus {
        self.readings
            .read()
            .await
            .get(machine_id)
            .map_or(MachineStatus::Offline, |d| d.status)
    }

    /// Copy of every stored reading.
    pub async fn snapshot(&self) -> HashMap<String, MachineData> {
        self.readings.read().await.clone()
    }
}
