//! Machine registry -- static machine definitions loaded once at startup.

pub mod machine;

pub use self::machine::{Machine, MachineType, Metric, NormalRanges, Range};

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid {metric} range: min {min} must be below max {max}")]
    InvalidRange { metric: Metric, min: f64, max: f64 },

    #[error("duplicate machine id {0}")]
    DuplicateId(String),
}

/// On-disk layout of the machine configuration file.
#[derive(Debug, Deserialize)]
struct MachineConfigFile {
    machines: Vec<Machine>,
}

/// Insertion-ordered lookup table of configured machines.
#[derive(Debug, Default, Clone)]
pub struct MachineRegistry {
    machines: Vec<Machine>,
    index: HashMap<String, usize>,
}

impl MachineRegistry {
    /// Build a registry, rejecting machines with malformed ranges or reused ids.
    pub fn from_machines(machines: Vec<Machine>) -> Self {
        let mut registry = Self::default();
        for machine in machines {
            let id = machine.id.clone();
            if let Err(e) = registry.insert(machine) {
                warn!(machine_id = %id, error = %e, "skipping machine definition");
            }
        }
        registry
    }

    fn insert(&mut self, machine: Machine) -> Result<(), RegistryError> {
        machine.normal_ranges.validate()?;
        if self.index.contains_key(&machine.id) {
            return Err(RegistryError::DuplicateId(machine.id));
        }
        self.index.insert(machine.id.clone(), self.machines.len());
        self.machines.push(machine);
        Ok(())
    }

    /// Parse a machine configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read machine config: {}", path.display()))?;
        let file: MachineConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse machine config: {}", path.display()))?;
        let registry = Self::from_machines(file.machines);
        info!(path = %path.display(), machines = registry.len(), "loaded machine registry");
        Ok(registry)
    }

    /// Load the registry, starting empty when the file is missing or unreadable.
    pub fn load_or_empty(path: &Path) -> Self {
        if !path.exists() {
            warn!(path = %path.display(), "machine config file not found, registry is empty");
            return Self::default();
        }
        match Self::load(path) {
            Ok(registry) => registry,
            Err(e) => {
                let reason = format!("{:#}", e);
                error!(path = %path.display(), error = %reason, "error loading machine configs");
                Self::default()
            }
        }
    }

    pub fn all(&self) -> &[Machine] {
        &self.machines
    }

    pub fn get(&self, id: &str) -> Option<&Machine> {
        self.index.get(id).map(|&i| &self.machines[i])
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::machine;
    use std::io::Write;

    #[test]
    fn test_lookup_preserves_order() {
        let registry = MachineRegistry::from_machines(vec![machine("b"), machine("a")]);
        let ids: Vec<_> = registry.all().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
        assert_eq!(registry.get("a").unwrap().id, "a");
        assert!(registry.get("zzz").is_none());
    }

    #[test]
    fn test_rejects_bad_ranges_and_duplicates() {
        let mut bad = machine("bad");
        bad.normal_ranges.pressure = Range::new(120.0, 80.0);
        let registry =
            MachineRegistry::from_machines(vec![machine("ok"), bad, machine("ok")]);
        assert_eq!(registry.len(), 1);
        assert!(registry.get("bad").is_none());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let registry = MachineRegistry::load_or_empty(&dir.path().join("nope.json"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unparseable_file_is_empty() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(MachineRegistry::load(file.path()).is_err());
        assert!(MachineRegistry::load_or_empty(file.path()).is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let body = serde_json::json!({ "machines": [machine("im-01"), machine("conv-01")] });
        write!(file, "{}", body).unwrap();
        let registry = MachineRegistry::load(file.path()).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("conv-01").unwrap().name, "Machine conv-01");
    }

    #[test]
    fn test_shipped_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/machines.json");
        let registry = MachineRegistry::load(&path).unwrap();
        assert_eq!(registry.len(), 3);
    }
}
