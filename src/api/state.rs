use std::sync::Arc;

use crate::monitor::Monitor;
use crate::narrative::Narrator;
use crate::registry::MachineRegistry;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<MachineRegistry>,
    pub monitor: Monitor,
    pub narrator: Narrator,
}

impl AppState {
    pub fn new(registry: MachineRegistry, monitor: Monitor, narrator: Narrator) -> Self {
        Self {
            registry: Arc::new(registry),
            monitor,
            narrator,
        }
    }
}
