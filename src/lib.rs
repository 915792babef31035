//! machinewatch -- industrial machine monitoring demo backend.
//!
//! This crate provides the machine registry, the synthetic reading generator,
//! anomaly scoring and alerting, the narrative (language model) integration,
//! and the HTTP API that ties them together.

pub mod api;
pub mod config;
pub mod monitor;
pub mod narrative;
pub mod registry;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::AppConfig;
use crate::monitor::generator::DataGenerator;
use crate::monitor::store::LatestStore;
use crate::monitor::Monitor;
use crate::narrative::openai::OpenAiNarrator;
use crate::narrative::Narrator;
use crate::registry::MachineRegistry;

/// Generator seeded from config, or from entropy when no seed is set.
pub fn build_generator(seed: Option<u64>) -> DataGenerator {
    match seed {
        Some(seed) => DataGenerator::new(seed),
        None => DataGenerator::from_entropy(),
    }
}

/// Narrator backed by the hosted model, or a disabled one when no API key is set.
pub fn build_narrator(config: &AppConfig) -> Narrator {
    let narrative = &config.narrative;
    let Some(api_key) = narrative.api_key() else {
        tracing::warn!(
            env = %narrative.api_key_env,
            "no API key configured, narrative service unavailable (fallback text only)"
        );
        return Narrator::disabled();
    };

    match OpenAiNarrator::new(narrative, api_key) {
        Ok(service) => {
            tracing::info!(model = %service.model(), "narrative service enabled");
            Narrator::new(Arc::new(service), Duration::from_secs(narrative.timeout_secs))
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to build narrative client, narrative service unavailable");
            Narrator::disabled()
        }
    }
}

/// Start the machinewatch API server.
pub async fn serve(config: AppConfig) -> Result<()> {
    // 1. Machine registry
    let registry = MachineRegistry::load_or_empty(&config.machines.path);

    // 2. Generator + latest-value store
    let monitor = Monitor::new(build_generator(config.simulation.seed), LatestStore::new());

    // 3. Narrative service
    let narrator = build_narrator(&config);
    tracing::info!(available = narrator.is_available(), "narrative service ready");

    // 4. Start API Server
    let addr: std::net::SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.server.bind))?;
    let app = api::router(api::state::AppState::new(registry, monitor, narrator));

    tracing::info!(%addr, "machinewatch listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrator_without_key_is_unavailable() {
        let mut config = AppConfig::default();
        config.narrative.api_key_env = "MACHINEWATCH_TEST_UNSET_KEY".to_string();
        assert!(!build_narrator(&config).is_available());
    }

    #[test]
    fn test_generator_resumes_from_tick() {
        let mut generator = build_generator(Some(5)).starting_at(40);
        generator.generate(&testutil::machine("m"));
        assert_eq!(generator.tick(), 41);
    }
}
