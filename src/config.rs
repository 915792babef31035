//! TOML configuration for machinewatch.
//!
//! Every section has compiled-in defaults. The file itself is optional and is
//! looked up from an explicit path, the `MACHINEWATCH_CONFIG` environment
//! variable, or `./machinewatch.toml`, in that order.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Environment variable naming an alternate config file.
pub const CONFIG_ENV: &str = "MACHINEWATCH_CONFIG";

/// Environment variable overriding `narrative.model`.
pub const MODEL_ENV: &str = "OPENAI_MODEL";

const LOCAL_CONFIG: &str = "machinewatch.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub machines: MachinesConfig,
    #[serde(default)]
    pub narrative: NarrativeConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Resolve configuration. An explicitly requested file must load; the
    /// implicit locations fall back to defaults with a warning.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => Self::load_or_default(),
        };
        config.apply_env();
        Ok(config)
    }

    fn load_or_default() -> Self {
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let path = Path::new(&env_path);
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "MACHINEWATCH_CONFIG set but file could not be loaded, trying fallback"
                    );
                }
            }
        }

        let local = Path::new(LOCAL_CONFIG);
        if local.exists() {
            match Self::load(local) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %local.display(),
                        error = %e,
                        "config file exists but could not be loaded, using defaults"
                    );
                }
            }
        }

        debug!("no config file found, using compiled-in defaults");
        Self::default()
    }

    fn apply_env(&mut self) {
        if let Ok(model) = std::env::var(MODEL_ENV) {
            if !model.trim().is_empty() {
                self.narrative.model = model;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP API listens on.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MachinesConfig {
    /// JSON file with the machine definitions.
    pub path: PathBuf,
}

impl Default for MachinesConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("config/machines.json"),
        }
    }
}

/// Hosted language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    /// Base URL of an OpenAI-compatible API (without `/chat/completions`).
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Upper bound on a single narrative call.
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 20,
            max_tokens: 200,
            temperature: 0.3,
        }
    }
}

impl NarrativeConfig {
    /// The API key, if the configured variable is set and non-empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed seed for reproducible readings; entropy when unset.
    pub seed: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.bind, "0.0.0.0:8000");
        assert_eq!(cfg.machines.path, PathBuf::from("config/machines.json"));
        assert_eq!(cfg.narrative.model, "gpt-4o-mini");
        assert_eq!(cfg.narrative.max_tokens, 200);
        assert!(cfg.simulation.seed.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[narrative]\ntimeout_secs = 3\n\n[simulation]\nseed = 9").unwrap();
        let cfg = AppConfig::load(file.path()).unwrap();
        assert_eq!(cfg.narrative.timeout_secs, 3);
        assert_eq!(cfg.narrative.base_url, "https://api.openai.com/v1");
        assert_eq!(cfg.simulation.seed, Some(9));
        assert_eq!(cfg.server.bind, "0.0.0.0:8000");
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::resolve(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_shipped_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("machinewatch.toml");
        let cfg = AppConfig::load(&path).unwrap();
        assert_eq!(cfg.narrative.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_api_key_missing_variable() {
        let cfg = NarrativeConfig {
            api_key_env: "MACHINEWATCH_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..NarrativeConfig::default()
        };
        assert!(cfg.api_key().is_none());
    }
}
