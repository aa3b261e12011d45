// Harness configuration loading for the bytebash CLI
use anyhow::{bail, Context, Result};
use bytebash_common::config::{EngineKind, HarnessConfig};
use std::fs;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_CONFIG_PATH: &str = "config/bytebash.json";

pub const ENGINE_ENV: &str = "BYTEBASH_ENGINE";
pub const MAX_OUTPUT_ENV: &str = "BYTEBASH_MAX_OUTPUT_BYTES";
pub const PYTHON_ENV: &str = "BYTEBASH_PYTHON";

/// Load a harness config file
pub fn load(config_path: &Path) -> Result<HarnessConfig> {
    if !config_path.exists() {
        bail!("Harness config file not found: {}", config_path.display());
    }

    let content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;

    let config: HarnessConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", config_path.display()))?;

    validate(&config)?;
    Ok(config)
}

/// Load an explicit path, or config/bytebash.json when present, or defaults
pub fn load_or_default(config_path: Option<&Path>) -> Result<HarnessConfig> {
    match config_path {
        Some(path) => load(path),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                load(default_path)
            } else {
                debug!("no config file, using defaults");
                Ok(HarnessConfig::default())
            }
        }
    }
}

/// Apply `BYTEBASH_*` overrides through an arbitrary variable lookup
pub fn apply_overrides<F>(mut config: HarnessConfig, lookup: F) -> Result<HarnessConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(engine) = lookup(ENGINE_ENV) {
        config.engine = engine
            .parse::<EngineKind>()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("Invalid {}", ENGINE_ENV))?;
    }
    if let Some(limit) = lookup(MAX_OUTPUT_ENV) {
        config.max_output_bytes = limit
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: '{}'", MAX_OUTPUT_ENV, limit))?;
    }
    if let Some(python) = lookup(PYTHON_ENV) {
        config.python_command = python;
    }
    validate(&config)?;
    Ok(config)
}

/// Apply overrides from the process environment
pub fn apply_env_overrides(config: HarnessConfig) -> Result<HarnessConfig> {
    apply_overrides(config, |name| std::env::var(name).ok())
}

fn validate(config: &HarnessConfig) -> Result<()> {
    if config.max_output_bytes == 0 {
        bail!("max_output_bytes must be greater than zero");
    }
    if config.python_command.trim().is_empty() {
        bail!("python_command must not be empty");
    }
    Ok(())
}
