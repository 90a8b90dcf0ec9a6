// Configuration loader
// Reads ~/.seekcode/config.toml, then applies DEEPSEEK_* environment overrides

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::constants::{CONFIG_DIR, CONFIG_FILE};
use super::settings::Config;

pub const ENV_API_KEY: &str = "DEEPSEEK_API_KEY";
pub const ENV_MODEL: &str = "DEEPSEEK_MODEL";
pub const ENV_BASE_URL: &str = "DEEPSEEK_BASE_URL";

/// `~/.seekcode/config.toml`, if a home directory exists
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load and validate configuration from the default location and environment
pub fn load_config() -> Result<Config> {
    load_config_from(default_config_path().as_deref())
}

/// Load from `path` (missing file means defaults), apply the process
/// environment, then validate.
pub fn load_config_from(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) if path.exists() => {
            debug!(path = %path.display(), "Loading config file");
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            parse_config(&contents)
                .with_context(|| format!("Invalid configuration in {}", path.display()))?
        }
        _ => {
            debug!("No config file, using defaults");
            Config::default()
        }
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    config
        .validate()
        .context("Configuration validation failed")?;
    Ok(config)
}

/// Parse TOML; absent sections and keys fall back to defaults
pub fn parse_config(contents: &str) -> Result<Config> {
    toml::from_str(contents).context("Failed to parse config TOML")
}

/// Overlay DEEPSEEK_* variables. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(key) = get(ENV_API_KEY) {
        config.provider.api_key = Some(key);
    }
    if let Some(model) = get(ENV_MODEL) {
        debug!(%model, "Model overridden from environment");
        config.provider.model = model;
    }
    if let Some(url) = get(ENV_BASE_URL) {
        debug!(%url, "Base URL overridden from environment");
        config.provider.base_url = url;
    }
}
