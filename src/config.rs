//! Configuration loading for Dayplan
//!
//! Settings come from an optional `dayplan.toml`, then environment overrides:
//!
//! ```toml
//! provider = "lmstudio"          # or "gemini"
//! data_dir = "/home/me/.dayplan"
//!
//! [gemini]
//! api_key = "..."
//! model = "gemini-2.5-flash-lite"
//!
//! [lmstudio]
//! url = "http://127.0.0.1:1234"
//! model = "google/gemma-3-4b"
//! ```

use crate::{DayplanConfig, DayplanError, Provider, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CONFIG_FILE: &str = "dayplan.toml";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-lite";
pub const DEFAULT_LMSTUDIO_URL: &str = "http://127.0.0.1:1234";
pub const DEFAULT_LMSTUDIO_MODEL: &str = "google/gemma-3-4b";

pub const ENV_PROVIDER: &str = "DAYPLAN_PROVIDER";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_LMSTUDIO_URL: &str = "DAYPLAN_LMSTUDIO_URL";
pub const ENV_DATA_DIR: &str = "DAYPLAN_DATA_DIR";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    provider: Option<String>,
    data_dir: Option<PathBuf>,
    gemini: GeminiSection,
    lmstudio: LmStudioSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeminiSection {
    api_key: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LmStudioSection {
    url: Option<String>,
    model: Option<String>,
}

/// `<data dir>/dayplan`, or the working directory when the platform has none
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("dayplan"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `<config dir>/dayplan/dayplan.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dayplan").join(CONFIG_FILE))
}

/// Load configuration.
///
/// An explicit `path` must exist. Without one, the default location is used
/// if present and defaults apply otherwise. Environment variables win over
/// file values.
pub fn load(path: Option<&Path>) -> Result<DayplanConfig> {
    let content = match path {
        Some(path) => Some(std::fs::read_to_string(path).map_err(|e| {
            DayplanError::Config(format!("cannot read {}: {e}", path.display()))
        })?),
        None => match default_config_path() {
            Some(default) if default.exists() => {
                debug!("Using config file {}", default.display());
                Some(std::fs::read_to_string(&default)?)
            }
            _ => None,
        },
    };

    let config = match content {
        Some(content) => parse(&content)?,
        None => DayplanConfig::new(default_data_dir()),
    };
    let config = apply_env(config, |key| std::env::var(key).ok())?;
    info!(
        "Config loaded: provider={}, data_dir={}",
        config.provider,
        config.data_dir.display()
    );
    Ok(config)
}

/// Build a config from TOML text, filling gaps with defaults
pub fn parse(content: &str) -> Result<DayplanConfig> {
    let file: FileConfig =
        toml::from_str(content).map_err(|e| DayplanError::Config(e.to_string()))?;

    let mut config = DayplanConfig::new(file.data_dir.unwrap_or_else(default_data_dir));
    if let Some(provider) = file.provider {
        config = config.with_provider(provider.parse()?);
    }
    if let Some(key) = file.gemini.api_key {
        config = config.with_gemini_api_key(key);
    }
    if let Some(model) = file.gemini.model {
        config.gemini_model = model;
    }
    if let Some(url) = file.lmstudio.url {
        config.lmstudio_url = url;
    }
    if let Some(model) = file.lmstudio.model {
        config.lmstudio_model = model;
    }
    Ok(config)
}

/// Apply environment overrides read through `lookup`
pub fn apply_env<F>(mut config: DayplanConfig, lookup: F) -> Result<DayplanConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(provider) = lookup(ENV_PROVIDER) {
        config.provider = provider.parse::<Provider>()?;
    }
    if let Some(key) = lookup(ENV_GEMINI_API_KEY) {
        config.gemini_api_key = Some(key);
    }
    if let Some(url) = lookup(ENV_LMSTUDIO_URL) {
        config.lmstudio_url = url;
    }
    if let Some(dir) = lookup(ENV_DATA_DIR) {
        config.data_dir = PathBuf::from(dir);
    }
    Ok(config)
}
