use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::catalog::ProductClass;
use crate::taxonomy::TaxonomyOverrides;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,
    #[serde(default)]
    pub products: BTreeMap<String, ProductClass>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    /// Store write attempts before giving up on one record.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Pause between attempts, in milliseconds.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}
fn default_retry_backoff_ms() -> u64 {
    200
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TaxonomyConfig {
    /// Optional TOML file with `[categories]`/`[themes]` keyword overrides.
    pub path: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.sync.max_retries == 0 {
        anyhow::bail!("sync.max_retries must be >= 1");
    }

    Ok(config)
}

/// Load keyword overrides from the file named by `taxonomy.path`, or an
/// empty override set when none is configured.
pub fn load_taxonomy_overrides(config: &Config) -> Result<TaxonomyOverrides> {
    let Some(path) = &config.taxonomy.path else {
        return Ok(TaxonomyOverrides::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read taxonomy file: {}", path.display()))?;
    let overrides: TaxonomyOverrides =
        toml::from_str(&content).with_context(|| "Failed to parse taxonomy file")?;
    Ok(overrides)
}
