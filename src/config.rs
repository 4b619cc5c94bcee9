//! Runtime configuration, read from TOML.
//!
//! Lookup order: the file named by `FACET_MCP_CONFIG`, then
//! `<config dir>/facet-mcp/config.toml`, then built-in defaults.

use crate::error::Result;
use anyhow::{Context, ensure};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "FACET_MCP_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub search: SearchSection,
    pub suggest: SuggestSection,
    pub results: ResultsSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchSection {
    /// Backend collection holding the game documents.
    pub collection: String,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            collection: "gog_games".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SuggestSection {
    /// Quiet period before a suggestion lookup runs.
    pub debounce_ms: u64,
    /// Hits fetched per lookup.
    pub per_page: u32,
}

impl Default for SuggestSection {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            per_page: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResultsSection {
    pub per_page: u32,
}

impl Default for ResultsSection {
    fn default() -> Self {
        Self { per_page: 10 }
    }
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("In config file {}", path.display()))
    }

    /// Per-user configuration file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("facet-mcp").join("config.toml"))
    }

    /// Load configuration following the documented lookup order.
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::load_file(Path::new(&path));
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load_file(&path),
            _ => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            !self.search.collection.trim().is_empty(),
            "search.collection must not be empty"
        );
        ensure!(self.suggest.per_page > 0, "suggest.per_page must be positive");
        ensure!(self.results.per_page > 0, "results.per_page must be positive");
        Ok(())
    }

    pub const fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.suggest.debounce_ms)
    }
}
