//! Configuration system for pathquill.
//!
//! Settings live in a TOML file and every field has a default, so a partial or
//! missing file is fine. Command-line flags override whatever is loaded here.
//!
//! # Example
//!
//! ```
//! use pathquill::config::Config;
//! use pathquill::treepath::OutputFormat;
//!
//! let config = Config::default();
//! assert_eq!(config.output, OutputFormat::Text);
//! assert_eq!(config.node_budget, 1_000_000);
//!
//! let custom = Config {
//!     paths_only: true,
//!     ..Config::default()
//! };
//! assert_eq!(custom.budget(), Some(1_000_000));
//! ```

use crate::treepath::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Configuration for the pathquill CLI.
///
/// # Fields
///
/// * `output` - Report format: "text", "json" or "yaml" (default: "text")
/// * `node_budget` - Nodes recursive descent may visit per query, 0 for no
///   limit (default: 1,000,000)
/// * `max_results` - Matches to print before truncating (default: all)
/// * `paths_only` - Print paths without values (default: false)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Report format
    #[serde(default)]
    pub output: OutputFormat,

    /// Nodes recursive descent may visit per query; 0 disables the limit
    #[serde(default = "default_node_budget")]
    pub node_budget: usize,

    /// Matches to print before truncating
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,

    /// Print paths without values
    #[serde(default)]
    pub paths_only: bool,
}

/// Returns the default node budget.
fn default_node_budget() -> usize {
    1_000_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: OutputFormat::default(),
            node_budget: default_node_budget(),
            max_results: None,
            paths_only: false,
        }
    }
}

impl Config {
    /// Returns the path to the config file.
    ///
    /// Uses `~/.config/pathquill/config.toml` on all platforms.
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|mut path| {
            path.push(".config");
            path.push("pathquill");
            path.push("config.toml");
            path
        })
    }

    /// Loads configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist or can't be
    /// read.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|err| {
                warn!(path = %path.display(), "ignoring config file: {:#}", err);
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    /// Loads configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Saves configuration to the default config file.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&config_path)
    }

    /// Saves configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;

        Ok(())
    }

    /// Node budget as the engine takes it.
    pub fn budget(&self) -> Option<usize> {
        (self.node_budget > 0).then_some(self.node_budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_budget_means_unlimited() {
        let config = Config {
            node_budget: 0,
            ..Default::default()
        };
        assert_eq!(config.budget(), None);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("paths_only = true").unwrap();
        assert!(config.paths_only);
        assert_eq!(config.node_budget, 1_000_000);
        assert_eq!(config.output, OutputFormat::Text);
    }

    #[test]
    fn test_output_format_in_toml() {
        let config: Config = toml::from_str("output = \"yaml\"\nmax_results = 5").unwrap();
        assert_eq!(config.output, OutputFormat::Yaml);
        assert_eq!(config.max_results, Some(5));
    }
}
