use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use xdg::BaseDirectories;

/// Host build assumed when none is configured.
pub const DEFAULT_BUILD: u32 = 4200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the `Packages/` resource tree.
    pub packages_path: Option<PathBuf>,
    /// Build number assertions are gated against.
    pub build: u32,
    pub debug: bool,
    pub coverage: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            packages_path: None,
            build: DEFAULT_BUILD,
            debug: false,
            coverage: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn config_path() -> PathBuf {
        BaseDirectories::with_prefix("color-scheme-unit")
            .map(|dirs| dirs.get_config_home().join("config.toml"))
            .unwrap_or_else(|_| PathBuf::from("config.toml"))
    }
}
