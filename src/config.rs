//! Tool configuration
//!
//! TOML files are layered, later ones overriding earlier ones field by field:
//!
//! 1. `$XDG_CONFIG_HOME/extra-sources/config.toml`
//! 2. `$RECIPE_DIR/extra-sources.toml`
//! 3. an explicit `--config` file
//!
//! Command-line flags are applied on top by the binary.
//!
//! ```toml
//! [provider]
//! bin = "conda-provide-source"
//! args = ["--meta", "{meta}", "--into", "{work_dir}"]
//! env = { CONDA_BLD_PATH = "/opt/conda-bld" }
//! ```

use crate::provider::CommandProvider;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Per-recipe config file name.
pub const RECIPE_CONFIG_NAME: &str = "extra-sources.toml";

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigToml {
    pub provider: Option<ProviderToml>,
    /// Whether to take the build folder lock. Defaults to on.
    pub lock: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProviderToml {
    pub bin: Option<String>,
    pub args: Option<Vec<String>>,
    pub env: Option<BTreeMap<String, String>>,
}

impl ConfigToml {
    pub fn merge(&mut self, other: ConfigToml) {
        if other.lock.is_some() {
            self.lock = other.lock;
        }
        match (self.provider.as_mut(), other.provider) {
            (Some(dst), Some(src)) => dst.merge(src),
            (None, Some(src)) => self.provider = Some(src),
            _ => {}
        }
    }

    /// Parse one config file.
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// Merge every config file that exists, then `explicit` (which must exist).
    pub fn load(recipe_dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        let mut config = ConfigToml::default();
        for path in default_paths(recipe_dir) {
            if path.is_file() {
                config.merge(Self::read(&path)?);
            }
        }
        if let Some(path) = explicit {
            config.merge(Self::read(path)?);
        }
        Ok(config)
    }

    pub fn lock_enabled(&self) -> bool {
        self.lock.unwrap_or(true)
    }

    /// Build the provider described by the merged config.
    pub fn command_provider(&self) -> Result<CommandProvider> {
        let provider = self.provider.clone().unwrap_or_default();
        let bin = provider.bin.context(
            "no source provider configured; pass --provider, set EXTRA_SOURCES_PROVIDER, \
             or add [provider] bin = \"...\" to extra-sources.toml",
        )?;
        Ok(CommandProvider::new(bin)
            .args(provider.args.unwrap_or_default())
            .envs(provider.env.unwrap_or_default()))
    }
}

impl ProviderToml {
    fn merge(&mut self, other: ProviderToml) {
        if other.bin.is_some() {
            self.bin = other.bin;
        }
        if other.args.is_some() {
            self.args = other.args;
        }
        match (&mut self.env, other.env) {
            (Some(dst), Some(src)) => {
                for (k, v) in src {
                    dst.insert(k, v);
                }
            }
            (None, Some(src)) => self.env = Some(src),
            _ => {}
        }
    }
}

/// Global then per-recipe config locations.
pub fn default_paths(recipe_dir: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("extra-sources").join("config.toml"));
    }
    paths.push(recipe_dir.join(RECIPE_CONFIG_NAME));
    paths
}
