//! Configuration file support for soundpack
//!
//! Configuration is stored in TOML format at:
//! - Linux: `~/.config/soundpack/config.toml`
//! - macOS: `~/Library/Application Support/soundpack/config.toml`
//! - Windows: `%APPDATA%\soundpack\config.toml`
//!
//! Every value can be overridden on the command line.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use soundpack_core::schema::DxOptions;
use soundpack_core::UpSelectorPolicy;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pack metadata and output defaults
    pub pack: PackSettings,
    /// dx document options
    pub dx: DxSettings,
    /// Allocation behaviour
    pub engine: EngineSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub includes_numpad: bool,
    /// Emit `version` as a string in v1/v2 documents
    pub dx_compatible: bool,
    /// Schema selector used when `--schema` is not given
    pub schema: String,
    /// Directory pack directories are created under
    pub output_root: PathBuf,
}

impl Default for PackSettings {
    fn default() -> Self {
        Self {
            author: None,
            tags: Vec::new(),
            includes_numpad: true,
            dx_compatible: false,
            schema: "all".to_string(),
            output_root: PathBuf::from("target"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DxSettings {
    pub random_pitch: bool,
    pub recommended_volume: f64,
    /// JSON document deep-merged into every dx config
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrides: Option<PathBuf>,
}

impl Default for DxSettings {
    fn default() -> Self {
        let options = DxOptions::default();
        Self {
            random_pitch: options.random_pitch,
            recommended_volume: options.recommended_volume,
            overrides: None,
        }
    }
}

impl DxSettings {
    pub fn options(&self) -> DxOptions {
        DxOptions {
            random_pitch: self.random_pitch,
            recommended_volume: self.recommended_volume,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// What happens to `_UP` selectors when building v1/dx
    pub up_selector_policy: UpSelectorPolicy,
    /// Fixed seed for balanced allocation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Config {
    /// Load configuration from `path`
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load an explicit config file, or the default one if it exists.
    ///
    /// A missing default file yields the built-in defaults; a missing
    /// explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        match Self::config_path() {
            Ok(path) if path.exists() => {
                log::debug!("Using config file {}", path.display());
                Self::load_from(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Get the default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        ProjectDirs::from("", "", "soundpack")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .context("Could not determine config directory")
    }

    /// Write a commented default config file to `path`
    pub fn create_default_config_file(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            anyhow::bail!(
                "Config file already exists at {} (use --force to overwrite)",
                path.display()
            );
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, DEFAULT_CONFIG)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}

const DEFAULT_CONFIG: &str = r#"# soundpack configuration file

[pack]
# Author written into every config document
# author = "Your Name"

tags = []

# v1: whether the pack covers the numpad
includes_numpad = true

# Write "version" as a string ("1"/"2") so DX players accept v1/v2 packs
dx_compatible = false

# Schemas built when --schema is not given: v1|v2|dx combinations or "all"
schema = "all"

# Pack directories are created under this directory
output_root = "target"

[dx]
random_pitch = false
recommended_volume = 1.0

# JSON document deep-merged into every dx config
# overrides = "rule/common.json"

[engine]
# What to do with _UP rule selectors when building v1/dx: "ignore" or "warn"
up_selector_policy = "ignore"

# Fixed seed for the balanced random allocation
# seed = 42
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.pack.includes_numpad);
        assert_eq!(config.pack.schema, "all");
        assert_eq!(config.dx.recommended_volume, 1.0);
        assert_eq!(config.engine.up_selector_policy, UpSelectorPolicy::Ignore);
    }

    #[test]
    fn test_default_file_parses_to_defaults() {
        let parsed: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = Config::default();
        config.pack.author = Some("someone".to_string());
        config.engine.seed = Some(7);
        config.engine.up_selector_policy = UpSelectorPolicy::Warn;
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file() {
        let parsed: Config = toml::from_str("[engine]\nseed = 3\n").unwrap();
        assert_eq!(parsed.engine.seed, Some(3));
        assert!(parsed.pack.includes_numpad);
    }

    #[test]
    fn test_create_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        Config::create_default_config_file(&path, false).unwrap();
        assert_eq!(Config::load(Some(path.as_path())).unwrap(), Config::default());
        assert!(Config::create_default_config_file(&path, false).is_err());
        Config::create_default_config_file(&path, true).unwrap();
    }
}
