use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub size_check: SizeCheckConfig,
    #[serde(default)]
    pub changelog: ChangelogConfig,
    #[serde(default)]
    pub package: PackageConfig,
}

/// Settings for the line-count gate.
#[derive(Debug, Clone, Deserialize)]
pub struct SizeCheckConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,
    /// File extensions (without the dot) that count as source files.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Directory names skipped anywhere in the tree.
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,
}

impl Default for SizeCheckConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            max_lines: default_max_lines(),
            extensions: default_extensions(),
            exclude_dirs: default_exclude_dirs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangelogConfig {
    #[serde(default = "default_fragment_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_changelog_file")]
    pub file: PathBuf,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            dir: default_fragment_dir(),
            file: default_changelog_file(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageConfig {
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            manifest: default_manifest(),
        }
    }
}

impl SizeCheckConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_lines == 0 {
            return Err(Error::config("size_check.max_lines must be at least 1"));
        }
        if self.extensions.is_empty() {
            return Err(Error::config("size_check.extensions must not be empty"));
        }
        Ok(())
    }
}

// Defaults
fn default_root() -> PathBuf {
    "src".into()
}
fn default_max_lines() -> usize {
    1000
}
fn default_extensions() -> Vec<String> {
    vec!["rs".into()]
}
fn default_exclude_dirs() -> Vec<String> {
    vec!["target".into(), ".git".into(), "node_modules".into()]
}
fn default_fragment_dir() -> PathBuf {
    "changelog.d".into()
}
fn default_changelog_file() -> PathBuf {
    "CHANGELOG.md".into()
}
fn default_manifest() -> PathBuf {
    "Cargo.toml".into()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config {}: {e}", path.display())))?;
        toml::from_str(&content).map_err(|e| Error::config(format!("Failed to parse config: {e}")))
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.size_check.validate()
    }
}
