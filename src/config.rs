use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::xdg;

/// Complete swiftrun configuration (loaded from TOML file)
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SwiftrunConfig {
    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub install: InstallConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub edit: EditConfig,

    #[serde(default)]
    pub manifest: ManifestConfig,
}

/// External build tool configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildConfig {
    /// Build configuration passed as `-c` (debug, release)
    #[serde(default = "default_configuration")]
    pub configuration: String,

    /// Build tool executable (resolved through PATH)
    #[serde(default = "default_tool")]
    pub tool: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            configuration: default_configuration(),
            tool: default_tool(),
        }
    }
}

/// Where installed aliases are linked
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstallConfig {
    #[serde(default = "default_bin_dir")]
    pub bin_dir: String,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            bin_dir: default_bin_dir(),
        }
    }
}

/// Generated package cache location
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CacheConfig {
    /// Cache directory path (defaults to the XDG cache dir)
    #[serde(default)]
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EditConfig {
    /// Editor command used by `--edit`
    #[serde(default)]
    pub editor: Option<String>,
}

/// Generated `Package.swift` options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManifestConfig {
    #[serde(default = "default_tools_version")]
    pub tools_version: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            tools_version: default_tools_version(),
        }
    }
}

fn default_configuration() -> String {
    "debug".to_string()
}

fn default_tool() -> String {
    "swift".to_string()
}

fn default_bin_dir() -> String {
    "/usr/local/bin".to_string()
}

fn default_tools_version() -> String {
    "5.2".to_string()
}

impl SwiftrunConfig {
    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: SwiftrunConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        Ok(config)
    }

    /// Load the explicit config file if given, else the default one if it exists.
    ///
    /// A missing default file is not an error.
    pub fn load(explicit_path: Option<&str>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        let default_path = xdg::config_file();
        if default_path.exists() {
            tracing::debug!(path = %default_path.display(), "loading config");
            Self::from_file(&default_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.build.configuration.trim().is_empty() {
            anyhow::bail!("build.configuration must not be empty");
        }
        if self.build.tool.trim().is_empty() {
            anyhow::bail!("build.tool must not be empty");
        }
        if self.install.bin_dir.trim().is_empty() {
            anyhow::bail!("install.bin_dir must not be empty");
        }
        Ok(())
    }
}
