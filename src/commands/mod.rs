pub mod cache;
pub mod run;

use anyhow::{Context, Result};

use crate::config::SwiftrunConfig;
use crate::merger::Settings;

/// Config file named by `SWIFTRUN_CONFIG`
pub const ENV_CONFIG: &str = "SWIFTRUN_CONFIG";

/// Load and validate the config file, then apply environment overrides
pub fn load_settings(config_path: Option<&str>) -> Result<Settings> {
    let file = SwiftrunConfig::load(config_path).context("Failed to load configuration")?;
    file.validate().context("Invalid configuration")?;
    Ok(Settings::from_env(file))
}
