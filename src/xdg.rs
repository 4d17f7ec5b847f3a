//! XDG Base Directory support for swiftrun
//!
//! Follows the XDG Base Directory Specification:
//! - https://specifications.freedesktop.org/basedir-spec/basedir-spec-latest.html
//!
//! Directory structure:
//! - `$XDG_CACHE_HOME/swiftrun/` (default: `~/.cache/swiftrun/`) - Generated packages and builds
//! - `$XDG_CONFIG_HOME/swiftrun/` (default: `~/.config/swiftrun/`) - Configuration files

use std::path::PathBuf;

/// Get the swiftrun cache directory (one generated package per script)
///
/// Respects XDG_CACHE_HOME environment variable.
/// Falls back to the platform cache directory, then `$HOME/.cache/swiftrun`.
///
/// # Example
/// ```
/// let cache_dir = swiftrun::xdg::cache_dir();
/// // Unix: ~/.cache/swiftrun or $XDG_CACHE_HOME/swiftrun
/// ```
pub fn cache_dir() -> PathBuf {
    if let Ok(xdg_cache) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg_cache).join("swiftrun")
    } else if let Some(cache) = dirs::cache_dir() {
        cache.join("swiftrun")
    } else if let Some(home) = dirs::home_dir() {
        // XDG spec default: $HOME/.cache
        home.join(".cache").join("swiftrun")
    } else {
        PathBuf::from(".swiftrun-cache")
    }
}

/// Get the swiftrun configuration directory
///
/// Respects XDG_CONFIG_HOME environment variable.
/// Falls back to `$HOME/.config/swiftrun`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join("swiftrun")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".config").join("swiftrun")
    } else {
        PathBuf::from(".swiftrun-config")
    }
}

/// Default location of the configuration file
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}
