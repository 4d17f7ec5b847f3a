/// Configuration merger: Env vars > Config file > Defaults
///
/// The run path has no flags of its own (everything after the script belongs
/// to the script), so environment variables are the override layer.
use std::path::PathBuf;

use crate::config::SwiftrunConfig;
use crate::xdg;

pub const ENV_BUILD_CONFIG: &str = "SWIFTRUN_BUILD_CONFIG";
pub const ENV_BINDIR: &str = "SWIFTRUN_BINDIR";
pub const ENV_HOME: &str = "SWIFTRUN_HOME";
pub const ENV_BUILD_TOOL: &str = "SWIFTRUN_BUILD_TOOL";
pub const ENV_DEBUG: &str = "SWIFTRUN_DEBUG";

/// Effective settings for one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub configuration: String,
    pub build_tool: String,
    pub bin_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub editor: Option<String>,
    pub tools_version: String,
    pub verbose: bool,
}

impl Settings {
    /// Merge configuration from the environment and the config file
    pub fn merge(file: SwiftrunConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| env(key).filter(|value| !value.is_empty());

        Self {
            configuration: non_empty(ENV_BUILD_CONFIG).unwrap_or(file.build.configuration),
            build_tool: non_empty(ENV_BUILD_TOOL).unwrap_or(file.build.tool),
            bin_dir: non_empty(ENV_BINDIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(file.install.bin_dir)),
            cache_dir: non_empty(ENV_HOME)
                .or(file.cache.dir)
                .map(PathBuf::from)
                .unwrap_or_else(xdg::cache_dir),
            editor: non_empty("VISUAL")
                .or_else(|| non_empty("EDITOR"))
                .or(file.edit.editor),
            tools_version: file.manifest.tools_version,
            verbose: env(ENV_DEBUG).is_some(),
        }
    }

    /// Merge against the real process environment
    pub fn from_env(file: SwiftrunConfig) -> Self {
        Self::merge(file, |key| std::env::var(key).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let mut file = SwiftrunConfig::default();
        file.cache.dir = Some("/var/cache/swiftrun".to_string());

        let settings = Settings::merge(file, env_of(&[]));
        assert_eq!(settings.configuration, "debug");
        assert_eq!(settings.build_tool, "swift");
        assert_eq!(settings.bin_dir, PathBuf::from("/usr/local/bin"));
        assert_eq!(settings.cache_dir, PathBuf::from("/var/cache/swiftrun"));
        assert!(!settings.verbose);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = SwiftrunConfig::default();
        file.build.configuration = "release".to_string();
        file.cache.dir = Some("/var/cache/swiftrun".to_string());

        let settings = Settings::merge(
            file,
            env_of(&[
                (ENV_BUILD_CONFIG, "debug"),
                (ENV_BINDIR, "/opt/bin"),
                (ENV_HOME, "/tmp/sr"),
                (ENV_DEBUG, ""),
            ]),
        );
        assert_eq!(settings.configuration, "debug");
        assert_eq!(settings.bin_dir, PathBuf::from("/opt/bin"));
        assert_eq!(settings.cache_dir, PathBuf::from("/tmp/sr"));
        // Presence alone enables debug output
        assert!(settings.verbose);
    }

    #[test]
    fn test_empty_env_value_falls_back_to_file() {
        let mut file = SwiftrunConfig::default();
        file.build.configuration = "release".to_string();

        let settings = Settings::merge(file, env_of(&[(ENV_BUILD_CONFIG, "")]));
        assert_eq!(settings.configuration, "release");
    }

    #[test]
    fn test_editor_precedence() {
        let mut file = SwiftrunConfig::default();
        file.edit.editor = Some("nano".to_string());

        let settings = Settings::merge(file.clone(), env_of(&[("EDITOR", "vi")]));
        assert_eq!(settings.editor.as_deref(), Some("vi"));

        let settings = Settings::merge(file.clone(), env_of(&[("EDITOR", "vi"), ("VISUAL", "code")]));
        assert_eq!(settings.editor.as_deref(), Some("code"));

        let settings = Settings::merge(file, env_of(&[]));
        assert_eq!(settings.editor.as_deref(), Some("nano"));
    }
}
