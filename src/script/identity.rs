/// Script identity resolution
///
/// Derives the canonical name that partitions the cache from a local path or
/// an `https:` URL. Pure: nothing here touches the filesystem.
use std::path::{Path, PathBuf};

/// Where the script comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Absolute path of a local script file
    Local(PathBuf),
    /// Git repository URL containing a Swift package
    Remote(String),
}

/// Identity of a script for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptIdentity {
    /// Locator exactly as given on the command line
    pub raw: String,
    pub locator: Locator,
    /// Lowercase, extension-stripped name; sole cache partition key
    pub canonical_name: String,
    /// The script is the runner itself
    pub is_self: bool,
}

impl ScriptIdentity {
    /// Resolve a locator relative to `cwd`
    ///
    /// Anything that is not a usable `https:` URL is treated as a local path;
    /// a bad path surfaces later as "script not found".
    pub fn resolve(raw: &str, cwd: &Path, runner_name: &str) -> Self {
        let (locator, stem) = match remote_path(raw) {
            Some(path) => {
                let last = path.rsplit('/').find(|s| !s.is_empty()).unwrap_or(path);
                (Locator::Remote(raw.to_string()), strip_extension(last).to_string())
            }
            None => {
                let path = cwd.join(raw);
                let stem = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let stem = if stem == "main" {
                    parent_name(&path).unwrap_or(stem)
                } else {
                    stem
                };
                (Locator::Local(path), stem)
            }
        };

        let canonical_name = safe_name(&stem.to_lowercase());
        let is_self = canonical_name == runner_name;

        Self {
            raw: raw.to_string(),
            locator,
            canonical_name,
            is_self,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.locator, Locator::Remote(_))
    }

    /// Local script path, if any
    pub fn local_path(&self) -> Option<&Path> {
        match &self.locator {
            Locator::Local(path) => Some(path),
            Locator::Remote(_) => None,
        }
    }
}

/// Path part of an `https:` URL with a host, or `None` for local locators
fn remote_path(raw: &str) -> Option<&str> {
    let rest = raw.strip_prefix("https://")?;
    let (host, path) = rest.split_once('/')?;
    if host.is_empty() || path.trim_matches('/').is_empty() {
        return None;
    }
    // Drop query and fragment
    let path = path.split(['?', '#']).next().unwrap_or(path);
    Some(path)
}

/// Make `name` usable as a single directory under the cache base
///
/// Separators become `_`, and empty or dot-leading names (`.`, `..`,
/// `.hidden`) get a `_` prefix. Dot-leading entries in the base are
/// reserved for the runner's own bookkeeping.
fn safe_name(name: &str) -> String {
    let name: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    if name.is_empty() || name.starts_with('.') {
        format!("_{}", name)
    } else {
        name
    }
}

fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

fn parent_name(path: &Path) -> Option<String> {
    path.parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUNNER: &str = "swiftrun";

    #[test]
    fn test_local_name_is_lowercased_stem() {
        let id = ScriptIdentity::resolve("scripts/Bar.swift", Path::new("/home/me"), RUNNER);
        assert_eq!(id.canonical_name, "bar");
        assert_eq!(
            id.locator,
            Locator::Local(PathBuf::from("/home/me/scripts/Bar.swift"))
        );
        assert!(!id.is_remote());
        assert!(!id.is_self);
    }

    #[test]
    fn test_main_uses_parent_directory() {
        let id = ScriptIdentity::resolve("/work/Foo/main.swift", Path::new("/"), RUNNER);
        assert_eq!(id.canonical_name, "foo");
    }

    #[test]
    fn test_absolute_path_ignores_cwd() {
        let id = ScriptIdentity::resolve("/opt/tools/deploy.swift", Path::new("/home/me"), RUNNER);
        assert_eq!(id.local_path(), Some(Path::new("/opt/tools/deploy.swift")));
    }

    #[test]
    fn test_derivation_is_idempotent() {
        let a = ScriptIdentity::resolve("x/Tool.swift", Path::new("/w"), RUNNER);
        let b = ScriptIdentity::resolve("x/Tool.swift", Path::new("/w"), RUNNER);
        assert_eq!(a, b);
    }

    #[test]
    fn test_remote_url() {
        let id = ScriptIdentity::resolve(
            "https://github.com/example/MyTool.git",
            Path::new("/w"),
            RUNNER,
        );
        assert!(id.is_remote());
        assert_eq!(id.canonical_name, "mytool");
        assert_eq!(id.local_path(), None);
    }

    #[test]
    fn test_remote_url_with_trailing_slash() {
        let id = ScriptIdentity::resolve("https://example.com/org/Tool/", Path::new("/w"), RUNNER);
        assert_eq!(id.canonical_name, "tool");
    }

    #[test]
    fn test_malformed_url_is_local() {
        let id = ScriptIdentity::resolve("https:broken", Path::new("/w"), RUNNER);
        assert!(!id.is_remote());
        assert_eq!(id.local_path(), Some(Path::new("/w/https:broken")));
    }

    #[test]
    fn test_dot_names_stay_inside_the_cache_base() {
        let id = ScriptIdentity::resolve("..swift", Path::new("/w"), RUNNER);
        assert_eq!(id.canonical_name, "_.");

        let id = ScriptIdentity::resolve("https://h/org/..", Path::new("/w"), RUNNER);
        assert!(id.is_remote());
        assert_eq!(id.canonical_name, "_.");

        let id = ScriptIdentity::resolve("/w/.Hidden.swift", Path::new("/"), RUNNER);
        assert_eq!(id.canonical_name, "_.hidden");
    }

    #[test]
    fn test_safe_name() {
        assert_eq!(safe_name(""), "_");
        assert_eq!(safe_name(".."), "_..");
        assert_eq!(safe_name("a/b"), "a_b");
        assert_eq!(safe_name("locks"), "locks");
        assert_eq!(safe_name("tool"), "tool");
    }

    #[test]
    fn test_self_hosting() {
        let id = ScriptIdentity::resolve("/src/swiftrun/main.swift", Path::new("/"), RUNNER);
        assert_eq!(id.canonical_name, "swiftrun");
        assert!(id.is_self);
    }
}
