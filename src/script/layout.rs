/// On-disk layout of a script's cache root
///
/// ```text
/// <base>/
///   .locks/<name>.lock
///   <name>/
///     Package.swift
///     .swiftrun.json
///     Sources/<name>/main.swift
///     .build/<configuration>/<name>
/// ```
use std::path::{Path, PathBuf};

use super::identity::ScriptIdentity;

pub const MANIFEST_FILE: &str = "Package.swift";
pub const STATE_FILE: &str = ".swiftrun.json";
pub const ENTRY_FILE: &str = "main.swift";
const LOCKS_DIR: &str = ".locks";

/// Paths derived from the cache base, an identity and a build configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLayout {
    base: PathBuf,
    name: String,
    configuration: String,
}

impl CacheLayout {
    pub fn new(base: &Path, identity: &ScriptIdentity, configuration: &str) -> Self {
        Self::from_name(base, &identity.canonical_name, configuration)
    }

    /// Layout for an existing root found by listing the cache
    pub fn from_name(base: &Path, name: &str, configuration: &str) -> Self {
        Self {
            base: base.to_path_buf(),
            name: name.to_string(),
            configuration: configuration.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn configuration(&self) -> &str {
        &self.configuration
    }

    pub fn root(&self) -> PathBuf {
        self.base.join(&self.name)
    }

    pub fn manifest(&self) -> PathBuf {
        self.root().join(MANIFEST_FILE)
    }

    pub fn state_file(&self) -> PathBuf {
        self.root().join(STATE_FILE)
    }

    /// Directory holding the generated sources
    pub fn sources_dir(&self) -> PathBuf {
        self.root().join("Sources").join(&self.name)
    }

    pub fn entry(&self) -> PathBuf {
        self.sources_dir().join(ENTRY_FILE)
    }

    pub fn artifact(&self) -> PathBuf {
        self.root()
            .join(".build")
            .join(&self.configuration)
            .join(&self.name)
    }

    pub fn lock_file(&self) -> PathBuf {
        self.base.join(LOCKS_DIR).join(format!("{}.lock", self.name))
    }
}

/// Names of every cache root under `base`
///
/// Canonical names never start with a dot, so dot entries (the lock
/// directory) are skipped.
pub fn list_roots(base: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    if !base.exists() {
        return Ok(names);
    }

    for entry in std::fs::read_dir(base)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if !name.starts_with('.') {
                names.push(name.to_string());
            }
        }
    }

    names.sort();
    Ok(names)
}
