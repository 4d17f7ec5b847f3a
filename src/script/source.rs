/// Source acquisition
///
/// Remote scripts are cloned into (or pulled inside) their cache root.
/// Local scripts are only checked for existence; their text is read later by
/// the synthesizer.
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use super::identity::{Locator, ScriptIdentity};
use super::layout::{CacheLayout, ENTRY_FILE};
use crate::error::AcquireError;
use crate::logging::stages;

/// Files making up a local script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSources {
    pub entry: PathBuf,
    /// Other `.swift` files next to a `main.swift` entry, sorted by name
    pub siblings: Vec<PathBuf>,
}

impl LocalSources {
    /// Entry first, then siblings
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.entry.as_path()).chain(self.siblings.iter().map(PathBuf::as_path))
    }

    /// File names of the siblings, in the same order
    pub fn sibling_names(&self) -> Vec<String> {
        self.siblings
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect()
    }

    /// Newest modification time across all files
    pub fn modified(&self) -> SystemTime {
        self.files().map(modified).max().unwrap_or(UNIX_EPOCH)
    }
}

/// Result of the acquisition stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquiredSource {
    Local(LocalSources),
    /// Package checked out at the cache root
    Remote,
}

/// Fetch or locate the script's sources
pub fn acquire(
    identity: &ScriptIdentity,
    layout: &CacheLayout,
) -> Result<AcquiredSource, AcquireError> {
    match &identity.locator {
        Locator::Local(path) => local_sources(path).map(AcquiredSource::Local),
        Locator::Remote(url) => {
            sync_remote(url, &layout.root())?;
            Ok(AcquiredSource::Remote)
        }
    }
}

/// Collect the entry file and, for a `main.swift` entry, its sibling sources
pub fn local_sources(entry: &Path) -> Result<LocalSources, AcquireError> {
    if !entry.is_file() {
        return Err(AcquireError::NotFound(entry.to_path_buf()));
    }

    let mut siblings = Vec::new();
    let is_main = entry.file_name().and_then(|n| n.to_str()) == Some(ENTRY_FILE);

    if let (true, Some(dir)) = (is_main, entry.parent()) {
        let read_dir = fs::read_dir(dir).map_err(|source| AcquireError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        for dir_entry in read_dir {
            let dir_entry = dir_entry.map_err(|source| AcquireError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = dir_entry.path();
            let is_swift = path.extension().and_then(|e| e.to_str()) == Some("swift");
            if is_swift && path.is_file() && path.file_name() != entry.file_name() {
                siblings.push(path);
            }
        }
        siblings.sort();
    }

    debug!(
        stage = stages::ACQUIRE,
        entry = %entry.display(),
        siblings = siblings.len(),
        "local sources"
    );

    Ok(LocalSources {
        entry: entry.to_path_buf(),
        siblings,
    })
}

/// Clone `url` into `root`, or pull if it is already a checkout
fn sync_remote(url: &str, root: &Path) -> Result<(), AcquireError> {
    let git = which::which("git").map_err(AcquireError::GitUnavailable)?;
    fetch(&git, url, root)
}

fn fetch(git: &Path, url: &str, root: &Path) -> Result<(), AcquireError> {
    let mut cmd = Command::new(git);
    let description = if root.join(".git").exists() {
        cmd.arg("-C").arg(root).arg("pull");
        format!("git -C {} pull", root.display())
    } else {
        if let Some(parent) = root.parent() {
            fs::create_dir_all(parent).map_err(|source| AcquireError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        cmd.arg("clone").arg(url).arg(root);
        format!("git clone {} {}", url, root.display())
    };

    info!(stage = stages::ACQUIRE, command = %description, "executing");

    let status = cmd.status().map_err(|source| AcquireError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    if !status.success() {
        return Err(AcquireError::Git {
            command: description,
            status,
        });
    }

    Ok(())
}

/// Modification time, or the epoch when the file is missing
pub fn modified(path: &Path) -> SystemTime {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(UNIX_EPOCH)
}
