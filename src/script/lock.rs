/// Per-script advisory lock
///
/// Serializes runs that share a canonical name from acquisition through
/// install. The lock is released when the guard drops, before handoff, so a
/// long-running script never blocks the next invocation.
use fs4::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::LockError;
use crate::logging::stages;

/// Held exclusive lock; unlocked on drop
#[derive(Debug)]
pub struct ScriptLock {
    file: File,
    path: PathBuf,
}

impl ScriptLock {
    /// Block until the lock at `path` is held
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        let lock_error = |source| LockError {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(lock_error)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)
            .map_err(lock_error)?;

        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::WouldBlock => {
                info!(
                    stage = stages::LOCK,
                    path = %path.display(),
                    "another run is updating this script, waiting"
                );
                file.lock_exclusive().map_err(lock_error)?;
            }
            Err(err) => return Err(lock_error(err)),
        }

        debug!(stage = stages::LOCK, path = %path.display(), "locked");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Try once without blocking; `None` when another holder exists
    pub fn try_acquire(path: &Path) -> Result<Option<Self>, LockError> {
        let lock_error = |source| LockError {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(lock_error)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)
            .map_err(lock_error)?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self {
                file,
                path: path.to_path_buf(),
            })),
            Err(err) if err.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(err) => Err(lock_error(err)),
        }
    }
}

impl Drop for ScriptLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            debug!(path = %self.path.display(), error = %e, "unlock failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_holder_is_refused_until_release() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("locks").join("hello.lock");

        let first = ScriptLock::acquire(&path).unwrap();
        assert!(path.exists());
        assert!(ScriptLock::try_acquire(&path).unwrap().is_none());

        drop(first);
        assert!(ScriptLock::try_acquire(&path).unwrap().is_some());
    }

    #[test]
    fn test_locks_are_per_name() {
        let temp = TempDir::new().unwrap();
        let _a = ScriptLock::acquire(&temp.path().join("a.lock")).unwrap();
        assert!(ScriptLock::try_acquire(&temp.path().join("b.lock"))
            .unwrap()
            .is_some());
    }
}
