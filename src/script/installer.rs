/// Command alias installation
///
/// Creates `<bin_dir>/<name>` as a symlink to the built artifact the first
/// time a script is built, so later invocations can use the bare name.
/// Existing entries are never replaced. When the directory is not writable
/// the same operations are retried through `sudo`.
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};

use crate::error::InstallError;
use crate::logging::{stages, status};

/// What the installer did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed(PathBuf),
    /// Something already lives at the alias path
    Exists(PathBuf),
}

pub struct Installer {
    bin_dir: PathBuf,
    /// Retry through `sudo` on permission errors
    elevate: bool,
}

impl Installer {
    pub fn new(bin_dir: &Path) -> Self {
        Self {
            bin_dir: bin_dir.to_path_buf(),
            elevate: true,
        }
    }

    /// Disable the `sudo` fallback
    pub fn without_elevation(mut self) -> Self {
        self.elevate = false;
        self
    }

    pub fn alias_path(&self, name: &str) -> PathBuf {
        self.bin_dir.join(name)
    }

    /// Link `<bin_dir>/<name>` to `target` unless the alias already exists
    pub fn install(&self, name: &str, target: &Path) -> Result<InstallOutcome, InstallError> {
        let alias = self.alias_path(name);

        // symlink_metadata so a dangling link still counts as present
        if fs::symlink_metadata(&alias).is_ok() {
            debug!(
                stage = stages::INSTALL,
                status = status::SKIPPED,
                alias = %alias.display(),
                "alias exists"
            );
            return Ok(InstallOutcome::Exists(alias));
        }

        self.create_bin_dir()?;
        self.link(&alias, target)?;

        info!(
            stage = stages::INSTALL,
            status = status::SUCCESS,
            alias = %alias.display(),
            target = %target.display(),
            "installed"
        );
        Ok(InstallOutcome::Installed(alias))
    }

    fn create_bin_dir(&self) -> Result<(), InstallError> {
        match fs::create_dir_all(&self.bin_dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::PermissionDenied && self.elevate => {
                let mut cmd = Command::new("sudo");
                cmd.arg("mkdir").arg("-p").arg(&self.bin_dir);
                privileged(cmd, format!("sudo mkdir -p {}", self.bin_dir.display()))
            }
            Err(source) => Err(InstallError::CreateDir {
                path: self.bin_dir.clone(),
                source,
            }),
        }
    }

    fn link(&self, alias: &Path, target: &Path) -> Result<(), InstallError> {
        match symlink(target, alias) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::PermissionDenied && self.elevate => {
                let mut cmd = Command::new("sudo");
                cmd.arg("ln").arg("-s").arg(target).arg(alias);
                privileged(
                    cmd,
                    format!("sudo ln -s {} {}", target.display(), alias.display()),
                )
            }
            Err(source) => Err(InstallError::Link {
                alias: alias.to_path_buf(),
                target: target.to_path_buf(),
                source,
            }),
        }
    }
}

fn privileged(mut cmd: Command, description: String) -> Result<(), InstallError> {
    warn!(stage = stages::INSTALL, command = %description, "retrying with elevated privileges");

    let exit_status = cmd.status().map_err(|source| InstallError::Spawn {
        command: description.clone(),
        source,
    })?;
    if exit_status.success() {
        Ok(())
    } else {
        Err(InstallError::Privileged {
            command: description,
            status: exit_status,
        })
    }
}

#[cfg(unix)]
fn symlink(target: &Path, alias: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, alias)
}

#[cfg(windows)]
fn symlink(target: &Path, alias: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, alias)
}
