/// Process handoff
///
/// Runs the built artifact with the terminal attached and mirrors its exit
/// status. The child sees the locator as `argv[0]` and the user's trailing
/// arguments unchanged. A child killed by a signal makes the runner die of
/// the same signal.
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use tracing::debug;

use crate::error::HandoffError;
use crate::logging::stages;

/// Spawn `artifact` and wait for it
pub fn run(artifact: &Path, argv0: &str, args: &[String]) -> Result<ExitStatus, HandoffError> {
    debug!(
        stage = stages::HANDOFF,
        artifact = %artifact.display(),
        args = args.len(),
        "executing"
    );

    let mut cmd = Command::new(artifact);
    set_arg0(&mut cmd, argv0);
    cmd.args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    let mut child = cmd.spawn().map_err(|source| HandoffError::Spawn {
        artifact: artifact.to_path_buf(),
        source,
    })?;

    // The terminal delivers interrupts to the whole process group; only the
    // child should react to them.
    let _guard = InterruptGuard::ignore();
    child.wait().map_err(|source| HandoffError::Wait {
        artifact: artifact.to_path_buf(),
        source,
    })
}

/// Exit code the runner reports for a child status
///
/// Signal terminations map to `128 + signal` as shells do.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

/// Terminate the runner the way the child terminated
pub fn exit_like(status: ExitStatus) -> ! {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            reraise(signal);
        }
    }
    std::process::exit(exit_code(status))
}

#[cfg(unix)]
fn set_arg0(cmd: &mut Command, argv0: &str) {
    use std::os::unix::process::CommandExt;
    cmd.arg0(argv0);
}

#[cfg(not(unix))]
fn set_arg0(_cmd: &mut Command, _argv0: &str) {}

/// Restore the default disposition and raise `signal` against ourselves.
/// Returns only if the signal did not terminate the process.
#[cfg(unix)]
fn reraise(signal: i32) {
    use nix::sys::signal::{raise, signal as set_handler, SigHandler, Signal};

    let Ok(sig) = Signal::try_from(signal) else {
        return;
    };
    // SAFETY: installing SigDfl runs no handler code.
    unsafe {
        let _ = set_handler(sig, SigHandler::SigDfl);
    }
    let _ = raise(sig);
}

/// Ignores SIGINT and SIGQUIT while alive, restoring the previous handlers on drop
struct InterruptGuard {
    #[cfg(unix)]
    previous: Vec<(nix::sys::signal::Signal, nix::sys::signal::SigHandler)>,
}

impl InterruptGuard {
    #[cfg(unix)]
    fn ignore() -> Self {
        use nix::sys::signal::{signal, SigHandler, Signal};

        let mut previous = Vec::new();
        for sig in [Signal::SIGINT, Signal::SIGQUIT] {
            // SAFETY: SigIgn runs no handler code.
            if let Ok(old) = unsafe { signal(sig, SigHandler::SigIgn) } {
                previous.push((sig, old));
            }
        }
        Self { previous }
    }

    #[cfg(not(unix))]
    fn ignore() -> Self {
        Self {}
    }
}

#[cfg(unix)]
impl Drop for InterruptGuard {
    fn drop(&mut self) {
        for (sig, handler) in self.previous.drain(..) {
            // SAFETY: restores the handler that was installed before.
            unsafe {
                let _ = nix::sys::signal::signal(sig, handler);
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::os::unix::process::ExitStatusExt;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("artifact");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_exit_code_is_propagated() {
        let temp = TempDir::new().unwrap();
        let artifact = script(temp.path(), "exit 7");

        let status = run(&artifact, "tool.swift", &[]).unwrap();
        assert_eq!(exit_code(status), 7);
    }

    #[test]
    fn test_arguments_are_forwarded() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out.txt");
        let artifact = script(
            temp.path(),
            &format!("echo \"$@\" > {}", out.display()),
        );

        let args = vec!["a b".to_string(), "c".to_string()];
        let status = run(&artifact, "tool.swift", &args).unwrap();
        assert!(status.success());
        assert_eq!(fs::read_to_string(&out).unwrap().trim(), "a b c");
    }

    #[test]
    fn test_missing_artifact() {
        let temp = TempDir::new().unwrap();
        let err = run(&temp.path().join("nope"), "nope", &[]).unwrap_err();
        assert!(matches!(err, HandoffError::Spawn { .. }));
    }

    #[test]
    fn test_signal_exit_code() {
        // Raw wait status for "killed by SIGTERM"
        let status = ExitStatus::from_raw(15);
        assert_eq!(status.signal(), Some(15));
        assert_eq!(exit_code(status), 143);

        let status = ExitStatus::from_raw(3 << 8);
        assert_eq!(exit_code(status), 3);
    }
}
