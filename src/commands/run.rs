/// `swiftrun <script>` implementation
///
/// Brings the script's executable up to date and hands the process over to it.
use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

use super::{load_settings, ENV_CONFIG};
use crate::cli::RunRequest;
use crate::cli_utils::swiftrun_prefix;
use crate::error::RunError;
use crate::logging::status;
use crate::script::handoff;
use crate::script::manifest::RUNNER_NAME;
use crate::script::{prepare, RunOutcome, ScriptIdentity};

pub fn run(request: &RunRequest) -> Result<()> {
    let config_path = std::env::var(ENV_CONFIG).ok();
    let settings = load_settings(config_path.as_deref())?;

    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let identity = ScriptIdentity::resolve(request.locator(), &cwd, RUNNER_NAME);
    let edit = request.wants_edit(identity.is_self);

    let outcome = prepare(&identity, &settings, edit).map_err(|e| report(&identity, e))?;

    match outcome {
        RunOutcome::Edit { path } => open_editor(&path, settings.editor.as_deref()),
        RunOutcome::Ready {
            artifact,
            installed,
            ..
        } => {
            if let Some(alias) = installed {
                eprintln!("{} Installed {}", swiftrun_prefix(), alias.display());
            }

            let exit_status = handoff::run(&artifact, request.locator(), request.script_args())
                .map_err(|e| report(&identity, e.into()))?;
            handoff::exit_like(exit_status)
        }
    }
}

/// Tag the failure with its stage; the message itself is printed by `main`
fn report(identity: &ScriptIdentity, err: RunError) -> anyhow::Error {
    debug!(
        stage = err.stage(),
        status = status::ERROR,
        script = %identity.canonical_name,
        "{}",
        err
    );
    anyhow::Error::new(err)
}

/// Open `path` with the configured editor, or the platform opener
fn open_editor(path: &Path, editor: Option<&str>) -> Result<()> {
    let command_line = editor.unwrap_or(default_opener());
    let mut parts = command_line.split_whitespace();
    let program = parts
        .next()
        .with_context(|| format!("Editor command is empty: {:?}", command_line))?;

    eprintln!("{} Editing {}", swiftrun_prefix(), path.display());

    let exit_status = Command::new(program)
        .args(parts)
        .arg(path)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .with_context(|| format!("Failed to launch editor: {}", program))?;

    if !exit_status.success() {
        anyhow::bail!("Editor exited with {}", exit_status);
    }
    Ok(())
}

fn default_opener() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    }
}
