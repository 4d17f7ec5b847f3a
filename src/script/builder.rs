/// Build orchestration
///
/// Runs `<tool> build -c <configuration>` in the package root with the
/// terminal attached, so compiler diagnostics reach the user unchanged.
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::layout::CacheLayout;
use crate::error::BuildError;
use crate::logging::{stages, status};

/// Result of a successful build
#[derive(Debug, Clone)]
pub struct BuildResult {
    pub artifact: PathBuf,
    pub duration: Duration,
}

/// Invokes the package build tool
pub struct Builder {
    tool: String,
    verbose: bool,
}

impl Builder {
    pub fn new(tool: &str, verbose: bool) -> Self {
        Self {
            tool: tool.to_string(),
            verbose,
        }
    }

    /// Arguments passed to the build tool
    pub fn args(&self, configuration: &str) -> Vec<String> {
        let mut args = vec![
            "build".to_string(),
            "-c".to_string(),
            configuration.to_string(),
        ];
        if self.verbose {
            args.push("-v".to_string());
        }
        args
    }

    /// Build the package rooted at `layout.root()`
    pub fn build(&self, layout: &CacheLayout) -> Result<BuildResult, BuildError> {
        let tool_path = which::which(&self.tool).map_err(|source| BuildError::ToolNotFound {
            tool: self.tool.clone(),
            source,
        })?;

        let args = self.args(layout.configuration());
        let command = describe(&tool_path, &args);
        let root = layout.root();

        info!(
            stage = stages::BUILD,
            script = layout.name(),
            command = %command,
            "compiling"
        );

        let start = Instant::now();
        let exit_status = Command::new(&tool_path)
            .args(&args)
            .current_dir(&root)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| BuildError::Spawn {
                command: command.clone(),
                source,
            })?;
        let duration = start.elapsed();

        if !exit_status.success() {
            debug!(
                stage = stages::BUILD,
                status = status::ERROR,
                exit_code = ?exit_status.code(),
                "build failed"
            );
            return Err(BuildError::Failed {
                command,
                status: exit_status,
            });
        }

        info!(
            stage = stages::BUILD,
            status = status::SUCCESS,
            script = layout.name(),
            duration = format!("{:.2}s", duration.as_secs_f64()),
            "build finished"
        );

        Ok(BuildResult {
            artifact: layout.artifact(),
            duration,
        })
    }
}

fn describe(tool: &Path, args: &[String]) -> String {
    let mut parts = vec![tool.display().to_string()];
    parts.extend(args.iter().cloned());
    parts.join(" ")
}
