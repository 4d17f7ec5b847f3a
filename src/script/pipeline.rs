/// Run pipeline
///
/// Drives one invocation through the stages:
/// lock, acquire, plan, synthesize, build, install. The staleness plan is
/// computed once, before anything in the cache root changes. The lock is
/// released when this returns, so handoff never holds it.
use std::path::PathBuf;
use std::time::SystemTime;

use tracing::debug;

use super::builder::Builder;
use super::identity::ScriptIdentity;
use super::installer::{InstallOutcome, Installer};
use super::layout::CacheLayout;
use super::lock::ScriptLock;
use super::manifest;
use super::source::{self, AcquiredSource, LocalSources};
use super::staleness::{decide, Plan, Timestamps};
use super::state::StateRecord;
use crate::error::RunError;
use crate::logging::{stages, status};
use crate::merger::Settings;

/// Configuration used when the runner builds itself
pub const SELF_CONFIGURATION: &str = "debug";

/// How the run ended before handoff
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Open `path` in an editor instead of building
    Edit { path: PathBuf },
    /// Artifact is current and ready to execute
    Ready {
        artifact: PathBuf,
        synthesized: bool,
        built: bool,
        /// Alias created by this run
        installed: Option<PathBuf>,
    },
}

/// Build configuration for `identity`; self-hosting always uses debug
pub fn configuration_for<'a>(identity: &ScriptIdentity, settings: &'a Settings) -> &'a str {
    if identity.is_self {
        SELF_CONFIGURATION
    } else {
        &settings.configuration
    }
}

/// Cache layout for `identity` under the configured base
pub fn layout_for(identity: &ScriptIdentity, settings: &Settings) -> CacheLayout {
    CacheLayout::new(
        &settings.cache_dir,
        identity,
        configuration_for(identity, settings),
    )
}

/// Observe timestamps for the oracle without touching the cache
pub fn observe(layout: &CacheLayout, sources: Option<&LocalSources>) -> Timestamps {
    match sources {
        Some(sources) => {
            let marker = StateRecord::load(&layout.state_file())
                .map(|record| record.marker(SystemTime::now(), &sources.sibling_names()));
            Timestamps::observe(layout, sources.modified(), marker)
        }
        None => Timestamps::remote(layout),
    }
}

/// Run every stage up to, but not including, handoff
pub fn prepare(
    identity: &ScriptIdentity,
    settings: &Settings,
    edit: bool,
) -> Result<RunOutcome, RunError> {
    let layout = layout_for(identity, settings);
    let _lock = ScriptLock::acquire(&layout.lock_file())?;

    let acquired = source::acquire(identity, &layout)?;
    let local = match &acquired {
        AcquiredSource::Local(sources) => Some(sources),
        AcquiredSource::Remote => None,
    };

    let plan = plan(&layout, local, identity.is_remote());

    let mut synthesized = false;
    if let (true, Some(sources)) = (plan.synthesize, local) {
        manifest::synthesize(identity, sources, &layout, &settings.tools_version)?;
        synthesized = true;
    }

    if edit {
        let path = edit_target(&layout);
        debug!(stage = stages::PLAN, path = %path.display(), "editing instead of building");
        return Ok(RunOutcome::Edit { path });
    }

    let mut built = false;
    if plan.build {
        Builder::new(&settings.build_tool, settings.verbose).build(&layout)?;
        built = true;
    }

    let installer = Installer::new(&settings.bin_dir);
    let installed = match installer.install(layout.name(), &layout.artifact())? {
        InstallOutcome::Installed(alias) => Some(alias),
        InstallOutcome::Exists(_) => None,
    };

    Ok(RunOutcome::Ready {
        artifact: layout.artifact(),
        synthesized,
        built,
        installed,
    })
}

fn plan(layout: &CacheLayout, local: Option<&LocalSources>, remote: bool) -> Plan {
    let times = observe(layout, local);
    let plan = decide(&times, remote);
    debug!(
        stage = stages::PLAN,
        script = layout.name(),
        status = if plan.is_fresh() { status::FRESH } else { status::STALE },
        synthesize = plan.synthesize,
        build = plan.build,
        "staleness decided"
    );
    plan
}

/// File opened by `--edit`
///
/// Xcode opens the whole package from `Package.swift`; elsewhere the entry
/// source is edited directly.
pub fn edit_target(layout: &CacheLayout) -> PathBuf {
    let entry = layout.entry();
    if cfg!(target_os = "macos") || !entry.exists() {
        layout.manifest()
    } else {
        entry
    }
}
