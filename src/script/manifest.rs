/// Package synthesis
///
/// Turns a local script into a SwiftPM package inside its cache root:
/// entry source with a shebang, sibling sources, `Package.swift` and the
/// sidecar state record.
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::annotations::{parse_dependencies, Dependency};
use super::atomic::write_atomic;
use super::identity::ScriptIdentity;
use super::layout::{CacheLayout, ENTRY_FILE};
use super::source::LocalSources;
use super::state::StateRecord;
use crate::error::SynthesisError;
use crate::logging::stages;

/// Name the runner is installed under; used in generated shebangs
pub const RUNNER_NAME: &str = "swiftrun";

/// Outcome of a synthesis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesis {
    pub dependencies: Vec<Dependency>,
    /// `Package.swift` content differed from what was on disk
    pub manifest_changed: bool,
}

/// Regenerate the package for a local script
///
/// The entry file is always rewritten; `Package.swift` only when its content
/// changes, so SwiftPM does not re-resolve packages for a body-only edit.
pub fn synthesize(
    identity: &ScriptIdentity,
    sources: &LocalSources,
    layout: &CacheLayout,
    tools_version: &str,
) -> Result<Synthesis, SynthesisError> {
    info!(
        stage = stages::SYNTHESIZE,
        script = layout.name(),
        entry = %layout.entry().display(),
        "updating"
    );

    // Parse everything before writing so a bad directive leaves the cache untouched
    let text = read_source(&sources.entry)?;
    let mut dependencies = parse_dependencies(&text, &sources.entry)?;
    let mut sibling_texts = Vec::with_capacity(sources.siblings.len());
    for sibling in &sources.siblings {
        let sibling_text = read_source(sibling)?;
        dependencies.extend(parse_dependencies(&sibling_text, sibling)?);
        sibling_texts.push((sibling, sibling_text));
    }

    let interpreter = if identity.is_self {
        layout.artifact().display().to_string()
    } else {
        RUNNER_NAME.to_string()
    };
    let entry_text = with_shebang(&text, &interpreter);

    let entry = layout.entry();
    write_atomic(&entry, entry_text.as_bytes(), Some(0o755)).map_err(|source| {
        SynthesisError::Write {
            path: entry.clone(),
            source,
        }
    })?;
    // Marker never exceeds the entry's own mtime, whatever the filesystem's granularity
    let updated_at = fs::metadata(&entry)
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());

    for (sibling, sibling_text) in sibling_texts {
        let Some(file_name) = sibling.file_name() else {
            continue;
        };
        let dest = layout.sources_dir().join(file_name);
        write_atomic(&dest, sibling_text.as_bytes(), None)
            .map_err(|source| SynthesisError::Write { path: dest, source })?;
    }
    remove_stale_sources(&layout.sources_dir(), &sources.siblings)?;

    let manifest = render_manifest(layout.name(), tools_version, &dependencies);
    let manifest_path = layout.manifest();
    let manifest_changed = fs::read_to_string(&manifest_path).ok().as_deref() != Some(manifest.as_str());
    if manifest_changed {
        write_atomic(&manifest_path, manifest.as_bytes(), None).map_err(|source| {
            SynthesisError::Write {
                path: manifest_path.clone(),
                source,
            }
        })?;
    }

    debug!(
        stage = stages::SYNTHESIZE,
        script = layout.name(),
        dependencies = dependencies.len(),
        manifest_changed,
        "package generated"
    );

    StateRecord::new(
        layout.name(),
        &identity.raw,
        layout.configuration(),
        &dependencies,
        sources.sibling_names(),
        updated_at,
    )
    .save(&layout.state_file())?;

    Ok(Synthesis {
        dependencies,
        manifest_changed,
    })
}

fn read_source(path: &Path) -> Result<String, SynthesisError> {
    fs::read_to_string(path).map_err(|source| SynthesisError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Prefix `#!/usr/bin/env <interpreter>` unless the text already has a shebang
pub fn with_shebang(text: &str, interpreter: &str) -> String {
    if text.starts_with("#!") {
        text.to_string()
    } else {
        format!("#!/usr/bin/env {}\n\n{}", interpreter, text)
    }
}

/// Delete generated `.swift` files whose source sibling no longer exists
fn remove_stale_sources(dir: &Path, siblings: &[PathBuf]) -> Result<(), SynthesisError> {
    let mut keep: HashSet<OsString> = siblings
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_os_string()))
        .collect();
    keep.insert(OsString::from(ENTRY_FILE));

    let entries = fs::read_dir(dir).map_err(|source| SynthesisError::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries.flatten() {
        let path = entry.path();
        let is_swift = path.extension().and_then(|e| e.to_str()) == Some("swift");
        if is_swift && !keep.contains(&entry.file_name()) {
            debug!(stage = stages::SYNTHESIZE, path = %path.display(), "removing stale source");
            fs::remove_file(&path).map_err(|source| SynthesisError::Write {
                path: path.clone(),
                source,
            })?;
        }
    }

    Ok(())
}

/// Render `Package.swift` for an executable named `name`
pub fn render_manifest(name: &str, tools_version: &str, dependencies: &[Dependency]) -> String {
    let packages: String = dependencies
        .iter()
        .map(|d| format!("        {},\n", d.package))
        .collect();
    let products = dependencies
        .iter()
        .map(|d| format!("\"{}\"", d.product))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"// swift-tools-version:{tools_version}
// Generated by swiftrun. Edits are overwritten when the script changes.

import PackageDescription

let package = Package(
    name: "{name}",
    platforms: [.macOS(.v10_13)],
    products: [
        .executable(
            name: "{name}",
            targets: ["{name}"]),
    ],
    dependencies: [
{packages}    ],
    targets: [
        .target(
            name: "{name}",
            dependencies: [{products}]),
    ]
)
"#
    )
}
