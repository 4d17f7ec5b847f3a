/// `swiftrun cache` command implementation
///
/// Lists, inspects and removes generated packages.
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::cli::{CacheArgs, CacheCommands};
use crate::cli_utils::{format_size, swiftrun_prefix};
use crate::merger::Settings;
use crate::script::layout::{list_roots, CacheLayout, STATE_FILE};
use crate::script::lock::ScriptLock;
use crate::script::manifest::RUNNER_NAME;
use crate::script::pipeline::{layout_for, observe};
use crate::script::source::local_sources;
use crate::script::staleness::decide;
use crate::script::state::StateRecord;
use crate::script::{Locator, ScriptIdentity};

pub fn cache(args: &CacheArgs, settings: &Settings) -> Result<()> {
    match &args.command {
        CacheCommands::List { verbose } => list(settings, *verbose),
        CacheCommands::Status { script } => status(settings, script),
        CacheCommands::Clean { script, all } => clean(settings, script.as_deref(), *all),
    }
}

/// List all generated packages
fn list(settings: &Settings, verbose: bool) -> Result<()> {
    let base = &settings.cache_dir;
    let names = list_roots(base)
        .with_context(|| format!("Failed to read cache directory: {}", base.display()))?;

    if names.is_empty() {
        println!("No cached scripts.");
        return Ok(());
    }

    println!("Cached scripts ({} entries):", names.len());
    println!();

    for name in names {
        let root = base.join(&name);
        let record = StateRecord::load(&root.join(STATE_FILE));
        let configuration = record
            .as_ref()
            .map(|r| r.configuration.as_str())
            .unwrap_or(settings.configuration.as_str());
        let layout = CacheLayout::from_name(base, &name, configuration);

        println!("  {}", name);
        match &record {
            Some(record) => {
                println!("    Script: {}", record.locator);
                println!(
                    "    Updated: {}",
                    record.updated_at.format("%Y-%m-%d %H:%M:%S")
                );
            }
            None => println!("    Script: (remote or unknown)"),
        }
        println!(
            "    Built ({}): {}",
            configuration,
            if layout.artifact().exists() { "yes" } else { "no" }
        );

        if verbose {
            let (size, files) = dir_size_and_count(&root)?;
            println!("    Path: {}", root.display());
            println!("    Size: {} ({} files)", format_size(size), files);
            if let Some(record) = &record {
                println!("    Dependencies: {}", record.dependencies.len());
            }
        }
        println!();
    }

    Ok(())
}

/// Show identity, paths and the current staleness plan for a script
fn status(settings: &Settings, script: &str) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let identity = ScriptIdentity::resolve(script, &cwd, RUNNER_NAME);
    let layout = layout_for(&identity, settings);

    println!("Script: {}", script);
    println!("Name: {}", identity.canonical_name);
    match &identity.locator {
        Locator::Local(path) => println!("Source: {}", path.display()),
        Locator::Remote(url) => println!("Source: {} (remote)", url),
    }
    println!("Package: {}", layout.root().display());
    println!("Artifact: {}", layout.artifact().display());
    println!();

    let plan = match &identity.locator {
        Locator::Local(path) => {
            let sources = local_sources(path)?;
            decide(&observe(&layout, Some(&sources)), false)
        }
        Locator::Remote(_) => decide(&observe(&layout, None), true),
    };

    if plan.is_fresh() {
        println!("Status: UP TO DATE ✓");
    } else if plan.synthesize {
        println!("Status: STALE (next run regenerates and builds)");
    } else {
        println!("Status: STALE (next run builds)");
    }

    if let Some(record) = StateRecord::load(&layout.state_file()) {
        println!(
            "Updated: {}",
            record.updated_at.format("%Y-%m-%d %H:%M:%S")
        );
        for dependency in &record.dependencies {
            println!("  {} {}", dependency.product, dependency.package);
        }
    }

    Ok(())
}

/// Remove the package for one script, or every package
fn clean(settings: &Settings, script: Option<&str>, all: bool) -> Result<()> {
    let base = &settings.cache_dir;

    if all {
        println!("{} Cleaning all generated packages...", swiftrun_prefix());
        let names = list_roots(base)
            .with_context(|| format!("Failed to read cache directory: {}", base.display()))?;
        for name in &names {
            remove_root(&CacheLayout::from_name(base, name, &settings.configuration))?;
        }
        println!("{} Removed {} packages.", swiftrun_prefix(), names.len());
        return Ok(());
    }

    let Some(script) = script else {
        anyhow::bail!("Specify --all to clean every package, or provide a script");
    };

    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let identity = ScriptIdentity::resolve(script, &cwd, RUNNER_NAME);
    let layout = layout_for(&identity, settings);

    if !layout.root().exists() {
        println!("{} Nothing cached for {}", swiftrun_prefix(), script);
        return Ok(());
    }

    println!(
        "{} Cleaning {} ({})",
        swiftrun_prefix(),
        identity.canonical_name,
        layout.root().display()
    );
    remove_root(&layout)?;
    println!("{} Cache cleaned.", swiftrun_prefix());

    Ok(())
}

/// Delete a package root while holding its lock
fn remove_root(layout: &CacheLayout) -> Result<()> {
    let _lock = ScriptLock::acquire(&layout.lock_file())?;
    let root = layout.root();
    if root.exists() {
        fs::remove_dir_all(&root)
            .with_context(|| format!("Failed to remove {}", root.display()))?;
    }
    Ok(())
}

/// Total size and file count of a directory
fn dir_size_and_count(path: &Path) -> Result<(u64, usize)> {
    let mut total_size = 0;
    let mut file_count = 0;

    for entry in walkdir::WalkDir::new(path) {
        let entry = entry?;
        if entry.file_type().is_file() {
            total_size += entry.metadata()?.len();
            file_count += 1;
        }
    }

    Ok((total_size, file_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn settings(temp: &TempDir) -> Settings {
        Settings {
            configuration: "debug".to_string(),
            build_tool: "swift".to_string(),
            bin_dir: temp.path().join("bin"),
            cache_dir: temp.path().join("cache"),
            editor: None,
            tools_version: "5.2".to_string(),
            verbose: false,
        }
    }

    #[test]
    fn test_dir_size_and_count() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("a/b")).unwrap();
        fs::write(temp.path().join("a/one"), "12345").unwrap();
        fs::write(temp.path().join("a/b/two"), "123").unwrap();

        let (size, count) = dir_size_and_count(temp.path()).unwrap();
        assert_eq!(size, 8);
        assert_eq!(count, 2);
    }

    #[test]
    fn test_clean_all_removes_roots_but_not_locks() {
        let temp = TempDir::new().unwrap();
        let settings = settings(&temp);
        fs::create_dir_all(settings.cache_dir.join("hello/Sources/hello")).unwrap();
        fs::create_dir_all(settings.cache_dir.join("tool")).unwrap();

        clean(&settings, None, true).unwrap();

        assert!(list_roots(&settings.cache_dir).unwrap().is_empty());
        assert!(settings.cache_dir.join(".locks/hello.lock").exists());
    }

    #[test]
    fn test_clean_dot_named_script_leaves_other_roots() {
        let temp = TempDir::new().unwrap();
        let settings = settings(&temp);
        fs::create_dir_all(settings.cache_dir.join("hello/Sources/hello")).unwrap();

        let script = temp.path().join("..swift");
        clean(&settings, script.to_str(), false).unwrap();

        assert!(settings.cache_dir.join("hello").exists());
        assert_eq!(list_roots(&settings.cache_dir).unwrap(), vec!["hello"]);
    }

    #[test]
    fn test_clean_requires_script_or_all() {
        let temp = TempDir::new().unwrap();
        assert!(clean(&settings(&temp), None, false).is_err());
    }
}
