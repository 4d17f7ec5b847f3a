/// Sidecar state record for a generated package
///
/// Holds the "last updated" marker and what was generated, next to the
/// package instead of inside the generated source.
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::SystemTime;

use super::annotations::Dependency;
use super::atomic::write_atomic;
use crate::error::SynthesisError;

pub const STATE_VERSION: u32 = 1;

/// Version of the runner writing state records
pub const RUNNER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedDependency {
    pub package: String,
    pub product: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    pub version: u32,
    pub runner_version: String,
    pub canonical_name: String,
    pub locator: String,
    /// Last synthesis time, whole seconds
    pub updated_at: DateTime<Utc>,
    pub configuration: String,
    #[serde(default)]
    pub dependencies: Vec<RecordedDependency>,
    /// File names of the sources copied next to the entry, sorted
    #[serde(default)]
    pub siblings: Vec<String>,
}

impl StateRecord {
    pub fn new(
        canonical_name: &str,
        locator: &str,
        configuration: &str,
        dependencies: &[Dependency],
        siblings: Vec<String>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            version: STATE_VERSION,
            runner_version: RUNNER_VERSION.to_string(),
            canonical_name: canonical_name.to_string(),
            locator: locator.to_string(),
            updated_at: updated_at.trunc_subsecs(0),
            configuration: configuration.to_string(),
            dependencies: dependencies
                .iter()
                .map(|d| RecordedDependency {
                    package: d.package.clone(),
                    product: d.product.clone(),
                })
                .collect(),
            siblings,
        }
    }

    /// Load a record; missing or unreadable records are treated as absent
    pub fn load(path: &Path) -> Option<Self> {
        let json = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&json) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable state record");
                None
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SynthesisError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| SynthesisError::State {
            path: path.to_path_buf(),
            source,
        })?;
        write_atomic(path, json.as_bytes(), None).map_err(|source| SynthesisError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Marker for the staleness check
    ///
    /// A record from another runner version, or one generated from a
    /// different set of sibling files, reads as `now`. That is newer than any
    /// generated file and forces regeneration. Deleting or renaming a sibling
    /// does not make any remaining source newer, so the set is compared by name.
    pub fn marker(&self, now: SystemTime, siblings: &[String]) -> SystemTime {
        if self.runner_version == RUNNER_VERSION && self.siblings == siblings {
            SystemTime::from(self.updated_at)
        } else {
            now
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dep(package: &str, product: &str) -> Dependency {
        Dependency {
            package: package.to_string(),
            product: product.to_string(),
        }
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".swiftrun.json");

        let record = StateRecord::new(
            "hello",
            "hello.swift",
            "debug",
            &[dep(r#".package(url: "https://x/Popen", from: "2.1.7")"#, "Popen")],
            vec!["util.swift".to_string()],
            Utc::now(),
        );
        record.save(&path).unwrap();

        let loaded = StateRecord::load(&path).unwrap();
        assert_eq!(loaded, record);
        assert_eq!(loaded.dependencies[0].product, "Popen");
        assert_eq!(loaded.siblings, vec!["util.swift"]);
    }

    #[test]
    fn test_updated_at_is_whole_seconds() {
        let record = StateRecord::new("a", "a.swift", "debug", &[], Vec::new(), Utc::now());
        assert_eq!(record.updated_at.timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn test_load_missing_or_corrupt() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".swiftrun.json");
        assert!(StateRecord::load(&path).is_none());

        fs::write(&path, "{not json").unwrap();
        assert!(StateRecord::load(&path).is_none());
    }

    #[test]
    fn test_marker_for_other_runner_version_is_now() {
        let earlier = Utc::now() - chrono::Duration::hours(1);
        let mut record = StateRecord::new("a", "a.swift", "debug", &[], Vec::new(), earlier);
        let now = SystemTime::now();

        assert_eq!(record.marker(now, &[]), SystemTime::from(record.updated_at));

        record.runner_version = "0.0.0-old".to_string();
        assert_eq!(record.marker(now, &[]), now);
    }

    #[test]
    fn test_marker_for_changed_sibling_set_is_now() {
        let earlier = Utc::now() - chrono::Duration::hours(1);
        let siblings = vec!["a.swift".to_string(), "b.swift".to_string()];
        let record = StateRecord::new("tool", "tool/main.swift", "debug", &[], siblings.clone(), earlier);
        let now = SystemTime::now();

        assert_eq!(record.marker(now, &siblings), SystemTime::from(record.updated_at));
        // Deleted
        assert_eq!(record.marker(now, &siblings[..1]), now);
        // Renamed
        assert_eq!(record.marker(now, &["a.swift".to_string(), "c.swift".to_string()]), now);
    }

    #[test]
    fn test_record_without_siblings_field_loads() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".swiftrun.json");
        fs::write(
            &path,
            r#"{"version":1,"runner_version":"0.3.0","canonical_name":"a","locator":"a.swift","updated_at":"2026-01-01T00:00:00Z","configuration":"debug"}"#,
        )
        .unwrap();

        let record = StateRecord::load(&path).unwrap();
        assert!(record.siblings.is_empty());
        assert!(record.dependencies.is_empty());
    }
}
