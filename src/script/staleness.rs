/// Staleness decisions
///
/// Decides from modification times alone whether the generated package must
/// be regenerated and whether the build tool must run. The decision is taken
/// once, before any stage mutates the cache.
use std::time::{SystemTime, UNIX_EPOCH};

use super::layout::CacheLayout;
use super::source::modified;

/// Observed timestamps; a missing file reads as `UNIX_EPOCH`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamps {
    pub source: SystemTime,
    pub generated: SystemTime,
    pub artifact: SystemTime,
    /// Last-updated marker from the sidecar state record
    pub marker: Option<SystemTime>,
}

impl Timestamps {
    /// Read generated/artifact times from the cache layout
    pub fn observe(layout: &CacheLayout, source: SystemTime, marker: Option<SystemTime>) -> Self {
        Self {
            source,
            generated: modified(&layout.entry()),
            artifact: modified(&layout.artifact()),
            marker,
        }
    }

    /// Timestamps of a remote checkout, which has no separate source file
    pub fn remote(layout: &CacheLayout) -> Self {
        Self::observe(layout, UNIX_EPOCH, None)
    }
}

/// Which downstream stages must run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Plan {
    pub synthesize: bool,
    pub build: bool,
}

impl Plan {
    pub fn is_fresh(&self) -> bool {
        !self.synthesize && !self.build
    }
}

/// Apply the decision table
///
/// - source newer than generated, or marker newer than generated: synthesize
/// - synthesizing, generated newer than artifact, or remote: build
/// - otherwise: run the existing artifact
pub fn decide(times: &Timestamps, remote: bool) -> Plan {
    let marker = times.marker.unwrap_or(UNIX_EPOCH);
    let synthesize = !remote && (times.source > times.generated || marker > times.generated);
    let build = remote || synthesize || times.generated > times.artifact;

    Plan { synthesize, build }
}
