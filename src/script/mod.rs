//! Script-to-executable pipeline.
//!
//! A script is resolved to an identity, its package is (re)generated in a
//! per-script cache root when stale, built with SwiftPM, linked into a bin
//! directory, and finally executed.

pub mod annotations;
pub mod atomic;
pub mod builder;
pub mod handoff;
pub mod identity;
pub mod installer;
pub mod layout;
pub mod lock;
pub mod manifest;
pub mod pipeline;
pub mod source;
pub mod staleness;
pub mod state;

pub use identity::{Locator, ScriptIdentity};
pub use pipeline::{prepare, RunOutcome};
