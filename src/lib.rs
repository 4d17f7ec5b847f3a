// Library interface for swiftrun
// The binary and the integration tests both go through these modules

pub mod cli;
pub mod cli_utils;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod merger;
pub mod script;
pub mod xdg;

// Re-export commonly used types
pub use error::RunError;
pub use merger::Settings;
pub use script::{prepare, RunOutcome, ScriptIdentity};
