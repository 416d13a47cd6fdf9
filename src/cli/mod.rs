//! cli
//!
//! Command-line interface layer.
//!
//! # Architecture
//!
//! The CLI is a thin shell over the engine: handlers parse arguments,
//! build the store and managers, call the engine, and format output.
//! Business logic (ordering, cycle prevention, campaign validation)
//! never lives here.

pub mod args;
pub mod commands;

use std::path::PathBuf;

/// Execution context for commands.
///
/// Contains global settings derived from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Config file override.
    pub config: Option<PathBuf>,
    /// Store base URL override.
    pub store_url: Option<String>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
}

impl Context {
    /// The output verbosity for this invocation.
    pub fn verbosity(&self) -> crate::ui::output::Verbosity {
        crate::ui::output::Verbosity::from_flags(self.quiet, self.debug)
    }
}
