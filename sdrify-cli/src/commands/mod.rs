//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// Converts one HDR video to SDR with progress and Ctrl-C cancellation.
pub mod convert;

pub mod check;
pub mod preview;
pub mod probe;
