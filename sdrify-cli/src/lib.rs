// sdrify-cli/src/lib.rs
//
// Library portion of the sdrify CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod platform;
pub mod terminal;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands, ConvertArgs, PreviewArgs, ProbeArgs};
pub use commands::convert::{ConvertStatus, run_convert};
pub use commands::{check::run_check, preview::run_preview, probe::run_probe};
pub use error::{CliErrorContext, CliResult};
