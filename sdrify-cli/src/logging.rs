// ============================================================================
// sdrify-cli/src/logging.rs
// ============================================================================
//
// LOGGING UTILITIES: Logger initialisation and helpers
//
// Console logging goes through env_logger and respects RUST_LOG. When a
// debug log is requested the core's log4rs setup takes over and writes
// both to stderr and to the log file.
//
// KEY COMPONENTS:
// - init_logging: picks env_logger or the log4rs file setup
// - get_timestamp: file name timestamps
//
// AI-ASSISTANT-INFO: Logging setup and helper functions

use log::LevelFilter;
use sdrify_core::file_logging::{resolve_log_path, setup_file_logging};
use std::path::PathBuf;

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
///
/// # Example
/// ```
/// let name = format!("preview_{}.png", sdrify_cli::logging::get_timestamp());
/// assert!(name.starts_with("preview_"));
/// ```
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Maps the number of `-v` flags to a console level.
pub fn console_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

/// Initialises logging for the process.
///
/// `log_file` takes precedence; `debug_log` resolves the default debug.log
/// location. When no writable location is found, or the file logger cannot
/// be set up, console logging is used instead. Returns the log file in use.
pub fn init_logging(verbose: u8, log_file: Option<PathBuf>, debug_log: bool) -> Option<PathBuf> {
    let requested = log_file.or_else(|| if debug_log { resolve_log_path() } else { None });

    if let Some(path) = requested {
        match setup_file_logging(&path, LevelFilter::Debug) {
            Ok(()) => {
                log::debug!("Logging to {}", path.display());
                return Some(path);
            }
            Err(e) => eprintln!("Could not set up the debug log at {}: {e}", path.display()),
        }
    } else if debug_log {
        eprintln!("No writable location for debug.log; logging to the console only");
    }

    env_logger::Builder::new()
        .filter_level(console_level(verbose))
        .parse_default_env()
        .format_timestamp(None)
        .init();
    None
}
