// ============================================================================
// sdrify-cli/src/main.rs
// ============================================================================
//
// SDRIFY CLI: Main Entry Point
//
// Parses the command line, sets up logging, loads the core configuration
// (defaults plus SDRIFY_* environment overrides) and dispatches to the
// command implementations. The process exit code reflects the outcome.
//
// AI-ASSISTANT-INFO: Entry point for the sdrify CLI

use clap::Parser;
use sdrify_cli::logging::init_logging;
use sdrify_cli::terminal::print_error;
use sdrify_cli::{Cli, Commands, run_check, run_convert, run_preview, run_probe};
use sdrify_core::CoreConfig;
use std::process;

fn main() {
    let cli = Cli::parse();
    let log_file = init_logging(cli.verbose, cli.log_file.clone(), cli.debug_log);
    log::debug!("sdrify {} starting", env!("CARGO_PKG_VERSION"));

    let config = CoreConfig::from_env();
    if let Err(e) = config.validate() {
        print_error(e);
        process::exit(2);
    }
    log::debug!("Configuration: {config:?}");

    let result = match cli.command {
        Commands::Convert(args) => run_convert(args, &config).map(|status| status.exit_code()),
        Commands::Preview(args) => run_preview(args, &config).map(|()| 0),
        Commands::Probe(args) => run_probe(args, &config).map(|()| 0),
        Commands::Check => run_check(&config).map(|()| 0),
    };

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            print_error(&e);
            1
        }
    };

    if let Some(path) = log_file {
        log::info!("Debug log written to {}", path.display());
    }
    process::exit(code);
}
