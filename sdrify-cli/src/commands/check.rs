//! Implementation of the 'check' subcommand.
//!
//! Runs `<tool> -version` for ffmpeg and ffprobe and reports each result.

use crate::error::CliResult;
use crate::terminal::{print_error, print_success};

use sdrify_core::{CoreConfig, CoreError, SystemToolRunner, check_dependency};

/// Runs the check command; fails when either tool is unusable.
pub fn run_check(config: &CoreConfig) -> CliResult<()> {
    let tools = [
        ("ffmpeg", &config.ffmpeg_path),
        ("ffprobe", &config.ffprobe_path),
    ];
    let mut missing = Vec::new();

    for (name, path) in tools {
        match check_dependency(&SystemToolRunner, path) {
            Ok(banner) => print_success(format!("{name}: {banner}")),
            Err(e) => {
                log::debug!("{name} check failed: {e:?}");
                print_error(format!("{name} ({}): {e}", path.display()));
                missing.push(name);
            }
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CoreError::DependencyNotFound(missing.join(", ")))
    }
}
