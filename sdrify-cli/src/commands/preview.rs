//! Implementation of the 'preview' subcommand.
//!
//! Extracts the original and the tone mapped frame at the same position and
//! saves both as PNG, either into `--output-dir` or into temporary files
//! that are kept after the command exits.

use crate::cli::PreviewArgs;
use crate::error::{CliErrorContext, CliResult};
use crate::logging::get_timestamp;
use crate::terminal;

use sdrify_core::{
    CoreConfig, CoreError, FramePreviewExtractor, MAX_GAMMA, MIN_GAMMA, PreviewFrame,
    SystemToolRunner,
};

use std::path::{Path, PathBuf};

/// File name for one side of a preview pair.
pub fn preview_file_name(input: &Path, label: &str, timestamp: &str) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "preview".to_string());
    format!("{stem}_{label}_{timestamp}.png")
}

fn validate_gamma(gamma: f64) -> CliResult<()> {
    if gamma.is_finite() && (MIN_GAMMA..=MAX_GAMMA).contains(&gamma) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Gamma must be between {MIN_GAMMA} and {MAX_GAMMA}, got {gamma}"
        )))
    }
}

fn save_frame(
    frame: &PreviewFrame,
    config: &CoreConfig,
    output_dir: Option<&Path>,
    input: &Path,
    label: &str,
    stamp: &str,
) -> CliResult<PathBuf> {
    match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .cli_with_context(|| format!("Creating {}", dir.display()))?;
            let path = dir.join(preview_file_name(input, label, stamp));
            frame.save(&path)?;
            Ok(path)
        }
        None => {
            let file = frame.save_to_temp(config, label)?;
            let (_, path) = file.keep().map_err(|e| CoreError::Io(e.error))?;
            Ok(path)
        }
    }
}

/// Runs the preview command.
pub fn run_preview(args: PreviewArgs, config: &CoreConfig) -> CliResult<()> {
    validate_gamma(args.gamma)?;
    if args.width == 0 || args.height == 0 {
        return Err(CoreError::Validation(
            "Preview width and height must be greater than zero".to_string(),
        ));
    }

    let extractor = FramePreviewExtractor::new(SystemToolRunner, config);
    let pair = extractor
        .preview_pair(&args.input, args.gamma, args.tone_map, args.timestamp)
        .cli_with_context(|| format!("Extracting preview from {}", args.input.display()))?;
    log::info!(
        "Extracted preview at {} ({}x{})",
        sdrify_core::format_duration(pair.original.timestamp),
        pair.original.width(),
        pair.original.height()
    );

    let stamp = get_timestamp();
    let original = pair.original.resized(args.width, args.height);
    let converted = pair.converted.resized(args.width, args.height);
    let dir = args.output_dir.as_deref();

    let original_path = save_frame(&original, config, dir, &args.input, "original", &stamp)?;
    let converted_path = save_frame(&converted, config, dir, &args.input, "sdr", &stamp)?;

    terminal::print_info(
        "Position",
        format!("{:.3}s", pair.original.timestamp),
    );
    terminal::print_info("Original", original_path.display());
    terminal::print_info("Converted", converted_path.display());
    terminal::print_success(format!(
        "Preview saved (gamma {:.2}, {} tone map)",
        args.gamma, args.tone_map
    ));
    Ok(())
}
