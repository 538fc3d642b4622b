// sdrify-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{ArgAction, Parser, Subcommand};
use sdrify_core::{DEFAULT_GAMMA, ToneMapMode};
use std::path::PathBuf;

/// Bounding box the preview frames are scaled into.
pub const DEFAULT_PREVIEW_WIDTH: u32 = 960;
pub const DEFAULT_PREVIEW_HEIGHT: u32 = 540;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "sdrify: HDR to SDR video conversion",
    long_about = "Converts HDR video to SDR with ffmpeg tone mapping, on the CPU or with NVENC."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase console logging (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Write a debug log to this file instead of logging to the console only
    #[arg(long, value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Write a debug log named debug.log next to the executable, in the
    /// working directory or in the home directory
    #[arg(long, global = true, conflicts_with = "log_file")]
    pub debug_log: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Converts an HDR video to SDR
    Convert(ConvertArgs),
    /// Extracts an original and a tone mapped frame for comparison
    Preview(PreviewArgs),
    /// Prints the properties ffprobe reports for a video
    Probe(ProbeArgs),
    /// Checks that ffmpeg and ffprobe can be executed
    Check,
}

#[derive(Parser, Debug)]
pub struct ConvertArgs {
    /// HDR source video (.mp4, .mkv or .mov)
    #[arg(short = 'i', long = "input", value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file (defaults to <input stem>_sdr.mp4 next to the input)
    #[arg(short = 'o', long = "output", value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Gamma applied after tone mapping (0.1 - 3.0)
    #[arg(short, long, default_value_t = DEFAULT_GAMMA, value_name = "GAMMA")]
    pub gamma: f64,

    /// Use NVENC hardware encoding (Windows and Linux only)
    #[arg(long)]
    pub gpu: bool,

    /// Tone map variant: static or dynamic
    #[arg(long, default_value_t = ToneMapMode::Static, value_name = "MODE")]
    pub tone_map: ToneMapMode,

    /// Open the output with the default player when the conversion succeeds
    #[arg(long)]
    pub open: bool,

    /// Overwrite the output file if it already exists
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
pub struct PreviewArgs {
    /// HDR source video
    #[arg(short = 'i', long = "input", value_name = "INPUT")]
    pub input: PathBuf,

    /// Gamma applied after tone mapping (0.1 - 3.0)
    #[arg(short, long, default_value_t = DEFAULT_GAMMA, value_name = "GAMMA")]
    pub gamma: f64,

    /// Tone map variant: static or dynamic
    #[arg(long, default_value_t = ToneMapMode::Static, value_name = "MODE")]
    pub tone_map: ToneMapMode,

    /// Position in seconds (defaults to one third of the duration)
    #[arg(short, long, value_name = "SECONDS")]
    pub timestamp: Option<f64>,

    /// Directory for the PNG files (defaults to a temporary directory)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Maximum width of the saved frames
    #[arg(long, default_value_t = DEFAULT_PREVIEW_WIDTH)]
    pub width: u32,

    /// Maximum height of the saved frames
    #[arg(long, default_value_t = DEFAULT_PREVIEW_HEIGHT)]
    pub height: u32,
}

#[derive(Parser, Debug)]
pub struct ProbeArgs {
    /// Video to inspect
    #[arg(short = 'i', long = "input", value_name = "INPUT")]
    pub input: PathBuf,

    /// Also read light level metadata from the first frame
    #[arg(long)]
    pub light_level: bool,

    /// Print the properties as JSON
    #[arg(long)]
    pub json: bool,
}
