// ============================================================================
// sdrify-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error Types for the Conversion Core
//
// This module defines the single error type used throughout sdrify-core. The
// user-facing variants mirror the failure classes a conversion can end in;
// the remaining variants carry plumbing failures (I/O, JSON, spawning).
//
// KEY COMPONENTS:
// - CoreError: every failure the core can report
// - CoreResult: result alias used by all fallible operations
// - Helper constructors for external command failures

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout sdrify-core.
pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    // ---- User-facing failure classes ----
    /// Missing or out-of-range request parameters. No process is spawned.
    #[error("{0}")]
    Validation(String),

    /// ffprobe missing, failing, or producing output we cannot use.
    #[error("Failed to probe media: {0}")]
    Probe(String),

    /// GPU acceleration was requested on a platform that does not support it.
    /// Reported as a warning; the conversion continues on the CPU.
    #[error("Hardware acceleration is not available on {platform}; using the CPU encoder instead")]
    AccelerationUnavailable { platform: String },

    /// The conversion tool exited non-zero and no retry applies.
    #[error("Conversion failed with code {}\n{transcript}", display_code(.exit_code))]
    ProcessFailure {
        exit_code: Option<i32>,
        transcript: String,
    },

    /// GPU attempt failed with an acceleration error signature.
    #[error("Hardware accelerated conversion failed with code {}", display_code(.exit_code))]
    TransientAccelerationFailure { exit_code: Option<i32> },

    #[error("Conversion was cancelled.")]
    CancelledByUser,

    /// Preview frame extraction failed or produced undecodable bytes.
    #[error("Failed to extract frame: {0}")]
    Extraction(String),

    /// The media cannot be previewed (no usable duration).
    #[error("Invalid media: {0}")]
    InvalidMedia(String),

    // ---- Session ----
    #[error("A conversion is already running")]
    SessionActive,

    // ---- Configuration ----
    #[error("Invalid configuration: {0}")]
    Config(String),

    // ---- External commands ----
    #[error("Required dependency '{0}' not found. Please install it and ensure it is in your PATH.")]
    DependencyNotFound(String),

    #[error("Failed to execute {0}: {1}")]
    CommandStart(String, #[source] io::Error),

    #[error("Failed to wait for {0}: {1}")]
    CommandWait(String, #[source] io::Error),

    #[error("Command {tool} failed with code {}: {stderr}", display_code(.code))]
    CommandFailed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    // ---- Wrapped library errors ----
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Path error: {}", .0.display())]
    Path(PathBuf),

    #[error("{0}")]
    OperationFailed(String),
}

impl CoreError {
    /// Whether this error belongs to the preview failure classes, which the UI
    /// shows inline next to the preview rather than as a dialog.
    #[must_use]
    pub fn is_preview_error(&self) -> bool {
        matches!(self, Self::Extraction(_) | Self::InvalidMedia(_))
    }
}

fn display_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "unknown".to_string(), |c| c.to_string())
}

// ---- Helper constructors ----

/// Creates a `CommandStart` error for a tool that could not be launched.
pub fn command_start_error(tool: impl Into<String>, error: io::Error) -> CoreError {
    CoreError::CommandStart(tool.into(), error)
}

/// Creates a `CommandWait` error for a tool whose exit could not be collected.
pub fn command_wait_error(tool: impl Into<String>, error: io::Error) -> CoreError {
    CoreError::CommandWait(tool.into(), error)
}

/// Creates a `CommandFailed` error from an exit code and captured stderr.
pub fn command_failed_error(
    tool: impl Into<String>,
    code: Option<i32>,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed {
        tool: tool.into(),
        code,
        stderr: stderr.into(),
    }
}
