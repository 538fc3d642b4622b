// ============================================================================
// sdrify-core/src/progress_reporting/mod.rs
// ============================================================================
//
// PROGRESS REPORTING: Interpreting ffmpeg's diagnostic stream
//
// The conversion worker runs ffmpeg-sidecar's log parser over the captured
// stderr. ProgressMonitor turns the resulting status events into
// percentages and keeps the log lines as a failure transcript.
//
// KEY COMPONENTS:
// - ProgressMonitor: progress extraction, transcript, GPU error detection

pub mod monitor;

pub use monitor::{
    ACCELERATION_ERROR_SIGNATURES, ProgressMonitor, is_acceleration_error, progress_percent,
};
