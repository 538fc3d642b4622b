//! Conversion command construction.
//!
//! - [`request`]: the user's parameters for one conversion
//! - [`filters`]: the shared tone mapping filter routine
//! - [`command`]: ffmpeg argument lists for the CPU and GPU paths

pub mod command;
pub mod filters;
pub mod request;

pub use command::{BuildWarning, BuiltCommand, CommandBuilder, format_frame_rate};
pub use filters::{FrameSize, VideoFilterChain, build_tone_map_filter};
pub use request::{ConversionRequest, MISSING_PATHS_MESSAGE, ToneMapMode};
