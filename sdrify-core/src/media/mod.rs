//! Media probing.
//!
//! [`MediaProbe`] runs ffprobe and reduces its JSON output to an immutable
//! [`MediaProperties`] record consumed by the command builder, the progress
//! monitor and the preview extractor.

pub mod probe;
pub mod properties;

pub use probe::{MediaProbe, parse_frame_light_level, parse_probe_output};
pub use properties::{
    ContentLightLevel, DEFAULT_AUDIO_BIT_RATE, DEFAULT_AUDIO_CODEC, MediaProperties,
    SubtitleStream, parse_frame_rate,
};
