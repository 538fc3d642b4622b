// ============================================================================
// sdrify-core/src/media/properties.rs
// ============================================================================
//
// MEDIA PROPERTIES: Normalised technical description of a source file
//
// MediaProperties is produced once per conversion by the probe and never
// mutated afterwards. A GPU fallback retry reuses the same record because the
// properties of the input cannot change between attempts.

use serde::Serialize;

/// Audio codec assumed when the source has no audio stream.
pub const DEFAULT_AUDIO_CODEC: &str = "aac";

/// Audio bit rate assumed when the source has no audio stream or omits it.
pub const DEFAULT_AUDIO_BIT_RATE: u64 = 128_000;

/// Peak brightness assumed for HDR sources without light level metadata.
pub const DEFAULT_MAX_CLL: u32 = 1000;

/// Average brightness assumed for HDR sources without light level metadata.
pub const DEFAULT_MAX_FALL: u32 = 400;

/// A subtitle stream of the source, in container order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtitleStream {
    /// Absolute stream index inside the container
    pub index: u32,
    pub codec_name: String,
}

/// HDR content light level metadata, in nits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContentLightLevel {
    /// Maximum content light level (MaxCLL)
    pub max_cll: u32,
    /// Maximum frame-average light level (MaxFALL)
    pub max_fall: u32,
}

impl Default for ContentLightLevel {
    fn default() -> Self {
        Self {
            max_cll: DEFAULT_MAX_CLL,
            max_fall: DEFAULT_MAX_FALL,
        }
    }
}

/// Technical properties of a media file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaProperties {
    pub width: u32,
    pub height: u32,
    /// ffprobe codec name of the primary video stream (e.g. "hevc")
    pub codec_name: String,
    /// Video bit rate in bits/second
    pub bit_rate: u64,
    /// Frames per second; 0 when the rate is unknown
    pub frame_rate: f64,
    pub duration_secs: f64,
    pub audio_codec: String,
    pub audio_bit_rate: u64,
    pub subtitle_streams: Vec<SubtitleStream>,
    /// Light level metadata when the container or first frame carries it
    pub content_light: Option<ContentLightLevel>,
}

impl MediaProperties {
    /// Whether time based operations (progress, preview offset) are possible.
    #[must_use]
    pub fn has_duration(&self) -> bool {
        self.duration_secs.is_finite() && self.duration_secs > 0.0
    }

    /// Returns a copy carrying the given light level metadata.
    #[must_use]
    pub fn with_content_light(mut self, light: Option<ContentLightLevel>) -> Self {
        self.content_light = light;
        self
    }
}

/// Parses an ffprobe rational such as `"30000/1001"` or a plain number.
///
/// A zero denominator yields `0.0`. Unparseable or non-finite input yields
/// `None`.
#[must_use]
pub fn parse_frame_rate(rate: &str) -> Option<f64> {
    let rate = rate.trim();
    let value = match rate.split_once('/') {
        Some((num, den)) => {
            let num = num.trim().parse::<f64>().ok()?;
            let den = den.trim().parse::<f64>().ok()?;
            if den == 0.0 {
                Some(0.0)
            } else {
                Some(num / den)
            }
        }
        None => rate.parse::<f64>().ok(),
    };
    value.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_denominator_yields_zero() {
        assert_eq!(parse_frame_rate("30/0"), Some(0.0));
        assert_eq!(parse_frame_rate("0/0"), Some(0.0));
        assert_eq!(parse_frame_rate("24000/0"), Some(0.0));
    }

    #[test]
    fn rationals_and_plain_numbers() {
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        let ntsc = parse_frame_rate("30000/1001").unwrap();
        assert!((ntsc - 29.97).abs() < 0.001);
        assert_eq!(parse_frame_rate("abc/1"), None);
        assert_eq!(parse_frame_rate(""), None);
    }

    #[test]
    fn non_finite_rates_are_rejected() {
        assert_eq!(parse_frame_rate("inf"), None);
        assert_eq!(parse_frame_rate("NaN"), None);
        assert_eq!(parse_frame_rate("-infinity"), None);
        assert_eq!(parse_frame_rate("inf/1"), None);
        assert_eq!(parse_frame_rate("1e309/1"), None);
    }
}
