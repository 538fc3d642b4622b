//! HDR to SDR filter construction.
//!
//! A single routine, [`build_tone_map_filter`], produces the `-filter:v`
//! expression for both full conversions and converted preview frames, so the
//! preview always shows what the conversion will produce.

use crate::encoding::request::ToneMapMode;
use crate::media::ContentLightLevel;

/// Reference white used when linearising for the dynamic tone map, in nits.
const REFERENCE_WHITE_NITS: f64 = 100.0;

/// Output size of the filter's final scale step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSize {
    /// Explicit pixel dimensions taken from the probed video stream.
    Fixed { width: u32, height: u32 },
    /// Keep the decoded frame's size (`iw:ih`).
    Input,
}

impl FrameSize {
    fn scale_filter(self) -> String {
        match self {
            Self::Fixed { width, height } => format!("scale={width}:{height}"),
            Self::Input => "scale=iw:ih".to_string(),
        }
    }
}

/// Builder for constructing video filter chains
#[derive(Debug, Default, Clone)]
pub struct VideoFilterChain {
    filters: Vec<String>,
}

impl VideoFilterChain {
    /// Creates a new empty filter chain
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter to the chain; empty strings are skipped
    #[must_use]
    pub fn add_filter(mut self, filter: impl Into<String>) -> Self {
        let filter = filter.into();
        if !filter.is_empty() {
            self.filters.push(filter);
        }
        self
    }

    /// Builds the filter chain into a single filter string
    #[must_use]
    pub fn build(self) -> Option<String> {
        if self.filters.is_empty() {
            None
        } else {
            Some(self.filters.join(","))
        }
    }
}

/// Builds the tone mapping filter expression.
///
/// Static: bt709 normalisation, reinhard tone map, gamma, scale.
/// Dynamic: linearise, hable tone map with its peak taken from MaxCLL
/// (defaults when `light` is `None`), bt709 normalisation, 8-bit output,
/// gamma, scale.
#[must_use]
pub fn build_tone_map_filter(
    mode: ToneMapMode,
    gamma: f64,
    size: FrameSize,
    light: Option<ContentLightLevel>,
) -> String {
    let chain = match mode {
        ToneMapMode::Static => VideoFilterChain::new()
            .add_filter("zscale=primaries=bt709:transfer=bt709:matrix=bt709")
            .add_filter("tonemap=reinhard"),
        ToneMapMode::Dynamic => {
            let light = light.unwrap_or_default();
            let peak = f64::from(light.max_cll) / REFERENCE_WHITE_NITS;
            VideoFilterChain::new()
                .add_filter(format!("zscale=transfer=linear:npl={REFERENCE_WHITE_NITS}"))
                .add_filter("format=gbrpf32le")
                .add_filter("zscale=primaries=bt709")
                .add_filter(format!("tonemap=tonemap=hable:desat=0:peak={peak}"))
                .add_filter("zscale=transfer=bt709:matrix=bt709:range=tv")
                .add_filter("format=yuv420p")
        }
    };

    chain
        .add_filter(format!("eq=gamma={gamma}"))
        .add_filter(size.scale_filter())
        .build()
        .unwrap_or_default()
}
