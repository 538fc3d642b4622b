// ============================================================================
// sdrify-core/src/encoding/request.rs
// ============================================================================
//
// CONVERSION REQUEST: User parameters for one conversion attempt
//
// A request is created by the UI for every conversion the user starts and is
// owned by the conversion manager for the lifetime of the attempt. The GPU
// fallback builds a fresh request through `for_cpu_retry` rather than
// mutating the original.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::{MAX_GAMMA, MIN_GAMMA};
use crate::error::{CoreError, CoreResult};

/// Message shown when the input or output path is missing.
pub const MISSING_PATHS_MESSAGE: &str =
    "Please select both an input file and specify an output file.";

/// Tone mapping variant applied on the CPU path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ToneMapMode {
    /// Fixed reinhard tone map.
    #[default]
    Static,
    /// Hable tone map parameterised by the source's light level metadata.
    Dynamic,
}

impl ToneMapMode {
    /// Whether building the filter needs light level metadata from the source.
    #[must_use]
    pub fn needs_light_level(self) -> bool {
        matches!(self, Self::Dynamic)
    }
}

impl fmt::Display for ToneMapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => f.write_str("static"),
            Self::Dynamic => f.write_str("dynamic"),
        }
    }
}

impl FromStr for ToneMapMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "dynamic" => Ok(Self::Dynamic),
            other => Err(CoreError::Validation(format!(
                "Unknown tone map mode '{other}' (expected 'static' or 'dynamic')"
            ))),
        }
    }
}

/// Parameters of a single user-initiated conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub gamma: f64,
    pub use_gpu: bool,
    pub tone_map: ToneMapMode,
    pub open_after_conversion: bool,
}

impl ConversionRequest {
    /// Creates a CPU, static tone map request with the given gamma.
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, gamma: f64) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            gamma,
            use_gpu: false,
            tone_map: ToneMapMode::Static,
            open_after_conversion: false,
        }
    }

    #[must_use]
    pub fn with_gpu(mut self, use_gpu: bool) -> Self {
        self.use_gpu = use_gpu;
        self
    }

    #[must_use]
    pub fn with_tone_map(mut self, mode: ToneMapMode) -> Self {
        self.tone_map = mode;
        self
    }

    #[must_use]
    pub fn with_open_after_conversion(mut self, open: bool) -> Self {
        self.open_after_conversion = open;
        self
    }

    /// Same request with GPU acceleration forced off.
    #[must_use]
    pub fn for_cpu_retry(&self) -> Self {
        Self {
            use_gpu: false,
            ..self.clone()
        }
    }

    /// Checks that both paths are present and gamma is in range.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` with a user-presentable message.
    pub fn validate(&self) -> CoreResult<()> {
        if self.input.as_os_str().is_empty() || self.output.as_os_str().is_empty() {
            return Err(CoreError::Validation(MISSING_PATHS_MESSAGE.to_string()));
        }
        if !self.gamma.is_finite() || !(MIN_GAMMA..=MAX_GAMMA).contains(&self.gamma) {
            return Err(CoreError::Validation(format!(
                "Gamma must be between {MIN_GAMMA} and {MAX_GAMMA}, got {}",
                self.gamma
            )));
        }
        Ok(())
    }
}
