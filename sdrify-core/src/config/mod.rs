// ============================================================================
// sdrify-core/src/config/mod.rs
// ============================================================================
//
// CONFIGURATION: Core Configuration Structures
//
// This module defines the configuration shared by every component of the
// conversion core: where the external tools live, the encoder presets used on
// the CPU and GPU paths, and preview extraction quality.
//
// KEY COMPONENTS:
// - CoreConfig: Main configuration structure
// - Default constants and gamma bounds
// - Environment variable overrides
// - CoreConfigBuilder (in builder.rs)

// ---- Standard library imports ----
use std::path::PathBuf;

// ---- External crate imports ----
use serde::{Deserialize, Serialize};

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};

mod builder;

pub use builder::CoreConfigBuilder;

// ============================================================================
// DEFAULT CONSTANTS
// ============================================================================

/// Default ffmpeg executable, resolved through PATH.
pub const DEFAULT_FFMPEG_PATH: &str = "ffmpeg";

/// Default ffprobe executable, resolved through PATH.
pub const DEFAULT_FFPROBE_PATH: &str = "ffprobe";

/// Software encoder speed preset.
pub const DEFAULT_CPU_PRESET: &str = "faster";

/// NVENC preset (p1 fastest to p7 slowest).
pub const DEFAULT_GPU_PRESET: &str = "p4";

/// NVENC constant quality value for `-cq`.
pub const DEFAULT_GPU_QUALITY: u8 = 23;

/// JPEG quality for preview frames (`-q:v`, 2 is best).
pub const DEFAULT_PREVIEW_QUALITY: u8 = 2;

/// Bit rate used when ffprobe does not report one for the video stream.
pub const DEFAULT_FALLBACK_BIT_RATE: u64 = 5_000_000;

/// Lower gamma bound accepted for a conversion request.
pub const MIN_GAMMA: f64 = 0.1;

/// Upper gamma bound accepted for a conversion request.
pub const MAX_GAMMA: f64 = 3.0;

/// Gamma that leaves the tone-mapped image unchanged.
pub const DEFAULT_GAMMA: f64 = 1.0;

// ---- Environment variable names ----
pub const ENV_FFMPEG: &str = "SDRIFY_FFMPEG";
pub const ENV_FFPROBE: &str = "SDRIFY_FFPROBE";
pub const ENV_CPU_PRESET: &str = "SDRIFY_CPU_PRESET";
pub const ENV_GPU_PRESET: &str = "SDRIFY_GPU_PRESET";
pub const ENV_GPU_CQ: &str = "SDRIFY_GPU_CQ";
pub const ENV_TEMP_DIR: &str = "SDRIFY_TEMP_DIR";

// ============================================================================
// CORE CONFIGURATION
// ============================================================================

/// Configuration for the conversion core.
///
/// Construct it with [`CoreConfig::default`], [`CoreConfig::from_env`] or
/// [`CoreConfigBuilder`], then call [`CoreConfig::validate`] before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// ffmpeg executable used for conversions and frame extraction
    pub ffmpeg_path: PathBuf,

    /// ffprobe executable used for media probing
    pub ffprobe_path: PathBuf,

    /// `-preset` passed to the software encoder
    pub cpu_preset: String,

    /// `-preset` passed to the hardware encoder
    pub gpu_preset: String,

    /// `-cq` passed to the hardware encoder (0-51)
    pub gpu_quality: u8,

    /// `-q:v` used for preview frames (2-31)
    pub preview_quality: u8,

    /// Video bit rate used when the source does not report one
    pub fallback_bit_rate: u64,

    /// Directory for temporary preview files; system temp dir when `None`
    pub temp_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from(DEFAULT_FFMPEG_PATH),
            ffprobe_path: PathBuf::from(DEFAULT_FFPROBE_PATH),
            cpu_preset: DEFAULT_CPU_PRESET.to_string(),
            gpu_preset: DEFAULT_GPU_PRESET.to_string(),
            gpu_quality: DEFAULT_GPU_QUALITY,
            preview_quality: DEFAULT_PREVIEW_QUALITY,
            fallback_bit_rate: DEFAULT_FALLBACK_BIT_RATE,
            temp_dir: None,
        }
    }
}

impl CoreConfig {
    /// Default configuration with `SDRIFY_*` environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_with(|key| std::env::var(key).ok());
        config
    }

    /// Applies overrides read through `lookup`.
    ///
    /// Unparseable numeric values are ignored with a warning so that a typo
    /// in the environment never prevents the application from starting.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = non_empty(ENV_FFMPEG) {
            self.ffmpeg_path = PathBuf::from(path);
        }
        if let Some(path) = non_empty(ENV_FFPROBE) {
            self.ffprobe_path = PathBuf::from(path);
        }
        if let Some(preset) = non_empty(ENV_CPU_PRESET) {
            self.cpu_preset = preset;
        }
        if let Some(preset) = non_empty(ENV_GPU_PRESET) {
            self.gpu_preset = preset;
        }
        if let Some(raw) = non_empty(ENV_GPU_CQ) {
            match raw.trim().parse::<u8>() {
                Ok(cq) => self.gpu_quality = cq,
                Err(_) => log::warn!("Ignoring invalid {ENV_GPU_CQ} value '{raw}'"),
            }
        }
        if let Some(dir) = non_empty(ENV_TEMP_DIR) {
            self.temp_dir = Some(PathBuf::from(dir));
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Config` describing the first invalid field.
    pub fn validate(&self) -> CoreResult<()> {
        if self.ffmpeg_path.as_os_str().is_empty() {
            return Err(CoreError::Config("ffmpeg path must not be empty".to_string()));
        }
        if self.ffprobe_path.as_os_str().is_empty() {
            return Err(CoreError::Config("ffprobe path must not be empty".to_string()));
        }
        if self.cpu_preset.trim().is_empty() || self.gpu_preset.trim().is_empty() {
            return Err(CoreError::Config("encoder presets must not be empty".to_string()));
        }
        if self.gpu_quality > 51 {
            return Err(CoreError::Config(format!(
                "GPU quality must be between 0 and 51, got {}",
                self.gpu_quality
            )));
        }
        if !(2..=31).contains(&self.preview_quality) {
            return Err(CoreError::Config(format!(
                "preview quality must be between 2 and 31, got {}",
                self.preview_quality
            )));
        }
        if self.fallback_bit_rate == 0 {
            return Err(CoreError::Config("fallback bit rate must be positive".to_string()));
        }
        Ok(())
    }
}
