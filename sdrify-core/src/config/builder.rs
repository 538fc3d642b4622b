// ============================================================================
// sdrify-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for CoreConfig
//
// Fluent construction of CoreConfig. Every field starts from its default, so
// callers only name what they want to change.

// ---- Standard library imports ----
use std::path::PathBuf;

// ---- Internal crate imports ----
use super::CoreConfig;

/// Builder for creating CoreConfig instances.
///
/// # Examples
///
/// ```rust
/// use sdrify_core::config::CoreConfigBuilder;
///
/// let config = CoreConfigBuilder::new()
///     .ffmpeg_path("/usr/local/bin/ffmpeg")
///     .ffprobe_path("/usr/local/bin/ffprobe")
///     .gpu_quality(21)
///     .build();
///
/// assert_eq!(config.gpu_quality, 21);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl CoreConfigBuilder {
    /// Creates a builder populated with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration, e.g. one read from the environment.
    #[must_use]
    pub fn from_config(config: CoreConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.ffmpeg_path = path.into();
        self
    }

    #[must_use]
    pub fn ffprobe_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.ffprobe_path = path.into();
        self
    }

    #[must_use]
    pub fn cpu_preset(mut self, preset: impl Into<String>) -> Self {
        self.config.cpu_preset = preset.into();
        self
    }

    #[must_use]
    pub fn gpu_preset(mut self, preset: impl Into<String>) -> Self {
        self.config.gpu_preset = preset.into();
        self
    }

    #[must_use]
    pub fn gpu_quality(mut self, quality: u8) -> Self {
        self.config.gpu_quality = quality;
        self
    }

    #[must_use]
    pub fn preview_quality(mut self, quality: u8) -> Self {
        self.config.preview_quality = quality;
        self
    }

    #[must_use]
    pub fn fallback_bit_rate(mut self, bit_rate: u64) -> Self {
        self.config.fallback_bit_rate = bit_rate;
        self
    }

    #[must_use]
    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = Some(dir.into());
        self
    }

    /// Builds the configuration. Call [`CoreConfig::validate`] on the result
    /// before handing it to the conversion manager.
    #[must_use]
    pub fn build(self) -> CoreConfig {
        self.config
    }
}
