// ============================================================================
// sdrify-core/src/preview.rs
// ============================================================================
//
// FRAME PREVIEW: Single-frame extraction for before/after comparison
//
// A preview is one frame decoded by ffmpeg and piped back as a JPEG. The
// converted variant runs through build_tone_map_filter, the same routine the
// CommandBuilder uses, so it shows what the full conversion will produce.
//
// KEY COMPONENTS:
// - FramePreviewExtractor: probe + extraction
// - PreviewFrame: decoded image with display helpers
// - PreviewPair: original and converted frame at the same timestamp

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use tempfile::NamedTempFile;

use crate::config::CoreConfig;
use crate::encoding::{FrameSize, ToneMapMode, build_tone_map_filter};
use crate::error::{CoreError, CoreResult};
use crate::external::ToolRunner;
use crate::media::{MediaProbe, MediaProperties};
use crate::temp_files::create_temp_file;
use crate::utils::path_arg;

/// The default extraction point is `duration / DEFAULT_POSITION_DIVISOR`.
const DEFAULT_POSITION_DIVISOR: f64 = 3.0;

/// A decoded preview frame.
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    pub image: DynamicImage,
    /// Position in the source, in seconds.
    pub timestamp: f64,
}

impl PreviewFrame {
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Scales the frame to fit within `width` x `height`, keeping the
    /// aspect ratio.
    #[must_use]
    pub fn resized(&self, width: u32, height: u32) -> Self {
        Self {
            image: self.image.resize(width, height, FilterType::Lanczos3),
            timestamp: self.timestamp,
        }
    }

    /// Writes the frame as PNG to `path`.
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        self.image.save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }

    /// Writes the frame as PNG into a temporary file removed on drop.
    pub fn save_to_temp(&self, config: &CoreConfig, label: &str) -> CoreResult<NamedTempFile> {
        let dir = config
            .temp_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        let file = create_temp_file(&dir, label, "png")?;
        self.save(file.path())?;
        log::debug!("Saved preview frame to {}", file.path().display());
        Ok(file)
    }
}

/// Original and converted frames at the same timestamp.
#[derive(Debug, Clone)]
pub struct PreviewPair {
    pub original: PreviewFrame,
    pub converted: PreviewFrame,
}

/// Extracts preview frames with ffmpeg.
pub struct FramePreviewExtractor<R: ToolRunner> {
    runner: R,
    config: CoreConfig,
}

impl<R: ToolRunner> FramePreviewExtractor<R> {
    pub fn new(runner: R, config: &CoreConfig) -> Self {
        Self {
            runner,
            config: config.clone(),
        }
    }

    /// Default extraction point: one third of the duration.
    ///
    /// # Errors
    ///
    /// `CoreError::InvalidMedia` when the duration is missing or zero.
    pub fn default_timestamp(properties: &MediaProperties) -> CoreResult<f64> {
        if !properties.has_duration() {
            return Err(CoreError::InvalidMedia(
                "Invalid video properties or duration.".to_string(),
            ));
        }
        Ok(properties.duration_secs / DEFAULT_POSITION_DIVISOR)
    }

    /// Frame at the default timestamp; converted with a static tone map at
    /// `gamma` when given, unmodified otherwise.
    pub fn preview(&self, path: &Path, gamma: Option<f64>) -> CoreResult<PreviewFrame> {
        let properties = self.probe_for_preview(path)?;
        let timestamp = Self::default_timestamp(&properties)?;
        let filter = gamma.map(|g| {
            build_tone_map_filter(ToneMapMode::Static, g, FrameSize::Input, None)
        });
        self.extract(path, timestamp, filter.as_deref())
    }

    /// Unmodified frame at `timestamp`, or at the default timestamp.
    pub fn extract_original(&self, path: &Path, timestamp: Option<f64>) -> CoreResult<PreviewFrame> {
        let timestamp = self.resolve_timestamp(path, timestamp)?;
        self.extract(path, timestamp, None)
    }

    /// Tone mapped frame at `timestamp`, or at the default timestamp.
    pub fn extract_converted(
        &self,
        path: &Path,
        gamma: f64,
        mode: ToneMapMode,
        timestamp: Option<f64>,
    ) -> CoreResult<PreviewFrame> {
        let properties = self.probe_with_mode(path, mode)?;
        let timestamp = match timestamp {
            Some(t) => t,
            None => Self::default_timestamp(&properties)?,
        };
        let filter =
            build_tone_map_filter(mode, gamma, FrameSize::Input, properties.content_light);
        self.extract(path, timestamp, Some(&filter))
    }

    /// Both variants at the same position, probing the input once.
    pub fn preview_pair(
        &self,
        path: &Path,
        gamma: f64,
        mode: ToneMapMode,
        timestamp: Option<f64>,
    ) -> CoreResult<PreviewPair> {
        let properties = self.probe_with_mode(path, mode)?;
        let timestamp = match timestamp {
            Some(t) => t,
            None => Self::default_timestamp(&properties)?,
        };
        let filter =
            build_tone_map_filter(mode, gamma, FrameSize::Input, properties.content_light);
        Ok(PreviewPair {
            original: self.extract(path, timestamp, None)?,
            converted: self.extract(path, timestamp, Some(&filter))?,
        })
    }

    /// Argument list for a single-frame extraction.
    #[must_use]
    pub fn extraction_args(&self, path: &Path, timestamp: f64, filter: Option<&str>) -> Vec<String> {
        let mut args = vec![
            "-ss".to_string(),
            format!("{timestamp:.3}"),
            "-i".to_string(),
            path_arg(path),
        ];
        if let Some(filter) = filter {
            args.push("-filter:v".to_string());
            args.push(filter.to_string());
        }
        args.extend([
            "-frames:v".to_string(),
            "1".to_string(),
            "-q:v".to_string(),
            self.config.preview_quality.to_string(),
            "-c:v".to_string(),
            "mjpeg".to_string(),
            "-f".to_string(),
            "image2pipe".to_string(),
            "-".to_string(),
            "-y".to_string(),
        ]);
        args
    }

    fn extract(&self, path: &Path, timestamp: f64, filter: Option<&str>) -> CoreResult<PreviewFrame> {
        let args = self.extraction_args(path, timestamp, filter);
        log::debug!("Preview command: {} {}", self.config.ffmpeg_path.display(), args.join(" "));

        let output = self
            .runner
            .run(&self.config.ffmpeg_path, &args)
            .map_err(|e| CoreError::Extraction(e.to_string()))?;
        if !output.success() {
            return Err(CoreError::Extraction(format!(
                "ffmpeg exited with code {:?}: {}",
                output.exit.code(),
                output.stderr.trim()
            )));
        }
        if output.stdout.is_empty() {
            return Err(CoreError::Extraction("ffmpeg produced no image data".to_string()));
        }

        let image = image::load_from_memory(&output.stdout)
            .map_err(|e| CoreError::Extraction(e.to_string()))?;
        Ok(PreviewFrame { image, timestamp })
    }

    fn resolve_timestamp(&self, path: &Path, timestamp: Option<f64>) -> CoreResult<f64> {
        match timestamp {
            Some(t) => Ok(t),
            None => Self::default_timestamp(&self.probe_for_preview(path)?),
        }
    }

    fn probe_with_mode(&self, path: &Path, mode: ToneMapMode) -> CoreResult<MediaProperties> {
        let probe = MediaProbe::new(&self.runner, &self.config);
        if mode.needs_light_level() {
            probe.probe_with_light_level(path)
        } else {
            probe.probe(path)
        }
    }

    fn probe_for_preview(&self, path: &Path) -> CoreResult<MediaProperties> {
        self.probe_with_mode(path, ToneMapMode::Static)
    }
}
