// ============================================================================
// sdrify-core/src/media/probe.rs
// ============================================================================
//
// MEDIA PROBE: ffprobe invocation and JSON parsing
//
// Runs ffprobe with JSON output and reduces the result to MediaProperties.
// The raw ffprobe structures stay private to this module; only the
// normalised record leaves it.
//
// KEY COMPONENTS:
// - MediaProbe: runs ffprobe through a ToolRunner
// - parse_probe_output: JSON to MediaProperties
// - parse_frame_light_level: first-frame HDR metadata for dynamic tone mapping

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::properties::{
    ContentLightLevel, DEFAULT_AUDIO_BIT_RATE, DEFAULT_AUDIO_CODEC, MediaProperties,
    SubtitleStream, parse_frame_rate,
};
use crate::config::{CoreConfig, DEFAULT_FALLBACK_BIT_RATE};
use crate::error::{CoreError, CoreResult};
use crate::external::ToolRunner;
use crate::utils::path_arg;

const CONTENT_LIGHT_SIDE_DATA: &str = "Content light level metadata";

// ---- Raw ffprobe output ----

#[derive(Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    index: u32,
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    bit_rate: Option<String>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
    #[serde(default)]
    side_data_list: Vec<FfprobeSideData>,
}

#[derive(Deserialize)]
struct FfprobeSideData {
    side_data_type: Option<String>,
    max_content: Option<u32>,
    max_average: Option<u32>,
}

#[derive(Deserialize)]
struct FfprobeFrames {
    #[serde(default)]
    frames: Vec<FfprobeFrame>,
}

#[derive(Deserialize)]
struct FfprobeFrame {
    #[serde(default)]
    side_data_list: Vec<FfprobeSideData>,
}

// ============================================================================
// PROBE
// ============================================================================

/// Probes media files with ffprobe.
#[derive(Debug, Clone)]
pub struct MediaProbe<R: ToolRunner> {
    runner: R,
    ffprobe_path: PathBuf,
    fallback_bit_rate: u64,
}

impl<R: ToolRunner> MediaProbe<R> {
    /// Creates a probe using the ffprobe path and fallback bit rate from `config`.
    pub fn new(runner: R, config: &CoreConfig) -> Self {
        Self {
            runner,
            ffprobe_path: config.ffprobe_path.clone(),
            fallback_bit_rate: config.fallback_bit_rate,
        }
    }

    /// Probes `path` for stream and format metadata.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Probe` when ffprobe cannot be run, exits non-zero,
    /// prints unparseable JSON, or the file has no usable video stream.
    pub fn probe(&self, path: &Path) -> CoreResult<MediaProperties> {
        let args = vec![
            "-v".to_string(),
            "quiet".to_string(),
            "-print_format".to_string(),
            "json".to_string(),
            "-show_streams".to_string(),
            "-show_format".to_string(),
            path_arg(path),
        ];

        let stdout = self.run_ffprobe(path, &args)?;
        let properties = parse_probe_output(&stdout, self.fallback_bit_rate)?;
        log::debug!(
            "Probed {}: {}x{} {} {:.3} fps, {:.2}s, {} subtitle stream(s)",
            path.display(),
            properties.width,
            properties.height,
            properties.codec_name,
            properties.frame_rate,
            properties.duration_secs,
            properties.subtitle_streams.len()
        );
        Ok(properties)
    }

    /// Reads content light level metadata from the first video frame.
    ///
    /// Returns `Ok(None)` when the frame carries no such metadata.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Probe` under the same conditions as [`MediaProbe::probe`].
    pub fn probe_content_light(&self, path: &Path) -> CoreResult<Option<ContentLightLevel>> {
        let args = vec![
            "-v".to_string(),
            "quiet".to_string(),
            "-print_format".to_string(),
            "json".to_string(),
            "-select_streams".to_string(),
            "v:0".to_string(),
            "-show_frames".to_string(),
            "-read_intervals".to_string(),
            "%+#1".to_string(),
            "-show_entries".to_string(),
            "frame=side_data_list".to_string(),
            path_arg(path),
        ];

        let stdout = self.run_ffprobe(path, &args)?;
        parse_frame_light_level(&stdout)
    }

    /// Probes `path` and, when the container lacks light level metadata,
    /// falls back to reading it from the first frame.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Probe` if either ffprobe invocation fails.
    pub fn probe_with_light_level(&self, path: &Path) -> CoreResult<MediaProperties> {
        let properties = self.probe(path)?;
        if properties.content_light.is_some() {
            return Ok(properties);
        }
        let light = self.probe_content_light(path)?;
        if light.is_none() {
            log::info!(
                "No content light level metadata in {}; using defaults",
                path.display()
            );
        }
        Ok(properties.with_content_light(light))
    }

    fn run_ffprobe(&self, path: &Path, args: &[String]) -> CoreResult<String> {
        let output = self
            .runner
            .run(&self.ffprobe_path, args)
            .map_err(|e| CoreError::Probe(e.to_string()))?;

        if !output.success() {
            let code = output
                .exit
                .code()
                .map_or_else(|| "unknown".to_string(), |c| c.to_string());
            let mut message = format!(
                "ffprobe exited with code {code} for '{}'",
                path.display()
            );
            if !output.stderr.trim().is_empty() {
                message.push_str(": ");
                message.push_str(output.stderr.trim());
            }
            log::warn!("{message}");
            return Err(CoreError::Probe(message));
        }

        Ok(output.stdout_text())
    }
}

// ============================================================================
// PARSING
// ============================================================================

/// Parses `-show_streams -show_format` JSON into MediaProperties.
///
/// # Errors
///
/// Returns `CoreError::Probe` on malformed JSON, a missing video stream, or a
/// video stream without dimensions or codec.
pub fn parse_probe_output(json: &str, fallback_bit_rate: u64) -> CoreResult<MediaProperties> {
    let output: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| CoreError::Probe(format!("unexpected ffprobe output: {e}")))?;

    let mut video: Option<&FfprobeStream> = None;
    let mut audio: Option<&FfprobeStream> = None;
    let mut subtitle_streams = Vec::new();

    for stream in &output.streams {
        match stream.codec_type.as_deref() {
            Some("video") if video.is_none() => video = Some(stream),
            Some("audio") if audio.is_none() => audio = Some(stream),
            Some("subtitle") => subtitle_streams.push(SubtitleStream {
                index: stream.index,
                codec_name: stream
                    .codec_name
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string()),
            }),
            _ => {}
        }
    }

    let video = video.ok_or_else(|| CoreError::Probe("no video stream found".to_string()))?;

    let (width, height) = match (video.width, video.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => {
            return Err(CoreError::Probe(
                "video stream has no pixel dimensions".to_string(),
            ));
        }
    };

    let codec_name = video
        .codec_name
        .clone()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| CoreError::Probe("video stream has no codec name".to_string()))?;

    let fallback_bit_rate = if fallback_bit_rate == 0 {
        DEFAULT_FALLBACK_BIT_RATE
    } else {
        fallback_bit_rate
    };
    let bit_rate = parse_u64(video.bit_rate.as_deref()).unwrap_or(fallback_bit_rate);

    let frame_rate = video
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .filter(|rate| *rate > 0.0)
        .or_else(|| video.r_frame_rate.as_deref().and_then(parse_frame_rate))
        .unwrap_or(0.0);

    let duration_secs = output
        .format
        .as_ref()
        .and_then(|f| parse_f64(f.duration.as_deref()))
        .or_else(|| parse_f64(video.duration.as_deref()))
        .unwrap_or(0.0);

    let (audio_codec, audio_bit_rate) = match audio {
        Some(stream) => (
            stream
                .codec_name
                .clone()
                .unwrap_or_else(|| DEFAULT_AUDIO_CODEC.to_string()),
            parse_u64(stream.bit_rate.as_deref()).unwrap_or(DEFAULT_AUDIO_BIT_RATE),
        ),
        None => (DEFAULT_AUDIO_CODEC.to_string(), DEFAULT_AUDIO_BIT_RATE),
    };

    Ok(MediaProperties {
        width,
        height,
        codec_name,
        bit_rate,
        frame_rate,
        duration_secs,
        audio_codec,
        audio_bit_rate,
        subtitle_streams,
        content_light: light_level_from(&video.side_data_list),
    })
}

/// Parses `-show_frames -show_entries frame=side_data_list` JSON.
///
/// # Errors
///
/// Returns `CoreError::Probe` on malformed JSON.
pub fn parse_frame_light_level(json: &str) -> CoreResult<Option<ContentLightLevel>> {
    let output: FfprobeFrames = serde_json::from_str(json)
        .map_err(|e| CoreError::Probe(format!("unexpected ffprobe frame output: {e}")))?;
    Ok(output
        .frames
        .iter()
        .find_map(|frame| light_level_from(&frame.side_data_list)))
}

fn light_level_from(side_data: &[FfprobeSideData]) -> Option<ContentLightLevel> {
    side_data
        .iter()
        .filter(|sd| sd.side_data_type.as_deref() == Some(CONTENT_LIGHT_SIDE_DATA))
        .find_map(|sd| match (sd.max_content, sd.max_average) {
            (Some(max_cll), max_fall) if max_cll > 0 => Some(ContentLightLevel {
                max_cll,
                max_fall: max_fall.unwrap_or(0),
            }),
            _ => None,
        })
}

fn parse_u64(value: Option<&str>) -> Option<u64> {
    value.and_then(|v| v.trim().parse::<u64>().ok())
}

fn parse_f64(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
