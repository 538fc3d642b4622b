// ============================================================================
// sdrify-core/src/encoding/command.rs
// ============================================================================
//
// COMMAND BUILDER: ffmpeg argument lists for HDR to SDR conversion
//
// Maps a ConversionRequest plus the probed MediaProperties to the ordered
// argument list passed to ffmpeg. Building is pure: the only environmental
// input is the Platform captured when the builder is created, so the same
// request and properties always yield the same arguments.
//
// KEY COMPONENTS:
// - CommandBuilder: CPU and GPU argument construction
// - BuiltCommand: arguments plus warnings raised while building
// - BuildWarning: soft problems the UI should surface
//
// The GPU path does not apply the tone mapping filter. Frames decoded with
// CUDA are encoded by NVENC without tone mapping, so GPU output keeps HDR
// transfer characteristics squeezed into an 8-bit SDR container.

use std::fmt;

use crate::config::CoreConfig;
use crate::encoding::filters::{FrameSize, build_tone_map_filter};
use crate::encoding::request::ConversionRequest;
use crate::error::CoreError;
use crate::hardware_accel::{HardwareAcceleration, Platform, hardware_encoder_for};
use crate::media::MediaProperties;
use crate::utils::path_arg;

/// Soft problems detected while building a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildWarning {
    /// GPU was requested but the platform has no supported acceleration; the
    /// CPU path was used instead.
    AccelerationUnavailable { platform: Platform },
}

impl BuildWarning {
    /// The warning expressed as the corresponding soft error.
    #[must_use]
    pub fn to_error(&self) -> CoreError {
        match self {
            Self::AccelerationUnavailable { platform } => CoreError::AccelerationUnavailable {
                platform: platform.to_string(),
            },
        }
    }
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_error())
    }
}

/// Result of [`CommandBuilder::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltCommand {
    pub args: Vec<String>,
    pub warnings: Vec<BuildWarning>,
    /// Whether the GPU path was actually selected
    pub accelerated: bool,
}

/// Builds ffmpeg argument lists.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    hardware: HardwareAcceleration,
    cpu_preset: String,
    gpu_preset: String,
    gpu_quality: u8,
}

impl CommandBuilder {
    /// Creates a builder for the platform this binary runs on.
    #[must_use]
    pub fn new(config: &CoreConfig) -> Self {
        Self::for_platform(config, Platform::current())
    }

    /// Creates a builder targeting an explicit platform.
    #[must_use]
    pub fn for_platform(config: &CoreConfig, platform: Platform) -> Self {
        Self {
            hardware: HardwareAcceleration::for_platform(platform),
            cpu_preset: config.cpu_preset.clone(),
            gpu_preset: config.gpu_preset.clone(),
            gpu_quality: config.gpu_quality,
        }
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        self.hardware.platform
    }

    /// Builds the argument list for `request` against `properties`.
    #[must_use]
    pub fn build(&self, request: &ConversionRequest, properties: &MediaProperties) -> BuiltCommand {
        let mut warnings = Vec::new();
        let accelerated = request.use_gpu && self.hardware.cuda_available;
        if request.use_gpu && !accelerated {
            log::warn!(
                "GPU acceleration requested but unavailable on {}; using CPU",
                self.hardware.platform
            );
            warnings.push(BuildWarning::AccelerationUnavailable {
                platform: self.hardware.platform,
            });
        }

        let mut args: Vec<String> = vec!["-loglevel".into(), "info".into()];
        if accelerated {
            args.extend(self.hardware.hwaccel_args());
        }
        args.extend([
            "-i".to_string(),
            path_arg(&request.input),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "0:a?".to_string(),
            "-map".to_string(),
            "0:s?".to_string(),
        ]);

        let preset = if accelerated {
            self.push_gpu_video_args(&mut args, properties);
            &self.gpu_preset
        } else {
            self.push_cpu_video_args(&mut args, request, properties);
            &self.cpu_preset
        };

        if properties.frame_rate > 0.0 {
            args.push("-r".to_string());
            args.push(format_frame_rate(properties.frame_rate));
        }

        args.extend([
            "-preset".to_string(),
            preset.clone(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-c:a".to_string(),
            "copy".to_string(),
            "-c:s".to_string(),
            "copy".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            path_arg(&request.output),
            "-y".to_string(),
        ]);

        BuiltCommand {
            args,
            warnings,
            accelerated,
        }
    }

    fn push_cpu_video_args(
        &self,
        args: &mut Vec<String>,
        request: &ConversionRequest,
        properties: &MediaProperties,
    ) {
        let filter = build_tone_map_filter(
            request.tone_map,
            request.gamma,
            FrameSize::Fixed {
                width: properties.width,
                height: properties.height,
            },
            properties.content_light,
        );
        args.extend([
            "-filter:v".to_string(),
            filter,
            "-c:v".to_string(),
            properties.codec_name.clone(),
            "-b:v".to_string(),
            properties.bit_rate.to_string(),
        ]);
    }

    fn push_gpu_video_args(&self, args: &mut Vec<String>, properties: &MediaProperties) {
        let bit_rate = properties.bit_rate;
        args.extend([
            "-c:v".to_string(),
            hardware_encoder_for(&properties.codec_name).to_string(),
            "-rc".to_string(),
            "vbr".to_string(),
            "-cq".to_string(),
            self.gpu_quality.to_string(),
            "-b:v".to_string(),
            bit_rate.to_string(),
            "-maxrate".to_string(),
            (bit_rate.saturating_mul(3) / 2).to_string(),
            "-bufsize".to_string(),
            bit_rate.saturating_mul(2).to_string(),
        ]);
    }
}

/// Renders a frame rate so whole numbers keep one decimal ("30.0").
#[must_use]
pub fn format_frame_rate(rate: f64) -> String {
    if rate.fract() == 0.0 {
        format!("{rate:.1}")
    } else {
        format!("{rate}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::request::ToneMapMode;
    use crate::media::ContentLightLevel;

    fn properties() -> MediaProperties {
        MediaProperties {
            width: 1920,
            height: 1080,
            codec_name: "h264".to_string(),
            bit_rate: 8_000_000,
            frame_rate: 30.0,
            duration_secs: 120.0,
            audio_codec: "aac".to_string(),
            audio_bit_rate: 128_000,
            subtitle_streams: Vec::new(),
            content_light: None,
        }
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn cpu_command_layout() {
        let builder = CommandBuilder::for_platform(&CoreConfig::default(), Platform::Linux);
        let request = ConversionRequest::new("/videos/in.mkv", "/videos/out.mp4", 2.2);
        let built = builder.build(&request, &properties());

        let expected: Vec<String> = [
            "-loglevel", "info",
            "-i", "/videos/in.mkv",
            "-map", "0:v:0", "-map", "0:a?", "-map", "0:s?",
            "-filter:v",
            "zscale=primaries=bt709:transfer=bt709:matrix=bt709,tonemap=reinhard,eq=gamma=2.2,scale=1920:1080",
            "-c:v", "h264",
            "-b:v", "8000000",
            "-r", "30.0",
            "-preset", "faster",
            "-pix_fmt", "yuv420p",
            "-c:a", "copy",
            "-c:s", "copy",
            "-movflags", "+faststart",
            "/videos/out.mp4", "-y",
        ]
        .iter()
        .map(ToString::to_string)
        .collect();

        assert_eq!(built.args, expected);
        assert!(built.warnings.is_empty());
        assert!(!built.accelerated);
    }

    #[test]
    fn gpu_command_on_supported_platform() {
        let builder = CommandBuilder::for_platform(&CoreConfig::default(), Platform::Windows);
        let request = ConversionRequest::new("in.mkv", "out.mp4", 1.0).with_gpu(true);
        let built = builder.build(&request, &properties());

        assert!(built.accelerated);
        assert_eq!(&built.args[2..6], ["-hwaccel", "cuda", "-hwaccel_device", "0"]);
        assert_eq!(value_after(&built.args, "-c:v"), Some("h264_nvenc"));
        assert_eq!(value_after(&built.args, "-rc"), Some("vbr"));
        assert_eq!(value_after(&built.args, "-cq"), Some("23"));
        assert_eq!(value_after(&built.args, "-maxrate"), Some("12000000"));
        assert_eq!(value_after(&built.args, "-bufsize"), Some("16000000"));
        assert_eq!(value_after(&built.args, "-preset"), Some("p4"));
        assert!(!built.args.iter().any(|a| a == "-filter:v"));
    }

    #[test]
    fn gpu_on_unsupported_platform_matches_cpu_plus_warning() {
        let builder = CommandBuilder::for_platform(&CoreConfig::default(), Platform::MacOs);
        let cpu = ConversionRequest::new("in.mkv", "out.mp4", 1.4);
        let gpu = cpu.clone().with_gpu(true);

        let cpu_built = builder.build(&cpu, &properties());
        let gpu_built = builder.build(&gpu, &properties());

        assert_eq!(gpu_built.args, cpu_built.args);
        assert!(!gpu_built.args.iter().any(|a| a == "-hwaccel"));
        assert_eq!(
            gpu_built.warnings,
            vec![BuildWarning::AccelerationUnavailable { platform: Platform::MacOs }]
        );
    }

    #[test]
    fn build_is_deterministic() {
        let builder = CommandBuilder::for_platform(&CoreConfig::default(), Platform::Linux);
        let request = ConversionRequest::new("a/./in.mkv", "b/../out.mp4", 1.8)
            .with_tone_map(ToneMapMode::Dynamic);
        let props = MediaProperties {
            content_light: Some(ContentLightLevel { max_cll: 1000, max_fall: 400 }),
            ..properties()
        };
        assert_eq!(builder.build(&request, &props), builder.build(&request, &props));
    }

    #[test]
    fn paths_are_normalised() {
        let builder = CommandBuilder::for_platform(&CoreConfig::default(), Platform::Linux);
        let request = ConversionRequest::new("/videos/./raw/../in.mkv", "/out/./x.mp4", 1.0);
        let built = builder.build(&request, &properties());
        assert_eq!(value_after(&built.args, "-i"), Some("/videos/in.mkv"));
        assert_eq!(built.args[built.args.len() - 2], "/out/x.mp4");
    }

    #[test]
    fn zero_frame_rate_omits_rate_flag() {
        let builder = CommandBuilder::for_platform(&CoreConfig::default(), Platform::Linux);
        let request = ConversionRequest::new("in.mkv", "out.mp4", 1.0);
        let props = MediaProperties {
            frame_rate: 0.0,
            ..properties()
        };
        let built = builder.build(&request, &props);
        assert!(!built.args.iter().any(|a| a == "-r"));
    }

    #[test]
    fn frame_rate_formatting() {
        assert_eq!(format_frame_rate(30.0), "30.0");
        assert_eq!(format_frame_rate(23.976), "23.976");
    }
}
