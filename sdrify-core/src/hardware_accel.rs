// ============================================================================
// sdrify-core/src/hardware_accel.rs
// ============================================================================
//
// HARDWARE ACCELERATION: Platform gating and NVENC configuration
//
// This module decides whether the GPU conversion path may be used on the
// running platform and provides the ffmpeg arguments that path needs.
// Only CUDA decoding with NVENC encoding is supported, which ffmpeg offers
// on Windows and Linux builds.
//
// KEY COMPONENTS:
// - Platform: the operating system the command line is built for
// - HardwareAcceleration: detected capability plus argument helpers
// - Hardware encoder selection from the source codec

use std::env;
use std::fmt;

/// Operating systems the command builder distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    Linux,
    MacOs,
    Other,
}

impl Platform {
    /// Detects the platform this binary was compiled for.
    ///
    /// This function uses the `std::env::consts::OS` constant.
    #[must_use]
    pub fn current() -> Self {
        Self::from_os_name(env::consts::OS)
    }

    /// Maps an `std::env::consts::OS` value to a platform.
    #[must_use]
    pub fn from_os_name(os: &str) -> Self {
        match os {
            "windows" => Self::Windows,
            "linux" => Self::Linux,
            "macos" => Self::MacOs,
            _ => Self::Other,
        }
    }

    /// Whether ffmpeg's CUDA/NVENC path is available on this platform.
    #[must_use]
    pub fn supports_gpu(self) -> bool {
        matches!(self, Self::Windows | Self::Linux)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Windows => "Windows",
            Self::Linux => "Linux",
            Self::MacOs => "macOS",
            Self::Other => "this platform",
        };
        f.write_str(name)
    }
}

/// Represents hardware acceleration capabilities for a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareAcceleration {
    pub platform: Platform,
    /// Whether CUDA decoding and NVENC encoding can be requested
    pub cuda_available: bool,
}

impl Default for HardwareAcceleration {
    fn default() -> Self {
        Self::detect()
    }
}

impl HardwareAcceleration {
    /// Detects hardware acceleration capabilities for the current platform.
    #[must_use]
    pub fn detect() -> Self {
        Self::for_platform(Platform::current())
    }

    #[must_use]
    pub fn for_platform(platform: Platform) -> Self {
        Self {
            platform,
            cuda_available: platform.supports_gpu(),
        }
    }

    /// Arguments that must precede `-i` on the GPU path.
    #[must_use]
    pub fn hwaccel_args(&self) -> Vec<String> {
        if !self.cuda_available {
            return Vec::new();
        }
        vec![
            "-hwaccel".to_string(),
            "cuda".to_string(),
            "-hwaccel_device".to_string(),
            "0".to_string(),
        ]
    }
}

/// Picks the NVENC encoder matching the source codec. Sources NVENC cannot
/// encode to fall back to HEVC.
#[must_use]
pub fn hardware_encoder_for(codec_name: &str) -> &'static str {
    match codec_name.to_ascii_lowercase().as_str() {
        "h264" | "avc" | "avc1" => "h264_nvenc",
        "av1" => "av1_nvenc",
        _ => "hevc_nvenc",
    }
}
