//! Utility functions for time values and paths.
//!
//! This module provides general-purpose helpers used throughout the
//! sdrify-core library: parsing ffmpeg timestamps, formatting durations,
//! normalising paths before they are placed on a command line and deriving
//! default output names.

use std::path::{Component, Path, PathBuf};

/// Container extensions accepted as conversion input.
pub const SUPPORTED_INPUT_EXTENSIONS: [&str; 3] = ["mp4", "mkv", "mov"];

/// Suffix appended to the input stem when deriving an output file name.
pub const OUTPUT_SUFFIX: &str = "_sdr";

/// Extension of derived output files.
pub const OUTPUT_EXTENSION: &str = "mp4";

/// Checks if the given path has one of the supported container extensions
/// (case-insensitive).
#[must_use]
pub fn is_supported_input(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_INPUT_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

/// Derives `<stem>_sdr.mp4` next to the input file.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "output".into(), |s| s.to_string_lossy());
    input.with_file_name(format!("{stem}{OUTPUT_SUFFIX}.{OUTPUT_EXTENSION}"))
}

/// Formats seconds as HH:MM:SS (e.g., 3725.0 -> "01:02:05"). Returns "??:??:??" for invalid inputs.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "??:??:??".to_string();
    }

    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Parses FFmpeg time string (HH:MM:SS.ff) to seconds. Returns None if invalid.
#[must_use]
pub fn parse_ffmpeg_time(time: &str) -> Option<f64> {
    let parts: Vec<&str> = time.split(':').collect();
    if parts.len() == 3 {
        let hours = parts[0].parse::<f64>().ok()?;
        let minutes = parts[1].parse::<f64>().ok()?;
        let seconds = parts[2].parse::<f64>().ok()?;
        Some(hours * 3600.0 + minutes * 60.0 + seconds)
    } else {
        None
    }
}

/// Lexically normalises a path: drops `.` components and folds `..` into the
/// preceding normal component. The file system is never consulted, so the
/// path does not need to exist.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let ends_with_normal = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                );
                if ends_with_normal {
                    normalized.pop();
                } else if !matches!(
                    normalized.components().next_back(),
                    Some(Component::RootDir | Component::Prefix(_))
                ) {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }
    normalized
}

/// Normalised path rendered for an argument list.
#[must_use]
pub fn path_arg(path: &Path) -> String {
    normalize_path(path).to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported_input() {
        assert!(is_supported_input(Path::new("movie.mkv")));
        assert!(is_supported_input(Path::new("/videos/clip.MP4")));
        assert!(is_supported_input(Path::new("take.Mov")));
        assert!(!is_supported_input(Path::new("movie.avi")));
        assert!(!is_supported_input(Path::new("movie")));
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/videos/holiday.mkv")),
            PathBuf::from("/videos/holiday_sdr.mp4")
        );
        assert_eq!(
            default_output_path(Path::new("clip.mov")),
            PathBuf::from("clip_sdr.mp4")
        );
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "00:00:00");
        assert_eq!(format_duration(3725.0), "01:02:05");
        assert_eq!(format_duration(59.9), "00:00:59");
        assert_eq!(format_duration(-1.0), "??:??:??");
        assert_eq!(format_duration(f64::NAN), "??:??:??");
    }

    #[test]
    fn test_parse_ffmpeg_time() {
        assert_eq!(parse_ffmpeg_time("00:00:00.00"), Some(0.0));
        assert_eq!(parse_ffmpeg_time("00:01:30.00"), Some(90.0));
        assert_eq!(parse_ffmpeg_time("01:30:45.75"), Some(5445.75));
        assert_eq!(parse_ffmpeg_time(""), None);
        assert_eq!(parse_ffmpeg_time("00:00"), None);
        assert_eq!(parse_ffmpeg_time("N/A"), None);
        assert_eq!(parse_ffmpeg_time("aa:bb:cc"), None);
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/videos/./in/../movie.mkv")),
            PathBuf::from("/videos/movie.mkv")
        );
        assert_eq!(
            normalize_path(Path::new("a/b/../../c")),
            PathBuf::from("c")
        );
        assert_eq!(normalize_path(Path::new("../x")), PathBuf::from("../x"));
        assert_eq!(normalize_path(Path::new("/../x")), PathBuf::from("/x"));
        assert_eq!(normalize_path(Path::new("./")), PathBuf::from("."));
        assert_eq!(normalize_path(Path::new("movie.mkv")), PathBuf::from("movie.mkv"));
    }
}
