//! Progress monitor for the ffmpeg diagnostic stream.
//!
//! Consumes the events ffmpeg-sidecar's log parser produces from stderr.
//! Status updates are turned into a completion percentage, every log line is
//! buffered for the failure report, and lines matching a known CUDA/NVENC
//! failure are remembered so the supervisor can decide whether a CPU retry
//! applies.

use ffmpeg_sidecar::event::{FfmpegEvent, FfmpegProgress};

use crate::utils::parse_ffmpeg_time;

/// Lowercase fragments of ffmpeg messages emitted when CUDA decoding or NVENC
/// encoding cannot be used. Plain mentions of "nvenc" are not included since
/// the stream mapping line names the encoder on every GPU run.
pub const ACCELERATION_ERROR_SIGNATURES: &[&str] = &[
    "cuda_error",
    "cuinit(0) failed",
    "cannot load nvcuda",
    "cannot load libcuda",
    "cannot load libnvidia-encode",
    "cannot load nvencodeapi",
    "no nvenc capable devices found",
    "openencodesessionex failed",
    "driver does not support the required nvenc api version",
    "failed setup for format cuda",
    "hwaccel initialisation returned error",
    "device creation failed",
    "no device available for decoder",
];

/// Whether `line` contains one of [`ACCELERATION_ERROR_SIGNATURES`].
#[must_use]
pub fn is_acceleration_error(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    ACCELERATION_ERROR_SIGNATURES
        .iter()
        .any(|signature| lower.contains(signature))
}

/// Percentage of `duration_secs` reached at the status time `time`
/// (`HH:MM:SS.ff`), clamped to 0-100. `None` when the time is not reported
/// or the duration is unusable.
#[must_use]
pub fn progress_percent(time: &str, duration_secs: f64) -> Option<f64> {
    if !(duration_secs.is_finite() && duration_secs > 0.0) {
        return None;
    }
    let elapsed = parse_ffmpeg_time(time)?;
    Some((elapsed / duration_secs * 100.0).clamp(0.0, 100.0))
}

/// Per-session consumer of ffmpeg events.
#[derive(Debug, Clone)]
pub struct ProgressMonitor {
    duration_secs: f64,
    transcript: Vec<String>,
    acceleration_error: bool,
    last_percent: Option<f64>,
}

impl ProgressMonitor {
    #[must_use]
    pub fn new(duration_secs: f64) -> Self {
        Self {
            duration_secs,
            transcript: Vec::new(),
            acceleration_error: false,
            last_percent: None,
        }
    }

    /// Handles one parsed event and returns the progress it reports, if any.
    pub fn handle_event(&mut self, event: FfmpegEvent) -> Option<f64> {
        match event {
            FfmpegEvent::Progress(progress) => self.handle_progress(&progress),
            FfmpegEvent::Log(_, message) | FfmpegEvent::Error(message) => {
                self.handle_log(&message);
                None
            }
            _ => None,
        }
    }

    fn handle_progress(&mut self, progress: &FfmpegProgress) -> Option<f64> {
        self.transcript.push(progress.raw_log_message.trim().to_string());
        let percent = progress_percent(&progress.time, self.duration_secs)?;
        self.last_percent = Some(percent);
        Some(percent)
    }

    /// Buffers a log message and checks it for acceleration errors.
    pub fn handle_log(&mut self, message: &str) {
        let message = message.trim();
        if message.is_empty() {
            return;
        }
        log::debug!(target: "ffmpeg_log", "{message}");
        if is_acceleration_error(message) {
            log::debug!("Acceleration error signature: {message}");
            self.acceleration_error = true;
        }
        self.transcript.push(message.to_string());
    }

    /// Whether the current attempt printed an acceleration error.
    #[must_use]
    pub fn acceleration_error_seen(&self) -> bool {
        self.acceleration_error
    }

    #[must_use]
    pub fn last_percent(&self) -> Option<f64> {
        self.last_percent
    }

    /// Prepares for a new attempt. The transcript of earlier attempts is kept
    /// so a failure report covers the whole session.
    pub fn begin_attempt(&mut self) {
        self.acceleration_error = false;
        self.last_percent = None;
    }

    /// All buffered lines joined by newlines.
    #[must_use]
    pub fn transcript(&self) -> String {
        let mut text = self.transcript.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        text
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.transcript.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffmpeg_sidecar::event::LogLevel;
    use ffmpeg_sidecar::log_parser::FfmpegLogParser;
    use std::io::Cursor;

    fn status_line(time: &str) -> String {
        format!(
            "frame= 2700 fps= 45 q=28.0 size=   10240kB time={time} bitrate= 932.1kbits/s speed=1.5x"
        )
    }

    fn parse(stderr: &str) -> Vec<FfmpegEvent> {
        let mut parser = FfmpegLogParser::new(Cursor::new(stderr.as_bytes().to_vec()));
        let mut events = Vec::new();
        loop {
            match parser.parse_next_event().unwrap() {
                FfmpegEvent::LogEOF => break,
                event => events.push(event),
            }
        }
        events
    }

    fn log(message: &str) -> FfmpegEvent {
        FfmpegEvent::Log(LogLevel::Unknown, message.to_string())
    }

    #[test]
    fn ninety_seconds_of_two_minutes_is_seventy_five_percent() {
        assert_eq!(progress_percent("00:01:30.00", 120.0), Some(75.0));

        let mut monitor = ProgressMonitor::new(120.0);
        let percents: Vec<f64> = parse(&format!("{}\r", status_line("00:01:30.00")))
            .into_iter()
            .filter_map(|event| monitor.handle_event(event))
            .collect();
        assert_eq!(percents, vec![75.0]);
    }

    #[test]
    fn unreported_time_or_duration() {
        assert_eq!(progress_percent("N/A", 120.0), None);
        assert_eq!(progress_percent("00:00:10.00", 0.0), None);
        assert_eq!(progress_percent("00:00:10.00", f64::NAN), None);

        let mut monitor = ProgressMonitor::new(120.0);
        assert_eq!(monitor.handle_event(log("Stream mapping:")), None);
        assert_eq!(monitor.last_percent(), None);
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(progress_percent("00:02:30.00", 120.0), Some(100.0));
    }

    #[test]
    fn increasing_status_times_give_non_decreasing_progress() {
        let stderr: String = (0..700)
            .step_by(7)
            .map(|second| {
                format!(
                    "{}\r",
                    status_line(&format!("00:{:02}:{:02}.50", second / 60, second % 60))
                )
            })
            .collect();

        let mut monitor = ProgressMonitor::new(600.0);
        let mut previous = 0.0;
        let mut updates = 0;
        for event in parse(&stderr) {
            if let Some(percent) = monitor.handle_event(event) {
                assert!(percent >= previous);
                previous = percent;
                updates += 1;
            }
        }
        assert_eq!(updates, 100);
        assert_eq!(monitor.last_percent(), Some(100.0));
    }

    #[test]
    fn transcript_buffers_log_and_status_lines() {
        let stderr = format!(
            "[hevc @ 0x1] Skipping invalid frame\n{}\rConversion failed!\n",
            status_line("00:00:01.00")
        );
        let mut monitor = ProgressMonitor::new(120.0);
        for event in parse(&stderr) {
            monitor.handle_event(event);
        }
        assert_eq!(monitor.line_count(), 3);
        assert_eq!(
            monitor.transcript(),
            format!(
                "[hevc @ 0x1] Skipping invalid frame\n{}\nConversion failed!\n",
                status_line("00:00:01.00")
            )
        );
    }

    #[test]
    fn blank_messages_are_not_buffered() {
        let mut monitor = ProgressMonitor::new(120.0);
        monitor.handle_log("   ");
        monitor.handle_event(FfmpegEvent::Error(String::new()));
        assert_eq!(monitor.line_count(), 0);
        assert_eq!(monitor.transcript(), "");
    }

    #[test]
    fn acceleration_signatures() {
        assert!(is_acceleration_error("[h264_nvenc @ 0x55] OpenEncodeSessionEx failed: unsupported device (2): (no details)"));
        assert!(is_acceleration_error("[hevc_nvenc @ 0x1] No NVENC capable devices found"));
        assert!(is_acceleration_error("Cannot load nvcuda.dll"));
        assert!(is_acceleration_error("[AVHWDeviceContext @ 0x2] cu->cuInit(0) failed -> CUDA_ERROR_NO_DEVICE: no CUDA-capable device is detected"));
        assert!(is_acceleration_error("Device creation failed: -542398533."));
        assert!(!is_acceleration_error("Stream #0:0 -> #0:0 (hevc (native) -> hevc (hevc_nvenc))"));
        assert!(!is_acceleration_error("Error while decoding stream #0:1: Invalid data found"));
    }

    #[test]
    fn error_events_are_scanned_for_signatures() {
        let mut monitor = ProgressMonitor::new(10.0);
        monitor.handle_event(FfmpegEvent::Error("No NVENC capable devices found".to_string()));
        assert!(monitor.acceleration_error_seen());
    }

    #[test]
    fn begin_attempt_resets_signature_but_keeps_transcript() {
        let mut monitor = ProgressMonitor::new(10.0);
        monitor.handle_event(log("No NVENC capable devices found"));
        assert!(monitor.acceleration_error_seen());
        monitor.begin_attempt();
        assert!(!monitor.acceleration_error_seen());
        assert_eq!(monitor.line_count(), 1);
    }
}
