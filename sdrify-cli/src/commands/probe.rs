//! Implementation of the 'probe' subcommand.

use crate::cli::ProbeArgs;
use crate::error::{CliErrorContext, CliResult};
use crate::terminal::print_info;

use sdrify_core::{CoreConfig, MediaProbe, MediaProperties, SystemToolRunner, format_duration};

/// Runs the probe command, printing either a summary or JSON.
pub fn run_probe(args: ProbeArgs, config: &CoreConfig) -> CliResult<()> {
    let probe = MediaProbe::new(SystemToolRunner, config);
    let properties = if args.light_level {
        probe.probe_with_light_level(&args.input)
    } else {
        probe.probe(&args.input)
    }
    .cli_with_context(|| format!("Probing {}", args.input.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&properties)?);
    } else {
        print_summary(&properties);
    }
    Ok(())
}

/// Prints the properties as labelled lines.
pub fn print_summary(properties: &MediaProperties) {
    print_info("Video", format!(
        "{} {}x{} @ {}",
        properties.codec_name,
        properties.width,
        properties.height,
        format_frame_rate(properties.frame_rate)
    ));
    print_info("Bit rate", format_bit_rate(properties.bit_rate));
    print_info("Duration", if properties.has_duration() {
        format_duration(properties.duration_secs)
    } else {
        "unknown".to_string()
    });
    if !properties.audio_codec.is_empty() {
        print_info("Audio", format!(
            "{} {}",
            properties.audio_codec,
            format_bit_rate(properties.audio_bit_rate)
        ));
    }
    print_info("Subtitles", properties.subtitle_streams.len());
    if let Some(light) = properties.content_light {
        print_info("Light level", format!(
            "MaxCLL {} nits, MaxFALL {} nits",
            light.max_cll, light.max_fall
        ));
    }
}

fn format_frame_rate(rate: f64) -> String {
    if rate > 0.0 {
        format!("{rate:.3} fps")
    } else {
        "unknown fps".to_string()
    }
}

/// Formats bits per second with a k/M suffix.
pub fn format_bit_rate(bits: u64) -> String {
    match bits {
        0 => "unknown".to_string(),
        b if b >= 1_000_000 => format!("{:.1} Mb/s", b as f64 / 1_000_000.0),
        b if b >= 1_000 => format!("{} kb/s", b / 1_000),
        b => format!("{b} b/s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_rate_units() {
        assert_eq!(format_bit_rate(0), "unknown");
        assert_eq!(format_bit_rate(640_000), "640 kb/s");
        assert_eq!(format_bit_rate(20_000_000), "20.0 Mb/s");
        assert_eq!(format_bit_rate(512), "512 b/s");
    }

    #[test]
    fn unknown_frame_rate() {
        assert_eq!(format_frame_rate(0.0), "unknown fps");
        assert_eq!(format_frame_rate(24.0), "24.000 fps");
    }
}
