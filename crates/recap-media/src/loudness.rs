//! Peak audio normalization.
//!
//! A `volumedetect` pass measures the loudest sample in the clip range; the
//! extraction pass then applies the gain that brings that peak to 0 dBFS.

use std::path::Path;
use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Peaks at or below this level are treated as silence and left alone.
pub const SILENCE_FLOOR_DB: f64 = -90.0;

/// Gains smaller than this are not worth an extra filter.
const MIN_GAIN_DB: f64 = 0.05;

/// Measure the peak level of `[start, start + duration)` in dBFS.
///
/// Returns `None` when FFmpeg reports no level, which happens for ranges
/// without decodable audio.
pub async fn measure_peak_db(input: &Path, start: f64, duration: f64) -> MediaResult<Option<f64>> {
    let cmd = FfmpegCommand::new(input, "-")
        .seek(start)
        .duration(duration)
        .output_args(["-vn", "-sn", "-dn"])
        .audio_filter("volumedetect")
        .format("null")
        .log_level("info");

    let output = FfmpegRunner::new().run(&cmd).await?;
    let peak = parse_max_volume(&output.log);

    debug!(
        input = %input.display(),
        start_secs = start,
        duration_secs = duration,
        peak_db = ?peak,
        "Measured clip peak"
    );

    Ok(peak)
}

/// Extract `max_volume` from `volumedetect` log lines.
///
/// ```text
/// [Parsed_volumedetect_0 @ 0x5581c0a4c8c0] max_volume: -3.2 dB
/// ```
pub fn parse_max_volume<S: AsRef<str>>(lines: &[S]) -> Option<f64> {
    lines.iter().rev().find_map(|line| {
        let (_, rest) = line.as_ref().split_once("max_volume:")?;
        let value = rest.trim().trim_end_matches("dB").trim();
        match value {
            "-inf" => Some(f64::NEG_INFINITY),
            _ => value.parse().ok(),
        }
    })
}

/// Gain in dB that brings `peak_db` to 0 dBFS, or `None` when no change applies.
pub fn normalization_gain_db(peak_db: f64) -> Option<f64> {
    if peak_db.is_nan() || peak_db <= SILENCE_FLOOR_DB {
        return None;
    }

    let gain = -peak_db;
    (gain.abs() >= MIN_GAIN_DB).then_some(gain)
}

/// `volume` filter for a gain in dB.
pub fn volume_filter(gain_db: f64) -> String {
    format!("volume={:.2}dB", gain_db)
}
