//! Clip extraction.
//!
//! Each spreadsheet row becomes one intermediate file in the run's work
//! directory: the requested range re-encoded at the render frame rate, with
//! audio peak-normalized and a silent track added when the source has none.
//! Later stages read only these intermediates, never the sources.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use recap_models::timestamp::TimeRange;
use recap_models::EncodingConfig;

use crate::command::{FfmpegCommand, FfmpegRunner, InputSpec};
use crate::error::MediaResult;
use crate::loudness::{measure_peak_db, normalization_gain_db, volume_filter};
use crate::probe::VideoInfo;

/// A trimmed, normalized intermediate clip.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedClip {
    /// Intermediate file in the work directory
    pub path: PathBuf,
    /// Source video the clip was cut from
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Requested range length in seconds
    pub duration: f64,
}

/// Cut `range` out of `source` into `output`.
///
/// `info` is the probe result for `source`. The returned duration is the
/// requested range length, which is also enforced on the output with `-t`.
pub async fn extract_clip(
    source: &Path,
    info: &VideoInfo,
    range: TimeRange,
    output: &Path,
    encoding: &EncodingConfig,
) -> MediaResult<ExtractedClip> {
    let duration = range.duration();
    let intermediate = encoding.for_intermediate();

    let gain = if info.has_audio {
        measure_peak_db(source, range.start_secs, duration)
            .await?
            .and_then(normalization_gain_db)
    } else {
        warn!(
            source = %source.display(),
            "Source has no audio stream, adding a silent track"
        );
        None
    };

    let mut cmd = FfmpegCommand::new(source, output)
        .seek(range.start_secs)
        .duration(duration);

    if info.has_audio {
        cmd = cmd.map("0:v:0").map("0:a:0");
        if let Some(gain_db) = gain {
            cmd = cmd.audio_filter(volume_filter(gain_db));
        }
    } else {
        cmd = cmd
            .input(InputSpec::lavfi(silent_audio_source(encoding.sample_rate)))
            .duration(duration)
            .map("0:v:0")
            .map("1:a:0");
    }

    let cmd = cmd
        .video_filter(format!("fps={},format=yuv420p", encoding.fps))
        .video_codec(&intermediate.codec)
        .preset(&intermediate.preset)
        .crf(intermediate.crf)
        .audio_codec(&intermediate.audio_codec)
        .audio_bitrate(&intermediate.audio_bitrate)
        .output_args(["-ar", &encoding.sample_rate.to_string(), "-ac", "2"])
        .output_duration(duration);

    FfmpegRunner::new().run(&cmd).await?;

    info!(
        source = %source.display(),
        output = %output.display(),
        start_secs = range.start_secs,
        duration_secs = duration,
        gain_db = ?gain,
        "Clip extracted"
    );

    Ok(ExtractedClip {
        path: output.to_path_buf(),
        source: source.to_path_buf(),
        width: info.width,
        height: info.height,
        duration,
    })
}

/// Stereo silence at the render sample rate.
fn silent_audio_source(sample_rate: u32) -> String {
    format!("anullsrc=channel_layout=stereo:sample_rate={}", sample_rate)
}

/// Intermediate file name for the clip at `index` (0-based).
pub fn intermediate_path(work_dir: &Path, index: usize) -> PathBuf {
    work_dir.join(format!("clip_{:03}.mp4", index + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_audio_source() {
        assert_eq!(
            silent_audio_source(44_100),
            "anullsrc=channel_layout=stereo:sample_rate=44100"
        );
    }

    #[test]
    fn test_intermediate_path_is_one_based() {
        let path = intermediate_path(Path::new("/tmp/work"), 0);
        assert_eq!(path, PathBuf::from("/tmp/work/clip_001.mp4"));
    }
}
