//! Chorus onset detection.
//!
//! The chorus is taken to be the section that repeats most often. The audio
//! is reduced to a chromagram, compared with itself at every lag, and the
//! longest, most corroborated repetition line gives the onset.
//!
//! # Pipeline
//!
//! 1. Decode mono 22.05 kHz PCM with FFmpeg
//! 2. Power STFT and 12-bin chroma ([`chroma`])
//! 3. Time-time and time-lag similarity, denoised ([`similarity`])
//! 4. Line detection and scoring ([`lines`])

pub mod chroma;
pub mod lines;
pub mod similarity;

use std::path::Path;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::VideoInfo;

use chroma::Chromagram;

/// Sample rate audio is decoded at for analysis.
pub const ANALYSIS_SAMPLE_RATE: u32 = 22_050;

/// Moving average length for denoising, in seconds.
const SMOOTHING_SECS: f64 = 2.5;

/// Finds where a clip of a given length should start in a source file.
#[async_trait]
pub trait OnsetDetector: Send + Sync {
    /// Onset in seconds, or `None` when no suitable section exists.
    async fn detect_onset(
        &self,
        source: &Path,
        info: &VideoInfo,
        clip_length_secs: f64,
    ) -> MediaResult<Option<f64>>;
}

/// Chroma self-similarity chorus detector.
#[derive(Debug, Clone, Default)]
pub struct ChorusDetector;

impl ChorusDetector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OnsetDetector for ChorusDetector {
    async fn detect_onset(
        &self,
        source: &Path,
        info: &VideoInfo,
        clip_length_secs: f64,
    ) -> MediaResult<Option<f64>> {
        if !info.has_audio {
            debug!(source = %source.display(), "No audio stream to analyze");
            return Ok(None);
        }

        let samples = decode_mono(source).await?;
        let source_name = source.display().to_string();

        // Matrix work is CPU bound
        let onset = tokio::task::spawn_blocking(move || {
            find_chorus(&samples, ANALYSIS_SAMPLE_RATE, clip_length_secs)
        })
        .await
        .map_err(|e| MediaError::internal(format!("Chorus analysis failed: {}", e)))?;

        match onset {
            Some(secs) => info!(source = %source_name, onset_secs = secs, "Chorus found"),
            None => info!(source = %source_name, "No chorus found"),
        }

        Ok(onset)
    }
}

/// Decode the first audio stream as mono `f32` samples at
/// [`ANALYSIS_SAMPLE_RATE`].
pub async fn decode_mono(source: &Path) -> MediaResult<Vec<f32>> {
    let raw = NamedTempFile::new()?;

    let cmd = FfmpegCommand::new(source, raw.path())
        .output_args(["-vn", "-sn", "-dn", "-map", "0:a:0", "-ac", "1"])
        .output_args(["-ar", &ANALYSIS_SAMPLE_RATE.to_string()])
        .format("f32le");
    FfmpegRunner::new().run(&cmd).await?;

    let bytes = tokio::fs::read(raw.path()).await?;
    if bytes.len() < 4 {
        return Err(MediaError::NoAudioData(source.to_path_buf()));
    }

    // 4 bytes per sample, little-endian
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Chorus onset in seconds for mono `samples`.
pub fn find_chorus(samples: &[f32], sample_rate: u32, clip_length_secs: f64) -> Option<f64> {
    let song_secs = samples.len() as f64 / sample_rate as f64;
    if song_secs < clip_length_secs || samples.is_empty() {
        return None;
    }

    let chroma = Chromagram::from_samples(samples, sample_rate);
    find_chorus_in_chroma(&chroma, song_secs, clip_length_secs)
}

/// Chorus onset from a precomputed chromagram spanning `song_secs`.
pub fn find_chorus_in_chroma(
    chroma: &Chromagram,
    song_secs: f64,
    clip_length_secs: f64,
) -> Option<f64> {
    if chroma.len() < 3 || song_secs <= 0.0 {
        return None;
    }

    let chroma_rate = chroma.len() as f64 / song_secs;
    let smoothing = (SMOOTHING_SECS * chroma_rate) as usize;
    let clip_frames = clip_length_secs * chroma_rate;

    let time_time = similarity::time_time(chroma);
    let time_lag = similarity::time_lag(chroma);
    let denoised = similarity::denoise(&time_lag, &time_time, smoothing);
    drop(time_lag);
    drop(time_time);

    let rows = lines::candidate_rows(&denoised);
    let found = lines::detect_lines(&denoised, &rows, clip_frames);

    debug!(
        frames = chroma.len(),
        candidate_rows = rows.len(),
        lines = found.len(),
        "Chorus line detection"
    );

    let best = lines::best_line(&found, clip_frames)?;
    Some(best.start as f64 / chroma_rate)
}
