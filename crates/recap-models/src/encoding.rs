//! Video encoding configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "fast";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 18;
/// Default audio bitrate
pub const DEFAULT_AUDIO_BITRATE: &str = "192k";
/// Frame rate every clip is conformed to before crossfading
pub const DEFAULT_FPS: u32 = 30;
/// Audio sample rate every clip is conformed to before mixing
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Video encoding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264", "h264_nvenc")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset (e.g., "fast", "medium", "slow")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    #[serde(default = "default_crf")]
    #[validate(range(max = 51))]
    pub crf: u8,

    /// Audio codec
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Audio bitrate
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Output frame rate
    #[serde(default = "default_fps")]
    #[validate(range(min = 1, max = 120))]
    pub fps: u32,

    /// Output audio sample rate
    #[serde(default = "default_sample_rate")]
    #[validate(range(min = 8000))]
    pub sample_rate: u32,

    /// Additional FFmpeg output arguments for the final render
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_audio_bitrate() -> String {
    DEFAULT_AUDIO_BITRATE.to_string()
}
fn default_fps() -> u32 {
    DEFAULT_FPS
}
fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
            fps: DEFAULT_FPS,
            sample_rate: DEFAULT_SAMPLE_RATE,
            extra_args: Vec::new(),
        }
    }
}

impl EncodingConfig {
    /// Settings for per-clip intermediates.
    ///
    /// Intermediates are re-encoded once more by the final render, so they
    /// keep the configured codec and rates but use a faster preset and a
    /// near-lossless CRF.
    pub fn for_intermediate(&self) -> Self {
        Self {
            preset: "veryfast".to_string(),
            crf: self.crf.min(12),
            extra_args: Vec::new(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let config: EncodingConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EncodingConfig::default());
        assert_eq!(config.fps, 30);
        assert_eq!(config.sample_rate, 44_100);
    }

    #[test]
    fn test_intermediate_settings() {
        let config = EncodingConfig {
            crf: 23,
            ..Default::default()
        };
        let intermediate = config.for_intermediate();
        assert_eq!(intermediate.crf, 12);
        assert_eq!(intermediate.preset, "veryfast");
        assert_eq!(intermediate.codec, config.codec);
    }

    #[test]
    fn test_crf_out_of_range_rejected() {
        let config = EncodingConfig {
            crf: 60,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
