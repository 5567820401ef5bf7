//! Recap options document.
//!
//! Every key is optional; a missing key takes the default listed on the
//! field. The document is validated once, before any media work starts.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::encoding::EncodingConfig;
use crate::style::{ClipSelectionMethod, SubtitleAlignment, TextStyle};

/// Options for one recap run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(default, deny_unknown_fields)]
#[validate(schema(function = "validate_intro_image_duration"))]
pub struct RecapOptions {
    /// Spreadsheet listing the source videos (xlsx, xls or ods)
    pub video_data_file: PathBuf,
    /// Directory containing the source videos
    pub video_directory: PathBuf,
    /// Where the rendered recap is written
    pub output_file: PathBuf,

    /// Chorus detection (`auto`) or spreadsheet times (`manual`)
    pub clip_selection_method: ClipSelectionMethod,
    /// Clip length in seconds for automatically selected clips
    #[validate(range(min = 1))]
    pub clip_length: u32,

    /// Horizontal anchor of bottom captions
    pub sub_alignment: SubtitleAlignment,
    pub sub_font_file: PathBuf,
    #[validate(range(min = 1))]
    pub sub_font_size: u32,
    pub sub_text_color: String,
    pub sub_stroke_color: String,
    pub sub_stroke_width: u32,

    /// Treat the first clip as an intro with a large centered caption
    pub include_intro: bool,
    /// Overlay an image over the first clip
    pub use_overlay_intro_image: bool,
    pub intro_image_file: PathBuf,
    /// Seconds the intro image stays on screen
    pub intro_image_duration: u32,
    /// Scale the intro image to fill the canvas instead of half of it
    pub make_intro_image_fullscreen: bool,
    pub intro_font_file: PathBuf,
    #[validate(range(min = 1))]
    pub intro_font_size: u32,
    pub intro_text_color: String,
    pub intro_stroke_color: String,
    pub intro_stroke_width: u32,

    /// Black 1920x1080 image placed beneath every clip
    pub background_image_file: PathBuf,

    #[validate(nested)]
    pub encoding: EncodingConfig,
}

impl Default for RecapOptions {
    fn default() -> Self {
        Self {
            video_data_file: PathBuf::from("video_data.xlsx"),
            video_directory: PathBuf::from("Videos"),
            output_file: PathBuf::from("recap.mp4"),
            clip_selection_method: ClipSelectionMethod::Auto,
            clip_length: 15,
            sub_alignment: SubtitleAlignment::Left,
            sub_font_file: PathBuf::from("Fonts/LiberationSans-Regular.ttf"),
            sub_font_size: 50,
            sub_text_color: "white".to_string(),
            sub_stroke_color: "black".to_string(),
            sub_stroke_width: 3,
            include_intro: false,
            use_overlay_intro_image: false,
            intro_image_file: PathBuf::from("intro.png"),
            intro_image_duration: 10,
            make_intro_image_fullscreen: true,
            intro_font_file: PathBuf::from("Fonts/LiberationSans-Bold.ttf"),
            intro_font_size: 150,
            intro_text_color: "white".to_string(),
            intro_stroke_color: "black".to_string(),
            intro_stroke_width: 3,
            background_image_file: PathBuf::from("1920x1080-black.jpg"),
            encoding: EncodingConfig::default(),
        }
    }
}

fn validate_intro_image_duration(options: &RecapOptions) -> Result<(), ValidationError> {
    if !options.use_overlay_intro_image {
        return Ok(());
    }

    if options.intro_image_duration == 0 || options.intro_image_duration > options.clip_length {
        let mut error = ValidationError::new("intro_image_duration");
        error.message = Some(Cow::Owned(format!(
            "intro_image_duration must be between 1 and clip_length ({}), got {}",
            options.clip_length, options.intro_image_duration
        )));
        return Err(error);
    }

    Ok(())
}

/// Intro image overlay settings, present only when the overlay is enabled.
#[derive(Debug, Clone, PartialEq)]
pub struct IntroImageOptions {
    pub image_file: PathBuf,
    pub duration_secs: f64,
    pub fullscreen: bool,
}

impl RecapOptions {
    /// Style for per-clip captions.
    pub fn subtitle_style(&self) -> TextStyle {
        TextStyle {
            font_file: self.sub_font_file.clone(),
            font_size: self.sub_font_size,
            color: self.sub_text_color.clone(),
            stroke_color: self.sub_stroke_color.clone(),
            stroke_width: self.sub_stroke_width,
        }
    }

    /// Style for the intro caption.
    pub fn intro_style(&self) -> TextStyle {
        TextStyle {
            font_file: self.intro_font_file.clone(),
            font_size: self.intro_font_size,
            color: self.intro_text_color.clone(),
            stroke_color: self.intro_stroke_color.clone(),
            stroke_width: self.intro_stroke_width,
        }
    }

    pub fn intro_image(&self) -> Option<IntroImageOptions> {
        self.use_overlay_intro_image.then(|| IntroImageOptions {
            image_file: self.intro_image_file.clone(),
            duration_secs: self.intro_image_duration as f64,
            fullscreen: self.make_intro_image_fullscreen,
        })
    }

    /// Files the run reads besides the spreadsheet and source videos.
    pub fn required_assets(&self) -> Vec<(&'static str, &Path)> {
        let mut assets = vec![
            ("Background image", self.background_image_file.as_path()),
            ("Subtitle font", self.sub_font_file.as_path()),
        ];
        if self.include_intro {
            assets.push(("Intro font", self.intro_font_file.as_path()));
        }
        if self.use_overlay_intro_image {
            assets.push(("Intro image", self.intro_image_file.as_path()));
        }
        assets
    }

    /// Validate field ranges, then check that every asset exists.
    pub fn validate_all(&self) -> Result<(), OptionsError> {
        self.validate()?;

        let missing: Vec<MissingAsset> = self
            .required_assets()
            .into_iter()
            .filter(|(_, path)| !path.is_file())
            .map(|(kind, path)| MissingAsset {
                kind,
                path: path.to_path_buf(),
            })
            .collect();

        if !missing.is_empty() {
            return Err(OptionsError::MissingAssets(missing));
        }

        Ok(())
    }
}

/// An asset file referenced by the options that doesn't exist.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingAsset {
    pub kind: &'static str,
    pub path: PathBuf,
}

impl std::fmt::Display for MissingAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.kind, self.path.display())
    }
}

/// Errors from options validation.
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("Invalid options: {0}")]
    Invalid(#[from] ValidationErrors),

    #[error("Missing asset files: {}", format_missing(.0))]
    MissingAssets(Vec<MissingAsset>),
}

fn format_missing(missing: &[MissingAsset]) -> String {
    missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn options_with_assets(dir: &TempDir) -> RecapOptions {
        let touch = |name: &str| {
            let path = dir.path().join(name);
            std::fs::write(&path, b"x").unwrap();
            path
        };
        RecapOptions {
            background_image_file: touch("black.jpg"),
            sub_font_file: touch("regular.ttf"),
            intro_font_file: touch("bold.ttf"),
            intro_image_file: touch("intro.png"),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let options: RecapOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, RecapOptions::default());
        assert_eq!(options.clip_length, 15);
        assert_eq!(options.sub_alignment, SubtitleAlignment::Left);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let parsed: Result<RecapOptions, _> = serde_json::from_str(r#"{"clip_lenght": 10}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_zero_clip_length_rejected() {
        let options = RecapOptions {
            clip_length: 0,
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_overlay_duration_exceeding_clip_length_rejected() {
        let options = RecapOptions {
            use_overlay_intro_image: true,
            clip_length: 8,
            intro_image_duration: 10,
            ..Default::default()
        };
        assert!(options.validate().is_err());

        // Only checked when the overlay is in use
        let options = RecapOptions {
            use_overlay_intro_image: false,
            ..options
        };
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_missing_assets_reported_together() {
        let options = RecapOptions {
            include_intro: true,
            background_image_file: PathBuf::from("/nonexistent/black.jpg"),
            sub_font_file: PathBuf::from("/nonexistent/regular.ttf"),
            intro_font_file: PathBuf::from("/nonexistent/bold.ttf"),
            ..Default::default()
        };
        match options.validate_all() {
            Err(OptionsError::MissingAssets(missing)) => assert_eq!(missing.len(), 3),
            other => panic!("expected missing assets, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_all_passes_with_assets() {
        let dir = TempDir::new().unwrap();
        let options = RecapOptions {
            include_intro: true,
            use_overlay_intro_image: true,
            ..options_with_assets(&dir)
        };
        assert!(options.validate_all().is_ok());
        let intro = options.intro_image().unwrap();
        assert_eq!(intro.duration_secs, 10.0);
        assert!(intro.fullscreen);
    }

    #[test]
    fn test_text_styles() {
        let options = RecapOptions::default();
        assert_eq!(options.subtitle_style().font_size, 50);
        assert_eq!(options.intro_style().font_size, 150);
        assert!(options.intro_image().is_none());
    }
}
