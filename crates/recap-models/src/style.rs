//! Clip selection modes and caption styling.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// How each row's clip range is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClipSelectionMethod {
    /// Chorus detection, unless the row carries manual times
    #[default]
    Auto,
    /// Start and end times from the spreadsheet for every row
    Manual,
}

impl ClipSelectionMethod {
    pub const ALL: &'static [ClipSelectionMethod] =
        &[ClipSelectionMethod::Auto, ClipSelectionMethod::Manual];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClipSelectionMethod::Auto => "auto",
            ClipSelectionMethod::Manual => "manual",
        }
    }
}

impl fmt::Display for ClipSelectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ClipSelectionMethod {
    type Err = SelectionMethodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(ClipSelectionMethod::Auto),
            "manual" => Ok(ClipSelectionMethod::Manual),
            _ => Err(SelectionMethodParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown clip selection method: {0} (expected auto or manual)")]
pub struct SelectionMethodParseError(String);

/// Horizontal anchor for bottom captions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleAlignment {
    #[default]
    Left,
    Center,
    Right,
}

impl SubtitleAlignment {
    pub const ALL: &'static [SubtitleAlignment] = &[
        SubtitleAlignment::Left,
        SubtitleAlignment::Center,
        SubtitleAlignment::Right,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubtitleAlignment::Left => "left",
            SubtitleAlignment::Center => "center",
            SubtitleAlignment::Right => "right",
        }
    }
}

impl fmt::Display for SubtitleAlignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SubtitleAlignment {
    type Err = AlignmentParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "left" => Ok(SubtitleAlignment::Left),
            "center" => Ok(SubtitleAlignment::Center),
            "right" => Ok(SubtitleAlignment::Right),
            _ => Err(AlignmentParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown subtitle alignment: {0} (expected left, center or right)")]
pub struct AlignmentParseError(String);

/// Font and stroke settings for one kind of caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TextStyle {
    /// TrueType/OpenType font file
    pub font_file: PathBuf,
    /// Font size in pixels
    pub font_size: u32,
    /// Text color (name or hex)
    pub color: String,
    /// Outline color (name or hex)
    pub stroke_color: String,
    /// Outline thickness in pixels
    pub stroke_width: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_round_trip_names() {
        for alignment in SubtitleAlignment::ALL {
            assert_eq!(alignment.as_str().parse::<SubtitleAlignment>().unwrap(), *alignment);
        }
        assert_eq!(" Center ".parse::<SubtitleAlignment>().unwrap(), SubtitleAlignment::Center);
    }

    #[test]
    fn test_invalid_alignment_rejected() {
        assert!("middle".parse::<SubtitleAlignment>().is_err());
        let parsed: Result<SubtitleAlignment, _> = serde_json::from_str("\"top\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_selection_method_parse() {
        assert_eq!("MANUAL".parse::<ClipSelectionMethod>().unwrap(), ClipSelectionMethod::Manual);
        assert!("chorus".parse::<ClipSelectionMethod>().is_err());
    }
}
