//! Shared data models for the recap generator.
//!
//! This crate provides Serde-serializable types for:
//! - The options document and its validation
//! - Spreadsheet rows and caption lines
//! - Caption styling and clip selection modes
//! - Encoding configuration and canvas geometry
//! - Timestamp parsing

pub mod canvas;
pub mod encoding;
pub mod options;
pub mod row;
pub mod style;
pub mod timestamp;

// Re-export common types
pub use canvas::{Canvas, CROSSFADE_PADDING_SECS};
pub use encoding::EncodingConfig;
pub use options::{IntroImageOptions, OptionsError, RecapOptions};
pub use row::{CaptionLines, SheetRow};
pub use style::{ClipSelectionMethod, SubtitleAlignment, TextStyle};
pub use timestamp::{format_seconds, parse_timestamp, TimestampError};
