#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper and media stages for recap rendering.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with multiple inputs
//! - Progress parsing from `-progress pipe:2`
//! - Clip extraction with peak audio normalization
//! - Chorus onset detection from chroma self-similarity
//! - Canvas compositing, crossfade timeline and caption windows
//! - A single-pass renderer that flattens everything into one filter graph

pub mod captions;
pub mod chorus;
pub mod clip;
pub mod command;
pub mod compositor;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod loudness;
pub mod probe;
pub mod progress;
pub mod render;
pub mod timeline;

pub use captions::{caption_windows, drawtext_filter, CaptionWindow, Placement};
pub use chorus::{ChorusDetector, OnsetDetector};
pub use clip::{extract_clip, ExtractedClip};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegOutput, FfmpegRunner, InputSpec};
pub use compositor::{compose_clips, Composite, Layer, OverlayImage};
pub use error::{MediaError, MediaResult};
pub use filters::{fit_to_canvas, FitBox};
pub use probe::{probe_video, VideoInfo};
pub use progress::{FfmpegProgress, ProgressCallback};
pub use fs_utils::{move_file, partial_path};
pub use render::{build_render_graph, render, CaptionOverlay, CaptionStyles, RenderGraph};
pub use timeline::{assemble, Fades, Timeline, TimelineEntry};
