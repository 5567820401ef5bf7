//! Caption windows and drawtext rendering.
//!
//! Clip `i` on the timeline gets a caption from whole second
//! `floor(S_i) + p` to `floor(S_{i+1})`, where `S_i = sum(d_j - p for j < i)`.
//! The window starts after the clip's crossfade-in and ends before the next
//! clip's, so consecutive windows are separated by the padding.

use std::path::Path;

use recap_models::{SubtitleAlignment, TextStyle};

use crate::error::{MediaError, MediaResult};
use crate::filters::escape_filter_path;

/// Horizontal margin for bottom captions, in pixels.
pub const CAPTION_MARGIN_X: u32 = 10;
/// Vertical margin for bottom captions, in pixels.
pub const CAPTION_MARGIN_Y: u32 = 20;

/// Where a caption is anchored on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Bottom edge, at the configured horizontal alignment
    Bottom(SubtitleAlignment),
    /// Canvas center (intro caption)
    Center,
}

/// A caption shown from `start` (inclusive) to `end` (exclusive), in seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionWindow {
    pub start: u64,
    pub end: u64,
    pub text: String,
    pub placement: Placement,
}

impl CaptionWindow {
    pub fn is_intro(&self) -> bool {
        self.placement == Placement::Center
    }
}

/// Compute caption windows for clips in timeline order.
///
/// `texts[i]` is the caption for the clip with duration `durations[i]`;
/// rows and clips are paired by position. With `intro`, the first clip's
/// caption is centered and spans `[p, floor(d_0 - p))`. Empty captions
/// produce no window.
pub fn caption_windows(
    texts: &[String],
    durations: &[f64],
    padding: f64,
    intro: bool,
    alignment: SubtitleAlignment,
) -> MediaResult<Vec<CaptionWindow>> {
    if texts.len() != durations.len() {
        return Err(MediaError::CaptionCountMismatch {
            captions: texts.len(),
            clips: durations.len(),
        });
    }

    let mut windows = Vec::with_capacity(texts.len());
    let mut elapsed = 0.0f64;

    for (index, (text, duration)) in texts.iter().zip(durations).enumerate() {
        let (start, end, placement) = if intro && index == 0 {
            (
                padding as u64,
                (duration - padding).max(0.0) as u64,
                Placement::Center,
            )
        } else {
            (
                (elapsed.floor() + padding) as u64,
                (elapsed + duration - padding).max(0.0) as u64,
                Placement::Bottom(alignment),
            )
        };
        elapsed += duration - padding;

        if text.is_empty() || end <= start {
            continue;
        }

        windows.push(CaptionWindow {
            start,
            end,
            text: text.clone(),
            placement,
        });
    }

    Ok(windows)
}

/// `drawtext` filter showing `window` in `style`, reading its text from
/// `text_file`.
pub fn drawtext_filter(window: &CaptionWindow, style: &TextStyle, text_file: &Path) -> String {
    let (x, y) = match window.placement {
        Placement::Center => ("(w-text_w)/2".to_string(), "(h-text_h)/2".to_string()),
        Placement::Bottom(alignment) => {
            let x = match alignment {
                SubtitleAlignment::Left => CAPTION_MARGIN_X.to_string(),
                SubtitleAlignment::Center => "(w-text_w)/2".to_string(),
                SubtitleAlignment::Right => format!("w-text_w-{}", CAPTION_MARGIN_X),
            };
            (x, format!("h-text_h-{}", CAPTION_MARGIN_Y))
        }
    };

    format!(
        "drawtext=fontfile={font}:textfile={text}:expansion=none:\
         fontsize={size}:fontcolor={color}:borderw={stroke}:bordercolor={stroke_color}:\
         x={x}:y={y}:enable='gte(t,{start})*lt(t,{end})'",
        font = escape_filter_path(&style.font_file.to_string_lossy()),
        text = escape_filter_path(&text_file.to_string_lossy()),
        size = style.font_size,
        color = style.color,
        stroke = style.stroke_width,
        stroke_color = style.stroke_color,
        x = x,
        y = y,
        start = window.start,
        end = window.end,
    )
}
