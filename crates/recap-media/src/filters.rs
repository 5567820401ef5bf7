//! Canvas fitting and FFmpeg filter fragments.

use recap_models::Canvas;

use crate::error::{MediaError, MediaResult};

/// Scaled size and centered position of content on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitBox {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

impl FitBox {
    /// `scale` filter for this box.
    pub fn scale_filter(&self) -> String {
        format!("scale={}:{}", self.width, self.height)
    }

    /// `overlay` position arguments for this box.
    pub fn overlay_position(&self) -> String {
        format!("x={}:y={}", self.x, self.y)
    }
}

/// Fit content into `fill` of the canvas while keeping its aspect ratio.
///
/// Content no wider than the canvas aspect is scaled to the box height
/// (pillarbox bars left and right), wider content to the box width
/// (letterbox bars above and below). Clips use `fill = 1.0`; intro images
/// use `1.0` for fullscreen and `0.5` otherwise. Dimensions are rounded to
/// even pixels for yuv420p and never exceed the box.
pub fn fit_to_canvas(
    content_width: u32,
    content_height: u32,
    canvas: Canvas,
    fill: f64,
) -> MediaResult<FitBox> {
    if content_width == 0 || content_height == 0 {
        return Err(MediaError::invalid_video(format!(
            "Cannot fit {}x{} content onto the canvas",
            content_width, content_height
        )));
    }
    if !(fill > 0.0 && fill <= 1.0) {
        return Err(MediaError::internal(format!("Invalid canvas fill {}", fill)));
    }

    let box_width = floor_even(canvas.width as f64 * fill);
    let box_height = floor_even(canvas.height as f64 * fill);
    let aspect = content_width as f64 / content_height as f64;

    let (width, height) = if aspect <= canvas.aspect() {
        let height = round_even(canvas.height as f64 * fill).min(box_height);
        (round_even(height as f64 * aspect).min(box_width), height)
    } else {
        let width = round_even(canvas.width as f64 * fill).min(box_width);
        (width, round_even(width as f64 / aspect).min(box_height))
    };

    Ok(FitBox {
        width,
        height,
        x: (canvas.width - width) / 2,
        y: (canvas.height - height) / 2,
    })
}

fn round_even(value: f64) -> u32 {
    (((value / 2.0).round() as u32) * 2).max(2)
}

fn floor_even(value: f64) -> u32 {
    (((value / 2.0).floor() as u32) * 2).max(2)
}

/// Escape a value for the filter option parser (`key=value:key=value`).
pub fn escape_option_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace(':', "\\:")
}

/// Escape filter arguments for the filtergraph parser inside `-filter_complex`.
pub fn escape_graph_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '\'' | '[' | ']' | ',' | ';') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Escape a path used as an option value in a `-filter_complex` graph.
/// Both parsers strip one level of escaping.
pub fn escape_filter_path(path: &str) -> String {
    escape_graph_value(&escape_option_value(path))
}

/// Seconds formatted for filter arguments.
pub fn secs(value: f64) -> String {
    format!("{:.3}", value)
}
