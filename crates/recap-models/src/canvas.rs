//! Output canvas geometry and timeline constants.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Overlap between adjacent clips, in seconds.
pub const CROSSFADE_PADDING_SECS: f64 = 1.0;

/// Fixed-size output canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    /// Full HD landscape (1920x1080), the only canvas the recap renders to.
    pub const FULL_HD: Canvas = Canvas {
        width: 1920,
        height: 1080,
    };

    /// Width divided by height.
    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// FFmpeg size string (`WxH`).
    pub fn as_size(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::FULL_HD
    }
}
