//! Frame compositing onto the fixed canvas.

use std::path::{Path, PathBuf};
use tracing::debug;

use recap_models::{Canvas, IntroImageOptions};

use crate::clip::ExtractedClip;
use crate::error::{MediaError, MediaResult};
use crate::filters::{fit_to_canvas, FitBox};

/// Share of the canvas a windowed (non-fullscreen) intro image fills.
const WINDOWED_IMAGE_FILL: f64 = 0.5;

/// One layer of a composite, bottom to top.
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    /// The background image stretched over the whole canvas
    Background { image: PathBuf },
    /// The clip's video, scaled and centered
    Clip { fit: FitBox },
    /// A still image over the clip for the first `duration_secs`
    Image {
        image: PathBuf,
        fit: FitBox,
        duration_secs: f64,
    },
}

/// A clip stacked on the canvas with its layers.
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    pub clip: ExtractedClip,
    pub canvas: Canvas,
    pub layers: Vec<Layer>,
}

impl Composite {
    pub fn duration(&self) -> f64 {
        self.clip.duration
    }

    pub fn overlay(&self) -> Option<&Layer> {
        self.layers.iter().find(|l| matches!(l, Layer::Image { .. }))
    }
}

/// Intro image with its pixel size.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub duration_secs: f64,
    pub fullscreen: bool,
}

impl OverlayImage {
    /// Read the image dimensions from its header.
    pub fn load(options: &IntroImageOptions) -> MediaResult<Self> {
        let path = &options.image_file;
        if !path.is_file() {
            return Err(MediaError::FileNotFound(path.clone()));
        }

        let (width, height) = image::image_dimensions(path)?;
        debug!(path = %path.display(), width, height, "Loaded intro image header");

        Ok(Self {
            path: path.clone(),
            width,
            height,
            duration_secs: options.duration_secs,
            fullscreen: options.fullscreen,
        })
    }

    fn fill(&self) -> f64 {
        if self.fullscreen {
            1.0
        } else {
            WINDOWED_IMAGE_FILL
        }
    }
}

/// Place every clip on the canvas over the background.
///
/// When `overlay` is given it is layered on the first clip only, shown for
/// at most that clip's duration.
pub fn compose_clips(
    clips: Vec<ExtractedClip>,
    canvas: Canvas,
    background: &Path,
    overlay: Option<&OverlayImage>,
) -> MediaResult<Vec<Composite>> {
    clips
        .into_iter()
        .enumerate()
        .map(|(index, clip)| {
            let intro_overlay = overlay.filter(|_| index == 0);
            compose_clip(clip, canvas, background, intro_overlay)
        })
        .collect()
}

fn compose_clip(
    clip: ExtractedClip,
    canvas: Canvas,
    background: &Path,
    overlay: Option<&OverlayImage>,
) -> MediaResult<Composite> {
    let mut layers = vec![
        Layer::Background {
            image: background.to_path_buf(),
        },
        Layer::Clip {
            fit: fit_to_canvas(clip.width, clip.height, canvas, 1.0)?,
        },
    ];

    if let Some(image) = overlay {
        layers.push(Layer::Image {
            image: image.path.clone(),
            fit: fit_to_canvas(image.width, image.height, canvas, image.fill())?,
            duration_secs: image.duration_secs.min(clip.duration),
        });
    }

    Ok(Composite {
        clip,
        canvas,
        layers,
    })
}
