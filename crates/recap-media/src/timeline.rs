//! Crossfaded timeline assembly.
//!
//! Composites are laid end to end, each overlapping the previous one's tail
//! by the padding. Entry `k` starts at `sum(d_j - p for j < k)` and the
//! whole timeline lasts `sum(d) - (n - 1) * p`.

use tracing::debug;

use crate::compositor::Composite;
use crate::error::{MediaError, MediaResult};

/// Fades applied to one timeline entry, each lasting the padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Fades {
    /// Video fades in from black at the entry's start
    pub video_in: bool,
    /// Video cross-fades in over the previous entry
    pub video_crossfade_in: bool,
    /// Video fades out to black at the entry's end
    pub video_out: bool,
    pub audio_in: bool,
    pub audio_out: bool,
}

/// A composite placed on the timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub composite: Composite,
    /// Absolute start offset in seconds
    pub start: f64,
    pub fades: Fades,
}

impl TimelineEntry {
    pub fn duration(&self) -> f64 {
        self.composite.duration()
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration()
    }
}

/// The flattened recap.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub entries: Vec<TimelineEntry>,
    /// Crossfade overlap in seconds
    pub padding: f64,
    /// Total duration in seconds
    pub duration: f64,
}

/// Arrange composites in order with crossfades of `padding` seconds.
pub fn assemble(composites: Vec<Composite>, padding: f64) -> MediaResult<Timeline> {
    if composites.is_empty() {
        return Err(MediaError::EmptyTimeline);
    }

    if let Some((index, short)) = composites
        .iter()
        .enumerate()
        .find(|(_, c)| c.duration() <= padding)
    {
        return Err(MediaError::ClipTooShort {
            index,
            duration: short.duration(),
            padding,
        });
    }

    let last = composites.len() - 1;
    let mut cursor = 0.0f64;
    let mut entries = Vec::with_capacity(composites.len());

    for (index, composite) in composites.into_iter().enumerate() {
        let fades = Fades {
            video_in: index == 0,
            video_crossfade_in: index > 0,
            video_out: index == last,
            audio_in: true,
            audio_out: true,
        };

        let start = cursor;
        cursor += composite.duration() - padding;

        debug!(index, start_secs = start, duration_secs = composite.duration(), "Placed clip on timeline");
        entries.push(TimelineEntry {
            composite,
            start,
            fades,
        });
    }

    // The cursor stops one padding short of the last entry's end
    let duration = cursor + padding;

    Ok(Timeline {
        entries,
        padding,
        duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::ExtractedClip;
    use recap_models::Canvas;
    use std::path::PathBuf;

    fn composite(duration: f64) -> Composite {
        Composite {
            clip: ExtractedClip {
                path: PathBuf::from("clip.mp4"),
                source: PathBuf::from("source.mp4"),
                width: 1920,
                height: 1080,
                duration,
            },
            canvas: Canvas::FULL_HD,
            layers: Vec::new(),
        }
    }

    #[test]
    fn test_start_offsets_follow_cursor() {
        let durations = [10.0, 15.0, 12.5, 8.0];
        let timeline = assemble(durations.iter().map(|d| composite(*d)).collect(), 1.0).unwrap();

        for (k, entry) in timeline.entries.iter().enumerate() {
            let expected: f64 = durations[..k].iter().map(|d| d - 1.0).sum();
            assert!((entry.start - expected).abs() < 1e-9, "entry {}", k);
        }
        // Consecutive entries overlap by exactly the padding
        for pair in timeline.entries.windows(2) {
            assert!((pair[0].end() - pair[1].start - 1.0).abs() < 1e-9);
        }

        let total: f64 = durations.iter().sum::<f64>() - 3.0;
        assert!((timeline.duration - total).abs() < 1e-9);
    }

    #[test]
    fn test_fades() {
        let timeline = assemble(vec![composite(10.0), composite(10.0), composite(10.0)], 1.0).unwrap();
        let fades: Vec<Fades> = timeline.entries.iter().map(|e| e.fades).collect();

        assert!(fades[0].video_in && !fades[0].video_crossfade_in && !fades[0].video_out);
        assert!(!fades[1].video_in && fades[1].video_crossfade_in && !fades[1].video_out);
        assert!(fades[2].video_crossfade_in && fades[2].video_out);
        assert!(fades.iter().all(|f| f.audio_in && f.audio_out));
    }

    #[test]
    fn test_single_clip_fades_in_and_out() {
        let timeline = assemble(vec![composite(10.0)], 1.0).unwrap();
        assert_eq!(timeline.duration, 10.0);
        let fades = timeline.entries[0].fades;
        assert!(fades.video_in && fades.video_out && !fades.video_crossfade_in);
    }

    #[test]
    fn test_empty_and_short_clips_rejected() {
        assert!(matches!(assemble(Vec::new(), 1.0), Err(MediaError::EmptyTimeline)));
        assert!(matches!(
            assemble(vec![composite(10.0), composite(1.0)], 1.0),
            Err(MediaError::ClipTooShort { index: 1, .. })
        ));
    }
}
