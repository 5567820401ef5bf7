//! Recap pipeline orchestration.
//!
//! Stages run strictly in order: read the sheet, probe sources, resolve
//! every clip range, extract, compose, assemble the timeline, lay out
//! captions and render. Range resolution finishes for every row before any
//! extraction starts, so a run that will abort produces no media work.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{info, warn};

use recap_media::clip::intermediate_path;
use recap_media::{
    assemble, caption_windows, check_ffmpeg, check_ffprobe, compose_clips, extract_clip,
    probe_video, render, CaptionStyles, CaptionWindow, ChorusDetector, ExtractedClip,
    OnsetDetector, OverlayImage, VideoInfo,
};
use recap_models::timestamp::{validate_timestamps, TimeRange};
use recap_models::{Canvas, ClipSelectionMethod, RecapOptions, SheetRow, CROSSFADE_PADDING_SECS};

use crate::error::{RecapError, RecapResult};
use crate::logging::StageLogger;

/// A spreadsheet row with its probed source video.
#[derive(Debug, Clone)]
pub struct SourceVideo {
    pub row: SheetRow,
    pub path: PathBuf,
    pub info: VideoInfo,
}

/// How a clip range was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOrigin {
    Manual,
    Chorus,
}

/// The range to cut from one source.
#[derive(Debug, Clone)]
pub struct ClipPlan {
    pub source: SourceVideo,
    pub range: TimeRange,
    pub origin: RangeOrigin,
}

/// Runs one recap from validated options.
pub struct RecapPipeline {
    options: RecapOptions,
    detector: Box<dyn OnsetDetector>,
}

impl RecapPipeline {
    /// Pipeline using the chroma chorus detector.
    pub fn new(options: RecapOptions) -> Self {
        Self::with_detector(options, Box::new(ChorusDetector::new()))
    }

    pub fn with_detector(options: RecapOptions, detector: Box<dyn OnsetDetector>) -> Self {
        Self { options, detector }
    }

    pub fn options(&self) -> &RecapOptions {
        &self.options
    }

    /// Run every stage and return the rendered output path.
    pub async fn run(&self) -> RecapResult<PathBuf> {
        self.options.validate_all()?;

        let stage = StageLogger::start("read_sheet", "Importing data from spreadsheet");
        let rows = recap_sheet::read_rows(&self.options.video_data_file)?;
        stage.complete(&format!("{} rows", rows.len()));

        check_ffmpeg()?;
        check_ffprobe()?;

        let stage = StageLogger::start("resolve_ranges", "Choosing clip ranges");
        let sources = self.probe_sources(rows).await?;
        let plans = self.resolve_clip_ranges(sources).await?;
        stage.complete(&format!("{} clips planned", plans.len()));

        let work_dir = TempDir::new()?;
        info!(work_dir = %work_dir.path().display(), "Created work directory");

        let clips = self.extract_clips(&plans, work_dir.path()).await?;
        let windows = self.plan_captions(&plans, &clips)?;

        let stage = StageLogger::start("compose", "Resizing clips");
        let overlay = self.load_overlay()?;
        let composites = compose_clips(
            clips,
            Canvas::FULL_HD,
            &self.options.background_image_file,
            overlay.as_ref(),
        )?;
        stage.complete(&format!("{} composites", composites.len()));

        let stage = StageLogger::start("assemble", "Adding crossfades");
        let timeline = assemble(composites, CROSSFADE_PADDING_SECS)?;
        stage.complete(&format!("{:.3}s timeline", timeline.duration));

        let stage = StageLogger::start("render", "Saving recap");
        let styles = CaptionStyles {
            subtitle: self.options.subtitle_style(),
            intro: self.options.intro_style(),
        };
        let output = render(
            &timeline,
            &windows,
            &styles,
            &self.options.encoding,
            work_dir.path(),
            &self.options.output_file,
        )
        .await?;
        stage.complete(&output.display().to_string());

        Ok(output)
    }

    /// Probe every row's source video. A missing source aborts the run.
    pub async fn probe_sources(&self, rows: Vec<SheetRow>) -> RecapResult<Vec<SourceVideo>> {
        let mut sources = Vec::with_capacity(rows.len());
        for row in rows {
            let path = self.options.video_directory.join(&row.filename);
            let info = probe_video(&path).await?;
            sources.push(SourceVideo { row, path, info });
        }
        Ok(sources)
    }

    /// Choose the clip range for every source.
    ///
    /// Manual times win whenever a row has both. In auto mode the remaining
    /// rows go through onset detection; rows without an onset are collected
    /// and reported together once every row has been checked.
    pub async fn resolve_clip_ranges(&self, sources: Vec<SourceVideo>) -> RecapResult<Vec<ClipPlan>> {
        let clip_length = self.options.clip_length as f64;
        let mut plans = Vec::with_capacity(sources.len());
        let mut missing = Vec::new();

        for source in sources {
            if let Some((start, end)) = source.row.manual_times() {
                let range = validate_timestamps(start, end, Some(source.info.duration)).map_err(
                    |e| RecapError::Timestamp {
                        row: source.row.sheet_row,
                        filename: source.row.filename.clone(),
                        source: e,
                    },
                )?;
                plans.push(ClipPlan {
                    source,
                    range,
                    origin: RangeOrigin::Manual,
                });
                continue;
            }

            if self.options.clip_selection_method == ClipSelectionMethod::Manual {
                return Err(RecapError::ManualTimesMissing {
                    row: source.row.sheet_row,
                });
            }

            if source.row.start.is_some() || source.row.end.is_some() {
                warn!(
                    row = source.row.sheet_row,
                    filename = %source.row.filename,
                    "Row has only one manual time, detecting the chorus instead"
                );
            }

            info!(filename = %source.row.filename, "Detecting chorus");
            match self
                .detector
                .detect_onset(&source.path, &source.info, clip_length)
                .await?
            {
                Some(onset) => {
                    let range = auto_range(onset, clip_length, source.info.duration);
                    if range.duration() < clip_length {
                        warn!(
                            filename = %source.row.filename,
                            onset_secs = onset,
                            clip_secs = range.duration(),
                            "Clip runs past the end of the source, shortened"
                        );
                    }
                    plans.push(ClipPlan {
                        source,
                        range,
                        origin: RangeOrigin::Chorus,
                    });
                }
                None => {
                    warn!(filename = %source.row.filename, "No chorus found, choose this clip manually");
                    missing.push(source.row.filename.clone());
                }
            }
        }

        if !missing.is_empty() {
            return Err(RecapError::ChorusNotFound { files: missing });
        }

        Ok(plans)
    }

    /// Cut every planned range into the work directory.
    pub async fn extract_clips(
        &self,
        plans: &[ClipPlan],
        work_dir: &Path,
    ) -> RecapResult<Vec<ExtractedClip>> {
        let stage = StageLogger::start("extract_clips", "Extracting clips");
        let mut clips = Vec::with_capacity(plans.len());

        for (index, plan) in plans.iter().enumerate() {
            stage.progress(&format!("Extracting clip {} of {}", index + 1, plans.len()));
            let clip = extract_clip(
                &plan.source.path,
                &plan.source.info,
                plan.range,
                &intermediate_path(work_dir, index),
                &self.options.encoding,
            )
            .await?;
            clips.push(clip);
        }

        stage.complete(&format!("{} clips", clips.len()));
        Ok(clips)
    }

    /// Caption windows for the planned rows over the extracted clips.
    pub fn plan_captions(
        &self,
        plans: &[ClipPlan],
        clips: &[ExtractedClip],
    ) -> RecapResult<Vec<CaptionWindow>> {
        if plans.len() != clips.len() {
            return Err(RecapError::RowClipMismatch {
                rows: plans.len(),
                clips: clips.len(),
            });
        }

        let stage = StageLogger::start("captions", "Generating captions");
        let texts: Vec<String> = plans.iter().map(|p| p.source.row.captions.text()).collect();
        let durations: Vec<f64> = clips.iter().map(|c| c.duration).collect();

        let windows = caption_windows(
            &texts,
            &durations,
            CROSSFADE_PADDING_SECS,
            self.options.include_intro,
            self.options.sub_alignment,
        )?;
        stage.complete(&format!("{} captions", windows.len()));
        Ok(windows)
    }

    /// The intro overlay image, when enabled.
    pub fn load_overlay(&self) -> RecapResult<Option<OverlayImage>> {
        let Some(intro_image) = self.options.intro_image() else {
            return Ok(None);
        };

        if !self.options.include_intro {
            warn!("use_overlay_intro_image is set without include_intro, overlaying the first clip");
        }

        Ok(Some(OverlayImage::load(&intro_image)?))
    }
}

/// `[onset, onset + clip_length)`, cut short at the end of the source.
fn auto_range(onset: f64, clip_length: f64, source_duration: f64) -> TimeRange {
    let start_secs = onset.max(0.0);
    let end_secs = (start_secs + clip_length).min(source_duration);
    TimeRange { start_secs, end_secs }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_range_within_source() {
        let range = auto_range(42.0, 15.0, 200.0);
        assert_eq!((range.start_secs, range.end_secs), (42.0, 57.0));
    }

    #[test]
    fn test_auto_range_clamped_to_source_end() {
        let range = auto_range(190.0, 15.0, 200.0);
        assert_eq!(range.end_secs, 200.0);
        assert_eq!(range.duration(), 10.0);
    }
}
