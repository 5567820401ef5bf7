//! Pipeline planning tests.
//!
//! These drive range resolution, compositing, timeline assembly and caption
//! layout with a stub onset detector and hand-built probe results, so they
//! run without FFmpeg.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use recap_cli::{ClipPlan, RangeOrigin, RecapError, RecapPipeline, SourceVideo};
use recap_media::{
    assemble, compose_clips, ExtractedClip, Layer, MediaResult, OnsetDetector, OverlayImage,
    Placement, VideoInfo,
};
use recap_models::{
    CaptionLines, Canvas, ClipSelectionMethod, RecapOptions, SheetRow, CROSSFADE_PADDING_SECS,
};

/// Onsets keyed by source file name; unknown files have no chorus.
#[derive(Default)]
struct StubDetector {
    onsets: HashMap<String, f64>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl OnsetDetector for StubDetector {
    async fn detect_onset(
        &self,
        source: &Path,
        _info: &VideoInfo,
        _clip_length_secs: f64,
    ) -> MediaResult<Option<f64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(self.onsets.get(&name).copied())
    }
}

fn row(sheet_row: u32, filename: &str, start: Option<&str>, end: Option<&str>, caption: &str) -> SheetRow {
    let first = (!caption.is_empty()).then(|| caption.to_string());
    SheetRow {
        sheet_row,
        filename: filename.to_string(),
        start: start.map(str::to_string),
        end: end.map(str::to_string),
        captions: CaptionLines::new([first, None, None]),
    }
}

fn source(row: SheetRow, duration: f64) -> SourceVideo {
    SourceVideo {
        path: PathBuf::from("Videos").join(&row.filename),
        row,
        info: VideoInfo {
            duration,
            width: 1920,
            height: 1080,
            fps: 30.0,
            codec: "h264".to_string(),
            has_audio: true,
        },
    }
}

fn pipeline(options: RecapOptions, onsets: &[(&str, f64)]) -> (RecapPipeline, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let detector = StubDetector {
        onsets: onsets.iter().map(|(f, s)| (f.to_string(), *s)).collect(),
        calls: calls.clone(),
    };
    (RecapPipeline::with_detector(options, Box::new(detector)), calls)
}

/// Stand-in for extraction: one intermediate per plan with the planned length.
fn extracted(plans: &[ClipPlan]) -> Vec<ExtractedClip> {
    plans
        .iter()
        .enumerate()
        .map(|(i, plan)| ExtractedClip {
            path: PathBuf::from(format!("/work/clip_{:03}.mp4", i + 1)),
            source: plan.source.path.clone(),
            width: plan.source.info.width,
            height: plan.source.info.height,
            duration: plan.range.duration(),
        })
        .collect()
}

fn manual_options() -> RecapOptions {
    RecapOptions {
        clip_selection_method: ClipSelectionMethod::Manual,
        ..Default::default()
    }
}

/// A single manual row yields a 10 s clip, a [1, 9) caption and a 10 s recap.
#[tokio::test]
async fn test_single_manual_row() {
    let (pipeline, _) = pipeline(manual_options(), &[]);
    let sources = vec![source(
        row(2, "a.mp4", Some("00:00:10"), Some("00:00:20"), "Line1"),
        60.0,
    )];

    let plans = pipeline.resolve_clip_ranges(sources).await.unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].range.duration(), 10.0);

    let clips = extracted(&plans);
    let windows = pipeline.plan_captions(&plans, &clips).unwrap();
    assert_eq!(windows.len(), 1);
    assert_eq!((windows[0].start, windows[0].end), (1, 9));
    assert_eq!(windows[0].text, "Line1");

    let composites = compose_clips(clips, Canvas::FULL_HD, Path::new("black.jpg"), None).unwrap();
    let timeline = assemble(composites, CROSSFADE_PADDING_SECS).unwrap();
    assert_eq!(timeline.duration, 10.0);
}

/// Three manual rows give three bottom captions and a sum(d) - 2p timeline.
#[tokio::test]
async fn test_three_manual_rows() {
    let (pipeline, calls) = pipeline(manual_options(), &[]);
    let sources = vec![
        source(row(2, "a.mp4", Some("0:10"), Some("0:20"), "First"), 60.0),
        source(row(3, "b.mp4", Some("01:00"), Some("01:12.5"), "Second"), 120.0),
        source(row(4, "c.mp4", Some("5"), Some("20"), "Third"), 30.0),
    ];

    let plans = pipeline.resolve_clip_ranges(sources).await.unwrap();
    let durations: Vec<f64> = plans.iter().map(|p| p.range.duration()).collect();
    assert_eq!(durations, vec![10.0, 12.5, 15.0]);
    assert!(plans.iter().all(|p| p.origin == RangeOrigin::Manual));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let clips = extracted(&plans);
    let windows = pipeline.plan_captions(&plans, &clips).unwrap();
    assert_eq!(windows.len(), 3);
    assert!(windows.iter().all(|w| !w.is_intro()));
    for pair in windows.windows(2) {
        assert!(pair[0].end <= pair[1].start);
    }

    let composites = compose_clips(clips, Canvas::FULL_HD, Path::new("black.jpg"), None).unwrap();
    let timeline = assemble(composites, CROSSFADE_PADDING_SECS).unwrap();
    assert!((timeline.duration - (37.5 - 2.0)).abs() < 1e-9);
}

/// Rows without a chorus are all reported at once after every row is checked.
#[tokio::test]
async fn test_missing_choruses_reported_together() {
    let (pipeline, calls) = pipeline(RecapOptions::default(), &[("b.mp4", 30.0)]);
    let sources = vec![
        source(row(2, "a.mp4", None, None, ""), 180.0),
        source(row(3, "b.mp4", None, None, ""), 180.0),
        source(row(4, "c.mp4", None, None, ""), 180.0),
    ];

    match pipeline.resolve_clip_ranges(sources).await {
        Err(RecapError::ChorusNotFound { files }) => {
            assert_eq!(files, vec!["a.mp4".to_string(), "c.mp4".to_string()]);
        }
        other => panic!("expected ChorusNotFound, got {:?}", other.map(|p| p.len())),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

/// A failed chorus search aborts before anything is written.
#[tokio::test]
async fn test_no_chorus_produces_no_output() {
    let dir = tempfile::TempDir::new().unwrap();
    let output = dir.path().join("recap.mp4");
    let options = RecapOptions {
        output_file: output.clone(),
        clip_length: 15,
        ..Default::default()
    };
    let (pipeline, _) = pipeline(options, &[]);

    let result = pipeline
        .resolve_clip_ranges(vec![source(row(2, "a.mp4", None, None, "x"), 200.0)])
        .await;

    assert!(matches!(result, Err(RecapError::ChorusNotFound { .. })));
    assert!(!output.exists());
}

/// Manual times override detection per row in auto mode.
#[tokio::test]
async fn test_manual_times_win_in_auto_mode() {
    let (pipeline, calls) = pipeline(RecapOptions::default(), &[("b.mp4", 42.0)]);
    let sources = vec![
        source(row(2, "a.mp4", Some("00:00:05"), Some("00:00:11"), ""), 60.0),
        source(row(3, "b.mp4", None, None, ""), 180.0),
    ];

    let plans = pipeline.resolve_clip_ranges(sources).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    assert_eq!(plans[0].origin, RangeOrigin::Manual);
    assert_eq!(plans[0].range.duration(), 6.0);

    assert_eq!(plans[1].origin, RangeOrigin::Chorus);
    assert_eq!((plans[1].range.start_secs, plans[1].range.end_secs), (42.0, 57.0));
}

/// Detected clips running past the source end are shortened.
#[tokio::test]
async fn test_auto_range_clamped_to_source() {
    let (pipeline, _) = pipeline(RecapOptions::default(), &[("a.mp4", 50.0)]);
    let plans = pipeline
        .resolve_clip_ranges(vec![source(row(2, "a.mp4", None, None, ""), 60.0)])
        .await
        .unwrap();
    assert_eq!(plans[0].range.end_secs, 60.0);
}

/// Manual mode needs both times on every row.
#[tokio::test]
async fn test_manual_mode_requires_times() {
    let (pipeline, _) = pipeline(manual_options(), &[]);
    let result = pipeline
        .resolve_clip_ranges(vec![
            source(row(2, "a.mp4", Some("0:10"), Some("0:20"), ""), 60.0),
            source(row(3, "b.mp4", Some("0:10"), None, ""), 60.0),
        ])
        .await;
    assert!(matches!(result, Err(RecapError::ManualTimesMissing { row: 3 })));
}

/// Bad manual times name the sheet row.
#[tokio::test]
async fn test_invalid_manual_times_rejected() {
    let (pipeline, _) = pipeline(manual_options(), &[]);

    let result = pipeline
        .resolve_clip_ranges(vec![source(row(5, "a.mp4", Some("0:20"), Some("0:10"), ""), 60.0)])
        .await;
    assert!(matches!(result, Err(RecapError::Timestamp { row: 5, .. })));

    // End beyond the source duration
    let result = pipeline
        .resolve_clip_ranges(vec![source(row(6, "a.mp4", Some("0:10"), Some("2:00"), ""), 60.0)])
        .await;
    assert!(matches!(result, Err(RecapError::Timestamp { row: 6, .. })));
}

/// The intro clip carries a fullscreen overlay and a centered caption.
#[tokio::test]
async fn test_intro_with_fullscreen_overlay() {
    let options = RecapOptions {
        include_intro: true,
        use_overlay_intro_image: true,
        ..manual_options()
    };
    let (pipeline, _) = pipeline(options, &[]);
    let plans = pipeline
        .resolve_clip_ranges(vec![
            source(row(2, "intro.mp4", Some("0:00"), Some("0:15"), "Summer 2024"), 60.0),
            source(row(3, "a.mp4", Some("0:30"), Some("0:45"), "Song"), 60.0),
        ])
        .await
        .unwrap();

    let clips = extracted(&plans);
    let windows = pipeline.plan_captions(&plans, &clips).unwrap();
    assert_eq!(windows[0].placement, Placement::Center);
    assert_eq!((windows[0].start, windows[0].end), (1, 14));
    assert!(!windows[1].is_intro());

    let overlay = OverlayImage {
        path: PathBuf::from("intro.png"),
        width: 1280,
        height: 720,
        duration_secs: 10.0,
        fullscreen: true,
    };
    let composites =
        compose_clips(clips, Canvas::FULL_HD, Path::new("black.jpg"), Some(&overlay)).unwrap();

    let intro = &composites[0];
    assert_eq!(intro.layers.len(), 3);
    assert!(matches!(intro.layers[0], Layer::Background { .. }));
    assert!(matches!(intro.layers[1], Layer::Clip { .. }));
    match &intro.layers[2] {
        Layer::Image { fit, .. } => assert_eq!((fit.width, fit.height), (1920, 1080)),
        other => panic!("expected overlay layer, got {:?}", other),
    }
    assert_eq!(composites[1].layers.len(), 2);
}

/// Invalid options are rejected before any media work.
#[tokio::test]
async fn test_run_rejects_missing_assets() {
    let options = RecapOptions {
        background_image_file: PathBuf::from("/nonexistent/black.jpg"),
        ..Default::default()
    };
    let (pipeline, calls) = pipeline(options, &[]);

    let result = pipeline.run().await;
    assert!(matches!(result, Err(RecapError::Options(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
