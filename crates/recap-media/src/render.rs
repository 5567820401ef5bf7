//! Single-pass recap renderer.
//!
//! The whole timeline compiles to one FFmpeg filter graph:
//!
//! ```text
//! per entry k:
//!   [bg]  scale canvas ─┐
//!   [clip:v] scale fit ─┴ overlay ─ (overlay image) ─ fps,format ─ fade ─ [v{k}]
//!   [clip:a] afade in/out ─ adelay start_k ─ [a{k}]
//!
//! [v0][v1] xfade ... [vcat] ─ drawtext... ─ [vout]
//! [a0][a1] ... amix normalize=0 ─ [aout]
//! ```

use std::cell::Cell;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use recap_models::{EncodingConfig, TextStyle};

use crate::captions::{drawtext_filter, CaptionWindow};
use crate::command::{FfmpegCommand, FfmpegRunner, InputSpec};
use crate::compositor::Layer;
use crate::error::{MediaError, MediaResult};
use crate::filters::secs;
use crate::fs_utils::{ensure_parent_dir, move_file, partial_path, remove_partial};
use crate::timeline::{Timeline, TimelineEntry};

/// Graph label of the final video stream.
const VIDEO_OUT: &str = "vout";
/// Graph label of the final audio stream.
const AUDIO_OUT: &str = "aout";

/// Text styles for bottom captions and the intro caption.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionStyles {
    pub subtitle: TextStyle,
    pub intro: TextStyle,
}

impl CaptionStyles {
    pub fn style_for(&self, window: &CaptionWindow) -> &TextStyle {
        if window.is_intro() {
            &self.intro
        } else {
            &self.subtitle
        }
    }
}

/// A caption window with the file holding its text.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionOverlay {
    pub window: CaptionWindow,
    pub text_file: PathBuf,
}

/// FFmpeg inputs and filter graph for a whole timeline.
#[derive(Debug, Clone)]
pub struct RenderGraph {
    pub inputs: Vec<InputSpec>,
    pub filter_complex: String,
    /// Expected output duration in seconds
    pub duration: f64,
}

/// Compile `timeline` and its captions into a filter graph.
pub fn build_render_graph(
    timeline: &Timeline,
    captions: &[CaptionOverlay],
    styles: &CaptionStyles,
    encoding: &EncodingConfig,
) -> MediaResult<RenderGraph> {
    if timeline.entries.is_empty() {
        return Err(MediaError::EmptyTimeline);
    }

    let mut inputs = Vec::new();
    let mut chains = Vec::new();

    for (k, entry) in timeline.entries.iter().enumerate() {
        entry_chains(k, entry, timeline.padding, encoding, &mut inputs, &mut chains)?;
    }

    chains.extend(crossfade_chains(timeline));
    chains.push(caption_chain(captions, styles));
    chains.push(mix_chain(timeline.entries.len()));

    Ok(RenderGraph {
        inputs,
        filter_complex: chains.join(";"),
        duration: timeline.duration,
    })
}

/// Inputs and filter chains producing `[v{k}]` and `[a{k}]` for one entry.
fn entry_chains(
    k: usize,
    entry: &TimelineEntry,
    padding: f64,
    encoding: &EncodingConfig,
    inputs: &mut Vec<InputSpec>,
    chains: &mut Vec<String>,
) -> MediaResult<()> {
    let composite = &entry.composite;
    let duration = entry.duration();
    let canvas = composite.canvas;

    let mut base: Option<String> = None;
    let mut clip_input = None;

    for (layer_index, layer) in composite.layers.iter().enumerate() {
        let input = inputs.len();
        match layer {
            Layer::Background { image } => {
                inputs.push(InputSpec::looped_image(image, encoding.fps, duration));
                let label = format!("bg{}", k);
                chains.push(format!(
                    "[{}:v]scale={}:{},setsar=1[{}]",
                    input, canvas.width, canvas.height, label
                ));
                base = Some(label);
            }
            Layer::Clip { fit } => {
                inputs.push(InputSpec::file(&composite.clip.path));
                clip_input = Some(input);
                let label = format!("clip{}", k);
                chains.push(format!("[{}:v]{},setsar=1[{}]", input, fit.scale_filter(), label));
                base = Some(stack(chains, k, layer_index, base, label, &fit.overlay_position(), "shortest=1")?);
            }
            Layer::Image {
                image,
                fit,
                duration_secs,
            } => {
                inputs.push(InputSpec::looped_image(image, encoding.fps, *duration_secs));
                let label = format!("img{}", k);
                chains.push(format!("[{}:v]{},setsar=1[{}]", input, fit.scale_filter(), label));
                base = Some(stack(
                    chains,
                    k,
                    layer_index,
                    base,
                    label,
                    &fit.overlay_position(),
                    "eof_action=pass",
                )?);
            }
        }
    }

    let base = base.ok_or_else(|| MediaError::internal(format!("Timeline entry {} has no layers", k)))?;
    let clip_input =
        clip_input.ok_or_else(|| MediaError::internal(format!("Timeline entry {} has no clip layer", k)))?;

    let fade_out_at = secs(duration - padding);
    let p = secs(padding);

    let mut video = format!("[{}]fps={},format=yuv420p,settb=AVTB", base, encoding.fps);
    if entry.fades.video_in {
        video.push_str(&format!(",fade=t=in:st=0:d={}", p));
    }
    if entry.fades.video_out {
        video.push_str(&format!(",fade=t=out:st={}:d={}", fade_out_at, p));
    }
    video.push_str(&format!("[v{}]", k));
    chains.push(video);

    let mut audio = format!(
        "[{}:a]aresample={},aformat=channel_layouts=stereo",
        clip_input, encoding.sample_rate
    );
    if entry.fades.audio_in {
        audio.push_str(&format!(",afade=t=in:st=0:d={}", p));
    }
    if entry.fades.audio_out {
        audio.push_str(&format!(",afade=t=out:st={}:d={}", fade_out_at, p));
    }
    let delay_ms = (entry.start * 1000.0).round() as u64;
    audio.push_str(&format!(",adelay={}:all=1[a{}]", delay_ms, k));
    chains.push(audio);

    Ok(())
}

/// Overlay `top` on `base`, returning the new base label.
fn stack(
    chains: &mut Vec<String>,
    k: usize,
    layer_index: usize,
    base: Option<String>,
    top: String,
    position: &str,
    options: &str,
) -> MediaResult<String> {
    let base = base.ok_or_else(|| {
        MediaError::internal(format!("Timeline entry {} has no layer under {}", k, top))
    })?;
    let label = format!("layer{}_{}", k, layer_index);
    chains.push(format!("[{}][{}]overlay={}:{}[{}]", base, top, position, options, label));
    Ok(label)
}

/// Chained `xfade` transitions into `[vcat]`.
fn crossfade_chains(timeline: &Timeline) -> Vec<String> {
    let entries = &timeline.entries;
    if entries.len() == 1 {
        return vec!["[v0]null[vcat]".to_string()];
    }

    let mut chains = Vec::with_capacity(entries.len() - 1);
    let mut previous = "v0".to_string();
    for (k, entry) in entries.iter().enumerate().skip(1) {
        let out = if k == entries.len() - 1 {
            "vcat".to_string()
        } else {
            format!("x{}", k)
        };
        chains.push(format!(
            "[{}][v{}]xfade=transition=fade:duration={}:offset={}[{}]",
            previous,
            k,
            secs(timeline.padding),
            secs(entry.start),
            out
        ));
        previous = out;
    }
    chains
}

/// `drawtext` filters over the crossfaded video into `[vout]`.
fn caption_chain(captions: &[CaptionOverlay], styles: &CaptionStyles) -> String {
    if captions.is_empty() {
        return format!("[vcat]null[{}]", VIDEO_OUT);
    }

    let filters: Vec<String> = captions
        .iter()
        .map(|c| drawtext_filter(&c.window, styles.style_for(&c.window), &c.text_file))
        .collect();
    format!("[vcat]{}[{}]", filters.join(","), VIDEO_OUT)
}

/// Unnormalized mix of every delayed entry audio into `[aout]`.
fn mix_chain(count: usize) -> String {
    let labels: String = (0..count).map(|k| format!("[a{}]", k)).collect();
    format!(
        "{}amix=inputs={}:duration=longest:normalize=0[{}]",
        labels, count, AUDIO_OUT
    )
}

/// Caption text file for the window at `index` (0-based).
pub fn caption_text_path(work_dir: &Path, index: usize) -> PathBuf {
    work_dir.join(format!("caption_{:03}.txt", index + 1))
}

/// Write caption texts into `work_dir` and pair them with their windows.
pub async fn write_caption_files(
    windows: &[CaptionWindow],
    work_dir: &Path,
) -> MediaResult<Vec<CaptionOverlay>> {
    let mut overlays = Vec::with_capacity(windows.len());
    for (index, window) in windows.iter().enumerate() {
        let text_file = caption_text_path(work_dir, index);
        fs::write(&text_file, window.text.as_bytes()).await?;
        overlays.push(CaptionOverlay {
            window: window.clone(),
            text_file,
        });
    }
    Ok(overlays)
}

/// Render `timeline` with `captions` to `output`.
///
/// FFmpeg writes to a sibling partial file which replaces `output` only
/// after a successful encode. Returns the output path.
pub async fn render(
    timeline: &Timeline,
    captions: &[CaptionWindow],
    styles: &CaptionStyles,
    encoding: &EncodingConfig,
    work_dir: &Path,
    output: &Path,
) -> MediaResult<PathBuf> {
    let overlays = write_caption_files(captions, work_dir).await?;
    let graph = build_render_graph(timeline, &overlays, styles, encoding)?;
    debug!(filter_complex = %graph.filter_complex, "Built render graph");

    ensure_parent_dir(output).await?;
    let partial = partial_path(output);

    let mut cmd = FfmpegCommand::with_inputs(graph.inputs, &partial)
        .filter_complex(graph.filter_complex)
        .map(format!("[{}]", VIDEO_OUT))
        .map(format!("[{}]", AUDIO_OUT))
        .video_codec(&encoding.codec)
        .preset(&encoding.preset)
        .crf(encoding.crf)
        .output_args(["-pix_fmt", "yuv420p", "-r", &encoding.fps.to_string()])
        .audio_codec(&encoding.audio_codec)
        .audio_bitrate(&encoding.audio_bitrate)
        .output_args(["-ar", &encoding.sample_rate.to_string()]);

    if is_mp4_family(output) {
        cmd = cmd.output_args(["-movflags", "+faststart"]);
    }

    let cmd = cmd
        .output_args(encoding.extra_args.iter().cloned())
        .output_duration(graph.duration);

    info!(
        output = %output.display(),
        clips = timeline.entries.len(),
        captions = captions.len(),
        duration_secs = graph.duration,
        "Rendering recap"
    );

    let total_ms = (graph.duration * 1000.0) as i64;
    let logged_tenths = Cell::new(0u32);
    let result = FfmpegRunner::new()
        .run_with_progress(&cmd, move |progress| {
            let tenths = progress.completed_tenths(total_ms);
            if tenths > logged_tenths.get() {
                logged_tenths.set(tenths);
                info!(
                    percent = tenths * 10,
                    eta_secs = ?progress.eta_seconds(total_ms),
                    "Render progress"
                );
            }
        })
        .await;

    if let Err(e) = result {
        remove_partial(&partial).await;
        return Err(e);
    }

    if let Err(e) = move_file(&partial, output).await {
        remove_partial(&partial).await;
        return Err(e);
    }

    info!(output = %output.display(), "Recap rendered");
    Ok(output.to_path_buf())
}

fn is_mp4_family(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_ascii_lowercase();
            matches!(ext.as_str(), "mp4" | "m4v" | "mov")
        })
        .unwrap_or(false)
}
