//! Repetition lines in a denoised time-lag matrix.

use super::similarity::Matrix;

/// Starting detection threshold.
pub const LINE_THRESHOLD: f32 = 0.15;
/// Threshold decrement per retry.
const THRESHOLD_STEP: f32 = 0.01;
/// Detection stops lowering the threshold once this many lines are found.
pub const MIN_LINES: usize = 10;
/// Share of the clip length two lines may differ by and still overlap.
pub const OVERLAP_MARGIN: f64 = 0.2;

/// A run of high similarity in lag row `lag`, frames `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub start: usize,
    pub end: usize,
    pub lag: usize,
}

impl Line {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Start of the earlier occurrence this line repeats.
    fn earlier_start(&self) -> f64 {
        self.start as f64 - self.lag as f64
    }

    fn earlier_end(&self) -> f64 {
        self.end as f64 - self.lag as f64
    }
}

/// Lag rows whose mean value is a strict local maximum.
///
/// Row `lag` has `n - lag` cells in the upper triangle, so its sum is
/// divided by that count.
pub fn candidate_rows(matrix: &Matrix) -> Vec<usize> {
    let n = matrix.size();
    let means: Vec<f64> = (0..n)
        .map(|lag| {
            let sum: f64 = matrix.row(lag).iter().map(|v| *v as f64).sum();
            sum / (n - lag) as f64
        })
        .collect();

    (1..n.saturating_sub(1))
        .filter(|&i| means[i] > means[i - 1] && means[i] > means[i + 1])
        .collect()
}

/// Runs above `threshold` longer than `min_length` frames in the candidate
/// rows. A run only counts once the row dips back below the threshold, so a
/// run still open at the end of the song is dropped. Rows with a lag shorter
/// than `min_length` are ignored, since a repetition of the clip cannot start
/// that soon.
pub fn detect_lines_at(
    matrix: &Matrix,
    rows: &[usize],
    threshold: f32,
    min_length: f64,
) -> Vec<Line> {
    let n = matrix.size();
    let mut lines = Vec::new();

    for &lag in rows {
        if (lag as f64) < min_length {
            continue;
        }

        let row = matrix.row(lag);
        let mut start: Option<usize> = None;
        for t in lag..n {
            if row[t] > threshold {
                start.get_or_insert(t);
            } else if let Some(s) = start.take() {
                if (t - s) as f64 > min_length {
                    lines.push(Line { start: s, end: t, lag });
                }
            }
        }
    }

    lines
}

/// Detect lines, lowering the threshold until at least [`MIN_LINES`] are
/// found or the threshold is exhausted.
pub fn detect_lines(matrix: &Matrix, rows: &[usize], min_length: f64) -> Vec<Line> {
    let mut threshold = LINE_THRESHOLD;
    let mut lines = Vec::new();

    while lines.len() < MIN_LINES && threshold > 0.0 {
        lines = detect_lines_at(matrix, rows, threshold, min_length);
        threshold -= THRESHOLD_STEP;
    }

    lines
}

/// Score each line by how many other lines cover the same section, either
/// directly above/below it (same frames) or diagonally (both lines repeat
/// the same earlier frames).
pub fn score_lines(lines: &[Line], min_length: f64) -> Vec<usize> {
    let margin = OVERLAP_MARGIN * min_length;

    lines
        .iter()
        .map(|a| {
            lines
                .iter()
                .filter(|b| {
                    let far_apart = (b.lag as f64 - a.lag as f64).abs() > min_length;
                    let vertical = (b.start as f64) < a.start as f64 + margin
                        && (b.end as f64) > a.end as f64 - margin;
                    let diagonal = b.earlier_start() < a.earlier_start() + margin
                        && b.earlier_end() > a.earlier_end() - margin;
                    far_apart && (vertical || diagonal)
                })
                .count()
        })
        .collect()
}

/// The highest scoring line, ties broken by length, then by position.
pub fn best_line(lines: &[Line], min_length: f64) -> Option<Line> {
    let scores = score_lines(lines, min_length);
    lines
        .iter()
        .zip(scores)
        .enumerate()
        // Earlier lines win exact ties
        .max_by(|(ia, (a, sa)), (ib, (b, sb))| {
            sa.cmp(sb).then(a.len().cmp(&b.len())).then(ib.cmp(ia))
        })
        .map(|(_, (line, _))| *line)
}
