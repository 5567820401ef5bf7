//! Self-similarity matrices over a chromagram.
//!
//! The time-lag matrix is indexed `[lag][t]` and compares frame `t` with
//! frame `t - lag` (wrapping). A section that repeats after `lag` frames
//! shows up as a horizontal line in row `lag`.

use super::chroma::{Chromagram, N_CHROMA};

/// Square `n x n` matrix of `f32`, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    n: usize,
    data: Vec<f32>,
}

impl Matrix {
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    pub fn size(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.n + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self.data[row * self.n + col] = value;
    }

    pub fn row(&self, row: usize) -> &[f32] {
        &self.data[row * self.n..(row + 1) * self.n]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [f32] {
        &mut self.data[row * self.n..(row + 1) * self.n]
    }
}

/// `1 - ||a - b|| / sqrt(12)`: 1 for identical frames, 0 for opposite ones.
#[inline]
fn similarity(a: &[f32; N_CHROMA], b: &[f32; N_CHROMA]) -> f32 {
    let dist: f32 = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt();
    1.0 - dist / (N_CHROMA as f32).sqrt()
}

/// Similarity of every frame with every other frame.
pub fn time_time(chroma: &Chromagram) -> Matrix {
    let n = chroma.len();
    let mut m = Matrix::zeros(n);
    for i in 0..n {
        for j in i..n {
            let s = similarity(&chroma.frames[i], &chroma.frames[j]);
            m.set(i, j, s);
            m.set(j, i, s);
        }
    }
    m
}

/// Similarity of frame `t` with frame `t - lag`, wrapping around the song.
pub fn time_lag(chroma: &Chromagram) -> Matrix {
    let n = chroma.len();
    let mut m = Matrix::zeros(n);
    for lag in 0..n {
        for t in 0..n {
            let earlier = (t + n - lag) % n;
            m.set(lag, t, similarity(&chroma.frames[t], &chroma.frames[earlier]));
        }
    }
    m
}

/// Sum of `values[from..to]` with the range clipped to the slice.
#[inline]
fn window_sum(prefix: &[f64], from: isize, to: isize) -> f64 {
    let len = (prefix.len() - 1) as isize;
    let from = from.clamp(0, len) as usize;
    let to = to.clamp(0, len) as usize;
    if to > from {
        prefix[to] - prefix[from]
    } else {
        0.0
    }
}

fn prefix_sums(values: &[f32]) -> Vec<f64> {
    let mut prefix = Vec::with_capacity(values.len() + 1);
    prefix.push(0.0);
    let mut acc = 0.0f64;
    for v in values {
        acc += *v as f64;
        prefix.push(acc);
    }
    prefix
}

/// Suppress noise and emphasize horizontal lines in a time-lag matrix.
///
/// Every cell is compared against `smoothing`-frame moving averages in six
/// directions: left and right along its lag row, down and up across lags,
/// and along the two diagonals of the time-time matrix. Cells on a true
/// repetition are high horizontally but not in the other directions. The
/// result keeps the upper triangle (`t >= lag`), is Gaussian-smoothed along
/// time, clamped at zero, and the first five lags are cleared.
pub fn denoise(time_lag: &Matrix, time_time: &Matrix, smoothing: usize) -> Matrix {
    let n = time_lag.size();
    let s = smoothing.max(1);
    let s_i = s as isize;
    let inv = 1.0 / s as f64;

    // Diagonal averages come from the time-time matrix: for cell (lag, t)
    // with lag < t, row r = t - lag of the time-time matrix, columns ending
    // at t (lower-left) or starting at t (upper-right).
    let mut lower_left = Matrix::zeros(n);
    let mut upper_right = Matrix::zeros(n);
    for r in 1..n {
        let prefix = prefix_sums(time_time.row(r));
        for t in r..n {
            let lag = t - r;
            let t_i = t as isize;
            lower_left.set(lag, t, (window_sum(&prefix, t_i - s_i + 1, t_i + 1) * inv) as f32);
            upper_right.set(lag, t, (window_sum(&prefix, t_i, t_i + s_i) * inv) as f32);
        }
    }

    // Running column sums over the `s` rows ending at / starting at `lag`
    let mut down = vec![0.0f64; n];
    let mut up = vec![0.0f64; n];
    for row in 0..s.min(n) {
        for (acc, v) in up.iter_mut().zip(time_lag.row(row)) {
            *acc += *v as f64;
        }
    }

    let mut out = Matrix::zeros(n);
    for lag in 0..n {
        let current = time_lag.row(lag);
        for (acc, v) in down.iter_mut().zip(current) {
            *acc += *v as f64;
        }
        if lag >= s {
            for (acc, v) in down.iter_mut().zip(time_lag.row(lag - s)) {
                *acc -= *v as f64;
            }
        }
        if lag > 0 {
            for (acc, v) in up.iter_mut().zip(time_lag.row(lag - 1)) {
                *acc -= *v as f64;
            }
            if lag + s - 1 < n {
                for (acc, v) in up.iter_mut().zip(time_lag.row(lag + s - 1)) {
                    *acc += *v as f64;
                }
            }
        }

        let prefix = prefix_sums(current);
        let row = out.row_mut(lag);
        // Lower triangle is cleared after suppression
        for t in lag..n {
            let t_i = t as isize;
            let left = window_sum(&prefix, t_i - s_i + 1, t_i + 1) * inv;
            let right = window_sum(&prefix, t_i, t_i + s_i) * inv;
            let max_horizontal = left.max(right);

            let others = [
                down[t] * inv,
                up[t] * inv,
                lower_left.get(lag, t) as f64,
                upper_right.get(lag, t) as f64,
            ];
            let max_other = others.iter().copied().fold(f64::MIN, f64::max);
            let min_other = others.iter().copied().fold(f64::MAX, f64::min);

            let suppression = if max_horizontal > max_other {
                min_other
            } else {
                max_other
            };
            row[t] = (current[t] as f64 - suppression) as f32;
        }
    }

    for lag in 0..n {
        let smoothed = gaussian_filter(out.row(lag), s as f64);
        out.row_mut(lag).copy_from_slice(&smoothed);
        for v in out.row_mut(lag) {
            *v = v.max(0.0);
        }
    }
    for lag in 0..n.min(5) {
        out.row_mut(lag).fill(0.0);
    }

    out
}

/// 1-D Gaussian filter with a `4 sigma` kernel radius and half-sample
/// symmetric (reflecting) boundaries.
pub fn gaussian_filter(values: &[f32], sigma: f64) -> Vec<f32> {
    let n = values.len();
    if n == 0 || sigma <= 0.0 {
        return values.to_vec();
    }

    let radius = (4.0 * sigma + 0.5) as isize;
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|x| (-0.5 * (x as f64 / sigma).powi(2)).exp())
        .collect();
    let total: f64 = kernel.iter().sum();
    for k in kernel.iter_mut() {
        *k /= total;
    }

    let n_i = n as isize;
    let reflect = |mut i: isize| -> usize {
        // d c b a | a b c d | d c b a
        let period = 2 * n_i;
        i = i.rem_euclid(period);
        if i >= n_i {
            i = period - 1 - i;
        }
        i as usize
    };

    (0..n_i)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .map(|(k, w)| w * values[reflect(i + k as isize - radius)] as f64)
                .sum::<f64>() as f32
        })
        .collect()
}
