//! Chromagram from a power STFT.

use std::f32::consts::PI;

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// FFT window length in samples.
pub const N_FFT: usize = 16_384;
/// Hop between frames (a quarter window).
pub const HOP_LENGTH: usize = N_FFT / 4;
/// Pitch classes per octave.
pub const N_CHROMA: usize = 12;

/// Octave the weighting bump is centered on.
const CENTER_OCTAVE: f64 = 5.0;
/// Width of the octave weighting bump, in octaves.
const OCTAVE_WIDTH: f64 = 2.0;
/// A4 in Hz.
const A440: f64 = 440.0;

/// Per-frame 12-bin pitch class profiles, each normalized to a maximum of 1.
#[derive(Debug, Clone)]
pub struct Chromagram {
    pub frames: Vec<[f32; N_CHROMA]>,
}

impl Chromagram {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Compute the chromagram of mono samples at `sample_rate`.
    pub fn from_samples(samples: &[f32], sample_rate: u32) -> Self {
        let filterbank = chroma_filterbank(sample_rate, N_FFT);
        let spectrum = power_spectrogram(samples);

        let frames = spectrum
            .iter()
            .map(|power| {
                let mut chroma = [0.0f32; N_CHROMA];
                for (c, weights) in filterbank.iter().enumerate() {
                    chroma[c] = weights.iter().zip(power).map(|(w, p)| w * p).sum();
                }
                normalize_max(&mut chroma);
                chroma
            })
            .collect();

        Self { frames }
    }
}

/// Scale so the largest bin is 1. All-zero frames stay zero.
fn normalize_max(chroma: &mut [f32; N_CHROMA]) {
    let max = chroma.iter().fold(0.0f32, |m, v| m.max(v.abs()));
    if max > f32::MIN_POSITIVE {
        for v in chroma.iter_mut() {
            *v /= max;
        }
    }
}

/// Periodic Hann window.
fn hann_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f32 / len as f32).cos())
        .collect()
}

/// Centered power STFT: frames are zero-padded by half a window on both sides.
/// Returns `1 + len / HOP_LENGTH` frames of `N_FFT / 2 + 1` bins.
pub(crate) fn power_spectrogram(samples: &[f32]) -> Vec<Vec<f32>> {
    if samples.is_empty() {
        return Vec::new();
    }

    let window = hann_window(N_FFT);
    let fft = FftPlanner::<f32>::new().plan_fft_forward(N_FFT);
    let pad = N_FFT / 2;
    let n_frames = 1 + samples.len() / HOP_LENGTH;
    let n_bins = N_FFT / 2 + 1;

    let mut buffer = vec![Complex::new(0.0f32, 0.0); N_FFT];
    let mut frames = Vec::with_capacity(n_frames);

    for frame in 0..n_frames {
        let offset = frame * HOP_LENGTH;
        for (i, slot) in buffer.iter_mut().enumerate() {
            // Position in the unpadded signal
            let sample = (offset + i)
                .checked_sub(pad)
                .and_then(|idx| samples.get(idx))
                .copied()
                .unwrap_or(0.0);
            *slot = Complex::new(sample * window[i], 0.0);
        }

        fft.process(&mut buffer);
        frames.push(buffer[..n_bins].iter().map(|c| c.norm_sqr()).collect());
    }

    frames
}

/// Log-frequency chroma filterbank: `N_CHROMA` rows of `n_fft / 2 + 1` weights.
///
/// Each FFT bin contributes a Gaussian bump around its fractional pitch
/// class, columns are L2-normalized, then weighted by a Gaussian over
/// octaves. Row 0 is C.
pub(crate) fn chroma_filterbank(sample_rate: u32, n_fft: usize) -> Vec<Vec<f32>> {
    let n_chroma = N_CHROMA as f64;
    let n_bins = n_fft / 2 + 1;

    // Fractional chroma bin of every FFT bin, in semitones above A0 / 16
    let mut frqbins: Vec<f64> = (1..n_fft)
        .map(|k| {
            let freq = k as f64 * sample_rate as f64 / n_fft as f64;
            n_chroma * (freq / (A440 / 16.0)).log2()
        })
        .collect();
    // 0 Hz sits 1.5 octaves below the first bin
    frqbins.insert(0, frqbins[0] - 1.5 * n_chroma);

    let binwidths: Vec<f64> = (0..n_fft)
        .map(|k| {
            if k + 1 < n_fft {
                (frqbins[k + 1] - frqbins[k]).max(1.0)
            } else {
                1.0
            }
        })
        .collect();

    let half = (n_chroma / 2.0).round();
    let mut weights = vec![vec![0.0f64; n_bins]; N_CHROMA];

    for k in 0..n_bins {
        let mut norm = 0.0f64;
        for (c, row) in weights.iter_mut().enumerate() {
            let d = (frqbins[k] - c as f64 + half + 10.0 * n_chroma).rem_euclid(n_chroma) - half;
            let w = (-0.5 * (2.0 * d / binwidths[k]).powi(2)).exp();
            row[k] = w;
            norm += w * w;
        }

        let norm = norm.sqrt();
        let octave_weight =
            (-0.5 * ((frqbins[k] / n_chroma - CENTER_OCTAVE) / OCTAVE_WIDTH).powi(2)).exp();
        for row in weights.iter_mut() {
            if norm > 0.0 {
                row[k] /= norm;
            }
            row[k] *= octave_weight;
        }
    }

    // Start the pitch classes at C instead of A
    weights.rotate_left(3);

    weights
        .into_iter()
        .map(|row| row.into_iter().map(|w| w as f32).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 22_050;

    fn sine(freq: f32, secs: f32) -> Vec<f32> {
        let n = (SR as f32 * secs) as usize;
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / SR as f32).sin())
            .collect()
    }

    fn dominant_class(chroma: &[f32; N_CHROMA]) -> usize {
        chroma
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap()
    }

    #[test]
    fn test_frame_count() {
        let samples = vec![0.0f32; HOP_LENGTH * 10 + 7];
        let spectrum = power_spectrogram(&samples);
        assert_eq!(spectrum.len(), 11);
        assert_eq!(spectrum[0].len(), N_FFT / 2 + 1);
    }

    #[test]
    fn test_filterbank_shape() {
        let fb = chroma_filterbank(SR, N_FFT);
        assert_eq!(fb.len(), N_CHROMA);
        assert!(fb.iter().all(|row| row.len() == N_FFT / 2 + 1));
        assert!(fb.iter().flatten().all(|w| w.is_finite() && *w >= 0.0));
    }

    #[test]
    fn test_a440_maps_to_a() {
        let chroma = Chromagram::from_samples(&sine(440.0, 3.0), SR);
        let middle = &chroma.frames[chroma.len() / 2];
        // C=0 ... A=9
        assert_eq!(dominant_class(middle), 9);
        assert!((middle[9] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_middle_c_maps_to_c() {
        let chroma = Chromagram::from_samples(&sine(261.63, 3.0), SR);
        let middle = &chroma.frames[chroma.len() / 2];
        assert_eq!(dominant_class(middle), 0);
    }

    #[test]
    fn test_silence_stays_zero() {
        let chroma = Chromagram::from_samples(&vec![0.0; SR as usize], SR);
        assert!(chroma.frames.iter().flatten().all(|v| *v == 0.0));
    }
}
