//! FFmpeg `-progress` reports.

/// One `-progress` block, emitted at each `progress=` line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FfmpegProgress {
    /// Frames written so far
    pub frame: u64,
    /// Output position in milliseconds
    pub out_time_ms: i64,
    /// Encoding speed relative to realtime, 0 when unknown
    pub speed: f64,
    /// Set on the final block (`progress=end`)
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Share of `total_ms` encoded so far, 0-100.
    pub fn percentage(&self, total_ms: i64) -> f64 {
        if total_ms <= 0 {
            return 0.0;
        }
        (self.out_time_ms as f64 * 100.0 / total_ms as f64).clamp(0.0, 100.0)
    }

    /// Encoded share in whole tenths (0-10).
    pub fn completed_tenths(&self, total_ms: i64) -> u32 {
        if self.is_complete {
            return 10;
        }
        (self.percentage(total_ms) / 10.0).floor() as u32
    }

    /// Seconds left at the current speed.
    pub fn eta_seconds(&self, total_ms: i64) -> Option<f64> {
        if self.speed <= 0.0 || self.out_time_ms <= 0 {
            return None;
        }
        let remaining_ms = (total_ms - self.out_time_ms).max(0);
        Some(remaining_ms as f64 / 1000.0 / self.speed)
    }
}

/// Boxed progress handler.
pub type ProgressCallback = Box<dyn Fn(FfmpegProgress) + Send + 'static>;

#[cfg(test)]
mod tests {
    use super::*;

    fn at(out_time_ms: i64) -> FfmpegProgress {
        FfmpegProgress {
            out_time_ms,
            ..Default::default()
        }
    }

    #[test]
    fn test_percentage() {
        assert_eq!(at(5_000).percentage(10_000), 50.0);
        assert_eq!(at(12_000).percentage(10_000), 100.0);
        assert_eq!(at(5_000).percentage(0), 0.0);
        // Negative before the first frame is muxed
        assert_eq!(at(-23).percentage(10_000), 0.0);
    }

    #[test]
    fn test_completed_tenths() {
        assert_eq!(at(4_999).completed_tenths(10_000), 4);
        assert_eq!(at(0).completed_tenths(10_000), 0);

        let done = FfmpegProgress {
            is_complete: true,
            ..at(9_000)
        };
        assert_eq!(done.completed_tenths(10_000), 10);
    }

    #[test]
    fn test_eta() {
        let progress = FfmpegProgress {
            speed: 2.0,
            ..at(5_000)
        };
        // 5 s left at 2x
        assert_eq!(progress.eta_seconds(10_000), Some(2.5));
        assert_eq!(at(5_000).eta_seconds(10_000), None);
        assert_eq!(
            FfmpegProgress { speed: 1.0, ..at(11_000) }.eta_seconds(10_000),
            Some(0.0)
        );
    }
}
