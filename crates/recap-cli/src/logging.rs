//! Structured stage logging.

use std::time::Instant;
use tracing::info;

/// Logs one pipeline stage with a consistent `stage` field.
#[derive(Debug)]
pub struct StageLogger {
    stage: &'static str,
    started: Instant,
}

impl StageLogger {
    /// Log the stage start and begin timing it.
    pub fn start(stage: &'static str, message: &str) -> Self {
        info!(stage, "Stage started: {}", message);
        Self {
            stage,
            started: Instant::now(),
        }
    }

    /// Log a progress step inside the stage.
    pub fn progress(&self, message: &str) {
        info!(stage = self.stage, "Stage progress: {}", message);
    }

    /// Log the stage completion with its elapsed time.
    pub fn complete(self, message: &str) {
        info!(
            stage = self.stage,
            elapsed_secs = self.started.elapsed().as_secs_f64(),
            "Stage completed: {}", message
        );
    }
}
