//! Recap run error types.

use thiserror::Error;

use recap_models::TimestampError;

pub type RecapResult<T> = Result<T, RecapError>;

#[derive(Debug, Error)]
pub enum RecapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(
        "No chorus found for {}. Choose clips manually for these videos and try again",
        .files.join(", ")
    )]
    ChorusNotFound { files: Vec<String> },

    #[error("Sheet row {row} needs both a start and an end time in manual mode")]
    ManualTimesMissing { row: u32 },

    #[error("Sheet row {row} ({filename}): {source}")]
    Timestamp {
        row: u32,
        filename: String,
        #[source]
        source: TimestampError,
    },

    #[error("{rows} spreadsheet rows but {clips} extracted clips")]
    RowClipMismatch { rows: usize, clips: usize },

    #[error("Options error: {0}")]
    Options(#[from] recap_models::OptionsError),

    #[error("Spreadsheet error: {0}")]
    Sheet(#[from] recap_sheet::SheetError),

    #[error("Media error: {0}")]
    Media(#[from] recap_media::MediaError),

    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RecapError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
