//! Error types for spreadsheet reading.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for spreadsheet operations.
pub type SheetResult<T> = Result<T, SheetError>;

/// Errors that can occur while reading the video data spreadsheet.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Spreadsheet not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to open spreadsheet {}: {message}", path.display())]
    Open { path: PathBuf, message: String },

    #[error("Spreadsheet {} has no worksheets", .0.display())]
    NoWorksheet(PathBuf),

    #[error("Spreadsheet {} lists no video files in column A", .0.display())]
    NoRows(PathBuf),
}

impl SheetError {
    /// Create an open failure error.
    pub fn open(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Open {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
