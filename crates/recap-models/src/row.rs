//! Spreadsheet rows.

use serde::{Deserialize, Serialize};

/// Number of caption columns (D, E, F).
pub const CAPTION_LINE_COUNT: usize = 3;

/// Up to three caption lines for one clip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionLines(pub [Option<String>; CAPTION_LINE_COUNT]);

impl CaptionLines {
    pub fn new(lines: [Option<String>; CAPTION_LINE_COUNT]) -> Self {
        Self(lines)
    }

    /// Combined caption text, one line per column.
    ///
    /// A missing line ahead of a present one renders as a blank line so the
    /// lines below keep their vertical position. Trailing missing lines are
    /// dropped.
    ///
    /// ```
    /// use recap_models::CaptionLines;
    /// let lines = CaptionLines::new([Some("Artist".into()), None, Some("2019".into())]);
    /// assert_eq!(lines.text(), "Artist\n\n2019");
    /// ```
    pub fn text(&self) -> String {
        let last_present = self
            .0
            .iter()
            .rposition(|line| line.as_deref().is_some_and(|l| !l.trim().is_empty()));

        match last_present {
            Some(last) => self.0[..=last]
                .iter()
                .map(|line| line.as_deref().unwrap_or("").trim_end())
                .collect::<Vec<_>>()
                .join("\n"),
            None => String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text().is_empty()
    }
}

/// One spreadsheet entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRow {
    /// 1-based row number in the worksheet, for diagnostics
    pub sheet_row: u32,
    /// Source video filename (column A), relative to the video directory
    pub filename: String,
    /// Manual start time (column B)
    pub start: Option<String>,
    /// Manual end time (column C)
    pub end: Option<String>,
    /// Caption lines (columns D-F)
    pub captions: CaptionLines,
}

impl SheetRow {
    /// Manual start/end pair, present only when both cells are filled.
    pub fn manual_times(&self) -> Option<(&str, &str)> {
        match (self.start.as_deref(), self.end.as_deref()) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }
}
