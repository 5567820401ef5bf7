//! Row extraction from the first worksheet.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use tracing::{debug, info};

use recap_models::{CaptionLines, SheetRow};

use crate::cell::{cell_text, filename_text};
use crate::error::{SheetError, SheetResult};

/// Header value in column A that marks the title row.
pub const HEADER_FILENAME: &str = "FILENAME";

const COL_FILENAME: u32 = 0;
const COL_START: u32 = 1;
const COL_END: u32 = 2;
const COL_CAPTIONS: [u32; 3] = [3, 4, 5];

/// Read every video row from the spreadsheet, in sheet order.
pub fn read_rows(path: impl AsRef<Path>) -> SheetResult<Vec<SheetRow>> {
    let path = path.as_ref();

    if !path.is_file() {
        return Err(SheetError::NotFound(path.to_path_buf()));
    }

    let mut workbook = open_workbook_auto(path).map_err(|e| SheetError::open(path, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SheetError::NoWorksheet(path.to_path_buf()))?
        .map_err(|e| SheetError::open(path, e))?;

    let rows = rows_from_range(&range);
    if rows.is_empty() {
        return Err(SheetError::NoRows(path.to_path_buf()));
    }

    info!(
        path = %path.display(),
        rows = rows.len(),
        "Imported video rows from spreadsheet"
    );
    Ok(rows)
}

/// Convert a worksheet range into rows, skipping the header and blank names.
pub fn rows_from_range(range: &Range<Data>) -> Vec<SheetRow> {
    // The used range may not start at A1
    let (first_row, first_col) = range.start().unwrap_or((0, 0));

    let cell = |cells: &[Data], col: u32| -> Option<String> {
        let index = col.checked_sub(first_col)? as usize;
        cells.get(index).and_then(cell_text)
    };

    range
        .rows()
        .enumerate()
        .filter_map(|(offset, cells)| {
            let sheet_row = first_row + offset as u32 + 1;
            let filename = COL_FILENAME
                .checked_sub(first_col)
                .and_then(|index| cells.get(index as usize))
                .and_then(filename_text)?;

            if filename == HEADER_FILENAME {
                debug!(sheet_row, "Skipping header row");
                return None;
            }

            Some(SheetRow {
                sheet_row,
                filename,
                start: cell(cells, COL_START),
                end: cell(cells, COL_END),
                captions: CaptionLines::new(COL_CAPTIONS.map(|col| cell(cells, col))),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Data {
        Data::String(s.to_string())
    }

    fn sheet(start: (u32, u32), rows: Vec<Vec<Data>>) -> Range<Data> {
        let width = rows.iter().map(Vec::len).max().unwrap_or(1) as u32;
        let end = (start.0 + rows.len() as u32 - 1, start.1 + width - 1);
        let mut range = Range::new(start, end);
        for (r, row) in rows.into_iter().enumerate() {
            for (c, value) in row.into_iter().enumerate() {
                range.set_value((start.0 + r as u32, start.1 + c as u32), value);
            }
        }
        range
    }

    #[test]
    fn test_header_and_blank_rows_skipped() {
        let range = sheet(
            (0, 0),
            vec![
                vec![text("FILENAME"), text("START"), text("END"), text("LINE 1")],
                vec![text("a.mp4"), text("00:00:10"), text("00:00:20"), text("Line1")],
                vec![Data::Empty, text("00:00:01"), text("00:00:02"), text("orphan")],
                vec![text("b.mp4"), Data::Empty, Data::Empty, text("Artist"), Data::Empty, Data::Float(2019.0)],
            ],
        );

        let rows = rows_from_range(&range);
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].sheet_row, 2);
        assert_eq!(rows[0].filename, "a.mp4");
        assert_eq!(rows[0].manual_times(), Some(("00:00:10", "00:00:20")));
        assert_eq!(rows[0].captions.text(), "Line1");

        assert_eq!(rows[1].sheet_row, 4);
        assert_eq!(rows[1].manual_times(), None);
        assert_eq!(rows[1].captions.text(), "Artist\n\n2019");
    }

    #[test]
    fn test_filename_column_read_verbatim() {
        let range = sheet(
            (0, 0),
            vec![
                vec![text("Filename"), text("Start")],
                vec![text("My Song .mp4"), Data::Empty],
            ],
        );
        let rows = rows_from_range(&range);
        // Only an exact FILENAME header is skipped
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].filename, "Filename");
        assert_eq!(rows[1].filename, "My Song .mp4");
    }

    #[test]
    fn test_range_not_starting_at_a1() {
        let range = sheet(
            (2, 0),
            vec![vec![text("c.mp4"), text("00:01:00"), text("00:01:15")]],
        );
        let rows = rows_from_range(&range);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sheet_row, 3);
    }

    #[test]
    fn test_range_without_column_a_has_no_rows() {
        let range = sheet((0, 1), vec![vec![text("00:00:10"), text("00:00:20")]]);
        assert!(rows_from_range(&range).is_empty());
    }

    #[test]
    fn test_missing_file() {
        let result = read_rows("/nonexistent/video_data.xlsx");
        assert!(matches!(result, Err(SheetError::NotFound(_))));
    }

    #[test]
    fn test_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("video_data.xlsx");
        std::fs::write(&path, b"not a workbook").unwrap();
        assert!(matches!(read_rows(&path), Err(SheetError::Open { .. })));
    }
}
