//! Spreadsheet reader for recap video data.
//!
//! The first worksheet lists one source video per row:
//!
//! | Column | Content |
//! |---|---|
//! | A | Source filename (`FILENAME` header and blank cells skipped) |
//! | B | Manual start time |
//! | C | Manual end time |
//! | D-F | Caption lines |

pub mod cell;
pub mod error;
pub mod reader;

pub use error::{SheetError, SheetResult};
pub use reader::{read_rows, rows_from_range, HEADER_FILENAME};
