//! Cell value conversion.
//!
//! Spreadsheet applications store the same visible text in different cell
//! types: `00:01:30` typed into a cell usually becomes a time value (a day
//! fraction), `2019` becomes a float. These helpers turn any cell into the
//! text a user sees.

use calamine::Data;
use recap_models::format_seconds;
use tracing::warn;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Text content of a cell, `None` for empty or blank cells.
pub fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty => return None,
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_number(*f),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::DateTime(dt) => format_day_fraction(dt.as_f64()),
        Data::DateTimeIso(s) => iso_time_part(s).to_string(),
        Data::DurationIso(s) => match parse_iso_duration(s) {
            Some(secs) => format_seconds(secs),
            None => s.clone(),
        },
        Data::Error(e) => {
            warn!(error = ?e, "Ignoring spreadsheet cell with an error value");
            return None;
        }
    };

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Column A text, kept verbatim since it names a file on disk.
pub fn filename_text(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(s.clone()),
        other => cell_text(other),
    }
}

/// Integral floats render without a fractional part (`2019.0` -> `2019`).
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

/// Time of day stored as a fraction of a day. Dates are dropped.
fn format_day_fraction(value: f64) -> String {
    let fraction = if value >= 1.0 { value.fract() } else { value };
    format_seconds(fraction * SECONDS_PER_DAY)
}

/// `1899-12-31T00:01:30` -> `00:01:30`
fn iso_time_part(value: &str) -> &str {
    match value.split_once('T') {
        Some((_, time)) => time,
        None => value,
    }
}

/// Parse the time portion of an ISO 8601 duration such as `PT1M30S`.
fn parse_iso_duration(value: &str) -> Option<f64> {
    let rest = value.strip_prefix('P')?;
    let time = rest.strip_prefix('T').or_else(|| rest.split_once('T').map(|(_, t)| t))?;

    let mut total = 0.0;
    let mut number = String::new();
    for c in time.chars() {
        match c {
            '0'..='9' | '.' => number.push(c),
            'H' | 'M' | 'S' => {
                let n: f64 = number.parse().ok()?;
                total += n * match c {
                    'H' => 3600.0,
                    'M' => 60.0,
                    _ => 1.0,
                };
                number.clear();
            }
            _ => return None,
        }
    }

    number.is_empty().then_some(total)
}
