//! Cell-to-text coercion.
//!
//! Keywords are matched against the text form of each cell, so the rendering
//! here fixes what a search can hit:
//!
//! | cell                                  | text                  |
//! |---------------------------------------|-----------------------|
//! | empty                                 | `""`                  |
//! | string                                | verbatim              |
//! | integer                               | `42`                  |
//! | float with no fraction, below 1e15    | `42` (not `42.0`)     |
//! | other float                           | shortest round-trip   |
//! | bool                                  | `TRUE` / `FALSE`      |
//! | date-time at midnight                 | `2024-03-01`          |
//! | date-time                             | `2024-03-01 08:30:00` |
//! | ISO date/duration string              | verbatim              |
//! | error                                 | `#DIV/0!` etc.        |

use calamine::{CellErrorType, Data, DataRef, ExcelDateTime};
use chrono::Timelike;

/// Largest magnitude still rendered as an integer; beyond it `f64` loses whole digits
const INTEGRAL_LIMIT: f64 = 1e15;

/// Text for a cell read eagerly from a range
pub fn data_text(data: &Data) -> String {
    match data {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => float_text(*f),
        Data::Bool(b) => bool_text(*b),
        Data::DateTime(dt) => datetime_text(dt),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => error_text(e),
    }
}

/// Text for a cell delivered by the streaming xlsx cell reader
pub fn data_ref_text(data: &DataRef<'_>) -> String {
    match data {
        DataRef::Empty => String::new(),
        DataRef::String(s) => s.clone(),
        DataRef::SharedString(s) => (*s).to_string(),
        DataRef::Int(i) => i.to_string(),
        DataRef::Float(f) => float_text(*f),
        DataRef::Bool(b) => bool_text(*b),
        DataRef::DateTime(dt) => datetime_text(dt),
        DataRef::DateTimeIso(s) | DataRef::DurationIso(s) => s.clone(),
        DataRef::Error(e) => error_text(e),
    }
}

pub fn float_text(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < INTEGRAL_LIMIT {
        // -0.0 renders as "0"
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

fn bool_text(b: bool) -> String {
    let text = if b { "TRUE" } else { "FALSE" };
    text.to_string()
}

fn datetime_text(dt: &ExcelDateTime) -> String {
    if dt.is_duration() {
        return float_text(dt.as_f64());
    }
    match dt.as_datetime() {
        Some(value) if value.num_seconds_from_midnight() == 0 => {
            value.format("%Y-%m-%d").to_string()
        }
        Some(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => float_text(dt.as_f64()),
    }
}

fn error_text(e: &CellErrorType) -> String {
    e.to_string()
}

/// Drops empty cells from the end of a row
pub fn trim_trailing_empty(row: &mut Vec<String>) {
    while row.last().is_some_and(|cell| cell.is_empty()) {
        row.pop();
    }
}
