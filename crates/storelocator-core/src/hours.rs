//! Parsing of the per-day hours cells (`"9-5"`, `"08:00-17:30"`, or empty).

use crate::error::HoursError;
use crate::models::{DayOfWeek, StoreHour};

/// Parse a single hours cell for `day`.
///
/// - An empty cell means the store is closed that day and yields
///   [`StoreHour::closed`].
/// - A cell with exactly one `-` is split into open and close times, kept
///   verbatim (surrounding whitespace included).
///
/// # Errors
///
/// Returns [`HoursError::Malformed`] for any other non-empty cell, i.e. one
/// with no `-` or with more than one.
pub fn parse_hour(day: DayOfWeek, input: &str) -> Result<StoreHour, HoursError> {
    if input.is_empty() {
        return Ok(StoreHour::closed(day));
    }

    let mut tokens = input.split('-');
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(open), Some(close), None) => Ok(StoreHour {
            day_of_week: day,
            open_time: open.to_string(),
            close_time: close.to_string(),
        }),
        _ => Err(HoursError::Malformed {
            day,
            value: input.to_string(),
        }),
    }
}

/// Parse the seven hours cells of a row, Sunday first.
///
/// # Errors
///
/// Returns the first [`HoursError`] encountered, in day order.
pub fn parse_hours(cells: [&str; 7]) -> Result<[StoreHour; 7], HoursError> {
    let [sun, mon, tue, wed, thu, fri, sat] = cells;
    Ok([
        parse_hour(DayOfWeek::Sun, sun)?,
        parse_hour(DayOfWeek::Mon, mon)?,
        parse_hour(DayOfWeek::Tue, tue)?,
        parse_hour(DayOfWeek::Wed, wed)?,
        parse_hour(DayOfWeek::Thu, thu)?,
        parse_hour(DayOfWeek::Fri, fri)?,
        parse_hour(DayOfWeek::Sat, sat)?,
    ])
}
