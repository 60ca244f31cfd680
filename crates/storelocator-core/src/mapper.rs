//! Positional mapping of a 25-field input row onto a [`StoreRecord`].

use crate::error::RowError;
use crate::hours::parse_hours;
use crate::models::{StoreLocation, StoreRecord};

/// Number of fields every data row must carry.
pub const FIELD_COUNT: usize = 25;

const LATITUDE: usize = 15;
const LONGITUDE: usize = 16;
const SAP_ID: usize = 17;
const FIRST_HOURS: usize = 18;

/// Map one data row onto a store record.
///
/// `row` is the line number of the row in the input file and is only used
/// for error reporting. Field 14 is not part of the record. Latitude and
/// longitude that fail to parse default to `0.0` (a warning is logged).
///
/// # Errors
///
/// - [`RowError::FieldCount`] if the row does not have exactly
///   [`FIELD_COUNT`] fields.
/// - [`RowError::Hours`] if any of the seven hours cells is malformed.
pub fn map_row<S: AsRef<str>>(row: u64, fields: &[S]) -> Result<StoreRecord, RowError> {
    if fields.len() != FIELD_COUNT {
        return Err(RowError::FieldCount {
            row,
            expected: FIELD_COUNT,
            actual: fields.len(),
        });
    }

    let field = |i: usize| fields[i].as_ref();
    let text = |i: usize| field(i).to_string();

    let hours = parse_hours([
        field(FIRST_HOURS),
        field(FIRST_HOURS + 1),
        field(FIRST_HOURS + 2),
        field(FIRST_HOURS + 3),
        field(FIRST_HOURS + 4),
        field(FIRST_HOURS + 5),
        field(FIRST_HOURS + 6),
    ])
    .map_err(|source| RowError::Hours { row, source })?;

    Ok(StoreRecord {
        store_code: text(0),
        business_name: text(1),
        address1: text(2),
        address2: text(3),
        city: text(4),
        state: text(5),
        postal_code: text(6),
        country: text(7),
        primary_phone: text(8),
        website: text(9),
        description: text(10),
        payment_types: text(11),
        primary_category: text(12),
        photo: text(13),
        hours,
        location: StoreLocation {
            latitude: parse_coordinate(row, "latitude", field(LATITUDE)),
            longitude: parse_coordinate(row, "longitude", field(LONGITUDE)),
        },
        sap_id: text(SAP_ID),
    })
}

/// Parse a coordinate cell, falling back to `0.0` when it is not a finite
/// number.
///
/// The fallback keeps rows with missing or garbled coordinates loadable;
/// non-empty cells that fail to parse are logged so the data can be fixed
/// at the source. `NaN` and infinities parse as `f64` but have no JSON or
/// degree representation, so they fall back too.
fn parse_coordinate(row: u64, name: &'static str, raw: &str) -> f64 {
    if raw.is_empty() {
        tracing::debug!(row, field = name, "empty coordinate, defaulting to 0");
        return 0.0;
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        Ok(_) => {
            tracing::warn!(
                row,
                field = name,
                value = raw,
                "non-finite coordinate, defaulting to 0"
            );
            0.0
        }
        Err(e) => {
            tracing::warn!(
                row,
                field = name,
                value = raw,
                error = %e,
                "unparseable coordinate, defaulting to 0"
            );
            0.0
        }
    }
}

#[cfg(test)]
#[path = "mapper_test.rs"]
mod tests;
