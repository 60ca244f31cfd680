//! CSV input: header line skipped, every following line mapped to a record.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::ReadError;
use crate::mapper::map_row;
use crate::models::StoreRecord;

/// Read and map every data row of the file at `path`.
///
/// The file handle is dropped before this function returns, on success and
/// on every error path.
///
/// # Errors
///
/// Returns [`ReadError::Open`] if the file cannot be opened, and otherwise
/// the same errors as [`read_stores`].
pub fn read_store_file(path: &Path) -> Result<Vec<StoreRecord>, ReadError> {
    let file = File::open(path).map_err(|source| ReadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let stores = read_stores(file)?;
    tracing::info!(path = %path.display(), stores = stores.len(), "read store data file");
    Ok(stores)
}

/// Read and map every data row from `input`. The first line is treated as a
/// header and discarded.
///
/// Rows are not required to have the same width as the header; width is
/// checked per row by [`map_row`] so the error names the offending line.
///
/// # Errors
///
/// - [`ReadError::Csv`] on I/O failure or invalid CSV (e.g. bad quoting).
/// - [`ReadError::Row`] for the first row that cannot be mapped.
pub fn read_stores<R: Read>(input: R) -> Result<Vec<StoreRecord>, ReadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let mut stores = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map_or(0, csv::Position::line);
        let fields: Vec<&str> = record.iter().collect();
        stores.push(map_row(line, &fields)?);
    }
    Ok(stores)
}
