//! CSV Export Module
//! Serializes the filtered rows for the "Download CSV" action.

use crate::data::FilteredData;
use polars::prelude::*;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write CSV: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Failed to save file: {0}")]
    Io(#[from] std::io::Error),
}

/// UTF-8, comma separated, header row, no index column, ISO dates.
pub fn to_csv_bytes(data: &FilteredData) -> Result<Vec<u8>, ExportError> {
    let mut df = data.dataframe().clone();
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .with_separator(b',')
        .with_date_format(Some("%Y-%m-%d".to_string()))
        .finish(&mut df)?;
    Ok(buf)
}

pub fn write_csv(data: &FilteredData, path: &Path) -> Result<(), ExportError> {
    let bytes = to_csv_bytes(data)?;
    fs::write(path, bytes)?;
    log::info!("Exported {} rows to {}", data.row_count(), path.display());
    Ok(())
}
