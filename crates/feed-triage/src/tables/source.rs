//! Delimited feed loading.

use crate::error::{Result, ResultExt, TriageError};
use crate::types::{RawRecord, REQUIRED_FIELDS};
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Load a delimited feed with a header row into raw records.
///
/// Every column is read as text and empty fields are missing. Fails before
/// any record is produced when the file cannot be parsed or a required
/// column is absent.
pub fn read_raw_records(path: impl AsRef<Path>, separator: u8) -> Result<Vec<RawRecord>> {
    let path = path.as_ref();
    info!("Loading feed: {}", path.display());

    let unreadable = |reason: String| TriageError::SourceUnreadable {
        path: path.display().to_string(),
        reason,
    };

    if !path.is_file() {
        return Err(unreadable("file does not exist".to_string()));
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(separator)
                .with_quote_char(Some(b'"')),
        )
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(|e| unreadable(e.to_string()))?;

    debug!("Feed shape: {} rows x {} columns", df.height(), df.width());
    records_from_dataframe(&df)
}

/// Convert a loaded frame into raw records, checking the required columns.
pub fn records_from_dataframe(df: &DataFrame) -> Result<Vec<RawRecord>> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    if let Some(missing) = REQUIRED_FIELDS
        .iter()
        .copied()
        .find(|field| !names.iter().any(|name| name == field))
    {
        return Err(TriageError::MissingColumn {
            column: missing.to_string(),
            available: names,
        });
    }

    let mut columns: Vec<Vec<Option<String>>> = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let text = column
            .cast(&DataType::String)
            .context(format!("Reading column '{}' as text", column.name()))?;
        let values = text
            .str()
            .context(format!("Reading column '{}' as text", column.name()))?
            .into_iter()
            .map(|value| value.filter(|v| !v.is_empty()).map(str::to_string))
            .collect();
        columns.push(values);
    }

    let records = (0..df.height())
        .map(|row| {
            RawRecord::from_pairs(
                names
                    .iter()
                    .zip(&columns)
                    .map(|(name, values)| (name.clone(), values[row].clone())),
            )
        })
        .collect();

    Ok(records)
}
