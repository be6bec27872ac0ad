//! Sorting and CSV serialization of consolidated records.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::{QuoteStyle, Terminator, WriterBuilder};
use tracing::{debug, info};

use health_model::{RECORD_COLUMNS, Record};

use crate::error::{OutputError, Result};

/// Orders records by `startDate` using plain string comparison.
///
/// The sort is stable, so records sharing a start keep their ingestion order.
/// Dates are compared as written; sources with different date layouts are
/// not reconciled.
pub fn sort_records(records: &mut [Record]) {
    records.sort_by(|a, b| a.start_date.cmp(&b.start_date));
}

/// Writes the header row and every record to `writer`.
///
/// The header is written even when `records` is empty.
///
/// # Errors
///
/// Returns the underlying CSV or I/O error.
pub fn write_records<W: Write>(writer: W, records: &[Record]) -> csv::Result<()> {
    let mut csv_writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::CRLF)
        .from_writer(writer);
    csv_writer.write_record(RECORD_COLUMNS)?;
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes `records` to a CSV file at `path`, creating parent directories.
///
/// Returns the number of data rows written.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created or written.
pub fn write_records_csv(path: &Path, records: &[Record]) -> Result<usize> {
    ensure_parent_dir(path)?;
    info!(
        path = %path.display(),
        records = records.len(),
        "writing consolidated CSV"
    );
    let file = File::create(path).map_err(|source| OutputError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    write_records(BufWriter::new(file), records).map_err(|source| OutputError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "CSV written");
    Ok(records.len())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| OutputError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}
