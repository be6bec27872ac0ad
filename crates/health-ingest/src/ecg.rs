//! ECG session exports (`electrocardiograms/ecg_*.csv`).
//!
//! Each session file opens with a block of `key,value` metadata lines before
//! the voltage samples. Only that header block is read; one record per
//! session is derived from its recording time and classification.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use tracing::{debug, info, info_span, warn};

use health_model::{ECG_TYPE, Record};

use crate::context::IngestContext;
use crate::discovery::{list_ecg_files, open_buffered};
use crate::error::{IngestError, Result};

/// Leading lines of a session file scanned for metadata.
pub const ECG_HEADER_LINES: usize = 11;

/// Metadata key holding the session timestamp.
pub const RECORDED_DATE_KEY: &str = "Recorded Date";

/// Metadata key holding the rhythm classification.
pub const CLASSIFICATION_KEY: &str = "Classification";

/// Outcome of reading an ECG directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EcgStats {
    /// Session files found.
    pub files: usize,
    /// Records added to the context.
    pub added: usize,
    /// Files that could not be read or lacked a recording time.
    pub skipped: Vec<PathBuf>,
}

/// Metadata block at the top of a session file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EcgHeader {
    fields: HashMap<String, String>,
}

impl EcgHeader {
    /// Parses `key,value` pairs from header lines. Later keys replace earlier ones.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut fields = HashMap::new();
        for line in lines {
            if let Some((key, value)) = line.as_ref().trim().split_once(',') {
                fields.insert(key.trim().to_string(), unquote(value.trim()).to_string());
            }
        }
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn recorded_date(&self) -> Option<&str> {
        self.get(RECORDED_DATE_KEY).filter(|value| !value.is_empty())
    }

    pub fn classification(&self) -> &str {
        self.get(CLASSIFICATION_KEY).unwrap_or_default()
    }

    /// Builds the session record, if a recording time is present.
    pub fn to_record(&self) -> Option<Record> {
        let recorded = self.recorded_date()?;
        Some(Record::new(
            recorded,
            recorded,
            recorded,
            ECG_TYPE,
            self.classification(),
        ))
    }
}

/// Strips every leading and trailing double quote.
fn unquote(value: &str) -> &str {
    value.trim_matches('"')
}

/// Reads the metadata header of one session file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or its leading lines are not UTF-8.
pub fn read_ecg_header(path: &Path) -> Result<EcgHeader> {
    let reader = open_buffered(path)?;
    let mut lines = Vec::with_capacity(ECG_HEADER_LINES);
    for line in reader.lines().take(ECG_HEADER_LINES) {
        lines.push(line.map_err(|source| IngestError::FileRead {
            path: path.to_path_buf(),
            source,
        })?);
    }
    Ok(EcgHeader::from_lines(lines))
}

/// Derives the session record for one file.
///
/// # Errors
///
/// Returns an error if the header cannot be read or has no recording time.
pub fn ecg_record(path: &Path) -> Result<Record> {
    read_ecg_header(path)?
        .to_record()
        .ok_or_else(|| IngestError::MissingField {
            field: RECORDED_DATE_KEY.to_string(),
            path: path.to_path_buf(),
        })
}

/// Adds one record per ECG session file in `dir` to `ctx`.
///
/// Files that fail individually are logged and listed in
/// [`EcgStats::skipped`]; they never stop the remaining files.
///
/// # Errors
///
/// Returns an error only if `dir` itself cannot be listed.
pub fn parse_ecg_directory(dir: &Path, ctx: &mut IngestContext) -> Result<EcgStats> {
    let span = info_span!("electrocardiograms", dir = %dir.display());
    let _guard = span.enter();
    info!("processing ECG files from {}", dir.display());

    let files = list_ecg_files(dir)?;
    let mut stats = EcgStats {
        files: files.len(),
        ..EcgStats::default()
    };
    for path in files {
        match ecg_record(&path) {
            Ok(record) => {
                if ctx.insert(record) {
                    stats.added += 1;
                } else {
                    debug!(path = %path.display(), "duplicate ECG session");
                }
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "could not parse ECG file");
                stats.skipped.push(path);
            }
        }
    }

    info!(
        added = stats.added,
        skipped = stats.skipped.len(),
        "extracted {} ECG records",
        stats.added
    );
    Ok(stats)
}
