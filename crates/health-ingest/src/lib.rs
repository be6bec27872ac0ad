//! Health export ingestion.
//!
//! This crate reads the files produced by a personal health data export and
//! projects every observation into one [`health_model::Record`] shape.
//!
//! # Sources
//!
//! - **Flat export** (`export.xml`): allow-listed `Record` elements and all
//!   `Workout` elements, read from attributes.
//! - **Clinical document** (`export_cda.xml`): HL7 v3 `observation` elements,
//!   with compact timestamps rewritten by [`format_cda_date`].
//! - **ECG sessions** (`electrocardiograms/ecg_*.csv`): one record per file
//!   from its metadata header.
//!
//! All parsers write into a single [`IngestContext`], which rejects any
//! record whose five fields match one already accepted, whichever source
//! produced it.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use health_ingest::{IngestContext, parse_export_xml, parse_clinical_document};
//!
//! let mut ctx = IngestContext::new();
//! let flat = parse_export_xml(Path::new("export/export.xml"), &mut ctx)?;
//! let cda = parse_clinical_document(Path::new("export/export_cda.xml"), &mut ctx)?;
//! assert_eq!(ctx.len(), flat.total() + cda.added);
//! ```

mod cda;
mod context;
mod datetime;
mod discovery;
mod ecg;
mod error;
mod export_xml;
mod xml;

// === Error Types ===
pub use error::{IngestError, Result};

// === Shared State ===
pub use context::{IngestContext, PROGRESS_INTERVAL};

// === Parsers ===
pub use cda::{ClinicalDocumentStats, HL7_NAMESPACE, parse_clinical_document};
pub use ecg::{
    CLASSIFICATION_KEY, ECG_HEADER_LINES, EcgHeader, EcgStats, RECORDED_DATE_KEY, ecg_record,
    parse_ecg_directory, read_ecg_header,
};
pub use export_xml::{ExportXmlStats, parse_export_xml, workout_summary};

// === Normalization ===
pub use datetime::format_cda_date;

// === Source Discovery ===
pub use discovery::{ECG_FILE_EXTENSION, ECG_FILE_PREFIX, SourceLocations, list_ecg_files};
