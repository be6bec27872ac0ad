//! Conversion pipeline with explicit stages.
//!
//! The pipeline follows these stages in order:
//! 1. **Ingest**: Read each present source into one shared [`IngestContext`]
//! 2. **Order**: Sort accepted records by their `startDate` string
//! 3. **Output**: Write the consolidated CSV (skipped for dry runs)
//!
//! A source that is missing, disabled, or fails to parse never stops the
//! remaining sources; only an output failure aborts the run.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, error, info, info_span, warn};

use health_ingest::{
    IngestContext, SourceLocations, parse_clinical_document, parse_ecg_directory,
    parse_export_xml,
};
use health_model::{DEFAULT_OUTPUT_FILE, Record, SourceKind, sorted_target_identifiers};
use health_output::{sort_records, type_tally, write_records_csv};

use crate::types::{ConvertResult, SourceStatus, SourceSummary};

/// Inputs of one conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub locations: SourceLocations,
    pub output: PathBuf,
    /// Sources disabled for this run.
    pub skip: Vec<SourceKind>,
    /// Parse and summarize without writing `output`.
    pub dry_run: bool,
}

impl ConvertOptions {
    /// Conventional layout under `base`, writing `full_health_data.csv` there.
    pub fn under(base: &Path) -> Self {
        Self {
            locations: SourceLocations::under(base),
            output: base.join(DEFAULT_OUTPUT_FILE),
            skip: Vec::new(),
            dry_run: false,
        }
    }

    pub fn is_skipped(&self, kind: SourceKind) -> bool {
        self.skip.contains(&kind)
    }
}

// ============================================================================
// Stage 1: Ingest
// ============================================================================

/// Result of the ingest stage.
#[derive(Debug)]
pub struct IngestResult {
    /// Deduplicated records in ingestion order.
    pub records: Vec<Record>,
    /// One entry per source, in processing order.
    pub sources: Vec<SourceSummary>,
}

/// Reads every source into one context, in the fixed order
/// export.xml, export_cda.xml, electrocardiograms.
pub fn ingest(options: &ConvertOptions) -> IngestResult {
    let mut ctx = IngestContext::new();
    let sources = SourceKind::ALL
        .into_iter()
        .map(|kind| ingest_source(kind, options, &mut ctx))
        .collect();
    IngestResult {
        records: ctx.into_records(),
        sources,
    }
}

/// Runs the parser for one source and reports what it contributed.
///
/// `added` is measured on the context itself, so records accepted before a
/// parse failure are still attributed to the failing source.
pub fn ingest_source(
    kind: SourceKind,
    options: &ConvertOptions,
    ctx: &mut IngestContext,
) -> SourceSummary {
    let path = options.locations.path(kind).to_path_buf();
    if options.is_skipped(kind) {
        info!(source = %kind, "source disabled, skipping");
        return SourceSummary {
            kind,
            path,
            status: SourceStatus::Skipped,
            added: 0,
            detail: None,
        };
    }
    let Some(resolved) = options.locations.resolve(kind) else {
        warn!(source = %kind, path = %path.display(), "{} not found, skipping", path.display());
        return SourceSummary {
            kind,
            path,
            status: SourceStatus::Missing,
            added: 0,
            detail: None,
        };
    };

    let before = ctx.len();
    let outcome = match kind {
        SourceKind::ExportXml => parse_export_xml(resolved, ctx).map(|stats| {
            let detail = format!("{} records, {} workouts", stats.records, stats.workouts);
            (SourceStatus::Processed, Some(detail))
        }),
        SourceKind::ClinicalDocument => parse_clinical_document(resolved, ctx).map(|stats| {
            let status = if stats.truncated {
                SourceStatus::Truncated
            } else {
                SourceStatus::Processed
            };
            (status, Some(format!("{} observations", stats.observations)))
        }),
        SourceKind::Electrocardiograms => parse_ecg_directory(resolved, ctx).map(|stats| {
            let detail = if stats.skipped.is_empty() {
                format!("{} files", stats.files)
            } else {
                format!("{} files, {} unreadable", stats.files, stats.skipped.len())
            };
            (SourceStatus::Processed, Some(detail))
        }),
    };
    let (status, detail) = match outcome {
        Ok(result) => result,
        Err(source_error) => {
            error!(source = %kind, path = %path.display(), error = %source_error, "source failed");
            (SourceStatus::Failed(source_error.to_string()), None)
        }
    };

    SourceSummary {
        kind,
        path,
        status,
        added: ctx.len() - before,
        detail,
    }
}

// ============================================================================
// Stage 3: Output
// ============================================================================

/// Writes the sorted records to `path`.
pub fn output(path: &Path, records: &[Record]) -> Result<usize> {
    write_records_csv(path, records).with_context(|| format!("write {}", path.display()))
}

/// Runs every stage and collects the run summary.
///
/// # Errors
///
/// Returns an error only when the output file cannot be written.
pub fn consolidate(options: &ConvertOptions) -> Result<ConvertResult> {
    let convert_span = info_span!("convert", output = %options.output.display());
    let _convert_guard = convert_span.enter();
    let start = Instant::now();
    debug!(types = ?sorted_target_identifiers(), "retaining allow-listed observation types");

    let IngestResult {
        mut records,
        sources,
    } = info_span!("ingest").in_scope(|| ingest(options));

    info!(
        records = records.len(),
        "sorting {} records by start date",
        records.len()
    );
    sort_records(&mut records);

    let output_path = if options.dry_run {
        info!("dry run, output not written");
        None
    } else {
        output(&options.output, &records)?;
        Some(options.output.clone())
    };

    let type_counts = type_tally(&records);
    info!(
        total_records = records.len(),
        type_count = type_counts.len(),
        duration_ms = start.elapsed().as_millis(),
        "conversion complete"
    );

    Ok(ConvertResult {
        output: output_path,
        sources,
        total_records: records.len(),
        type_counts,
    })
}
