//! Streaming reader for the flat attribute-per-element health export (`export.xml`).
//!
//! The export can run to several gigabytes, so it is consumed as a forward-only
//! event stream with one reusable buffer. Only `Record` and `Workout` start tags
//! are inspected; everything an observation needs lives in its attributes, so
//! child elements (metadata entries, workout events, routes) are never held.

use std::io::BufRead;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, info, info_span};

use health_model::{Record, is_target_type};

use crate::context::IngestContext;
use crate::discovery::open_buffered;
use crate::error::{IngestError, Result};
use crate::xml::read_attributes;

const RECORD_TAG: &[u8] = b"Record";
const WORKOUT_TAG: &[u8] = b"Workout";

const RECORD_ATTRIBUTES: [&[u8]; 5] = [
    b"type",
    b"creationDate",
    b"startDate",
    b"endDate",
    b"value",
];
const WORKOUT_ATTRIBUTES: [&[u8]; 8] = [
    b"workoutActivityType",
    b"creationDate",
    b"startDate",
    b"endDate",
    b"duration",
    b"durationUnit",
    b"totalEnergyBurned",
    b"totalEnergyBurnedUnit",
];

const DEFAULT_DURATION_UNIT: &str = "min";
const DEFAULT_ENERGY_UNIT: &str = "Cal";

/// Counts of records added by one pass over `export.xml`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportXmlStats {
    /// Allow-listed point observations added.
    pub records: usize,
    /// Workouts added.
    pub workouts: usize,
}

impl ExportXmlStats {
    /// Total records added by this source.
    pub fn total(&self) -> usize {
        self.records + self.workouts
    }
}

/// Extracts allow-listed observations and all workouts from `path` into `ctx`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or the XML is malformed.
/// Records accepted before a parse error remain in `ctx`.
pub fn parse_export_xml(path: &Path, ctx: &mut IngestContext) -> Result<ExportXmlStats> {
    let span = info_span!("export_xml", path = %path.display());
    let _guard = span.enter();
    info!("processing {}", path.display());

    let mut reader = Reader::from_reader(open_buffered(path)?);
    let mut stats = ExportXmlStats::default();
    scan_export(&mut reader, ctx, &mut stats).map_err(|source| IngestError::Xml {
        path: path.to_path_buf(),
        position: reader.error_position() as u64,
        source,
    })?;

    info!(
        records = stats.records,
        workouts = stats.workouts,
        "extracted {} records + {} workouts from {}",
        stats.records,
        stats.workouts,
        file_name(path)
    );
    Ok(stats)
}

fn scan_export<R: BufRead>(
    reader: &mut Reader<R>,
    ctx: &mut IngestContext,
    stats: &mut ExportXmlStats,
) -> std::result::Result<(), quick_xml::Error> {
    let mut buf = Vec::new();
    let mut skipped = 0usize;
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(element) | Event::Empty(element) => {
                match element.name().as_ref() {
                    RECORD_TAG => match point_record(&element, reader)? {
                        Some(record) => {
                            if ctx.insert(record) {
                                stats.records += 1;
                            }
                        }
                        None => skipped += 1,
                    },
                    WORKOUT_TAG => {
                        if ctx.insert(workout_record(&element, reader)?) {
                            stats.workouts += 1;
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    debug!(skipped, "records outside the allow-list skipped");
    Ok(())
}

/// Builds a record from a `Record` element, or `None` if its type is not allow-listed.
fn point_record<R>(
    element: &BytesStart<'_>,
    reader: &Reader<R>,
) -> std::result::Result<Option<Record>, quick_xml::Error> {
    let [record_type, creation, start, end, value] =
        read_attributes(element, RECORD_ATTRIBUTES, reader.decoder())?;
    let Some(record_type) = record_type.filter(|t| is_target_type(t)) else {
        return Ok(None);
    };
    Ok(Some(Record::new(
        creation.unwrap_or_default(),
        start.unwrap_or_default(),
        end.unwrap_or_default(),
        record_type,
        value.unwrap_or_default(),
    )))
}

/// Builds a record from a `Workout` element.
fn workout_record<R>(
    element: &BytesStart<'_>,
    reader: &Reader<R>,
) -> std::result::Result<Record, quick_xml::Error> {
    let [
        activity,
        creation,
        start,
        end,
        duration,
        duration_unit,
        energy,
        energy_unit,
    ] = read_attributes(element, WORKOUT_ATTRIBUTES, reader.decoder())?;
    let value = workout_summary(
        duration.as_deref().unwrap_or_default(),
        duration_unit.as_deref().unwrap_or(DEFAULT_DURATION_UNIT),
        energy.as_deref().unwrap_or_default(),
        energy_unit.as_deref().unwrap_or(DEFAULT_ENERGY_UNIT),
    );
    Ok(Record::new(
        creation.unwrap_or_default(),
        start.unwrap_or_default(),
        end.unwrap_or_default(),
        activity.unwrap_or_default(),
        value,
    ))
}

/// Formats a workout value as `duration:<d> <unit>; calories:<e> <unit>`.
///
/// Parts with an empty measurement are left out; with neither present the
/// summary is empty.
pub fn workout_summary(
    duration: &str,
    duration_unit: &str,
    energy: &str,
    energy_unit: &str,
) -> String {
    let mut parts = Vec::with_capacity(2);
    if !duration.is_empty() {
        parts.push(format!("duration:{duration} {duration_unit}"));
    }
    if !energy.is_empty() {
        parts.push(format!("calories:{energy} {energy_unit}"));
    }
    parts.join("; ")
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}
