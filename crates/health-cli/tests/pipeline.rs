//! End-to-end tests for the conversion pipeline.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use health_cli::pipeline::{ConvertOptions, consolidate, ingest};
use health_cli::types::SourceStatus;
use health_model::SourceKind;

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
    path
}

fn read_rows(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let header = reader
        .headers()
        .unwrap()
        .iter()
        .map(String::from)
        .collect();
    let rows = reader
        .records()
        .map(|row| row.unwrap().iter().map(String::from).collect())
        .collect();
    (header, rows)
}

const EXPORT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<HealthData locale="en_US">
 <Record type="HKQuantityTypeIdentifierStepCount" sourceName="Phone" creationDate="2023-06-16 08:00:00 -0500" startDate="2023-06-16 07:00:00 -0500" endDate="2023-06-16 08:00:00 -0500" value="1200"/>
 <Record type="HKQuantityTypeIdentifierHeartRate" sourceName="Watch" creationDate="2023-06-15 14:30:00 -0500" startDate="2023-06-15 14:30:00 -0500" endDate="2023-06-15 14:30:00 -0500" value="72"/>
 <Record type="HKQuantityTypeIdentifierDietaryWater" sourceName="Phone" creationDate="2023-06-15 12:00:00 -0500" startDate="2023-06-15 12:00:00 -0500" endDate="2023-06-15 12:00:00 -0500" value="250"/>
 <Workout workoutActivityType="HKWorkoutActivityTypeRunning" duration="30" durationUnit="min" totalEnergyBurned="250" totalEnergyBurnedUnit="Cal" creationDate="2023-06-14 19:00:00 -0500" startDate="2023-06-14 18:30:00 -0500" endDate="2023-06-14 19:00:00 -0500"/>
</HealthData>
"#;

const CDA_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ClinicalDocument xmlns="urn:hl7-org:v3">
<entry><organizer>
<component><observation classCode="OBS" moodCode="EVN">
  <text><value>72</value><type>HKQuantityTypeIdentifierHeartRate</type></text>
  <effectiveTime><low value="20230615143000-0500"/><high value="20230615143000-0500"/></effectiveTime>
</observation></component>
<component><observation classCode="OBS" moodCode="EVN">
  <text><value>14</value><type>HKQuantityTypeIdentifierRespiratoryRate</type></text>
  <effectiveTime><low value="20230613090000-0500"/><high value="20230613090000-0500"/></effectiveTime>
</observation></component>
</organizer></entry>
</ClinicalDocument>
"#;

const ECG_CSV: &str = "Name,\"Jane Doe\"\n\
Date of Birth,\"1980-01-01\"\n\
Recorded Date,\"2023-06-15 15:00:00 -0500\"\n\
Classification,\"Sinus Rhythm\"\n\
Symptoms,\n\
Software Version,\"1.90\"\n\
Device,\"Watch6,1\"\n\
Sample Rate,\"512 hertz\"\n\
\n\
Lead,\"Lead I\"\n\
Unit,\"µV\"\n\
-12.345\n";

fn export_folder() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "export.xml", EXPORT_XML);
    write_file(dir.path(), "export_cda.xml", CDA_XML);
    write_file(dir.path(), "electrocardiograms/ecg_2023-06-15.csv", ECG_CSV);
    dir
}

#[test]
fn test_full_export_is_deduplicated_and_sorted() {
    let dir = export_folder();
    let options = ConvertOptions::under(dir.path());

    let result = consolidate(&options).unwrap();

    let output = dir.path().join("full_health_data.csv");
    assert_eq!(result.output.as_deref(), Some(output.as_path()));
    let (header, rows) = read_rows(&output);
    assert_eq!(
        header,
        ["creationDate", "startDate", "endDate", "type", "value"]
    );

    // Step count, heart rate, workout; respiratory rate; one ECG session.
    assert_eq!(rows.len(), 5);
    assert_eq!(result.total_records, rows.len());
    let added: usize = result.sources.iter().map(|s| s.added).sum();
    assert_eq!(added, rows.len());

    let starts: Vec<&str> = rows.iter().map(|row| row[1].as_str()).collect();
    let mut sorted = starts.clone();
    sorted.sort();
    assert_eq!(starts, sorted);

    assert_eq!(
        rows[0],
        [
            "2023-06-13 09:00:00 -0500",
            "2023-06-13 09:00:00 -0500",
            "2023-06-13 09:00:00 -0500",
            "HKQuantityTypeIdentifierRespiratoryRate",
            "14",
        ]
    );
    assert_eq!(rows[1][3], "HKWorkoutActivityTypeRunning");
    assert_eq!(rows[1][4], "duration:30 min; calories:250 Cal");
    assert!(rows.iter().all(|row| row[3] != "HKQuantityTypeIdentifierDietaryWater"));

    assert_eq!(result.type_counts["HKQuantityTypeIdentifierHeartRate"], 1);
    assert_eq!(result.type_counts["ECG"], 1);
}

#[test]
fn test_source_summaries_follow_processing_order() {
    let dir = export_folder();
    let result = consolidate(&ConvertOptions::under(dir.path())).unwrap();

    let kinds: Vec<SourceKind> = result.sources.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, SourceKind::ALL);
    assert!(
        result
            .sources
            .iter()
            .all(|s| s.status == SourceStatus::Processed)
    );
    // The CDA heart-rate sample duplicates the export.xml one.
    let added: Vec<usize> = result.sources.iter().map(|s| s.added).collect();
    assert_eq!(added, [3, 1, 1]);
}

#[test]
fn test_empty_folder_writes_header_only() {
    let dir = TempDir::new().unwrap();
    let result = consolidate(&ConvertOptions::under(dir.path())).unwrap();

    assert_eq!(result.total_records, 0);
    assert!(
        result
            .sources
            .iter()
            .all(|s| s.status == SourceStatus::Missing && s.added == 0)
    );
    let contents = std::fs::read_to_string(dir.path().join("full_health_data.csv")).unwrap();
    assert_eq!(contents, "creationDate,startDate,endDate,type,value\r\n");
}

#[test]
fn test_skipped_source_contributes_nothing() {
    let dir = export_folder();
    let mut options = ConvertOptions::under(dir.path());
    options.skip.push(SourceKind::ExportXml);

    let ingested = ingest(&options);

    assert_eq!(ingested.sources[0].status, SourceStatus::Skipped);
    assert_eq!(ingested.sources[0].added, 0);
    // Without export.xml the CDA heart-rate sample is no longer a duplicate.
    assert_eq!(ingested.sources[1].added, 2);
    assert_eq!(ingested.records.len(), 3);
}

#[test]
fn test_dry_run_writes_nothing() {
    let dir = export_folder();
    let mut options = ConvertOptions::under(dir.path());
    options.dry_run = true;

    let result = consolidate(&options).unwrap();

    assert!(result.output.is_none());
    assert_eq!(result.total_records, 5);
    assert!(!dir.path().join("full_health_data.csv").exists());
}

#[test]
fn test_overridden_locations_are_used() {
    let inputs = export_folder();
    let out = TempDir::new().unwrap();
    let mut options = ConvertOptions::under(out.path());
    options.locations = options
        .locations
        .with_path(SourceKind::ClinicalDocument, inputs.path().join("export_cda.xml"));
    options.output = out.path().join("nested/dir/health.csv");

    let result = consolidate(&options).unwrap();

    assert_eq!(result.sources[0].status, SourceStatus::Missing);
    assert_eq!(result.sources[1].added, 2);
    assert_eq!(result.sources[2].status, SourceStatus::Missing);
    let (_, rows) = read_rows(&out.path().join("nested/dir/health.csv"));
    assert_eq!(rows.len(), 2);
}

#[test]
fn test_malformed_export_fails_without_stopping_other_sources() {
    let dir = export_folder();
    write_file(
        dir.path(),
        "export.xml",
        r#"<HealthData>
 <Record type="HKQuantityTypeIdentifierStepCount" creationDate="2023-06-16 08:00:00 -0500" startDate="2023-06-16 07:00:00 -0500" endDate="2023-06-16 08:00:00 -0500" value="1200"/>
</Mismatched>
"#,
    );

    let result = consolidate(&ConvertOptions::under(dir.path())).unwrap();

    assert!(matches!(result.sources[0].status, SourceStatus::Failed(_)));
    assert_eq!(result.sources[0].added, 1);
    assert_eq!(result.sources[1].added, 2);
    assert_eq!(result.sources[2].added, 1);
    assert_eq!(result.failed_sources().count(), 1);
    let (_, rows) = read_rows(&dir.path().join("full_health_data.csv"));
    assert_eq!(rows.len(), 4);
}

#[test]
fn test_unwritable_output_is_fatal() {
    let dir = export_folder();
    let mut options = ConvertOptions::under(dir.path());
    options.output = dir.path().join("electrocardiograms");

    assert!(consolidate(&options).is_err());
}
