//! Shared fixtures for ingestion tests.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
    path
}

pub fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

/// A clinical-document observation in the HL7 default namespace.
pub fn cda_observation(record_type: &str, value: &str, low: &str, high: &str) -> String {
    format!(
        r#"<component><observation classCode="OBS" moodCode="EVN">
  <text>
    <sourceName>Watch</sourceName>
    <value>{value}</value>
    <type>{record_type}</type>
    <unit>count/min</unit>
  </text>
  <statusCode code="completed"/>
  <effectiveTime>
    <low value="{low}"/>
    <high value="{high}"/>
  </effectiveTime>
  <value xsi:type="PQ" value="{value}" unit="count/min"/>
</observation></component>
"#
    )
}

pub fn cda_document(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ClinicalDocument xmlns="urn:hl7-org:v3" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
<entry><organizer>
{body}</organizer></entry>
</ClinicalDocument>
"#
    )
}
