//! Streaming reader for HL7 clinical-document exports (`export_cda.xml`).
//!
//! Only `observation` elements in the `urn:hl7-org:v3` namespace are
//! considered. Each one is assembled from its direct children while the
//! stream advances: `text/type` and `text/value` carry the observation type
//! and value, `effectiveTime/low` and `effectiveTime/high` carry compact
//! timestamps in their `value` attribute. Where a child name repeats, the
//! first occurrence wins.
//!
//! These documents are frequently truncated or otherwise broken. A syntax
//! error stops the scan but keeps everything accepted before it. Besides
//! what the reader rejects, malformed attributes on any element, undefined
//! entities anywhere and content after the root element count as syntax
//! errors.

use std::io::BufRead;
use std::path::Path;

use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use tracing::{debug, info, info_span, warn};

use health_model::{Record, is_target_type};

use crate::context::IngestContext;
use crate::datetime::format_cda_date;
use crate::discovery::open_buffered;
use crate::error::{IngestError, Result};
use crate::export_xml::file_name;
use crate::xml::{check_attributes, is_syntax_error, read_attributes, resolve_reference};

/// HL7 v3 namespace URI.
pub const HL7_NAMESPACE: &[u8] = b"urn:hl7-org:v3";

const OBSERVATION_TAG: &str = "observation";
const VALUE_ATTRIBUTE: [&[u8]; 1] = [b"value"];

/// Outcome of one pass over a clinical document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClinicalDocumentStats {
    /// Records added to the context.
    pub added: usize,
    /// Observation elements fully read, whether or not they were kept.
    pub observations: usize,
    /// True if the scan stopped early on malformed XML.
    pub truncated: bool,
}

/// Extracts allow-listed observations from an HL7 clinical document into `ctx`.
///
/// Malformed markup is not an error: the scan stops, a warning is logged and
/// the records read so far are kept, with [`ClinicalDocumentStats::truncated`]
/// set.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn parse_clinical_document(
    path: &Path,
    ctx: &mut IngestContext,
) -> Result<ClinicalDocumentStats> {
    let span = info_span!("clinical_document", path = %path.display());
    let _guard = span.enter();
    info!("processing {}", path.display());

    let mut reader = NsReader::from_reader(open_buffered(path)?);
    let mut stats = ClinicalDocumentStats::default();
    match scan_document(&mut reader, ctx, &mut stats) {
        Ok(ScanOutcome::Complete) => {}
        Ok(ScanOutcome::Unclosed(open)) => {
            warn!(
                open_elements = open,
                "clinical document ended before all elements were closed"
            );
            warn!("(export.xml likely contains the same data)");
            stats.truncated = true;
        }
        Ok(ScanOutcome::Malformed(problem)) => {
            warn!(
                position = reader.buffer_position(),
                problem = %problem,
                "clinical document has malformed XML, skipping the rest"
            );
            warn!("(export.xml likely contains the same data)");
            stats.truncated = true;
        }
        Err(error) if is_syntax_error(&error) => {
            warn!(
                position = reader.error_position(),
                %error,
                "clinical document has malformed XML, skipping the rest"
            );
            warn!("(export.xml likely contains the same data)");
            stats.truncated = true;
        }
        Err(source) => {
            return Err(IngestError::Xml {
                path: path.to_path_buf(),
                position: reader.error_position() as u64,
                source,
            });
        }
    }

    info!(
        added = stats.added,
        observations = stats.observations,
        truncated = stats.truncated,
        "extracted {} new records from {}",
        stats.added,
        file_name(path)
    );
    Ok(stats)
}

/// How a scan over a clinical document ended.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ScanOutcome {
    /// Every element was closed before end of input.
    Complete,
    /// Input ended with this many elements still open.
    Unclosed(usize),
    /// The scan stopped on markup the reader itself accepts but which is
    /// not well-formed.
    Malformed(String),
}

/// Scans to end of input or to the first well-formedness problem.
fn scan_document<R: BufRead>(
    reader: &mut NsReader<R>,
    ctx: &mut IngestContext,
    stats: &mut ClinicalDocumentStats,
) -> std::result::Result<ScanOutcome, quick_xml::Error> {
    let mut buf = Vec::new();
    let mut drafts: Vec<ObservationDraft> = Vec::new();
    let mut depth = 0usize;
    let mut root_closed = false;
    loop {
        let (namespace, event) = reader.read_resolved_event_into(&mut buf)?;
        let in_hl7 = matches!(namespace, ResolveResult::Bound(Namespace(HL7_NAMESPACE)));
        if root_closed && !is_trailing_misc(&event) {
            return Ok(ScanOutcome::Malformed("content after the root element".to_string()));
        }
        match event {
            Event::Start(element) => {
                check_attributes(&element, reader.decoder())?;
                depth += 1;
                let name = element_name(&element, in_hl7);
                if let Some(draft) = drafts.last_mut() {
                    draft.enter(&name);
                    draft.capture_attributes(&element, reader)?;
                }
                if in_hl7 && name == OBSERVATION_TAG {
                    drafts.push(ObservationDraft::default());
                }
            }
            Event::Empty(element) => {
                check_attributes(&element, reader.decoder())?;
                if let Some(draft) = drafts.last_mut() {
                    draft.enter(&element_name(&element, in_hl7));
                    draft.capture_attributes(&element, reader)?;
                    draft.leave();
                }
                root_closed = depth == 0;
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                root_closed = depth == 0;
                if drafts.last().is_some_and(ObservationDraft::at_root) {
                    if let Some(draft) = drafts.pop() {
                        stats.observations += 1;
                        if let Some(record) = draft.finish()
                            && ctx.insert(record)
                        {
                            stats.added += 1;
                        }
                    }
                    if let Some(parent) = drafts.last_mut() {
                        parent.leave();
                    }
                } else if let Some(draft) = drafts.last_mut() {
                    draft.leave();
                }
            }
            Event::Text(text) => {
                if let Some(target) = drafts.last_mut().and_then(ObservationDraft::text_target) {
                    target.push_str(&reader.decoder().decode(&text)?);
                }
            }
            Event::CData(data) => {
                if let Some(target) = drafts.last_mut().and_then(ObservationDraft::text_target) {
                    target.push_str(&reader.decoder().decode(&data)?);
                }
            }
            Event::GeneralRef(reference) => {
                let Some(resolved) = resolve_reference(&reference)? else {
                    return Ok(ScanOutcome::Malformed(format!(
                        "undefined entity &{};",
                        String::from_utf8_lossy(&reference)
                    )));
                };
                if let Some(target) = drafts.last_mut().and_then(ObservationDraft::text_target) {
                    target.push_str(&resolved);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    debug!(observations = stats.observations, "clinical document scan complete");
    Ok(match depth {
        0 => ScanOutcome::Complete,
        open => ScanOutcome::Unclosed(open),
    })
}

/// Events allowed after the root element: comments, processing
/// instructions and whitespace.
fn is_trailing_misc(event: &Event<'_>) -> bool {
    match event {
        Event::Comment(_) | Event::PI(_) | Event::Eof => true,
        Event::Text(text) => text.iter().all(u8::is_ascii_whitespace),
        _ => false,
    }
}

/// Local name of an element, or empty when it lies outside the HL7 namespace.
fn element_name(element: &BytesStart<'_>, in_hl7: bool) -> String {
    if in_hl7 {
        String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
    } else {
        String::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Type,
    Value,
    Low,
    High,
}

#[derive(Debug)]
struct Frame {
    name: String,
    /// Whether this element and all its ancestors are the first of their name.
    first: bool,
    children: Vec<String>,
}

/// An observation whose end tag has not been reached yet.
#[derive(Debug, Default)]
struct ObservationDraft {
    /// Open elements below the observation, innermost last.
    path: Vec<Frame>,
    /// Names of direct children seen so far.
    children: Vec<String>,
    record_type: Option<String>,
    value: Option<String>,
    low: Option<String>,
    high: Option<String>,
}

impl ObservationDraft {
    fn at_root(&self) -> bool {
        self.path.is_empty()
    }

    fn enter(&mut self, name: &str) {
        let (parent_first, siblings) = match self.path.last_mut() {
            Some(frame) => (frame.first, &mut frame.children),
            None => (true, &mut self.children),
        };
        let first_of_name = if siblings.iter().any(|seen| seen == name) {
            false
        } else {
            siblings.push(name.to_string());
            true
        };
        self.path.push(Frame {
            name: name.to_string(),
            first: parent_first && first_of_name,
            children: Vec::new(),
        });
        match self.slot() {
            Some(Slot::Type) => {
                self.record_type.get_or_insert_with(String::new);
            }
            Some(Slot::Value) => {
                self.value.get_or_insert_with(String::new);
            }
            _ => {}
        }
    }

    fn leave(&mut self) {
        self.path.pop();
    }

    fn slot(&self) -> Option<Slot> {
        let [outer, inner] = self.path.as_slice() else {
            return None;
        };
        if !inner.first {
            return None;
        }
        match (outer.name.as_str(), inner.name.as_str()) {
            ("text", "type") => Some(Slot::Type),
            ("text", "value") => Some(Slot::Value),
            ("effectiveTime", "low") => Some(Slot::Low),
            ("effectiveTime", "high") => Some(Slot::High),
            _ => None,
        }
    }

    /// Reads the `value` attribute of a just-entered `low`/`high` element.
    fn capture_attributes<R>(
        &mut self,
        element: &BytesStart<'_>,
        reader: &NsReader<R>,
    ) -> std::result::Result<(), quick_xml::Error> {
        let target = match self.slot() {
            Some(Slot::Low) => &mut self.low,
            Some(Slot::High) => &mut self.high,
            _ => return Ok(()),
        };
        let [value] = read_attributes(element, VALUE_ATTRIBUTE, reader.decoder())?;
        *target = Some(value.unwrap_or_default());
        Ok(())
    }

    /// Buffer receiving character data at the current position, if any.
    ///
    /// Only text ahead of the first child element of `type` or `value` is
    /// captured.
    fn text_target(&mut self) -> Option<&mut String> {
        if self.path.last().is_some_and(|frame| !frame.children.is_empty()) {
            return None;
        }
        match self.slot()? {
            Slot::Type => self.record_type.as_mut(),
            Slot::Value => self.value.as_mut(),
            Slot::Low | Slot::High => None,
        }
    }

    fn finish(self) -> Option<Record> {
        let record_type = self.record_type.filter(|t| is_target_type(t))?;
        let start = self.low.as_deref().map(format_cda_date).unwrap_or_default();
        let end = self.high.as_deref().map(format_cda_date).unwrap_or_default();
        Some(Record::new(
            start.clone(),
            start,
            end,
            record_type,
            self.value.unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(xml: &str) -> (IngestContext, ClinicalDocumentStats, ScanOutcome) {
        let mut reader = NsReader::from_reader(xml.as_bytes());
        let mut ctx = IngestContext::new();
        let mut stats = ClinicalDocumentStats::default();
        let outcome = scan_document(&mut reader, &mut ctx, &mut stats).expect("scan document");
        (ctx, stats, outcome)
    }

    #[test]
    fn first_type_and_value_win() {
        let (ctx, stats, outcome) = scan(
            r#"<ClinicalDocument xmlns="urn:hl7-org:v3"><observation>
                 <text>
                   <type>HKQuantityTypeIdentifierBodyMass</type>
                   <value>70.2</value>
                   <type>HKQuantityTypeIdentifierStepCount</type>
                   <value>99</value>
                 </text>
               </observation></ClinicalDocument>"#,
        );
        assert_eq!(outcome, ScanOutcome::Complete);
        assert_eq!(stats.added, 1);
        assert_eq!(ctx.records()[0].record_type, "HKQuantityTypeIdentifierBodyMass");
        assert_eq!(ctx.records()[0].value, "70.2");
    }

    #[test]
    fn ignores_elements_outside_hl7_namespace() {
        let (ctx, stats, _) = scan(
            r#"<ClinicalDocument xmlns="urn:example:other"><observation>
                 <text><type>HKQuantityTypeIdentifierBodyMass</type></text>
               </observation></ClinicalDocument>"#,
        );
        assert_eq!(stats.observations, 0);
        assert!(ctx.is_empty());
    }

    #[test]
    fn prefixed_namespace_is_resolved() {
        let (ctx, _, _) = scan(
            r#"<cda:ClinicalDocument xmlns:cda="urn:hl7-org:v3"><cda:observation>
                 <cda:text><cda:type>HKQuantityTypeIdentifierVO2Max</cda:type><cda:value>44.1</cda:value></cda:text>
                 <cda:effectiveTime><cda:low value="20240301070000+0000"/></cda:effectiveTime>
               </cda:observation></cda:ClinicalDocument>"#,
        );
        let record = &ctx.records()[0];
        assert_eq!(record.start_date, "2024-03-01 07:00:00 +0000");
        assert_eq!(record.end_date, "");
        assert_eq!(record.value, "44.1");
    }

    #[test]
    fn nested_type_elements_are_not_direct_children() {
        let (ctx, stats, _) = scan(
            r#"<ClinicalDocument xmlns="urn:hl7-org:v3"><observation>
                 <text><section><type>HKQuantityTypeIdentifierHeartRate</type></section></text>
               </observation></ClinicalDocument>"#,
        );
        assert_eq!(stats.observations, 1);
        assert!(ctx.is_empty());
    }

    #[test]
    fn nested_observations_are_read_independently() {
        let (ctx, stats, _) = scan(
            r#"<ClinicalDocument xmlns="urn:hl7-org:v3"><observation>
                 <text><type>HKQuantityTypeIdentifierHeartRate</type><value>80</value></text>
                 <entryRelationship><observation>
                   <text><type>HKQuantityTypeIdentifierRestingHeartRate</type><value>55</value></text>
                 </observation></entryRelationship>
                 <effectiveTime><low value="20240101000000"/><high value="20240101000100"/></effectiveTime>
               </observation></ClinicalDocument>"#,
        );
        assert_eq!(stats.observations, 2);
        let types: Vec<&str> = ctx.records().iter().map(|r| r.record_type.as_str()).collect();
        assert_eq!(
            types,
            [
                "HKQuantityTypeIdentifierRestingHeartRate",
                "HKQuantityTypeIdentifierHeartRate"
            ]
        );
        assert_eq!(ctx.records()[1].start_date, "2024-01-01 00:00:00");
        assert_eq!(ctx.records()[1].end_date, "2024-01-01 00:01:00");
        assert_eq!(ctx.records()[0].start_date, "");
    }

    #[test]
    fn entities_in_value_are_resolved() {
        let (ctx, _, _) = scan(
            r#"<ClinicalDocument xmlns="urn:hl7-org:v3"><observation>
                 <text><type>HKCategoryTypeIdentifierSleepAnalysis</type><value>In&amp;Bed&#33;</value></text>
               </observation></ClinicalDocument>"#,
        );
        assert_eq!(ctx.records()[0].value, "In&Bed!");
    }

    #[test]
    fn type_text_after_a_child_element_is_dropped() {
        let (ctx, stats, outcome) = scan(
            r#"<ClinicalDocument xmlns="urn:hl7-org:v3"><observation>
                 <text><type>HKQuantityTypeIdentifierStep<b/>Count</type><value>10</value></text>
               </observation></ClinicalDocument>"#,
        );
        assert_eq!(outcome, ScanOutcome::Complete);
        assert_eq!(stats.observations, 1);
        assert!(ctx.is_empty());
    }

    #[test]
    fn trailing_comments_and_whitespace_are_allowed() {
        let (_, stats, outcome) = scan(
            "<ClinicalDocument xmlns=\"urn:hl7-org:v3\"/>\n<!-- end -->\n<?done?>\n",
        );
        assert_eq!(outcome, ScanOutcome::Complete);
        assert_eq!(stats.observations, 0);
    }

    #[test]
    fn undefined_entity_outside_an_observation_stops_the_scan() {
        let (_, _, outcome) = scan(
            r#"<ClinicalDocument xmlns="urn:hl7-org:v3"><title>&nbsp;</title></ClinicalDocument>"#,
        );
        assert_eq!(outcome, ScanOutcome::Malformed("undefined entity &nbsp;;".to_string()));
    }
}
