use std::fmt;

/// Conventional file name of the flat attribute export.
pub const EXPORT_XML_FILE: &str = "export.xml";

/// Conventional file name of the HL7 clinical-document export.
pub const CDA_XML_FILE: &str = "export_cda.xml";

/// Conventional directory holding ECG session files.
pub const ECG_DIR: &str = "electrocardiograms";

/// Default output file name written next to the inputs.
pub const DEFAULT_OUTPUT_FILE: &str = "full_health_data.csv";

/// The input sources, in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    ExportXml,
    ClinicalDocument,
    Electrocardiograms,
}

impl SourceKind {
    /// All sources in the order the pipeline processes them.
    pub const ALL: [SourceKind; 3] = [
        SourceKind::ExportXml,
        SourceKind::ClinicalDocument,
        SourceKind::Electrocardiograms,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SourceKind::ExportXml => "Health export",
            SourceKind::ClinicalDocument => "Clinical document",
            SourceKind::Electrocardiograms => "Electrocardiograms",
        }
    }

    /// Path of this source relative to the export base directory.
    pub fn relative_path(self) -> &'static str {
        match self {
            SourceKind::ExportXml => EXPORT_XML_FILE,
            SourceKind::ClinicalDocument => CDA_XML_FILE,
            SourceKind::Electrocardiograms => ECG_DIR,
        }
    }

    /// Whether the source is a directory rather than a single file.
    pub fn is_directory(self) -> bool {
        matches!(self, SourceKind::Electrocardiograms)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
