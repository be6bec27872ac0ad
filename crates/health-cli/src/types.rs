use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use health_model::SourceKind;

/// Outcome of one `convert` run.
#[derive(Debug)]
pub struct ConvertResult {
    /// Written CSV path, `None` for a dry run.
    pub output: Option<PathBuf>,
    pub sources: Vec<SourceSummary>,
    pub total_records: usize,
    pub type_counts: BTreeMap<String, usize>,
}

impl ConvertResult {
    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceSummary> {
        self.sources
            .iter()
            .filter(|summary| matches!(summary.status, SourceStatus::Failed(_)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSummary {
    pub kind: SourceKind,
    pub path: PathBuf,
    pub status: SourceStatus,
    /// Records this source contributed after deduplication.
    pub added: usize,
    /// Human-readable breakdown shown in the summary table.
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    Processed,
    /// Not present at the expected location.
    Missing,
    /// Disabled on the command line.
    Skipped,
    /// Read up to a malformed region; earlier records were kept.
    Truncated,
    Failed(String),
}

impl SourceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SourceStatus::Processed => "processed",
            SourceStatus::Missing => "missing",
            SourceStatus::Skipped => "skipped",
            SourceStatus::Truncated => "truncated",
            SourceStatus::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceStatus::Failed(message) => write!(f, "failed: {message}"),
            other => f.write_str(other.label()),
        }
    }
}
