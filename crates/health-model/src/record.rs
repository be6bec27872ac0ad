use serde::Serialize;

/// Output column names, in file order.
pub const RECORD_COLUMNS: [&str; 5] = ["creationDate", "startDate", "endDate", "type", "value"];

/// A single normalized observation.
///
/// Every source (flat export, clinical document, ECG sessions) projects its
/// observations into this shape. Fields are opaque strings; no coercion is
/// applied to dates or values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Record {
    #[serde(rename = "creationDate")]
    pub creation_date: String,
    #[serde(rename = "startDate")]
    pub start_date: String,
    #[serde(rename = "endDate")]
    pub end_date: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub value: String,
}

impl Record {
    pub fn new(
        creation_date: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
        record_type: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            creation_date: creation_date.into(),
            start_date: start_date.into(),
            end_date: end_date.into(),
            record_type: record_type.into(),
            value: value.into(),
        }
    }

    /// Returns the identity key used for cross-source deduplication.
    #[must_use]
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey {
            creation_date: self.creation_date.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            record_type: self.record_type.clone(),
            value: self.value.clone(),
        }
    }

    /// Fields in [`RECORD_COLUMNS`] order.
    pub fn fields(&self) -> [&str; 5] {
        [
            &self.creation_date,
            &self.start_date,
            &self.end_date,
            &self.record_type,
            &self.value,
        ]
    }
}

/// The five-field tuple two records must share to be considered duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    pub creation_date: String,
    pub start_date: String,
    pub end_date: String,
    pub record_type: String,
    pub value: String,
}

impl From<&Record> for IdentityKey {
    fn from(record: &Record) -> Self {
        record.identity_key()
    }
}
