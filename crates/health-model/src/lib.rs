//! Core types shared by the health export ingestion crates.

pub mod record;
pub mod source;
pub mod types;

pub use record::{IdentityKey, RECORD_COLUMNS, Record};
pub use source::{CDA_XML_FILE, DEFAULT_OUTPUT_FILE, ECG_DIR, EXPORT_XML_FILE, SourceKind};
pub use types::{
    ECG_TYPE, TARGET_TYPES, TargetType, TypeCategory, is_target_type, sorted_target_identifiers,
    target_type,
};
