//! Output generation for consolidated health records.
//!
//! Records are ordered by their `startDate` string and written as a single
//! UTF-8 CSV file with the columns `creationDate, startDate, endDate, type, value`.

mod error;
mod summary;
mod writer;

pub use error::{OutputError, Result};
pub use summary::type_tally;
pub use writer::{sort_records, write_records, write_records_csv};
