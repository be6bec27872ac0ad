//! CLI library components for the health export consolidator.

pub mod logging;
pub mod pipeline;
pub mod types;
