//! Report aggregation and logging
//!
//! This module turns validation outcomes into the final report and holds
//! the structured logging helpers used across a run.

pub mod logging;
pub mod report;

// Re-export commonly used items
pub use report::{Report, Summary};
