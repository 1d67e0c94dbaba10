//! Link rot detection for documentation trees.
//!
//! Extracts link references from Markdown, HTML and text documents,
//! validates them through a bounded worker pool backed by a persistent
//! cache, and aggregates the outcomes into a deterministic report.

pub mod cache;
pub mod config;
pub mod core;
pub mod discovery;
pub mod pipeline;
pub mod reporting;
pub mod ui;
pub mod validation;

pub use crate::cache::{CacheEntry, CacheStatus, CacheStore};
pub use crate::config::{CliConfig, Config};
pub use crate::core::{LinkReference, LinkStatus, LinkrotError, NormalizedLink, Result, ValidationOutcome};
pub use crate::discovery::{Diagnostic, Extractor};
pub use crate::pipeline::{run, run_with_probe};
pub use crate::reporting::{Report, Summary};
pub use crate::validation::{LinkProbe, ValidateLinks, ValidatorPool};
