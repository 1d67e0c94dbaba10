//! Link discovery and document processing
//!
//! This module walks the content tree and extracts link references from
//! Markdown, HTML and plain-text documents.

pub mod extractor;
pub mod path_utils;

// Re-export commonly used items
pub use extractor::{Diagnostic, Extraction, Extractor, References, extract_document};
pub use path_utils::expand_root;
