use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::constants::labels;

/// A link target found in a document.
///
/// Produced by the extractor, consumed by the validator pool. The raw
/// target is kept exactly as written so the report can point at it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LinkReference {
    /// Document the link was found in
    pub source_document: PathBuf,
    /// Target as written in the document
    pub raw_target: String,
    /// Line number where the link was found (1-indexed)
    pub line_number: u64,
}

/// Errors that can occur when building a `LinkReference`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkReferenceError {
    /// Target is missing or empty
    MissingTarget,
    /// Source document path is empty
    MissingDocument,
    /// Line number is invalid (zero)
    InvalidLineNumber,
}

impl fmt::Display for LinkReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTarget => write!(f, "Link target is required and cannot be empty"),
            Self::MissingDocument => write!(f, "Source document is required and cannot be empty"),
            Self::InvalidLineNumber => write!(f, "Line number must be greater than 0"),
        }
    }
}

impl std::error::Error for LinkReferenceError {}

impl LinkReference {
    /// Create a new LinkReference with validation.
    ///
    /// # Examples
    /// ```
    /// use linkrot::core::types::LinkReference;
    ///
    /// let link = LinkReference::new("docs/intro.md", "./setup.md", 12).unwrap();
    /// assert_eq!(link.raw_target, "./setup.md");
    /// assert_eq!(link.line_number, 12);
    /// ```
    pub fn new<P: Into<PathBuf>, S: Into<String>>(
        source_document: P,
        raw_target: S,
        line_number: u64,
    ) -> Result<Self, LinkReferenceError> {
        let source_document = source_document.into();
        let raw_target = raw_target.into();

        if raw_target.trim().is_empty() {
            return Err(LinkReferenceError::MissingTarget);
        }
        if source_document.as_os_str().is_empty() {
            return Err(LinkReferenceError::MissingDocument);
        }
        if line_number == 0 {
            return Err(LinkReferenceError::InvalidLineNumber);
        }

        Ok(Self {
            source_document,
            raw_target: raw_target.trim().to_string(),
            line_number,
        })
    }

    /// Directory local targets are resolved against.
    pub fn document_dir(&self) -> &Path {
        self.source_document.parent().unwrap_or_else(|| Path::new(""))
    }
}

/// Result of validating a single link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum LinkStatus {
    /// Target exists / answered successfully
    Ok,
    /// Target is confirmed missing or unreachable
    Broken(String),
    /// Target matched an exclusion pattern and was not checked
    Excluded,
    /// Indeterminate: network failure, run timeout, malformed target
    Error(String),
}

impl LinkStatus {
    /// Whether this status makes the overall run fail.
    pub fn is_failure(&self) -> bool {
        matches!(self, LinkStatus::Broken(_) | LinkStatus::Error(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            LinkStatus::Ok => labels::OK,
            LinkStatus::Broken(_) => labels::BROKEN,
            LinkStatus::Excluded => labels::EXCLUDED,
            LinkStatus::Error(_) => labels::ERROR,
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            LinkStatus::Broken(detail) | LinkStatus::Error(detail) => Some(detail),
            _ => None,
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detail() {
            Some(detail) => write!(f, "{} ({detail})", self.label()),
            None => write!(f, "{}", self.label()),
        }
    }
}

/// One outcome per `LinkReference` per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub link: LinkReference,
    #[serde(flatten)]
    pub status: LinkStatus,
}

impl ValidationOutcome {
    pub fn new(link: LinkReference, status: LinkStatus) -> Self {
        Self { link, status }
    }

    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} {}",
            self.link.source_document.display(),
            self.link.line_number,
            self.status.label(),
            self.link.raw_target
        )?;
        if let Some(detail) = self.status.detail() {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    #[test]
    fn test_link_reference__valid() {
        let link = LinkReference::new("docs/a.md", "  https://example.com  ", 3).unwrap();
        assert_eq!(link.raw_target, "https://example.com");
        assert_eq!(link.source_document, PathBuf::from("docs/a.md"));
        assert_eq!(link.document_dir(), Path::new("docs"));
    }

    #[test]
    fn test_link_reference__rejects_invalid_input() {
        assert_eq!(
            LinkReference::new("a.md", "   ", 1),
            Err(LinkReferenceError::MissingTarget)
        );
        assert_eq!(
            LinkReference::new("", "x.md", 1),
            Err(LinkReferenceError::MissingDocument)
        );
        assert_eq!(
            LinkReference::new("a.md", "x.md", 0),
            Err(LinkReferenceError::InvalidLineNumber)
        );
    }

    #[test]
    fn test_link_status__failure_classification() {
        assert!(!LinkStatus::Ok.is_failure());
        assert!(!LinkStatus::Excluded.is_failure());
        assert!(LinkStatus::Broken("HTTP 404".into()).is_failure());
        assert!(LinkStatus::Error("dns error".into()).is_failure());
    }

    #[test]
    fn test_validation_outcome__to_string() {
        let link = LinkReference::new("docs/a.md", "./missing.md", 7).unwrap();
        let broken = ValidationOutcome::new(link.clone(), LinkStatus::Broken("file not found".into()));
        assert_eq!(
            broken.to_string(),
            "docs/a.md:7: BROKEN ./missing.md (file not found)"
        );

        let excluded = ValidationOutcome::new(link, LinkStatus::Excluded);
        assert_eq!(excluded.to_string(), "docs/a.md:7: EXCLUDED ./missing.md");
    }

    #[test]
    fn test_validation_outcome__json_shape() {
        let link = LinkReference::new("a.md", "https://example.com/404", 2).unwrap();
        let outcome = ValidationOutcome::new(link, LinkStatus::Broken("HTTP 404".into()));
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["status"], "broken");
        assert_eq!(json["detail"], "HTTP 404");
        assert_eq!(json["link"]["line_number"], 2);
    }
}
