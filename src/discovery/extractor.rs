use grep::regex::RegexMatcher;
use grep::searcher::Searcher;
use grep::searcher::sinks::UTF8;
use linkify::{LinkFinder, LinkKind};
use memchr::memmem;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::Result;
use crate::core::normalize::{TargetKind, classify};
use crate::core::types::LinkReference;
use crate::discovery::path_utils::expand_root;

/// Lines worth a closer look: anything that can hold a link, plus code
/// fences so fenced blocks can be tracked.
const CANDIDATE_LINE_PATTERN: &str =
    r#"(?im)(https?://|\]\s*\(|^\s{0,3}\[[^\]]+\]:|href\s*=|src\s*=|^\s*(```|~~~))"#;

static CANDIDATE_MATCHER: Lazy<RegexMatcher> = Lazy::new(|| {
    RegexMatcher::new(CANDIDATE_LINE_PATTERN).expect("Failed to compile candidate line pattern")
});

// [text](target "title") and ![alt](target); one level of balanced
// parentheses is allowed inside the target
static INLINE_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"!?\[[^\]]*\]\(\s*<?((?:[^()\s<>]|\([^()\s]*\))+)>?(?:\s+["'][^"']*["'])?\s*\)"#)
        .expect("Failed to compile inline link pattern")
});

// [id]: target
static REFERENCE_DEFINITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s{0,3}\[[^\]]+\]:\s*<?([^\s>]+)>?").expect("Failed to compile reference pattern")
});

// <https://example.com>
static AUTOLINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(https?://[^>\s]+)>").expect("Failed to compile autolink pattern")
});

// href="..." / src='...'
static HTML_ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(?:href|src)\s*=\s*["']([^"']+)["']"#)
        .expect("Failed to compile HTML attribute pattern")
});

static LINK_FINDER: Lazy<LinkFinder> = Lazy::new(|| {
    let mut finder = LinkFinder::new();
    finder.kinds(&[LinkKind::Url]);
    finder
});

/// A non-fatal problem found while reading a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub document: PathBuf,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.document.display(), self.message)
    }
}

impl std::error::Error for Diagnostic {}

/// All references and diagnostics for a set of documents, in document order.
#[derive(Debug, Default)]
pub struct Extraction {
    pub references: Vec<LinkReference>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Scans the documents under a root for link references.
#[derive(Debug, Clone)]
pub struct Extractor {
    root: PathBuf,
    documents: Vec<PathBuf>,
}

impl Extractor {
    /// Resolve the documents to scan. Fails only when the root is unreadable.
    pub fn new(root: &Path, file_types: &HashSet<String>) -> Result<Self> {
        let documents = expand_root(root, file_types)?;
        let root = if root.is_file() {
            root.parent().unwrap_or_else(|| Path::new("")).to_path_buf()
        } else {
            root.to_path_buf()
        };

        Ok(Self { root, documents })
    }

    /// Directory rooted local targets (`/img/x.png`) resolve against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn documents(&self) -> &[PathBuf] {
        &self.documents
    }

    /// Lazily walk every document. Calling this again restarts from the
    /// first document.
    pub fn references(&self) -> References<'_> {
        References {
            documents: &self.documents,
            next_document: 0,
            pending: Vec::new().into_iter(),
            diagnostics: Vec::new(),
        }
    }

    /// Extract every document in parallel. The result is in the same order
    /// `references()` would produce.
    pub fn extract_all(&self) -> Extraction {
        let per_document: Vec<std::result::Result<Vec<LinkReference>, Diagnostic>> = self
            .documents
            .par_iter()
            .map(|path| extract_document(path))
            .collect();

        let mut extraction = Extraction::default();
        for document in per_document {
            match document {
                Ok(references) => extraction.references.extend(references),
                Err(diagnostic) => {
                    log::warn!("{diagnostic}");
                    extraction.diagnostics.push(diagnostic);
                }
            }
        }
        extraction
    }
}

/// Lazy, restartable sequence of references over an extractor's documents.
pub struct References<'a> {
    documents: &'a [PathBuf],
    next_document: usize,
    pending: std::vec::IntoIter<LinkReference>,
    diagnostics: Vec<Diagnostic>,
}

impl References<'_> {
    /// Diagnostics for the documents visited so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl Iterator for References<'_> {
    type Item = LinkReference;

    fn next(&mut self) -> Option<LinkReference> {
        loop {
            if let Some(reference) = self.pending.next() {
                return Some(reference);
            }

            let path = self.documents.get(self.next_document)?;
            self.next_document += 1;

            match extract_document(path) {
                Ok(references) => self.pending = references.into_iter(),
                Err(diagnostic) => {
                    log::warn!("{diagnostic}");
                    self.diagnostics.push(diagnostic);
                }
            }
        }
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "md" | "markdown"))
}

/// Opening or closing fence marker of a Markdown code block.
fn fence_marker(line: &str) -> Option<&'static str> {
    let trimmed = line.trim_start();
    if trimmed.starts_with("```") {
        Some("```")
    } else if trimmed.starts_with("~~~") {
        Some("~~~")
    } else {
        None
    }
}

/// Extract the references of one document.
///
/// Malformed markup (an unterminated code fence, content that is not UTF-8,
/// an unreadable file) yields a diagnostic and no references at all.
pub fn extract_document(path: &Path) -> std::result::Result<Vec<LinkReference>, Diagnostic> {
    let diagnostic = |message: String| Diagnostic {
        document: path.to_path_buf(),
        message,
    };

    let track_fences = is_markdown(path);
    let mut open_fence: Option<(&'static str, u64)> = None;
    let mut references = Vec::new();

    let bytes = fs::read(path).map_err(|e| diagnostic(format!("could not be read: {e}")))?;
    if let Err(e) = std::str::from_utf8(&bytes) {
        return Err(diagnostic(format!("not valid UTF-8: {e}")));
    }

    Searcher::new()
        .search_slice(
            &*CANDIDATE_MATCHER,
            &bytes,
            UTF8(|line_number, line| {
                if track_fences && let Some(marker) = fence_marker(line) {
                    open_fence = match open_fence {
                        None => Some((marker, line_number)),
                        Some((open, _)) if open == marker => None,
                        still_open => still_open,
                    };
                    return Ok(true);
                }
                if open_fence.is_some() {
                    return Ok(true);
                }

                for target in parse_targets(line) {
                    if let Ok(reference) = LinkReference::new(path, target, line_number) {
                        references.push(reference);
                    }
                }
                Ok(true)
            }),
        )
        .map_err(|e| diagnostic(format!("could not be read: {e}")))?;

    if let Some((_, opened_at)) = open_fence {
        return Err(diagnostic(format!(
            "unterminated code fence opened at line {opened_at}"
        )));
    }

    Ok(references)
}

/// Pull checkable targets out of a single line, in order of appearance,
/// each distinct target once.
pub fn parse_targets(line: &str) -> Vec<String> {
    let line = line.trim_end();
    let mut found: Vec<(usize, &str)> = Vec::new();

    let mut capture_all = |pattern: &Regex| {
        for caps in pattern.captures_iter(line) {
            if let Some(m) = caps.get(1) {
                found.push((m.start(), m.as_str()));
            }
        }
    };

    if memmem::find(line.as_bytes(), b"](").is_some() {
        capture_all(&INLINE_LINK);
    }
    capture_all(&REFERENCE_DEFINITION);
    capture_all(&AUTOLINK);
    capture_all(&HTML_ATTRIBUTE);

    for link in LINK_FINDER.links(line) {
        found.push((link.start(), link.as_str()));
    }

    // Stable sort: on a shared start offset the structured match wins over linkify
    found.sort_by_key(|(start, _)| *start);
    found.dedup_by_key(|(start, _)| *start);

    let mut seen = HashSet::new();
    found
        .into_iter()
        .map(|(_, target)| target)
        .filter(|target| matches!(classify(target), TargetKind::Remote | TargetKind::Local))
        .filter(|target| seen.insert(*target))
        .map(str::to_string)
        .collect()
}
