//! Canonical link keys.
//!
//! A `NormalizedLink` is what the cache and the in-flight arena are keyed
//! by, so two spellings of the same target must normalize identically.
//! Normalization never touches the network or the filesystem.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::core::types::LinkReference;

static SCHEME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z0-9+.\-]*):").expect("Failed to compile scheme pattern")
});

/// How a raw target should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// `http(s)://` or protocol-relative `//host`
    Remote,
    /// Path on disk, relative to the document or to the root
    Local,
    /// Pure in-page anchor such as `#usage`
    Anchor,
    /// A scheme this tool does not check (`mailto:`, `ftp:`, ...)
    Unsupported,
}

/// Classify a raw target without parsing it fully.
pub fn classify(raw: &str) -> TargetKind {
    let raw = raw.trim();
    if raw.starts_with('#') {
        return TargetKind::Anchor;
    }
    if raw.starts_with("//") {
        return TargetKind::Remote;
    }
    match SCHEME.captures(raw).and_then(|c| c.get(1)) {
        Some(scheme) => match scheme.as_str().to_ascii_lowercase().as_str() {
            "http" | "https" => TargetKind::Remote,
            _ => TargetKind::Unsupported,
        },
        None => TargetKind::Local,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LinkKind {
    Remote,
    Local,
}

/// Canonical, deduplicated form of a link target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedLink {
    kind: LinkKind,
    key: String,
}

/// A target that cannot be turned into a checkable link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedTarget(pub String);

impl fmt::Display for MalformedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed target: {}", self.0)
    }
}

impl std::error::Error for MalformedTarget {}

impl NormalizedLink {
    /// Normalize a remote URL: lowercase scheme and host, default port
    /// dropped, empty path becomes `/`, fragment removed.
    pub fn remote(raw: &str) -> Result<Self, MalformedTarget> {
        let raw = raw.trim();
        let candidate = if raw.starts_with("//") {
            format!("https:{raw}")
        } else {
            raw.to_string()
        };

        let mut url = Url::parse(&candidate).map_err(|e| MalformedTarget(format!("{raw} ({e})")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(MalformedTarget(format!("{raw} (unsupported scheme)")));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(MalformedTarget(format!("{raw} (missing host)")));
        }
        url.set_fragment(None);

        Ok(Self {
            kind: LinkKind::Remote,
            key: url.to_string(),
        })
    }

    /// Normalize a local target against the directory of the document that
    /// references it. Targets starting with `/` are taken relative to `root`.
    pub fn local(raw: &str, document_dir: &Path, root: &Path) -> Result<Self, MalformedTarget> {
        let without_fragment = raw.trim().split('#').next().unwrap_or_default();
        let path_part = without_fragment.split('?').next().unwrap_or_default();

        if path_part.contains('\0') {
            return Err(MalformedTarget(format!("{raw} (embedded NUL)")));
        }

        let joined = if let Some(rooted) = path_part.strip_prefix('/') {
            root.join(rooted)
        } else {
            document_dir.join(path_part)
        };

        Ok(Self {
            kind: LinkKind::Local,
            key: lexically_normalize(&joined).display().to_string(),
        })
    }

    /// Normalize the target of a reference found under `root`.
    pub fn from_reference(link: &LinkReference, root: &Path) -> Result<Self, MalformedTarget> {
        match classify(&link.raw_target) {
            TargetKind::Remote => Self::remote(&link.raw_target),
            TargetKind::Local => Self::local(&link.raw_target, link.document_dir(), root),
            TargetKind::Anchor | TargetKind::Unsupported => Err(MalformedTarget(format!(
                "{} (not a checkable link)",
                link.raw_target
            ))),
        }
    }

    pub fn kind(&self) -> LinkKind {
        self.kind
    }

    pub fn is_remote(&self) -> bool {
        self.kind == LinkKind::Remote
    }

    /// The cache and lock key.
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Filesystem path for local links.
    pub fn as_path(&self) -> Option<&Path> {
        match self.kind {
            LinkKind::Local => Some(Path::new(&self.key)),
            LinkKind::Remote => None,
        }
    }
}

impl fmt::Display for NormalizedLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Resolve `.` and `..` components without consulting the filesystem.
fn lexically_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                ) && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
