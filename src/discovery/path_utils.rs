use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{LinkrotError, Result};

/// Expand the root into the sorted list of documents to scan.
///
/// A root that is a file is scanned regardless of its extension. A
/// directory is walked recursively honouring `.gitignore`, hidden files
/// included, `.git` itself skipped. Only the root being unreadable is
/// fatal; unreadable entries below it are logged and skipped.
pub fn expand_root(root: &Path, file_types: &HashSet<String>) -> Result<Vec<PathBuf>> {
    let metadata = fs::metadata(root).map_err(|e| {
        LinkrotError::RootUnreadable(format!("'{}': {}", root.display(), e))
    })?;

    if metadata.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    // Walk errors below the root are not fatal, but the root itself must list
    fs::read_dir(root).map_err(|e| {
        LinkrotError::RootUnreadable(format!("'{}': {}", root.display(), e))
    })?;

    let mut builder = ignore::WalkBuilder::new(root);
    builder
        .hidden(false)
        .require_git(false)
        .filter_entry(|entry| entry.file_name() != ".git");

    let mut documents = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("Skipping unreadable entry: {err}");
                continue;
            }
        };

        let path = entry.path();
        if entry.file_type().is_some_and(|t| t.is_file()) && has_wanted_extension(path, file_types)
        {
            documents.push(path.to_path_buf());
        }
    }

    documents.sort();
    Ok(documents)
}

fn has_wanted_extension(path: &Path, file_types: &HashSet<String>) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => file_types.contains(&ext.to_ascii_lowercase()),
        // Extensionless files count when "" is in the set; dot-files such as
        // `.gitignore` never do
        None => {
            file_types.contains("")
                && !path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with('.'))
        }
    }
}
