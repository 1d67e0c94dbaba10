use rustc_hash::FxHashSet;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::core::error::Result;
use crate::core::normalize::NormalizedLink;
use crate::core::types::{LinkStatus, ValidationOutcome};
use crate::discovery::Diagnostic;

/// Counts by status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub documents: usize,
    pub total: usize,
    pub distinct_links: usize,
    pub ok: usize,
    pub broken: usize,
    pub excluded: usize,
    pub errors: usize,
}

impl Summary {
    pub fn failures(&self) -> usize {
        self.broken + self.errors
    }
}

/// Result of one run: every outcome in deterministic order, the counts and
/// any non-fatal extraction diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub summary: Summary,
    pub outcomes: Vec<ValidationOutcome>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    /// Aggregate outcomes. The sort is stable, so references on the same
    /// line keep their extraction order. `root` resolves root-relative
    /// targets when counting distinct links.
    pub fn from_outcomes(
        mut outcomes: Vec<ValidationOutcome>,
        diagnostics: Vec<Diagnostic>,
        documents: usize,
        root: &Path,
    ) -> Self {
        outcomes.sort_by(|a, b| {
            a.link
                .source_document
                .cmp(&b.link.source_document)
                .then(a.link.line_number.cmp(&b.link.line_number))
        });

        let mut summary = Summary {
            documents,
            total: outcomes.len(),
            distinct_links: outcomes
                .iter()
                .map(|o| match NormalizedLink::from_reference(&o.link, root) {
                    Ok(normalized) => normalized.as_str().to_string(),
                    Err(_) => o.link.raw_target.clone(),
                })
                .collect::<FxHashSet<_>>()
                .len(),
            ..Default::default()
        };
        for outcome in &outcomes {
            match outcome.status {
                LinkStatus::Ok => summary.ok += 1,
                LinkStatus::Broken(_) => summary.broken += 1,
                LinkStatus::Excluded => summary.excluded += 1,
                LinkStatus::Error(_) => summary.errors += 1,
            }
        }

        Self {
            summary,
            outcomes,
            diagnostics,
        }
    }

    /// A run fails when any reference is broken or could not be decided.
    pub fn is_failure(&self) -> bool {
        self.summary.failures() > 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &ValidationOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }

    /// One `<document>:<line>: <STATUS> <target> (<detail>)` line per
    /// failing reference.
    pub fn failure_lines(&self) -> Vec<String> {
        self.failures().map(ToString::to_string).collect()
    }

    /// Write the failure lines to `path`, replacing any previous report in
    /// one rename.
    pub fn write_report_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            for line in self.failure_lines() {
                writeln!(writer, "{line}")?;
            }
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }

        fs::rename(&tmp_path, path)?;
        Ok(())
    }
}
