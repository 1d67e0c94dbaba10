//! Output formatting and display logic for linkrot

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::core::constants::{display, output_formats};
use crate::core::types::{LinkStatus, ValidationOutcome};
use crate::reporting::Report;
use crate::ui::color::{Colors, bold, colorize};

/// Display configuration information in a user-friendly format
pub fn display_config_info(config: &Config, concurrency: usize, documents: &[PathBuf]) {
    let mut stdout = io::stdout().lock();
    // Console output is best effort; a closed stdout is not an error here
    let _ = write_config_info(&mut stdout, config, concurrency, documents);
}

fn write_config_info<W: Write>(
    out: &mut W,
    config: &Config,
    concurrency: usize,
    documents: &[PathBuf],
) -> io::Result<()> {
    let setting = |name: &str, value: String| {
        format!(
            "{}: {}",
            bold(name, Colors::BRIGHT_CYAN),
            colorize(&value, Colors::BRIGHT_WHITE)
        )
    };

    writeln!(out, "{}", setting("Concurrency", concurrency.to_string()))?;
    writeln!(
        out,
        "{}",
        setting(
            "Request timeout (seconds)",
            config.timeout_duration().as_secs().to_string()
        )
    )?;
    if let Some(ref run_timeout) = config.run_timeout {
        writeln!(out, "{}", setting("Run timeout", run_timeout.clone()))?;
    }
    let cache = match config.cache_file() {
        Some(path) => format!(
            "{} (max age {})",
            path.display(),
            config.max_cache_age.as_deref().unwrap_or("1d")
        ),
        None => "disabled".to_string(),
    };
    writeln!(out, "{} {}", display::CACHE_EMOJI, setting("Cache", cache))?;
    if let Some(ref patterns) = config.exclude_patterns
        && !patterns.is_empty()
    {
        writeln!(out, "{}", setting("Exclude patterns", patterns.join(", ")))?;
    }

    writeln!(
        out,
        "\n{} {}",
        display::FILE_EMOJI,
        bold(
            &format!("Documents to check ({})", documents.len()),
            Colors::BRIGHT_CYAN
        )
    )?;
    for (i, document) in documents.iter().enumerate().take(10) {
        writeln!(
            out,
            "   {}. {}",
            colorize(&(i + 1).to_string(), Colors::DIM),
            document.display()
        )?;
    }
    if documents.len() > 10 {
        writeln!(out, "   ... and {} more", documents.len() - 10)?;
    }
    writeln!(out)
}

/// Print the report to stdout in the requested format
pub fn display_report(report: &Report, output_format: &str, quiet: bool) -> io::Result<()> {
    if quiet {
        return Ok(());
    }
    let mut stdout = io::stdout().lock();
    write_report(&mut stdout, report, output_format)?;
    stdout.flush()
}

/// Render the report in the requested format
pub fn write_report<W: Write>(out: &mut W, report: &Report, output_format: &str) -> io::Result<()> {
    match output_format {
        output_formats::MINIMAL => write_minimal(out, report),
        output_formats::JSON => write_json(out, report),
        _ => write_text(out, report),
    }
}

/// One failing reference per line, no decoration
fn write_minimal<W: Write>(out: &mut W, report: &Report) -> io::Result<()> {
    for line in report.failure_lines() {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn write_json<W: Write>(out: &mut W, report: &Report) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)
}

/// Grouped, emoji-enhanced output
fn write_text<W: Write>(out: &mut W, report: &Report) -> io::Result<()> {
    for diagnostic in &report.diagnostics {
        writeln!(
            out,
            "{} {}",
            colorize(display::WARNING_EMOJI, Colors::BRIGHT_YELLOW),
            colorize(&diagnostic.to_string(), Colors::BRIGHT_YELLOW)
        )?;
    }
    if !report.diagnostics.is_empty() {
        writeln!(out)?;
    }

    if report.is_failure() {
        writeln!(
            out,
            "{} {}",
            colorize(display::WARNING_EMOJI, Colors::BRIGHT_RED),
            bold("Issues", Colors::BRIGHT_RED)
        )?;
        write_grouped_failures(out, report)?;
        writeln!(out)?;
    } else {
        writeln!(
            out,
            "{} {}!",
            colorize(display::SUCCESS_EMOJI, Colors::BRIGHT_GREEN),
            bold("No issues found", Colors::BRIGHT_GREEN)
        )?;
    }

    let summary = &report.summary;
    writeln!(
        out,
        "{} documents, {} references ({} distinct): {} ok, {} broken, {} excluded, {} errors",
        summary.documents,
        summary.total,
        summary.distinct_links,
        summary.ok,
        summary.broken,
        summary.excluded,
        summary.errors
    )
}

/// Failures grouped by source document, in report order
fn write_grouped_failures<W: Write>(out: &mut W, report: &Report) -> io::Result<()> {
    let mut current: Option<&Path> = None;
    for outcome in report.failures() {
        let document = outcome.link.source_document.as_path();
        if current != Some(document) {
            writeln!(
                out,
                "\n   {} {}:",
                display::FILE_EMOJI,
                bold(&document.display().to_string(), Colors::BRIGHT_WHITE)
            )?;
            current = Some(document);
        }
        writeln!(out, "      {}", format_failure(outcome))?;
    }
    Ok(())
}

fn format_failure(outcome: &ValidationOutcome) -> String {
    let (emoji, color) = match outcome.status {
        LinkStatus::Error(_) => (display::ERROR_EMOJI, Colors::BRIGHT_YELLOW),
        _ => (display::BROKEN_EMOJI, Colors::BRIGHT_RED),
    };
    format!(
        "{} {} {} {}",
        colorize(&format!("L{}", outcome.link.line_number), Colors::DIM),
        colorize(emoji, color),
        colorize(&outcome.link.raw_target, Colors::CYAN),
        colorize(&format!("({})", outcome.status.detail().unwrap_or_default()), color)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::LinkReference;
    use crate::discovery::Diagnostic;

    fn outcome(document: &str, line: u64, target: &str, status: LinkStatus) -> ValidationOutcome {
        ValidationOutcome::new(LinkReference::new(document, target, line).unwrap(), status)
    }

    fn failing_report() -> Report {
        Report::from_outcomes(
            vec![
                outcome("docs/a.md", 4, "https://example.com/gone", LinkStatus::Broken("HTTP 404".into())),
                outcome("docs/a.md", 1, "https://example.com/", LinkStatus::Ok),
                outcome("docs/b.md", 2, "missing.md", LinkStatus::Broken("file not found".into())),
                outcome("docs/b.md", 7, "https://nope.invalid/", LinkStatus::Error("dns error".into())),
            ],
            vec![Diagnostic {
                document: "docs/c.md".into(),
                message: "unterminated code fence opened at line 3".to_string(),
            }],
            3,
            Path::new("docs"),
        )
    }

    fn render(report: &Report, format: &str) -> String {
        let mut buf = Vec::new();
        write_report(&mut buf, report, format).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_minimal_output_lists_failures_only() {
        let output = render(&failing_report(), output_formats::MINIMAL);

        assert_eq!(
            output,
            "docs/a.md:4: BROKEN https://example.com/gone (HTTP 404)\n\
             docs/b.md:2: BROKEN missing.md (file not found)\n\
             docs/b.md:7: ERROR https://nope.invalid/ (dns error)\n"
        );
    }

    #[test]
    fn test_json_output_is_structured() {
        let output = render(&failing_report(), output_formats::JSON);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["summary"]["broken"], 2);
        assert_eq!(value["summary"]["errors"], 1);
        assert_eq!(value["outcomes"].as_array().unwrap().len(), 4);
        assert_eq!(value["outcomes"][0]["status"], "ok");
        assert_eq!(value["outcomes"][1]["status"], "broken");
        assert_eq!(value["outcomes"][1]["detail"], "HTTP 404");
        assert_eq!(value["outcomes"][1]["link"]["line_number"], 4);
        assert_eq!(value["diagnostics"][0]["document"], "docs/c.md");
    }

    #[test]
    fn test_text_output_groups_by_document() {
        let output = render(&failing_report(), output_formats::TEXT);

        assert!(output.contains("docs/c.md: unterminated code fence opened at line 3"));
        assert!(output.contains("Issues"));
        let a = output.find("docs/a.md:").unwrap();
        let b = output.find("docs/b.md:").unwrap();
        assert!(a < b);
        assert!(output.contains("L4 ❌ https://example.com/gone (HTTP 404)"));
        assert!(output.contains("L7 🔌 https://nope.invalid/ (dns error)"));
        assert!(output.contains("3 documents, 4 references (4 distinct): 1 ok, 2 broken, 0 excluded, 1 errors"));
    }

    #[test]
    fn test_text_output_clean_run() {
        let report = Report::from_outcomes(
            vec![outcome("a.md", 1, "https://example.com/", LinkStatus::Ok)],
            Vec::new(),
            1,
            Path::new(""),
        );
        let output = render(&report, output_formats::TEXT);

        assert!(output.contains("No issues found"));
        assert!(!output.contains("Issues\n"));
    }

    #[test]
    fn test_config_info_lists_documents() {
        let config = Config {
            use_cache: Some(false),
            exclude_patterns: Some(vec![r"twitter\.com".to_string()]),
            ..Default::default()
        };
        let documents: Vec<PathBuf> = (0..12).map(|i| PathBuf::from(format!("doc{i}.md"))).collect();

        let mut buf = Vec::new();
        write_config_info(&mut buf, &config, 4, &documents).unwrap();
        let output = String::from_utf8(buf).unwrap();

        assert!(output.contains("Concurrency: 4"));
        assert!(output.contains("Cache: disabled"));
        assert!(output.contains("Exclude patterns: twitter\\.com"));
        assert!(output.contains("Documents to check (12)"));
        assert!(output.contains("... and 2 more"));
    }
}
