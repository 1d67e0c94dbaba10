use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

/// Progress bars for the two phases of a run: reading documents and
/// validating links. Every method is a no-op when disabled.
pub struct ProgressReporter {
    multi_progress: Arc<MultiProgress>,
    enabled: bool,
}

impl ProgressReporter {
    pub fn new(enabled: bool) -> Self {
        Self {
            multi_progress: Arc::new(MultiProgress::new()),
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn start_extraction(&self, total_documents: usize) -> Option<ProgressBar> {
        self.add_bar(
            total_documents,
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents read ({eta})",
            "Extracting links",
        )
    }

    pub fn finish_extraction(&self, bar: Option<&ProgressBar>, link_count: usize) {
        if let Some(pb) = bar {
            pb.finish_with_message(format!("✓ Found {link_count} links"));
        }
    }

    pub fn start_validation(&self, total_links: usize) -> Option<ProgressBar> {
        let pb = self.add_bar(
            total_links,
            "{spinner:.green} [{elapsed_precise}] [{bar:40.yellow/red}] {pos}/{len} links validated ({eta})",
            "Validating links",
        )?;
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    }

    pub fn finish_validation(&self, bar: Option<&ProgressBar>, failures: usize, total: usize) {
        if let Some(pb) = bar {
            let message = if failures == 0 {
                "✓ All links validated successfully".to_string()
            } else {
                format!("✓ Validation complete ({failures}/{total} failing)")
            };
            pb.finish_with_message(message);
        }
    }

    pub fn finish_and_clear(&self) {
        if self.enabled {
            self.multi_progress.clear().unwrap_or(());
        }
    }

    pub fn log_warning(&self, message: &str) {
        if self.enabled {
            self.multi_progress
                .println(format!("⚠ {message}"))
                .unwrap_or(());
        }
    }

    fn add_bar(&self, total: usize, template: &str, message: &str) -> Option<ProgressBar> {
        if !self.enabled {
            return None;
        }

        let style = ProgressStyle::default_bar()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        let pb = self.multi_progress.add(ProgressBar::new(total as u64));
        pb.set_style(style);
        pb.set_message(message.to_string());
        Some(pb)
    }
}
