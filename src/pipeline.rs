//! One validation run from root directory to report.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::core::error::{LinkrotError, Result};
use crate::discovery::Extractor;
use crate::reporting::{Report, logging};
use crate::ui::ProgressReporter;
use crate::validation::{ExclusionRules, HttpProbe, LinkProbe, PoolSettings, ValidateLinks, ValidatorPool};

/// Check every link under `root` with an HTTP probe built from `config`.
pub async fn run(config: &Config, root: &Path, progress: Option<&ProgressReporter>) -> Result<Report> {
    config.validate()?;
    let probe = HttpProbe::from_config(config)?;
    run_with_probe(config, root, Arc::new(probe), progress).await
}

/// Same as [`run`] with a caller-supplied probe.
pub async fn run_with_probe(
    config: &Config,
    root: &Path,
    probe: Arc<dyn LinkProbe>,
    progress: Option<&ProgressReporter>,
) -> Result<Report> {
    let started = Instant::now();
    // The run deadline covers extraction as well as validation
    let deadline = config
        .run_timeout_duration()?
        .map(|limit| tokio::time::Instant::now() + limit);
    let extractor = Extractor::new(root, &config.file_types_as_set())?;
    logging::log_document_info(extractor.documents());

    let document_count = extractor.documents().len();
    let bar = progress.and_then(|p| p.start_extraction(document_count));
    let extraction = {
        let extractor = extractor.clone();
        tokio::task::spawn_blocking(move || extractor.extract_all())
            .await
            .map_err(|e| LinkrotError::WorkerPool(format!("extraction task failed: {e}")))?
    };
    if let Some(ref pb) = bar {
        pb.set_position(document_count as u64);
    }
    if let Some(reporter) = progress {
        reporter.finish_extraction(bar.as_ref(), extraction.references.len());
        for diagnostic in &extraction.diagnostics {
            reporter.log_warning(&diagnostic.to_string());
        }
    }
    logging::log_extraction(extraction.references.len(), extraction.diagnostics.len());

    let cache = Arc::new(match config.cache_file() {
        Some(path) => CacheStore::load(path),
        None => CacheStore::in_memory(),
    });
    logging::log_cache_loaded(cache.path(), cache.len());

    let pool = ValidatorPool::new(
        probe,
        Arc::clone(&cache),
        ExclusionRules::from_config(config)?,
        PoolSettings::from_config(config)?,
        extractor.root(),
    )
    .with_deadline(deadline);
    let outcomes = pool.validate(extraction.references, progress).await?;

    // The journal already holds every write; compaction is an optimization
    if let Err(e) = cache.persist() {
        logging::log_warning(&format!("Could not compact cache file: {e}"));
    }

    let report = Report::from_outcomes(
        outcomes,
        extraction.diagnostics,
        document_count,
        extractor.root(),
    );
    logging::log_validation_complete(&report.summary, started.elapsed().as_millis());

    if let Some(ref report_path) = config.report_path {
        report.write_report_file(report_path)?;
    }

    Ok(report)
}
