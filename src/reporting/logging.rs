use crate::config::Config;
use crate::reporting::report::Summary;
use log::{debug, error, info, warn};
use std::path::Path;

/// Initialize the logger with appropriate level based on verbosity
pub fn init_logger(verbose: bool, quiet: bool) {
    let level = if quiet {
        log::LevelFilter::Off
    } else if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };

    let _ = env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_module_path(false)
        .format_target(false)
        .try_init();

    debug!("Logger initialized with level: {level:?}");
}

/// Log configuration information
pub fn log_config_info(config: &Config, concurrency: usize) {
    let timeout = config.timeout_duration().as_secs();
    let retry_attempts = config.retry_attempts.unwrap_or(crate::core::constants::defaults::RETRY_ATTEMPTS);
    let retry_delay = config.retry_delay_duration().as_millis();
    let skip_ssl_verification = config.skip_ssl_verification.unwrap_or(false);
    let run_timeout = config.run_timeout.as_deref().unwrap_or("none");

    info!("Configuration: concurrency={concurrency}, timeout={timeout}s, run_timeout={run_timeout}");
    info!("Retry: attempts={retry_attempts}, delay={retry_delay}ms");
    info!("HTTP: skip_ssl={skip_ssl_verification}");
    match config.cache_file() {
        Some(path) => info!(
            "Cache: {} (max age {})",
            path.display(),
            config.max_cache_age.as_deref().unwrap_or("1d")
        ),
        None => info!("Cache: disabled"),
    }
}

/// Log document discovery information
pub fn log_document_info<P: AsRef<Path>>(documents: &[P]) {
    info!("Scanning {} document(s)", documents.len());
    for (i, document) in documents.iter().enumerate() {
        debug!("  {}. {}", i + 1, document.as_ref().display());
    }
}

/// Log link extraction results
pub fn log_extraction(references: usize, diagnostics: usize) {
    info!("Found {references} link reference(s), {diagnostics} diagnostic(s)");
}

/// Log cache state after loading
pub fn log_cache_loaded(path: Option<&Path>, entries: usize) {
    match path {
        Some(path) => info!("Loaded {entries} cache entries from {}", path.display()),
        None => debug!("Using in-memory cache"),
    }
}

/// Log validation completion
pub fn log_validation_complete(summary: &Summary, duration_ms: u128) {
    if summary.failures() == 0 {
        info!(
            "✅ Validation complete: {} ok, {} excluded of {} references ({}ms)",
            summary.ok, summary.excluded, summary.total, duration_ms
        );
    } else {
        warn!(
            "❌ Validation complete: {} broken, {} errors of {} references ({}ms)",
            summary.broken, summary.errors, summary.total, duration_ms
        );
    }
}

/// Log error information
pub fn log_error(message: &str, source: Option<&dyn std::error::Error>) {
    match source {
        Some(err) => error!("{message}: {err}"),
        None => error!("{message}"),
    }
}

/// Log warning information
pub fn log_warning(message: &str) {
    warn!("{message}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn test_logger_initialization_is_repeatable() {
        // try_init tolerates a logger that is already installed
        init_logger(true, false);
        init_logger(false, true);
        init_logger(false, false);
    }

    #[test]
    fn test_log_config_info() {
        let cached = Config {
            timeout: Some(30),
            retry_attempts: Some(3),
            retry_delay: Some(1000),
            max_cache_age: Some("7d".to_string()),
            ..Default::default()
        };
        log_config_info(&cached, 4);

        let uncached = Config {
            use_cache: Some(false),
            run_timeout: Some("10m".to_string()),
            skip_ssl_verification: Some(true),
            ..Default::default()
        };
        log_config_info(&uncached, 1);
    }

    #[test]
    fn test_log_helpers() {
        log_document_info(&[PathBuf::from("docs/a.md"), PathBuf::from("docs/b.md")]);
        log_document_info::<PathBuf>(&[]);
        log_extraction(12, 1);
        log_cache_loaded(Some(Path::new(".linkrot-cache.jsonl")), 40);
        log_cache_loaded(None, 0);
    }

    #[test]
    fn test_log_validation_complete() {
        let clean = Summary {
            total: 3,
            ok: 2,
            excluded: 1,
            ..Default::default()
        };
        log_validation_complete(&clean, 120);

        let failing = Summary {
            total: 3,
            ok: 1,
            broken: 1,
            errors: 1,
            ..Default::default()
        };
        log_validation_complete(&failing, 0);
    }

    #[test]
    fn test_log_error_and_warning() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        log_error("Failed to read cache", Some(&io_error));
        log_error("Simple error", None);
        log_warning("Cache file could not be compacted");
    }
}
