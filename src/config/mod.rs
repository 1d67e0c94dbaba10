//! Configuration management
//!
//! This module handles loading configuration from TOML files and merging
//! it with CLI arguments. CLI values always win over file values.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::constants::{defaults, output_formats, timeouts};
use crate::core::error::{LinkrotError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Document extensions to scan
    pub file_types: Option<Vec<String>>,

    /// Target patterns to exclude (regex, matched against the normalized link)
    pub exclude_patterns: Option<Vec<String>>,

    /// Cache file location
    pub cache_path: Option<String>,

    /// Whether to read and write the cache at all
    pub use_cache: Option<bool>,

    /// Maximum age of cache entries (`90`, `30s`, `15m`, `12h`, `7d`)
    pub max_cache_age: Option<String>,

    /// Number of link checks allowed in flight at once
    pub concurrency: Option<usize>,

    /// Timeout in seconds for a single HTTP request
    pub timeout: Option<u64>,

    /// Deadline for the whole run (`90`, `30s`, `15m`, ...)
    pub run_timeout: Option<String>,

    /// Retry attempts for transient network failures
    pub retry_attempts: Option<u8>,

    /// Base delay between retries in milliseconds (doubled on each retry)
    pub retry_delay: Option<u64>,

    /// HTTP status codes that count as reachable
    pub allowed_status_codes: Option<Vec<u16>>,

    /// Custom User-Agent header
    pub user_agent: Option<String>,

    /// HTTP/HTTPS proxy URL
    pub proxy: Option<String>,

    /// Skip TLS certificate verification
    pub skip_ssl_verification: Option<bool>,

    /// Where to write the line-oriented failure report
    pub report_path: Option<String>,

    /// Output format (text, json, minimal)
    pub output_format: Option<String>,

    /// Enable verbose logging
    pub verbose: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file_types: None, // Falls back to defaults::FILE_TYPES
            exclude_patterns: None,
            cache_path: Some(defaults::CACHE_FILE.to_string()),
            use_cache: Some(true),
            max_cache_age: Some(timeouts::DEFAULT_MAX_CACHE_AGE_SECONDS.to_string()),
            concurrency: None, // Will default to CPU core count
            timeout: Some(timeouts::DEFAULT_TIMEOUT_SECONDS),
            run_timeout: None,
            retry_attempts: Some(defaults::RETRY_ATTEMPTS),
            retry_delay: Some(timeouts::DEFAULT_RETRY_DELAY_MS),
            allowed_status_codes: None,
            user_agent: None,
            proxy: None,
            skip_ssl_verification: Some(false),
            report_path: None,
            output_format: Some(output_formats::DEFAULT.to_string()),
            verbose: Some(false),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            LinkrotError::Config(format!(
                "Could not read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| {
            LinkrotError::Config(format!(
                "Invalid TOML in config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Try to find and load a config file in the current directory or up to
    /// three parent directories, falling back to defaults.
    pub fn load_from_standard_locations() -> Self {
        for i in 0..=3 {
            let path = format!("{}{}", "../".repeat(i), defaults::CONFIG_FILE);
            if Path::new(&path).is_file() {
                match Self::load_from_file(&path) {
                    Ok(config) => return config,
                    Err(e) => log::warn!("Ignoring config file '{path}': {e}"),
                }
            }
        }

        Self::default()
    }

    /// Merge this config with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli_config: &CliConfig) {
        // Discovery & filtering
        if let Some(ref file_types) = cli_config.file_types {
            self.file_types = Some(file_types.clone());
        }
        if let Some(ref exclude_patterns) = cli_config.exclude_patterns {
            self.exclude_patterns = Some(exclude_patterns.clone());
        }
        if let Some(ref allowed_status_codes) = cli_config.allowed_status_codes {
            self.allowed_status_codes = Some(allowed_status_codes.clone());
        }

        // Cache
        if let Some(ref cache_path) = cli_config.cache_path {
            self.cache_path = Some(cache_path.clone());
        }
        if let Some(ref max_cache_age) = cli_config.max_cache_age {
            self.max_cache_age = Some(max_cache_age.clone());
        }
        if cli_config.no_cache {
            self.use_cache = Some(false);
        }

        // Performance & behavior
        if let Some(concurrency) = cli_config.concurrency {
            self.concurrency = Some(concurrency);
        }
        if let Some(timeout) = cli_config.timeout {
            self.timeout = Some(timeout);
        }
        if let Some(ref run_timeout) = cli_config.run_timeout {
            self.run_timeout = Some(run_timeout.clone());
        }
        if let Some(retry_attempts) = cli_config.retry_attempts {
            self.retry_attempts = Some(retry_attempts);
        }
        if let Some(retry_delay) = cli_config.retry_delay {
            self.retry_delay = Some(retry_delay);
        }

        // Output & format
        if cli_config.verbose {
            self.verbose = Some(true);
        }
        if let Some(ref output_format) = cli_config.output_format {
            self.output_format = Some(output_format.clone());
        }
        if let Some(ref report_path) = cli_config.report_path {
            self.report_path = Some(report_path.clone());
        }

        // Network & security
        if let Some(ref user_agent) = cli_config.user_agent {
            self.user_agent = Some(user_agent.clone());
        }
        if let Some(ref proxy) = cli_config.proxy {
            self.proxy = Some(proxy.clone());
        }
        if cli_config.skip_ssl_verification {
            self.skip_ssl_verification = Some(true);
        }
    }

    /// Compile exclude patterns into regex objects
    pub fn compile_exclude_patterns(&self) -> Result<Vec<Regex>> {
        let mut compiled = Vec::new();
        if let Some(ref patterns) = self.exclude_patterns {
            for pattern in patterns {
                compiled.push(Regex::new(pattern)?);
            }
        }
        Ok(compiled)
    }

    /// Document extensions to scan, with defaults applied
    pub fn file_types_as_set(&self) -> HashSet<String> {
        match self.file_types {
            Some(ref types) => types
                .iter()
                .map(|t| t.trim().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            None => defaults::FILE_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Cache file location, or `None` when caching is disabled
    pub fn cache_file(&self) -> Option<PathBuf> {
        if !self.use_cache.unwrap_or(true) {
            return None;
        }
        Some(PathBuf::from(
            self.cache_path.as_deref().unwrap_or(defaults::CACHE_FILE),
        ))
    }

    /// Worker pool size, defaulting to the number of CPU cores
    pub fn concurrency_limit(&self) -> usize {
        self.concurrency.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Get the per-request timeout as Duration
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout.unwrap_or(timeouts::DEFAULT_TIMEOUT_SECONDS))
    }

    /// Get the retry base delay as Duration
    pub fn retry_delay_duration(&self) -> Duration {
        Duration::from_millis(
            self.retry_delay
                .unwrap_or(timeouts::DEFAULT_RETRY_DELAY_MS),
        )
    }

    /// Get the maximum cache age as Duration
    pub fn max_cache_age_duration(&self) -> Result<Duration> {
        match self.max_cache_age {
            Some(ref age) => parse_duration(age),
            None => Ok(Duration::from_secs(
                timeouts::DEFAULT_MAX_CACHE_AGE_SECONDS,
            )),
        }
    }

    /// Get the whole-run deadline, if one is configured
    pub fn run_timeout_duration(&self) -> Result<Option<Duration>> {
        self.run_timeout.as_deref().map(parse_duration).transpose()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err(LinkrotError::Config(
                    "Timeout cannot be 0. Expected a positive integer representing seconds."
                        .to_string(),
                ));
            }
            if timeout > 86400 {
                return Err(LinkrotError::Config(format!(
                    "Timeout of {timeout} seconds is extremely large (>24 hours). Consider using a smaller value."
                )));
            }
        }

        if let Some(concurrency) = self.concurrency {
            if concurrency == 0 {
                return Err(LinkrotError::Config(
                    "Concurrency cannot be 0. Expected a positive integer.".to_string(),
                ));
            }
            if concurrency > defaults::MAX_CONCURRENCY {
                return Err(LinkrotError::Config(format!(
                    "Concurrency of {concurrency} is extremely high and may overwhelm remote hosts. Consider using a smaller value."
                )));
            }
        }

        if let Some(retry) = self.retry_attempts
            && retry > 20
        {
            return Err(LinkrotError::Config(format!(
                "Retry attempts of {retry} is very high and may cause long delays. Consider using a smaller value."
            )));
        }

        if let Some(ref codes) = self.allowed_status_codes {
            for &code in codes {
                if !(100..=599).contains(&code) {
                    return Err(LinkrotError::Config(format!(
                        "Status code {code} is not a valid HTTP status code. Expected a number between 100-599."
                    )));
                }
            }
        }

        if let Some(ref format) = self.output_format
            && !output_formats::ALL.contains(&format.as_str())
        {
            return Err(LinkrotError::Config(format!(
                "Invalid output format '{format}'. Expected one of: {}.",
                output_formats::ALL.join(", ")
            )));
        }

        self.max_cache_age_duration()?;
        if let Some(run_timeout) = self.run_timeout_duration()?
            && run_timeout.is_zero()
        {
            return Err(LinkrotError::Config(
                "Run timeout cannot be 0.".to_string(),
            ));
        }

        // Validate exclude patterns by trying to compile them
        self.compile_exclude_patterns()?;

        Ok(())
    }
}

/// Parse a duration written as a number with an optional unit suffix:
/// `s` (default), `m`, `h` or `d`.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let trimmed = input.trim();
    let invalid = || {
        LinkrotError::Config(format!(
            "Invalid duration '{input}'. Expected a number optionally followed by s, m, h or d (e.g. 90, 15m, 7d)."
        ))
    };

    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);
    let value: u64 = digits.parse().map_err(|_| invalid())?;

    let multiplier = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => return Err(invalid()),
    };

    value
        .checked_mul(multiplier)
        .map(Duration::from_secs)
        .ok_or_else(invalid)
}

/// Configuration options that can come from CLI
#[derive(Debug, Default)]
pub struct CliConfig {
    // Discovery & filtering
    pub file_types: Option<Vec<String>>,        // --include
    pub exclude_patterns: Option<Vec<String>>,  // --exclude-pattern
    pub allowed_status_codes: Option<Vec<u16>>, // --allow-status

    // Cache
    pub cache_path: Option<String>,    // --cache
    pub max_cache_age: Option<String>, // --max-cache-age
    pub no_cache: bool,                // --no-cache

    // Performance & behavior
    pub concurrency: Option<usize>,  // --concurrency
    pub timeout: Option<u64>,        // --timeout
    pub run_timeout: Option<String>, // --run-timeout
    pub retry_attempts: Option<u8>,  // --retry
    pub retry_delay: Option<u64>,    // --retry-delay

    // Output & format
    pub quiet: bool,                   // --quiet
    pub verbose: bool,                 // --verbose
    pub output_format: Option<String>, // --format
    pub no_progress: bool,             // --no-progress
    pub report_path: Option<String>,   // --report

    // Network & security
    pub user_agent: Option<String>,  // --user-agent
    pub proxy: Option<String>,       // --proxy
    pub skip_ssl_verification: bool, // --insecure

    // Configuration
    pub config_file: Option<String>, // --config
    pub no_config: bool,             // --no-config
}
