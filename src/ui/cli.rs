// Command-line interface definitions and parsing for linkrot

use crate::config::CliConfig;
use crate::core::constants::{output_formats, timeouts};
use crate::core::error::{LinkrotError, Result};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None, args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory (or single document) to check
    #[arg(value_name = "ROOT")]
    pub root: Option<String>,

    // Core Options
    /// Request timeout in seconds (default: 20)
    #[arg(
        short = 't',
        long,
        value_name = "SECONDS",
        help_heading = "Core Options"
    )]
    pub timeout: Option<u64>,

    /// Concurrent checks (default: CPU cores)
    #[arg(long, value_name = "COUNT", help_heading = "Core Options")]
    pub concurrency: Option<usize>,

    /// Deadline for the whole run (e.g. 90, 30s, 15m, 1h)
    #[arg(long, value_name = "DURATION", help_heading = "Core Options")]
    pub run_timeout: Option<String>,

    // Filtering & Content
    /// Document extensions to scan (e.g., md,html,txt)
    #[arg(long, value_name = "EXTENSIONS", help_heading = "Filtering & Content")]
    pub include: Option<String>,

    /// Link patterns to exclude (regex, repeatable)
    #[arg(long, value_name = "REGEX", help_heading = "Filtering & Content")]
    pub exclude_pattern: Vec<String>,

    /// Status codes to accept besides 2xx/3xx (comma-separated)
    #[arg(long, value_name = "CODES", help_heading = "Filtering & Content")]
    pub allow_status: Option<String>,

    // Cache
    /// Cache file (default: .linkrot-cache.jsonl)
    #[arg(long, value_name = "PATH", help_heading = "Cache")]
    pub cache: Option<String>,

    /// Maximum age of a cached result (e.g. 3600, 12h, 7d; default: 1d)
    #[arg(long, value_name = "DURATION", help_heading = "Cache")]
    pub max_cache_age: Option<String>,

    /// Neither read nor write the cache file
    #[arg(long, help_heading = "Cache")]
    pub no_cache: bool,

    // Retry
    /// Retries for transient failures (default: 1)
    #[arg(long, value_name = "COUNT", help_heading = "Retry")]
    pub retry: Option<u8>,

    /// Base delay before a retry in ms, doubled per retry (default: 500)
    #[arg(long, value_name = "MS", help_heading = "Retry")]
    pub retry_delay: Option<u64>,

    // Output & Verbosity
    /// Suppress all console output except the exit status
    #[arg(short = 'q', long, help_heading = "Output & Verbosity")]
    pub quiet: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long, help_heading = "Output & Verbosity")]
    pub verbose: bool,

    /// Output format (default: text)
    #[arg(long, value_name = "FORMAT", value_parser = output_formats::ALL, help_heading = "Output & Verbosity")]
    pub format: Option<String>,

    /// Disable progress bars
    #[arg(long, help_heading = "Output & Verbosity")]
    pub no_progress: bool,

    /// Write failing references to this file
    #[arg(long, value_name = "PATH", help_heading = "Output & Verbosity")]
    pub report: Option<String>,

    // Network & Security
    /// Custom User-Agent header
    #[arg(long, value_name = "AGENT", help_heading = "Network & Security")]
    pub user_agent: Option<String>,

    /// HTTP/HTTPS proxy URL
    #[arg(long, value_name = "URL", help_heading = "Network & Security")]
    pub proxy: Option<String>,

    /// Skip SSL certificate verification
    #[arg(long, help_heading = "Network & Security")]
    pub insecure: bool,

    // Configuration
    /// Use specific config file
    #[arg(long, value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Ignore config files
    #[arg(long, help_heading = "Configuration")]
    pub no_config: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate shell completions
    #[command(name = "completion-generate", arg_required_else_help = true)]
    CompletionGenerate {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Install shell completions to standard location
    #[command(name = "completion-install", arg_required_else_help = true)]
    CompletionInstall {
        /// The shell to install completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Convert derive-based CLI arguments to the CliConfig structure.
///
/// Values that can never be valid are rejected here; range checks shared
/// with config files happen in `Config::validate`.
pub fn cli_to_config(cli: &Cli) -> Result<CliConfig> {
    let mut cli_config = CliConfig::default();

    // Core options
    if let Some(timeout) = cli.timeout {
        if timeout == 0 {
            return Err(LinkrotError::InvalidArgument(
                "Timeout cannot be 0. Expected a positive integer representing seconds."
                    .to_string(),
            ));
        }
        if timeout > timeouts::MAX_TIMEOUT_SECONDS {
            log::warn!(
                "Timeout of {timeout} seconds is quite large. Consider using a smaller value."
            );
        }
        cli_config.timeout = Some(timeout);
    }

    if let Some(concurrency) = cli.concurrency {
        if concurrency == 0 {
            return Err(LinkrotError::InvalidArgument(
                "Concurrency cannot be 0. Expected a positive integer.".to_string(),
            ));
        }
        cli_config.concurrency = Some(concurrency);
    }

    cli_config.run_timeout = non_empty(cli.run_timeout.as_deref());

    // Filtering & inclusion
    if let Some(ref include_str) = cli.include {
        let types = split_list(include_str);
        if !types.is_empty() {
            cli_config.file_types = Some(types);
        }
    }

    if !cli.exclude_pattern.is_empty() {
        cli_config.exclude_patterns = Some(cli.exclude_pattern.clone());
    }

    if let Some(ref status_str) = cli.allow_status {
        let mut codes = Vec::new();
        for code_str in split_list(status_str) {
            let code = code_str.parse::<u16>().map_err(|_| {
                LinkrotError::InvalidArgument(format!(
                    "Status code '{code_str}' is not a valid number. Expected a number between 100-599."
                ))
            })?;
            if !(100..=599).contains(&code) {
                return Err(LinkrotError::InvalidArgument(format!(
                    "Status code '{code}' is not a valid HTTP status code. Expected a number between 100-599."
                )));
            }
            codes.push(code);
        }
        cli_config.allowed_status_codes = Some(codes);
    }

    // Cache
    cli_config.cache_path = non_empty(cli.cache.as_deref());
    cli_config.max_cache_age = non_empty(cli.max_cache_age.as_deref());
    cli_config.no_cache = cli.no_cache;

    // Retry
    cli_config.retry_attempts = cli.retry;
    cli_config.retry_delay = cli.retry_delay;

    // Output & format
    cli_config.quiet = cli.quiet;
    cli_config.verbose = cli.verbose;
    cli_config.no_progress = cli.no_progress;
    cli_config.output_format = cli.format.clone();
    cli_config.report_path = non_empty(cli.report.as_deref());

    // Network & security
    cli_config.user_agent = cli.user_agent.clone();
    cli_config.proxy = cli.proxy.clone();
    cli_config.skip_ssl_verification = cli.insecure;

    // Configuration
    cli_config.config_file = cli.config.clone();
    cli_config.no_config = cli.no_config;

    Ok(cli_config)
}

fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
