/// Application-wide constants to avoid magic values throughout the codebase.
///
/// Defaults, limits and fixed strings shared by the extractor, cache,
/// validator pool and report layers live here.
/// Output format constants
pub mod output_formats {
    /// Text output format - grouped, emoji-enhanced output
    pub const TEXT: &str = "text";
    /// JSON output format - structured output for automation
    pub const JSON: &str = "json";
    /// Minimal output format - one failing reference per line, no decoration
    pub const MINIMAL: &str = "minimal";

    /// Default output format
    pub const DEFAULT: &str = TEXT;

    /// All valid output formats
    pub const ALL: [&str; 3] = [TEXT, JSON, MINIMAL];
}

/// HTTP status code constants
pub mod http_status {
    /// HTTP 405 Method Not Allowed - HEAD rejected, retry with GET
    pub const METHOD_NOT_ALLOWED: u16 = 405;
    /// HTTP 501 Not Implemented - some servers answer HEAD with this
    pub const NOT_IMPLEMENTED: u16 = 501;
}

/// Timeout and duration constants
pub mod timeouts {
    /// Default per-request timeout in seconds
    pub const DEFAULT_TIMEOUT_SECONDS: u64 = 20;
    /// Maximum reasonable per-request timeout in seconds (1 hour)
    pub const MAX_TIMEOUT_SECONDS: u64 = 3600;
    /// Default base delay before a retry, in milliseconds
    pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;
    /// Default maximum cache age in seconds (one day)
    pub const DEFAULT_MAX_CACHE_AGE_SECONDS: u64 = 24 * 60 * 60;
}

/// Default configuration values
pub mod defaults {
    /// Transient failures are retried once before classification
    pub const RETRY_ATTEMPTS: u8 = 1;
    /// Redirects followed before a request is considered failed
    pub const MAX_REDIRECTS: usize = 10;
    /// Default cache file, relative to the working directory
    pub const CACHE_FILE: &str = ".linkrot-cache.jsonl";
    /// Configuration file looked up in the working directory and its parents
    pub const CONFIG_FILE: &str = ".linkrot.toml";
    /// Document extensions scanned when none are configured
    pub const FILE_TYPES: [&str; 6] = ["md", "markdown", "html", "htm", "txt", "rst"];
    /// Maximum concurrency accepted from configuration
    pub const MAX_CONCURRENCY: usize = 1000;
}

/// Status labels used in the report file and console output
pub mod labels {
    pub const OK: &str = "OK";
    pub const BROKEN: &str = "BROKEN";
    pub const EXCLUDED: &str = "EXCLUDED";
    pub const ERROR: &str = "ERROR";
}

/// Outcome detail strings shared between the validator and the cache
pub mod details {
    /// Remote check did not answer within the request timeout
    pub const TIMEOUT: &str = "timeout";
    /// Local target does not exist on disk
    pub const FILE_NOT_FOUND: &str = "file not found";
    /// The run deadline expired before the check finished
    pub const RUN_TIMEOUT: &str = "timeout";
    /// The owner of an in-flight check went away without a result
    pub const CHECK_ABANDONED: &str = "check abandoned";
}

/// Display and formatting constants
pub mod display {
    /// Emoji for success status
    pub const SUCCESS_EMOJI: &str = "✅";
    /// Emoji for warning status
    pub const WARNING_EMOJI: &str = "⚠️";
    /// Emoji for broken links
    pub const BROKEN_EMOJI: &str = "❌";
    /// Emoji for indeterminate errors
    pub const ERROR_EMOJI: &str = "🔌";
    /// Emoji for file information
    pub const FILE_EMOJI: &str = "📁";
    /// Emoji for cache information
    pub const CACHE_EMOJI: &str = "🗄️";
}
