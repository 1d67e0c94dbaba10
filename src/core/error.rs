use std::fmt;

/// Error types for linkrot operations that abort a run.
///
/// Per-link failures never surface here: they become outcomes in the report.
#[derive(Debug)]
pub enum LinkrotError {
    /// IO error (file operations, etc.)
    Io(std::io::Error),

    /// Configuration error
    Config(String),

    /// HTTP client construction error
    Http(reqwest::Error),

    /// Exclusion pattern compilation error
    Regex(regex::Error),

    /// TOML parsing error
    TomlParsing(toml::de::Error),

    /// JSON serialization error (cache records, JSON output)
    Json(serde_json::Error),

    /// The root path cannot be read at all
    RootUnreadable(String),

    /// File walking/ignore error
    FileWalking(ignore::Error),

    /// The validator pool could not hand out a worker slot
    WorkerPool(String),

    /// Invalid argument error
    InvalidArgument(String),
}

impl fmt::Display for LinkrotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkrotError::Io(err) => write!(f, "IO error: {err}"),
            LinkrotError::Config(msg) => write!(f, "Configuration error: {msg}"),
            LinkrotError::Http(err) => write!(f, "HTTP error: {err}"),
            LinkrotError::Regex(err) => write!(f, "Regex error: {err}"),
            LinkrotError::TomlParsing(err) => write!(f, "TOML parsing error: {err}"),
            LinkrotError::Json(err) => write!(f, "JSON error: {err}"),
            LinkrotError::RootUnreadable(msg) => write!(f, "Root unreadable: {msg}"),
            LinkrotError::FileWalking(err) => write!(f, "File walking error: {err}"),
            LinkrotError::WorkerPool(msg) => write!(f, "Worker pool error: {msg}"),
            LinkrotError::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}"),
        }
    }
}

impl std::error::Error for LinkrotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LinkrotError::Io(err) => Some(err),
            LinkrotError::Http(err) => Some(err),
            LinkrotError::Regex(err) => Some(err),
            LinkrotError::TomlParsing(err) => Some(err),
            LinkrotError::Json(err) => Some(err),
            LinkrotError::FileWalking(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LinkrotError {
    fn from(err: std::io::Error) -> Self {
        LinkrotError::Io(err)
    }
}

impl From<reqwest::Error> for LinkrotError {
    fn from(err: reqwest::Error) -> Self {
        LinkrotError::Http(err)
    }
}

impl From<regex::Error> for LinkrotError {
    fn from(err: regex::Error) -> Self {
        LinkrotError::Regex(err)
    }
}

impl From<toml::de::Error> for LinkrotError {
    fn from(err: toml::de::Error) -> Self {
        LinkrotError::TomlParsing(err)
    }
}

impl From<serde_json::Error> for LinkrotError {
    fn from(err: serde_json::Error) -> Self {
        LinkrotError::Json(err)
    }
}

impl From<ignore::Error> for LinkrotError {
    fn from(err: ignore::Error) -> Self {
        LinkrotError::FileWalking(err)
    }
}

/// Type alias for Results using LinkrotError
pub type Result<T> = std::result::Result<T, LinkrotError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display() {
        let config_error = LinkrotError::Config("Invalid timeout".to_string());
        assert_eq!(
            format!("{config_error}"),
            "Configuration error: Invalid timeout"
        );

        let root_error = LinkrotError::RootUnreadable("/missing".to_string());
        assert_eq!(format!("{root_error}"), "Root unreadable: /missing");
    }

    #[test]
    fn test_error_from_io() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let linkrot_error = LinkrotError::from(io_error);

        assert!(matches!(linkrot_error, LinkrotError::Io(_)));
        assert!(linkrot_error.source().is_some());
    }

    #[test]
    #[allow(clippy::invalid_regex)]
    fn test_error_from_regex() {
        let regex_error = regex::Regex::new("[invalid").unwrap_err();
        let linkrot_error = LinkrotError::from(regex_error);

        assert!(matches!(linkrot_error, LinkrotError::Regex(_)));
        assert!(format!("{linkrot_error}").starts_with("Regex error:"));
    }

    #[test]
    fn test_error_from_toml() {
        let toml_error = toml::from_str::<toml::Value>("invalid toml [").unwrap_err();
        let linkrot_error = LinkrotError::from(toml_error);

        assert!(matches!(linkrot_error, LinkrotError::TomlParsing(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let linkrot_error = LinkrotError::from(json_error);

        assert!(matches!(linkrot_error, LinkrotError::Json(_)));
        assert!(linkrot_error.source().is_some());
    }

    #[test]
    fn test_error_from_ignore() {
        let ignore_error = ignore::WalkBuilder::new("/definitely/nonexistent/path/12345")
            .build()
            .next()
            .unwrap()
            .unwrap_err();
        let linkrot_error = LinkrotError::from(ignore_error);

        assert!(matches!(linkrot_error, LinkrotError::FileWalking(_)));
        assert!(format!("{linkrot_error}").contains("File walking error:"));
    }

    #[test]
    fn test_error_no_source_variants() {
        let errors_without_source = vec![
            LinkrotError::Config("test".to_string()),
            LinkrotError::RootUnreadable("test".to_string()),
            LinkrotError::WorkerPool("test".to_string()),
            LinkrotError::InvalidArgument("test".to_string()),
        ];

        for error in errors_without_source {
            assert!(error.source().is_none());
            assert!(format!("{error}").contains(':'));
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LinkrotError>();
    }
}
