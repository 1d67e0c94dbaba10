use regex::Regex;

use crate::config::Config;
use crate::core::error::Result;
use crate::core::normalize::NormalizedLink;

/// Regular expressions that mark targets as skipped for the whole run.
///
/// Patterns are searched (not anchored) in the normalized link, so
/// `twitter\.com` excludes every URL on that host.
#[derive(Debug, Clone, Default)]
pub struct ExclusionRules {
    patterns: Vec<Regex>,
}

impl ExclusionRules {
    pub fn new(patterns: Vec<Regex>) -> Self {
        Self { patterns }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.compile_exclude_patterns()?))
    }

    pub fn is_excluded(&self, link: &NormalizedLink) -> bool {
        self.matching_pattern(link).is_some()
    }

    /// First pattern matching the link, for diagnostics.
    pub fn matching_pattern(&self, link: &NormalizedLink) -> Option<&str> {
        self.patterns
            .iter()
            .find(|pattern| pattern.is_match(link.as_str()))
            .map(Regex::as_str)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
