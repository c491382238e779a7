//! Composable pull-request filters.
//!
//! Filters are pure predicates over raw pull-request records. They run before
//! any per-pull-request enrichment so rejected items never cost a network
//! call.

use regex::Regex;

use crate::error::ConfigError;
use crate::github::PullRecord;

#[derive(Debug, Clone)]
pub enum PullRequestFilter {
    /// Accepts authors on the allow-list; an empty list accepts everyone.
    Author { logins: Vec<String> },
    /// Excludes drafts unless `include_drafts` is set.
    Draft { include_drafts: bool },
    /// Accepts titles matching the pattern.
    Title { pattern: Regex },
}

impl PullRequestFilter {
    pub fn author(logins: Vec<String>) -> Self {
        Self::Author { logins }
    }

    pub fn drafts(include_drafts: bool) -> Self {
        Self::Draft { include_drafts }
    }

    /// Compiles the title pattern eagerly so a malformed pattern fails while
    /// configuration is loaded, not at first use.
    pub fn title(pattern: &str) -> Result<Self, ConfigError> {
        let compiled = Regex::new(pattern).map_err(|source| ConfigError::InvalidTitlePattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self::Title { pattern: compiled })
    }

    pub fn applies(&self, pull: &PullRecord) -> bool {
        match self {
            Self::Author { logins } => {
                logins.is_empty() || logins.iter().any(|login| login == &pull.author)
            }
            Self::Draft { include_drafts } => *include_drafts || !pull.draft,
            Self::Title { pattern } => pattern.is_match(&pull.title),
        }
    }
}

/// True iff every filter accepts the pull request.
pub fn passes_all(filters: &[PullRequestFilter], pull: &PullRecord) -> bool {
    filters.iter().all(|filter| filter.applies(pull))
}
