//! Error types for the fetch/aggregation core.
//!
//! Configuration problems surface eagerly while loading configuration; host
//! failures are typed so callers can tell a missing repository apart from a
//! transient service failure.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::RepoId;

/// Cause attached to host errors, kept as a trait object so the taxonomy does
/// not depend on the concrete hosting client.
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Raised while loading and validating configuration, never at use time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read notifications config {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("notifications config is not valid JSON")]
    Json {
        #[source]
        source: serde_json::Error,
    },

    #[error("notifications config declares no notifications")]
    Empty,

    #[error("invalid repository identifier '{value}', expected owner/repo")]
    InvalidRepository { value: String },

    #[error("invalid title filter pattern '{pattern}'")]
    InvalidTitlePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("unknown notification type '{kind}' for channel '{channel}'")]
    UnknownNotificationType { channel: String, kind: String },

    #[error("time_window_days for channel '{channel}' must be positive, got {value}")]
    NonPositiveTimeWindow { channel: String, value: i64 },

    #[error("channel '{channel}' needs at least one team member")]
    EmptyTeam { channel: String },
}

/// Errors from talking to the hosting API.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The repository identifier did not resolve on the host.
    #[error("repository {repo} was not found on the host")]
    NotFound {
        repo: RepoId,
        #[source]
        source: BoxedCause,
    },

    /// The host was unreachable or rejected the request for a reason other
    /// than absence.
    #[error("host request for {repo} failed")]
    Service {
        repo: RepoId,
        #[source]
        source: BoxedCause,
    },

    /// Secondary data (diff stats, reviews) for one pull request could not
    /// be fetched.
    #[error("could not enrich pull request #{number} in {repo}")]
    Enrichment {
        repo: RepoId,
        number: u64,
        #[source]
        source: Box<FetchError>,
    },
}

impl FetchError {
    pub fn not_found(repo: &RepoId, source: impl Into<BoxedCause>) -> Self {
        Self::NotFound {
            repo: repo.clone(),
            source: source.into(),
        }
    }

    pub fn service(repo: &RepoId, source: impl Into<BoxedCause>) -> Self {
        Self::Service {
            repo: repo.clone(),
            source: source.into(),
        }
    }

    pub fn enrichment(repo: &RepoId, number: u64, source: FetchError) -> Self {
        Self::Enrichment {
            repo: repo.clone(),
            number,
            source: Box::new(source),
        }
    }
}
