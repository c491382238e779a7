//! Environment and notifications configuration.
//!
//! Environment variables (optionally via a `.env` file) carry credentials and
//! tuning knobs. A JSON notifications file declares which Slack channel
//! receives which report for which repositories; it is validated in full
//! before any network call happens.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::filters::PullRequestFilter;

/// A unique identifier for a hosted repository.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RepoId {
    /// The owner of the repository (e.g., "acme").
    pub owner: String,
    /// The name of the repository (e.g., "widgets").
    pub repo: String,
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepoId {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok(RepoId {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(ConfigError::InvalidRepository {
                value: value.to_string(),
            }),
        }
    }
}

/// Runtime configuration loaded from environment variables.
#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    /// Slack bot token used for chat.postMessage.
    pub slack_oauth_token: String,

    /// Optional GitHub Personal Access Token for higher rate limits.
    pub github_token: Option<String>,

    /// Optional REST base URL for GitHub Enterprise installs.
    pub github_api_url: Option<String>,

    /// Path of the JSON notifications file.
    #[serde(default = "default_notifications_config")]
    pub notifications_config: PathBuf,

    /// Width of the per-pull-request enrichment fan-out.
    #[serde(default = "default_enrichment_concurrency")]
    pub enrichment_concurrency: usize,

    /// Hard limit on the number of paginated closed-PR requests to make per
    /// repository.
    #[serde(default = "default_max_scan_pages")]
    pub max_scan_pages: u32,

    /// Maximum number of repositories kept in the open-PR cache.
    #[serde(default = "default_cache_max_capacity")]
    pub cache_max_capacity: u64,
}

fn default_notifications_config() -> PathBuf {
    PathBuf::from("config.json")
}

fn default_enrichment_concurrency() -> usize {
    25
}

fn default_max_scan_pages() -> u32 {
    30
}

fn default_cache_max_capacity() -> u64 {
    256
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }
}

const DEFAULT_TIME_WINDOW_DAYS: i64 = 14;

/// One channel's notification declaration.
#[derive(Debug, Clone)]
pub struct ChannelNotification {
    pub channel: String,
    pub task: NotificationTask,
}

/// What a channel receives.
#[derive(Debug, Clone)]
pub enum NotificationTask {
    /// Open-PR summary per repository, subject to the filter set.
    PullRequests {
        repositories: Vec<RepoId>,
        filters: Vec<PullRequestFilter>,
    },
    /// Team productivity report over a trailing window.
    TeamProductivity {
        repositories: Vec<RepoId>,
        team_members: Vec<String>,
        time_window_days: i64,
    },
}

pub fn load_notifications(path: &Path) -> Result<Vec<ChannelNotification>, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_notifications(&contents)
}

pub fn parse_notifications(contents: &str) -> Result<Vec<ChannelNotification>, ConfigError> {
    let raw: RawConfig =
        serde_json::from_str(contents).map_err(|source| ConfigError::Json { source })?;
    if raw.notifications.is_empty() {
        return Err(ConfigError::Empty);
    }
    raw.notifications
        .into_iter()
        .map(RawNotification::validate)
        .collect()
}

#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    notifications: Vec<RawNotification>,
}

#[derive(Deserialize)]
struct RawNotification {
    slack_channel: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    repositories: Vec<String>,
    pull_request_filters: Option<RawFilters>,
    team_members: Option<Vec<String>>,
    time_window_days: Option<i64>,
}

#[derive(Deserialize)]
struct RawFilters {
    authors: Option<Vec<String>>,
    include_drafts: Option<bool>,
    title_regex: Option<String>,
}

impl RawNotification {
    fn validate(self) -> Result<ChannelNotification, ConfigError> {
        let channel = self.slack_channel.trim().to_string();
        let repositories = parse_repositories(&self.repositories)?;

        let task = match self.kind.as_deref().unwrap_or("pull_requests") {
            "pull_requests" => NotificationTask::PullRequests {
                repositories,
                filters: parse_filters(self.pull_request_filters)?,
            },
            "team_productivity" => {
                let team_members = dedup_trimmed(self.team_members.unwrap_or_default());
                if team_members.is_empty() {
                    return Err(ConfigError::EmptyTeam { channel });
                }
                let time_window_days = self.time_window_days.unwrap_or(DEFAULT_TIME_WINDOW_DAYS);
                if time_window_days <= 0 {
                    return Err(ConfigError::NonPositiveTimeWindow {
                        channel,
                        value: time_window_days,
                    });
                }
                NotificationTask::TeamProductivity {
                    repositories,
                    team_members,
                    time_window_days,
                }
            }
            other => {
                return Err(ConfigError::UnknownNotificationType {
                    channel,
                    kind: other.to_string(),
                });
            }
        };

        Ok(ChannelNotification { channel, task })
    }
}

fn parse_repositories(raw: &[String]) -> Result<Vec<RepoId>, ConfigError> {
    dedup_trimmed(raw.to_vec())
        .iter()
        .map(|value| value.parse())
        .collect()
}

/// Trims entries, drops empties, and keeps the first occurrence of each.
fn dedup_trimmed(values: Vec<String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let trimmed = value.trim();
        if !trimmed.is_empty() && !result.iter().any(|seen| seen == trimmed) {
            result.push(trimmed.to_string());
        }
    }
    result
}

fn parse_filters(raw: Option<RawFilters>) -> Result<Vec<PullRequestFilter>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    let mut filters = Vec::new();
    if let Some(authors) = raw.authors {
        filters.push(PullRequestFilter::author(dedup_trimmed(authors)));
    }
    if let Some(include_drafts) = raw.include_drafts {
        filters.push(PullRequestFilter::drafts(include_drafts));
    }
    if let Some(pattern) = raw.title_regex {
        filters.push(PullRequestFilter::title(&pattern)?);
    }
    Ok(filters)
}
