//! Team productivity aggregation over a trailing time window.
//!
//! The aggregator walks each repository's closed pull requests in descending
//! update order and stops at the first record older than the window cutoff,
//! so the cost is bounded by recent activity rather than repository history.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::config::{AppConfig, RepoId};
use crate::error::FetchError;
use crate::github::{PullRequestHost, ReviewRecord, ReviewVerdict};

/// Per-repository share of the team report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryProductivityMetrics {
    pub repository: RepoId,
    pub merged_prs: u32,
    pub lines_added: u64,
    pub lines_deleted: u64,
}

/// Team-wide report: totals, a per-repository breakdown in input order, and
/// per-reviewer approval counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamProductivityMetrics {
    pub time_window_days: i64,
    pub total_merged_prs: u32,
    pub total_lines_added: u64,
    pub total_lines_deleted: u64,
    pub repository_breakdown: Vec<RepositoryProductivityMetrics>,
    pub reviewer_approvals: HashMap<String, u32>,
}

pub struct ProductivityAggregator {
    host: Arc<dyn PullRequestHost>,
    max_scan_pages: u32,
}

impl ProductivityAggregator {
    pub fn new(host: Arc<dyn PullRequestHost>, config: &AppConfig) -> Self {
        Self {
            host,
            max_scan_pages: config.max_scan_pages,
        }
    }

    /// Scans each repository's recently updated closed pull requests and
    /// accumulates merged-PR counts, line deltas, and reviewer approvals for
    /// the team roster. The window covers `now - window_days` up to the
    /// caller-supplied `now`, boundary included.
    ///
    /// Totals are sums over the breakdown, so scanning repositories in a
    /// different order changes only the breakdown order, never the numbers.
    pub async fn team_productivity(
        &self,
        repos: &[RepoId],
        team_members: &[String],
        window_days: i64,
        now: DateTime<Utc>,
    ) -> Result<TeamProductivityMetrics, FetchError> {
        let cutoff = now - Duration::days(window_days);
        let team: HashSet<&str> = team_members.iter().map(String::as_str).collect();

        let mut repository_breakdown = Vec::with_capacity(repos.len());
        let mut reviewer_approvals = HashMap::new();
        for repo in repos {
            let metrics = self
                .scan_repository(repo, &team, cutoff, &mut reviewer_approvals)
                .await?;
            repository_breakdown.push(metrics);
        }

        Ok(TeamProductivityMetrics {
            time_window_days: window_days,
            total_merged_prs: repository_breakdown.iter().map(|repo| repo.merged_prs).sum(),
            total_lines_added: repository_breakdown
                .iter()
                .map(|repo| repo.lines_added)
                .sum(),
            total_lines_deleted: repository_breakdown
                .iter()
                .map(|repo| repo.lines_deleted)
                .sum(),
            repository_breakdown,
            reviewer_approvals,
        })
    }

    /// Walks one repository's closed pull requests newest-update-first and
    /// stops at the first record older than the cutoff; in descending update
    /// order nothing after it can be inside the window.
    async fn scan_repository(
        &self,
        repo: &RepoId,
        team: &HashSet<&str>,
        cutoff: DateTime<Utc>,
        reviewer_approvals: &mut HashMap<String, u32>,
    ) -> Result<RepositoryProductivityMetrics, FetchError> {
        let mut metrics = RepositoryProductivityMetrics {
            repository: repo.clone(),
            merged_prs: 0,
            lines_added: 0,
            lines_deleted: 0,
        };

        let mut page = 1;
        loop {
            let pulls = self.host.closed_pulls_page(repo, page).await?;
            if pulls.is_empty() {
                break;
            }

            let mut reached_cutoff = false;
            for pull in &pulls {
                if pull.updated_at < cutoff {
                    reached_cutoff = true;
                    break;
                }
                if !team.contains(pull.author.as_str()) {
                    continue;
                }

                if pull.merged_at.is_some() {
                    let details = self
                        .host
                        .pull_details(repo, pull.number)
                        .await
                        .map_err(|err| FetchError::enrichment(repo, pull.number, err))?;
                    metrics.merged_prs += 1;
                    metrics.lines_added += details.additions;
                    metrics.lines_deleted += details.deletions;
                }

                match self.host.pull_reviews(repo, pull.number).await {
                    Ok(reviews) => tally_approvals(&reviews, team, cutoff, reviewer_approvals),
                    // Merge totals already counted above stay; only this pull
                    // request's approval tally is dropped.
                    Err(err) => tracing::warn!(
                        repo = %repo,
                        number = pull.number,
                        error = %err,
                        "skipping review tally"
                    ),
                }
            }

            if reached_cutoff {
                break;
            }
            if page >= self.max_scan_pages {
                tracing::warn!(
                    "Hit max_scan_pages ({}) for repo {} before reaching the window cutoff. Data may be incomplete.",
                    self.max_scan_pages,
                    repo
                );
                break;
            }
            page += 1;
        }

        Ok(metrics)
    }
}

/// Counts one approval per in-window APPROVED review by a team member.
/// Reviews without a submission time cannot be placed in the window and are
/// not counted.
fn tally_approvals(
    reviews: &[ReviewRecord],
    team: &HashSet<&str>,
    cutoff: DateTime<Utc>,
    reviewer_approvals: &mut HashMap<String, u32>,
) {
    for review in reviews {
        if review.verdict != ReviewVerdict::Approved {
            continue;
        }
        if !team.contains(review.reviewer.as_str()) {
            continue;
        }
        if !review
            .submitted_at
            .is_some_and(|submitted| submitted >= cutoff)
        {
            continue;
        }
        *reviewer_approvals.entry(review.reviewer.clone()).or_insert(0) += 1;
    }
}
