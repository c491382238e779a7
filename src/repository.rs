//! Normalized pull-request records and their derived fields.
//!
//! Everything here is pure. Callers supply the clock, so age and review
//! status are reproducible in tests and recomputed on every build even when
//! the raw records came from the cache.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::config::RepoId;
use crate::github::{PullDetails, PullRecord, ReviewRecord, ReviewVerdict};

/// Elapsed time since a pull request was opened, split into whole days and
/// remaining whole hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Age {
    pub days: i64,
    pub hours: i64,
}

/// Aggregate review verdict for a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStatus {
    Waiting,
    Approved,
    ChangesRequested,
}

impl ReviewStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Waiting => "WAITING",
            Self::Approved => "APPROVED",
            Self::ChangesRequested => "CHANGES_REQUESTED",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One open pull request, normalized for reporting. Built once per fetch and
/// never mutated afterwards; the age snapshot belongs to the build instant.
#[derive(Debug, Clone, PartialEq)]
pub struct PullRequestInfo {
    pub title: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub age: Age,
    pub review_status: ReviewStatus,
    pub url: String,
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub changed_files: u64,
}

impl PullRequestInfo {
    pub fn build(
        pull: &PullRecord,
        details: PullDetails,
        reviews: &[ReviewRecord],
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            title: pull.title.clone(),
            author: pull.author.clone(),
            created_at: pull.created_at,
            age: age_since(pull.created_at, now),
            review_status: derive_review_status(reviews, None),
            url: pull.html_url.clone(),
            lines_added: details.additions,
            lines_deleted: details.deletions,
            changed_files: details.changed_files,
        }
    }
}

/// A repository and its filtered open pull requests, in host return order.
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryInfo {
    pub repository: RepoId,
    pub pulls: Vec<PullRequestInfo>,
}

pub fn age_since(created_at: DateTime<Utc>, now: DateTime<Utc>) -> Age {
    let elapsed = now - created_at;
    let days = elapsed.num_days();
    let hours = elapsed.num_hours() - days * 24;
    Age { days, hours }
}

/// Derives the aggregate review status from each reviewer's most recent
/// review.
///
/// With `required_reviewers` present and non-empty, only those reviewers
/// count: any CHANGES_REQUESTED among them dominates, APPROVED needs every
/// one of them, anything else is WAITING. Without required reviewers the
/// same rules apply to everyone who reviewed, and a pull request with no
/// reviews at all is WAITING.
pub fn derive_review_status(
    reviews: &[ReviewRecord],
    required_reviewers: Option<&[String]>,
) -> ReviewStatus {
    let latest = latest_verdicts(reviews);

    match required_reviewers.filter(|required| !required.is_empty()) {
        Some(required) => {
            let verdicts: Vec<Option<ReviewVerdict>> = required
                .iter()
                .map(|login| latest.get(login.as_str()).copied())
                .collect();
            if verdicts
                .iter()
                .flatten()
                .any(|verdict| *verdict == ReviewVerdict::ChangesRequested)
            {
                ReviewStatus::ChangesRequested
            } else if verdicts
                .iter()
                .all(|verdict| *verdict == Some(ReviewVerdict::Approved))
            {
                ReviewStatus::Approved
            } else {
                ReviewStatus::Waiting
            }
        }
        None => {
            if latest
                .values()
                .any(|verdict| *verdict == ReviewVerdict::ChangesRequested)
            {
                ReviewStatus::ChangesRequested
            } else if !latest.is_empty()
                && latest
                    .values()
                    .all(|verdict| *verdict == ReviewVerdict::Approved)
            {
                ReviewStatus::Approved
            } else {
                ReviewStatus::Waiting
            }
        }
    }
}

/// Latest verdict per reviewer. On a submission-time tie the later entry in
/// the sequence wins, so feeds without timestamps degrade to list order.
fn latest_verdicts(reviews: &[ReviewRecord]) -> HashMap<&str, ReviewVerdict> {
    let mut latest: HashMap<&str, (DateTime<Utc>, ReviewVerdict)> = HashMap::new();
    for review in reviews {
        let submitted_at = review.submitted_at.unwrap_or(DateTime::<Utc>::MIN_UTC);
        match latest.get(review.reviewer.as_str()) {
            Some((existing, _)) if *existing > submitted_at => {}
            _ => {
                latest.insert(review.reviewer.as_str(), (submitted_at, review.verdict));
            }
        }
    }
    latest
        .into_iter()
        .map(|(login, (_, verdict))| (login, verdict))
        .collect()
}
