//! GitHub REST access behind the `PullRequestHost` trait.
//!
//! The trait is the seam the rest of the crate depends on; `GitHubClient` is
//! the octocrab-backed implementation. List endpoints return lightweight
//! records, diff statistics come from the per-pull-request endpoint only.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::models::pulls::{PullRequest, Review, ReviewState};
use octocrab::{Octocrab, Page};

use crate::config::RepoId;
use crate::error::FetchError;

/// Raw pull request as returned by the list endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct PullRecord {
    pub number: u64,
    pub title: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
    pub draft: bool,
    pub html_url: String,
}

/// Diff statistics only present on the per-pull-request endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullDetails {
    pub additions: u64,
    pub deletions: u64,
    pub changed_files: u64,
}

/// One submitted review.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRecord {
    pub reviewer: String,
    pub verdict: ReviewVerdict,
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewVerdict {
    Approved,
    ChangesRequested,
    Commented,
    Dismissed,
}

/// Read-only surface of the source-control host used by the core.
#[async_trait]
pub trait PullRequestHost: Send + Sync {
    /// All open pull requests, newest first.
    async fn open_pulls(&self, repo: &RepoId) -> Result<Vec<PullRecord>, FetchError>;

    /// One page of closed pull requests sorted by update time, newest first.
    /// An empty page means the listing is exhausted. Pages are numbered
    /// from 1.
    async fn closed_pulls_page(
        &self,
        repo: &RepoId,
        page: u32,
    ) -> Result<Vec<PullRecord>, FetchError>;

    /// Diff statistics for a single pull request.
    async fn pull_details(&self, repo: &RepoId, number: u64) -> Result<PullDetails, FetchError>;

    /// Every submitted review for a single pull request.
    async fn pull_reviews(
        &self,
        repo: &RepoId,
        number: u64,
    ) -> Result<Vec<ReviewRecord>, FetchError>;
}

pub struct GitHubClient {
    octocrab: Octocrab,
}

impl GitHubClient {
    pub fn new(token: Option<String>, base_url: Option<&str>) -> anyhow::Result<Self> {
        let mut builder = Octocrab::builder();
        if let Some(base_url) = base_url {
            builder = builder.base_uri(base_url)?;
        }
        if let Some(token) = token {
            builder = builder.personal_token(token);
        }

        Ok(Self {
            octocrab: builder.build()?,
        })
    }

    async fn next_page<T>(
        &self,
        repo: &RepoId,
        page: &Page<T>,
    ) -> Result<Option<Page<T>>, FetchError>
    where
        T: serde::de::DeserializeOwned,
    {
        self.octocrab
            .get_page(&page.next)
            .await
            .map_err(|err| map_api_error(repo, err))
    }
}

#[async_trait]
impl PullRequestHost for GitHubClient {
    async fn open_pulls(&self, repo: &RepoId) -> Result<Vec<PullRecord>, FetchError> {
        let mut current_page = self
            .octocrab
            .pulls(&repo.owner, &repo.repo)
            .list()
            .state(octocrab::params::State::Open)
            .sort(octocrab::params::pulls::Sort::Created)
            .direction(octocrab::params::Direction::Descending)
            .per_page(100)
            .send()
            .await
            .map_err(|err| map_api_error(repo, err))?;

        let mut pulls: Vec<PullRecord> =
            current_page.items.iter().filter_map(to_pull_record).collect();
        while let Some(next_page) = self.next_page(repo, &current_page).await? {
            current_page = next_page;
            pulls.extend(current_page.items.iter().filter_map(to_pull_record));
        }

        Ok(pulls)
    }

    async fn closed_pulls_page(
        &self,
        repo: &RepoId,
        page: u32,
    ) -> Result<Vec<PullRecord>, FetchError> {
        let fetched = self
            .octocrab
            .pulls(&repo.owner, &repo.repo)
            .list()
            .state(octocrab::params::State::Closed)
            .sort(octocrab::params::pulls::Sort::Updated)
            .direction(octocrab::params::Direction::Descending)
            .per_page(100)
            .page(page)
            .send()
            .await
            .map_err(|err| map_api_error(repo, err))?;

        Ok(fetched.items.iter().filter_map(to_pull_record).collect())
    }

    async fn pull_details(&self, repo: &RepoId, number: u64) -> Result<PullDetails, FetchError> {
        let pull = self
            .octocrab
            .pulls(&repo.owner, &repo.repo)
            .get(number)
            .await
            .map_err(|err| map_api_error(repo, err))?;

        Ok(PullDetails {
            additions: pull.additions.unwrap_or(0),
            deletions: pull.deletions.unwrap_or(0),
            changed_files: pull.changed_files.unwrap_or(0),
        })
    }

    async fn pull_reviews(
        &self,
        repo: &RepoId,
        number: u64,
    ) -> Result<Vec<ReviewRecord>, FetchError> {
        let route = format!(
            "/repos/{}/{}/pulls/{}/reviews",
            repo.owner, repo.repo, number
        );
        let mut current_page: Page<Review> = self
            .octocrab
            .get(&route, Some(&[("per_page", "100")]))
            .await
            .map_err(|err| map_api_error(repo, err))?;

        let mut reviews: Vec<ReviewRecord> =
            current_page.items.iter().filter_map(to_review_record).collect();
        while let Some(next_page) = self.next_page(repo, &current_page).await? {
            current_page = next_page;
            reviews.extend(current_page.items.iter().filter_map(to_review_record));
        }

        Ok(reviews)
    }
}

fn to_pull_record(pull: &PullRequest) -> Option<PullRecord> {
    let created_at = pull.created_at?;

    Some(PullRecord {
        number: pull.number,
        title: pull.title.clone().unwrap_or_default(),
        author: pull
            .user
            .as_ref()
            .map(|user| user.login.clone())
            .unwrap_or_default(),
        created_at,
        updated_at: pull.updated_at.unwrap_or(created_at),
        merged_at: pull.merged_at,
        draft: pull.draft.unwrap_or(false),
        html_url: pull
            .html_url
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
    })
}

fn to_review_record(review: &Review) -> Option<ReviewRecord> {
    let reviewer = review.user.as_ref().map(|user| user.login.clone())?;
    let verdict = match review.state {
        Some(ReviewState::Approved) => ReviewVerdict::Approved,
        Some(ReviewState::ChangesRequested) => ReviewVerdict::ChangesRequested,
        Some(ReviewState::Commented) => ReviewVerdict::Commented,
        Some(ReviewState::Dismissed) => ReviewVerdict::Dismissed,
        // Pending reviews have not been submitted yet.
        _ => return None,
    };

    Some(ReviewRecord {
        reviewer,
        verdict,
        submitted_at: review.submitted_at,
    })
}

/// Maps an octocrab error onto the crate taxonomy.
///
/// GitHub reports a missing repository as a generic API error, so detection
/// falls back to matching the error message.
fn map_api_error(repo: &RepoId, err: octocrab::Error) -> FetchError {
    if let octocrab::Error::GitHub { source, .. } = &err {
        if source.message.to_lowercase().contains("not found") {
            return FetchError::not_found(repo, err);
        }
    }
    FetchError::service(repo, err)
}
