//! Open pull-request fetching with per-run caching and bounded enrichment.
//!
//! `PullRequestFetcher` is the entry point for open-PR summaries. It
//! 1. checks the in-memory cache for the repository's raw open pull
//!    requests, fetching them once per run on a miss;
//! 2. applies the channel's filter set to the raw records, before any
//!    per-pull-request network call;
//! 3. enriches the survivors (diff stats, reviews) on a buffered stream and
//!    assembles the result in the original order.

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use moka::future::Cache;

use crate::config::{AppConfig, RepoId};
use crate::error::FetchError;
use crate::filters::{self, PullRequestFilter};
use crate::github::{PullRecord, PullRequestHost};
use crate::repository::{PullRequestInfo, RepositoryInfo};

pub struct PullRequestFetcher {
    host: Arc<dyn PullRequestHost>,
    open_pulls: Cache<RepoId, Arc<Vec<PullRecord>>>,
    enrichment_concurrency: usize,
}

impl PullRequestFetcher {
    pub fn new(host: Arc<dyn PullRequestHost>, config: &AppConfig) -> Self {
        // No TTL: a run is short-lived, so entries stay valid for the whole
        // process lifetime.
        let open_pulls = Cache::builder()
            .max_capacity(config.cache_max_capacity)
            .build();

        Self {
            host,
            open_pulls,
            enrichment_concurrency: config.enrichment_concurrency.max(1),
        }
    }

    /// Retrieves the repository's open pull requests, applies the filter
    /// set, and returns fully enriched records in host return order.
    ///
    /// The first enrichment failure aborts the whole repository so a report
    /// is never built from partially enriched data.
    pub async fn repository_info(
        &self,
        repo: &RepoId,
        filters: &[PullRequestFilter],
    ) -> Result<RepositoryInfo, FetchError> {
        let raw = self.open_pulls_cached(repo).await?;
        let selected: Vec<PullRecord> = raw
            .iter()
            .filter(|pull| filters::passes_all(filters, pull))
            .cloned()
            .collect();
        tracing::debug!(
            repo = %repo,
            total = raw.len(),
            selected = selected.len(),
            "filtered open pull requests"
        );

        let now = Utc::now();
        let mut enrichments = stream::iter(selected)
            .map(|pull| {
                let host = Arc::clone(&self.host);
                async move {
                    let details = host
                        .pull_details(repo, pull.number)
                        .await
                        .map_err(|err| FetchError::enrichment(repo, pull.number, err))?;
                    let reviews = host
                        .pull_reviews(repo, pull.number)
                        .await
                        .map_err(|err| FetchError::enrichment(repo, pull.number, err))?;
                    Ok::<_, FetchError>(PullRequestInfo::build(&pull, details, &reviews, now))
                }
            })
            .buffered(self.enrichment_concurrency);

        let mut pulls = Vec::new();
        while let Some(built) = enrichments.next().await {
            pulls.push(built?);
        }

        Ok(RepositoryInfo {
            repository: repo.clone(),
            pulls,
        })
    }

    /// Retrieves the raw open pull requests, fetching on a cache miss
    /// (read-through).
    async fn open_pulls_cached(&self, repo: &RepoId) -> Result<Arc<Vec<PullRecord>>, FetchError> {
        if let Some(pulls) = self.open_pulls.get(repo).await {
            return Ok(pulls);
        }

        let fetched = Arc::new(self.host.open_pulls(repo).await?);
        self.open_pulls
            .insert(repo.clone(), Arc::clone(&fetched))
            .await;
        tracing::debug!(repo = %repo, count = fetched.len(), "cached open pull requests");

        Ok(fetched)
    }
}
