//! Channel orchestration: fetch, format, deliver.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;

use crate::config::{AppConfig, ChannelNotification, NotificationTask, RepoId};
use crate::fetcher::PullRequestFetcher;
use crate::filters::PullRequestFilter;
use crate::format;
use crate::github::PullRequestHost;
use crate::productivity::ProductivityAggregator;
use crate::repository::RepositoryInfo;
use crate::slack::MessageSink;

pub struct Notifier {
    fetcher: PullRequestFetcher,
    aggregator: ProductivityAggregator,
    sink: Arc<dyn MessageSink>,
}

impl Notifier {
    pub fn new(
        host: Arc<dyn PullRequestHost>,
        sink: Arc<dyn MessageSink>,
        config: &AppConfig,
    ) -> Self {
        Self {
            fetcher: PullRequestFetcher::new(Arc::clone(&host), config),
            aggregator: ProductivityAggregator::new(host, config),
            sink,
        }
    }

    /// Processes every configured channel. A failing channel is logged and
    /// does not stop the others; the run fails at the end if any channel
    /// failed.
    pub async fn run(&self, notifications: &[ChannelNotification]) -> anyhow::Result<()> {
        let mut failed = 0usize;
        for notification in notifications {
            if let Err(e) = self.notify_channel(notification).await {
                tracing::error!(
                    channel = %notification.channel,
                    "Channel notification failed: {:#}",
                    e
                );
                failed += 1;
            }
        }

        if failed > 0 {
            anyhow::bail!(
                "{failed} of {} channel notifications failed",
                notifications.len()
            );
        }
        Ok(())
    }

    async fn notify_channel(&self, notification: &ChannelNotification) -> anyhow::Result<()> {
        match &notification.task {
            NotificationTask::PullRequests {
                repositories,
                filters,
            } => {
                self.send_pull_request_summaries(&notification.channel, repositories, filters)
                    .await
            }
            NotificationTask::TeamProductivity {
                repositories,
                team_members,
                time_window_days,
            } => {
                self.send_productivity_report(
                    &notification.channel,
                    repositories,
                    team_members,
                    *time_window_days,
                )
                .await
            }
        }
    }

    /// Fetches every configured repository before posting anything, so a
    /// fetch failure never leaves the channel with a partial report.
    /// Repositories with no matching pull requests are dropped; if none
    /// remain the channel stays quiet.
    async fn send_pull_request_summaries(
        &self,
        channel: &str,
        repositories: &[RepoId],
        filters: &[PullRequestFilter],
    ) -> anyhow::Result<()> {
        let mut reports: Vec<RepositoryInfo> = Vec::new();
        for repo in repositories {
            let info = self
                .fetcher
                .repository_info(repo, filters)
                .await
                .with_context(|| format!("fetching open pull requests for {repo}"))?;
            if info.pulls.is_empty() {
                tracing::debug!(repo = %repo, "no matching open pull requests");
            } else {
                reports.push(info);
            }
        }

        if reports.is_empty() {
            tracing::info!(channel, "Nothing to report");
            return Ok(());
        }

        for info in &reports {
            for blocks in format::repository_messages(info) {
                self.sink
                    .post_blocks(channel, &blocks)
                    .await
                    .with_context(|| format!("posting summary for {}", info.repository))?;
            }
        }
        Ok(())
    }

    async fn send_productivity_report(
        &self,
        channel: &str,
        repositories: &[RepoId],
        team_members: &[String],
        time_window_days: i64,
    ) -> anyhow::Result<()> {
        let metrics = self
            .aggregator
            .team_productivity(repositories, team_members, time_window_days, Utc::now())
            .await
            .context("aggregating team productivity")?;

        // Only send if there is meaningful data.
        if metrics.total_merged_prs == 0 && metrics.reviewer_approvals.is_empty() {
            tracing::info!(channel, "No productivity activity in the window");
            return Ok(());
        }

        let blocks = format::productivity_message(&metrics);
        self.sink
            .post_blocks(channel, &blocks)
            .await
            .context("posting productivity report")?;
        Ok(())
    }
}
