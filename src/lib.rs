pub mod config;
pub mod error;
pub mod fetcher;
pub mod filters;
pub mod format;
pub mod github;
pub mod notifier;
pub mod productivity;
pub mod repository;
pub mod slack;

pub use config::{AppConfig, ChannelNotification, NotificationTask, RepoId};
pub use error::{ConfigError, FetchError};
pub use fetcher::PullRequestFetcher;
pub use filters::PullRequestFilter;
pub use github::{GitHubClient, PullRequestHost};
pub use notifier::Notifier;
pub use productivity::{ProductivityAggregator, TeamProductivityMetrics};
pub use repository::{PullRequestInfo, RepositoryInfo, ReviewStatus};
pub use slack::{MessageSink, SlackClient, SlackError};
