use std::sync::Arc;

use pr_pulse::config::{self, AppConfig};
use pr_pulse::github::{GitHubClient, PullRequestHost};
use pr_pulse::notifier::Notifier;
use pr_pulse::slack::{MessageSink, SlackClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // A .env file is optional; deployments set the environment directly.
    dotenvy::dotenv().ok();

    // Initialize tracing (logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pr_pulse=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let notifications = config::load_notifications(&config.notifications_config)?;
    tracing::info!(
        path = %config.notifications_config.display(),
        channels = notifications.len(),
        "Loaded notifications config"
    );

    let host: Arc<dyn PullRequestHost> = Arc::new(GitHubClient::new(
        config.github_token.clone(),
        config.github_api_url.as_deref(),
    )?);
    let sink: Arc<dyn MessageSink> = Arc::new(SlackClient::new(config.slack_oauth_token.clone()));

    Notifier::new(host, sink, &config).run(&notifications).await
}
